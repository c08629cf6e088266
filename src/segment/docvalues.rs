//! Columnar per-document values
//!
//! Keyword columns dictionary-encode each field: values are stored once in
//! first-seen order and documents carry an ordinal into that list.

use std::collections::{BTreeMap, HashMap};
use std::io;

use serde::{Deserialize, Serialize};

use super::types::DocNo;

/// Keyword column with dictionary encoding
#[derive(Clone, Debug, Default)]
pub struct KeywordColumn {
    /// ordinal -> keyword, in first-seen order
    dictionary: Vec<String>,
    keyword_to_ordinal: HashMap<String, u32>,
    /// Ordinals indexed by docno
    ordinals: Vec<Option<u32>>,
}

/// On-disk form of a column: 0 is "no value", otherwise ordinal + 1
#[derive(Serialize, Deserialize)]
struct StoredColumn {
    dictionary: Vec<String>,
    ordinals: Vec<u32>,
}

impl KeywordColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ordinals: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Add a value for the next docno
    pub fn add(&mut self, value: Option<&str>) {
        let ordinal = value.map(|keyword| match self.keyword_to_ordinal.get(keyword) {
            Some(&ord) => ord,
            None => {
                let ord = self.dictionary.len() as u32;
                self.dictionary.push(keyword.to_string());
                self.keyword_to_ordinal.insert(keyword.to_string(), ord);
                ord
            }
        });
        self.ordinals.push(ordinal);
    }

    /// Value stored for a docno
    pub fn get(&self, docno: DocNo) -> Option<&str> {
        self.ordinals
            .get(docno.as_usize())
            .copied()
            .flatten()
            .and_then(|ord| self.dictionary.get(ord as usize))
            .map(|s| s.as_str())
    }

    /// Distinct keywords in byte order
    pub fn sorted_keywords(&self) -> Vec<String> {
        let mut keywords = self.dictionary.clone();
        keywords.sort();
        keywords
    }

    /// Number of documents without a value
    pub fn null_count(&self) -> usize {
        self.ordinals.iter().filter(|o| o.is_none()).count()
    }

    fn to_stored(&self) -> StoredColumn {
        StoredColumn {
            dictionary: self.dictionary.clone(),
            ordinals: self
                .ordinals
                .iter()
                .map(|ord| ord.map_or(0, |o| o + 1))
                .collect(),
        }
    }

    /// Rebuild from the stored form, rejecting ordinals that point outside
    /// the dictionary and repeated keywords
    fn from_stored(stored: StoredColumn) -> io::Result<Self> {
        let mut keyword_to_ordinal = HashMap::with_capacity(stored.dictionary.len());
        for (ord, keyword) in stored.dictionary.iter().enumerate() {
            if keyword_to_ordinal.insert(keyword.clone(), ord as u32).is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Duplicate keyword in column dictionary: {}", keyword),
                ));
            }
        }

        let mut ordinals = Vec::with_capacity(stored.ordinals.len());
        for (docno, v) in stored.ordinals.into_iter().enumerate() {
            match v {
                0 => ordinals.push(None),
                v if (v as usize) <= stored.dictionary.len() => ordinals.push(Some(v - 1)),
                v => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "Ordinal {} for doc {} exceeds dictionary of {} values",
                            v - 1,
                            docno,
                            stored.dictionary.len()
                        ),
                    ))
                }
            }
        }

        Ok(Self {
            dictionary: stored.dictionary,
            keyword_to_ordinal,
            ordinals,
        })
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// Doc values of a segment: one keyword column per field
#[derive(Clone, Debug, Default)]
pub struct DocValuesReader {
    keyword_columns: BTreeMap<String, KeywordColumn>,
}

impl DocValuesReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, name: String, column: KeywordColumn) {
        self.keyword_columns.insert(name, column);
    }

    pub fn get_keyword(&self, name: &str) -> Option<&KeywordColumn> {
        self.keyword_columns.get(name)
    }

    pub fn keyword_columns(&self) -> &BTreeMap<String, KeywordColumn> {
        &self.keyword_columns
    }

    /// Serialize all columns into a single byte stream (sorted by name)
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let stored: BTreeMap<&str, StoredColumn> = self
            .keyword_columns
            .iter()
            .map(|(name, column)| (name.as_str(), column.to_stored()))
            .collect();
        bincode::serialize(&stored).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let stored: BTreeMap<String, StoredColumn> = bincode::deserialize(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut reader = Self::new();
        for (name, column) in stored {
            let column = KeywordColumn::from_stored(column).map_err(|e| {
                io::Error::new(e.kind(), format!("column '{}': {}", name, e))
            })?;
            reader.add_keyword(name, column);
        }
        Ok(reader)
    }
}
