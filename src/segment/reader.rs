//! Immutable segment reader
//!
//! Gives the facet layer access to a segment's stored values (keyword
//! columns) and per-value postings.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};

use super::docvalues::DocValuesReader;
use super::postings::{PostingIterator, PostingsReader};
use super::term_dict::TermDictionary;
use super::types::{DocNo, PostingListMeta, SegmentId};
use crate::error::{FacetError, Result};
use crate::facet::FieldSource;

/// Metadata describing a written segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Unique segment identifier
    pub id: SegmentId,
    /// Number of documents in the segment
    pub doc_count: u32,
    /// Size in bytes (all segment files combined)
    pub size_bytes: u64,
    /// Creation timestamp
    pub created_at: u64,
    /// CRC32 of the persisted parts
    pub checksum: u32,
}

/// Immutable segment reader backed by in-memory data
pub struct SegmentReader {
    meta: SegmentMeta,
    /// Value dictionaries keyed by field
    terms: HashMap<String, TermDictionary>,
    postings: PostingsReader,
    docvalues: DocValuesReader,
}

impl SegmentReader {
    pub fn from_memory(
        meta: SegmentMeta,
        terms: HashMap<String, TermDictionary>,
        postings: PostingsReader,
        docvalues: DocValuesReader,
    ) -> Self {
        Self {
            meta,
            terms,
            postings,
            docvalues,
        }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    /// Number of documents in the segment
    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    /// Value dictionary of a field
    pub fn terms(&self, field: &str) -> Option<&TermDictionary> {
        self.terms.get(field)
    }

    pub fn get_posting_meta(&self, field: &str, value: &str) -> Option<&PostingListMeta> {
        self.terms.get(field).and_then(|dict| dict.get(value))
    }

    /// Fresh posting iterator for one field value
    pub fn get_postings(&self, field: &str, value: &str) -> io::Result<Option<PostingIterator>> {
        match self.get_posting_meta(field, value) {
            Some(meta) => Ok(Some(self.postings.get_postings(meta)?)),
            None => Ok(None),
        }
    }

    /// Number of documents carrying `value` in `field`
    pub fn doc_frequency(&self, field: &str, value: &str) -> u32 {
        self.get_posting_meta(field, value)
            .map(|m| m.doc_frequency)
            .unwrap_or(0)
    }

    pub fn docvalues(&self) -> &DocValuesReader {
        &self.docvalues
    }

    pub fn postings(&self) -> &PostingsReader {
        &self.postings
    }

    /// Fields with a stored column, in name order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.docvalues.keyword_columns().keys().map(|k| k.as_str())
    }
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader")
            .field("meta", &self.meta)
            .field("fields", &self.terms.len())
            .finish()
    }
}

impl FieldSource for SegmentReader {
    fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    fn enumerate_field_values(&self, field: &str) -> Result<Vec<String>> {
        let column = self
            .docvalues
            .get_keyword(field)
            .ok_or_else(|| FacetError::MissingColumn(field.to_string()))?;
        if column.len() != self.meta.doc_count as usize {
            return Err(FacetError::corrupt(
                field,
                format!(
                    "column holds {} documents, segment has {}",
                    column.len(),
                    self.meta.doc_count
                ),
            ));
        }
        Ok(column.sorted_keywords())
    }

    fn document_value(&self, docno: DocNo, field: &str) -> Result<Option<&str>> {
        let column = self
            .docvalues
            .get_keyword(field)
            .ok_or_else(|| FacetError::MissingColumn(field.to_string()))?;
        if docno.as_usize() >= column.len() {
            return Err(FacetError::corrupt(
                field,
                format!("no column entry for doc {}", docno),
            ));
        }
        Ok(column.get(docno))
    }

    fn posting_iterator(&self, field: &str, value: &str) -> Result<Option<PostingIterator>> {
        Ok(self.get_postings(field, value)?)
    }

    fn has_postings(&self, field: &str) -> bool {
        self.terms.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{DocumentFields, SegmentWriter};

    fn create_test_segment() -> SegmentReader {
        let mut writer = SegmentWriter::new(SegmentId::new(1));
        writer.add_document(DocumentFields::new().with("color", "red"));
        writer.add_document(DocumentFields::new().with("color", "blue"));
        writer.add_document(DocumentFields::new());
        writer.finish().unwrap().reader
    }

    #[test]
    fn test_segment_reader_basic() {
        let reader = create_test_segment();

        assert_eq!(reader.id(), SegmentId::new(1));
        assert_eq!(reader.doc_count(), 3);
        assert!(reader.terms("color").is_some());
        assert!(reader.terms("size").is_none());
        assert_eq!(reader.fields().collect::<Vec<_>>(), vec!["color"]);
    }

    #[test]
    fn test_field_source() {
        let reader = create_test_segment();

        assert_eq!(
            reader.enumerate_field_values("color").unwrap(),
            vec!["blue", "red"]
        );
        assert_eq!(reader.document_value(DocNo(0), "color").unwrap(), Some("red"));
        assert_eq!(reader.document_value(DocNo(2), "color").unwrap(), None);
        assert!(reader.has_postings("color"));

        let docs: Vec<_> = reader
            .posting_iterator("color", "blue")
            .unwrap()
            .unwrap()
            .collect();
        assert_eq!(docs, vec![DocNo(1)]);
        assert!(reader.posting_iterator("color", "purple").unwrap().is_none());
    }

    #[test]
    fn test_missing_column() {
        let reader = create_test_segment();

        let err = reader.enumerate_field_values("brand").unwrap_err();
        assert!(matches!(err, FacetError::MissingColumn(ref f) if f == "brand"));
        assert!(reader.document_value(DocNo(0), "brand").is_err());
    }

    #[test]
    fn test_out_of_range_doc_is_corrupt() {
        let reader = create_test_segment();
        let err = reader.document_value(DocNo(10), "color").unwrap_err();
        assert!(matches!(err, FacetError::CorruptColumn { .. }));
    }
}
