//! Segment writer
//!
//! Accumulates stored documents and writes one immutable segment: a keyword
//! column and a value dictionary per field, plus a shared postings area.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::docvalues::{DocValuesReader, KeywordColumn};
use super::postings::{PostingsReader, PostingsWriter};
use super::reader::{SegmentMeta, SegmentReader};
use super::term_dict::TermDictionary;
use super::types::{DocNo, DocumentFields, PostingListMeta, SegmentId};

/// Serialized value dictionary of one field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldTerms {
    pub field: String,
    pub fst_data: Vec<u8>,
    pub metadata: Vec<PostingListMeta>,
}

/// Result of writing a segment
pub struct SegmentWriteResult {
    /// The created segment reader
    pub reader: SegmentReader,
    /// Postings data
    pub postings_data: Vec<u8>,
    /// Value dictionaries, sorted by field name
    pub field_terms: Vec<FieldTerms>,
    /// DocValues serialized
    pub docvalues_data: Vec<u8>,
}

impl SegmentWriteResult {
    /// CRC32 over postings, term dictionaries and docvalues.
    ///
    /// The checksum stored in the segment meta must match this value on read.
    pub fn checksum(&self) -> io::Result<u32> {
        checksum_parts(&self.postings_data, &self.field_terms, &self.docvalues_data)
    }
}

pub(crate) fn checksum_parts(
    postings_data: &[u8],
    field_terms: &[FieldTerms],
    docvalues_data: &[u8],
) -> io::Result<u32> {
    let mut hasher = Hasher::new();
    hasher.update(postings_data);
    let terms_bytes = bincode::serialize(field_terms)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    hasher.update(&terms_bytes);
    hasher.update(docvalues_data);
    Ok(hasher.finalize())
}

/// Writer for a single segment
pub struct SegmentWriter {
    segment_id: SegmentId,
    documents: Vec<DocumentFields>,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self {
            segment_id,
            documents: Vec::new(),
        }
    }

    /// Buffer a document; docnos are assigned in insertion order
    pub fn add_document(&mut self, doc: DocumentFields) -> DocNo {
        let docno = DocNo::new(self.documents.len() as u32);
        self.documents.push(doc);
        docno
    }

    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }

    /// Write the buffered documents as an immutable segment
    pub fn finish(self) -> io::Result<SegmentWriteResult> {
        let doc_count = self.documents.len();
        let fields: BTreeSet<&str> = self.documents.iter().flat_map(|d| d.fields()).collect();

        let mut docvalues = DocValuesReader::new();
        let mut postings_writer = PostingsWriter::new();
        let mut dictionaries = Vec::with_capacity(fields.len());

        for field in fields {
            let mut column = KeywordColumn::with_capacity(doc_count);
            let mut postings: BTreeMap<&str, Vec<DocNo>> = BTreeMap::new();

            for (idx, doc) in self.documents.iter().enumerate() {
                let value = doc.get(field);
                column.add(value);
                if let Some(value) = value {
                    postings
                        .entry(value)
                        .or_default()
                        .push(DocNo::new(idx as u32));
                }
            }

            let entries = postings
                .into_iter()
                .map(|(value, docnos)| Ok((value, postings_writer.write_list(&docnos)?)))
                .collect::<io::Result<Vec<_>>>()?;

            dictionaries.push((field.to_string(), TermDictionary::from_sorted(entries)?));
            docvalues.add_keyword(field.to_string(), column);
        }

        let postings_data = postings_writer.into_data();
        let docvalues_data = docvalues.serialize()?;
        let field_terms: Vec<FieldTerms> = dictionaries
            .iter()
            .map(|(field, dict)| FieldTerms {
                field: field.clone(),
                fst_data: dict.fst_bytes().to_vec(),
                metadata: dict.metadata().to_vec(),
            })
            .collect();

        let checksum = checksum_parts(&postings_data, &field_terms, &docvalues_data)?;
        let size_bytes = postings_data.len()
            + docvalues_data.len()
            + field_terms.iter().map(|t| t.fst_data.len()).sum::<usize>();

        let meta = SegmentMeta {
            id: self.segment_id,
            doc_count: doc_count as u32,
            size_bytes: size_bytes as u64,
            created_at: current_timestamp(),
            checksum,
        };

        let reader = SegmentReader::from_memory(
            meta,
            dictionaries.into_iter().collect(),
            PostingsReader::new(postings_data.clone()),
            docvalues,
        );

        Ok(SegmentWriteResult {
            reader,
            postings_data,
            field_terms,
            docvalues_data,
        })
    }
}

/// Current Unix timestamp in seconds
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
