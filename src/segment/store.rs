use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::segment::docvalues::DocValuesReader;
use crate::segment::postings::PostingsReader;
use crate::segment::reader::{SegmentMeta, SegmentReader};
use crate::segment::term_dict::TermDictionary;
use crate::segment::types::SegmentId;
use crate::segment::writer::{checksum_parts, FieldTerms, SegmentWriteResult};

const META_FILE: &str = "meta.bin";
const POSTINGS_FILE: &str = "postings.bin";
const TERMS_FILE: &str = "terms.bin";
const DOCVALUES_FILE: &str = "docvalues.bin";

/// Persistent storage for segment files.
///
/// Each segment lives in its own `segment_<id>` directory.
pub struct SegmentStore {
    base_dir: PathBuf,
}

impl SegmentStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    fn segment_dir(&self, id: SegmentId) -> PathBuf {
        self.base_dir.join(id.to_string())
    }

    pub fn write_segment(&self, result: &SegmentWriteResult) -> io::Result<()> {
        let dir = self.segment_dir(result.reader.id());
        fs::create_dir_all(&dir)?;

        fs::write(dir.join(POSTINGS_FILE), &result.postings_data)?;
        fs::write(dir.join(TERMS_FILE), to_bincode(&result.field_terms)?)?;
        fs::write(dir.join(DOCVALUES_FILE), &result.docvalues_data)?;
        // meta last: a directory without it is an incomplete write
        fs::write(dir.join(META_FILE), to_bincode(result.reader.meta())?)?;

        debug!(
            segment = %result.reader.id(),
            doc_count = result.reader.doc_count(),
            "segment written"
        );
        Ok(())
    }

    /// Read a segment back, verifying its checksum
    pub fn read_segment(&self, id: SegmentId) -> io::Result<Arc<SegmentReader>> {
        let dir = self.segment_dir(id);
        let meta: SegmentMeta = from_bincode(&fs::read(dir.join(META_FILE))?)?;
        let postings_data = fs::read(dir.join(POSTINGS_FILE))?;
        let field_terms: Vec<FieldTerms> = from_bincode(&fs::read(dir.join(TERMS_FILE))?)?;
        let docvalues_data = fs::read(dir.join(DOCVALUES_FILE))?;

        let checksum = checksum_parts(&postings_data, &field_terms, &docvalues_data)?;
        if checksum != meta.checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch for {}: expected {:08x}, found {:08x}",
                    id, meta.checksum, checksum
                ),
            ));
        }

        let mut terms = HashMap::with_capacity(field_terms.len());
        for entry in field_terms {
            terms.insert(
                entry.field,
                TermDictionary::new(entry.fst_data, entry.metadata)?,
            );
        }
        let docvalues = DocValuesReader::deserialize(&docvalues_data)?;

        Ok(Arc::new(SegmentReader::from_memory(
            meta,
            terms,
            PostingsReader::new(postings_data),
            docvalues,
        )))
    }

    /// Ids of every fully written segment, ascending
    pub fn list_segments(&self) -> io::Result<Vec<SegmentId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix("segment_"))
                .and_then(|n| n.parse::<u64>().ok())
            else {
                continue;
            };
            if entry.path().join(META_FILE).exists() {
                ids.push(SegmentId::new(id));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn to_bincode<T: serde::Serialize>(value: &T) -> io::Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn from_bincode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> io::Result<T> {
    bincode::deserialize(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
