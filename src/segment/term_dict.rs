//! Per-field term index backed by an FST
//!
//! Maps each stored value of a field to the metadata of its posting list.
//! Keys stream out in byte order.

use std::io;

use fst::{Map, MapBuilder, Streamer};

use super::types::PostingListMeta;

fn invalid(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Value → posting metadata for one field
pub struct TermDictionary {
    /// value bytes -> slot in `postings`
    index: Map<Vec<u8>>,
    postings: Vec<PostingListMeta>,
}

impl TermDictionary {
    /// Reopen a persisted index; the FST must hold exactly one key per slot
    pub fn new(fst_data: Vec<u8>, postings: Vec<PostingListMeta>) -> io::Result<Self> {
        let index = Map::new(fst_data).map_err(invalid)?;
        if index.len() != postings.len() {
            return Err(invalid(format!(
                "term index has {} keys but {} posting entries",
                index.len(),
                postings.len()
            )));
        }
        Ok(Self { index, postings })
    }

    /// Build from values in strictly ascending byte order
    pub fn from_sorted<I, K>(entries: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = (K, PostingListMeta)>,
        K: AsRef<[u8]>,
    {
        let mut builder = MapBuilder::memory();
        let mut postings = Vec::new();
        for (key, meta) in entries {
            // rejects out-of-order and repeated keys
            builder
                .insert(key, postings.len() as u64)
                .map_err(invalid)?;
            postings.push(meta);
        }
        let data = builder.into_inner().map_err(invalid)?;
        Self::new(data, postings)
    }

    pub fn get(&self, value: &str) -> Option<&PostingListMeta> {
        let slot = self.index.get(value)?;
        self.postings.get(slot as usize)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn fst_bytes(&self) -> &[u8] {
        self.index.as_fst().as_bytes()
    }

    pub fn metadata(&self) -> &[PostingListMeta] {
        &self.postings
    }

    /// Values in byte order; non-UTF-8 keys are skipped
    pub fn values(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.postings.len());
        let mut stream = self.index.keys();
        while let Some(key) = stream.next() {
            if let Ok(value) = std::str::from_utf8(key) {
                out.push(value.to_string());
            }
        }
        out
    }
}

impl std::fmt::Debug for TermDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermDictionary")
            .field("values", &self.postings.len())
            .finish()
    }
}
