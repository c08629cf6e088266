//! Core types for the segment layer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Segment identifier; also names the segment's directory in a store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..doc_count)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Posting list metadata stored in the term dictionary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostingListMeta {
    /// Offset in the postings data
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Number of documents carrying this value
    pub doc_frequency: u32,
}

/// Stored field values of a single document, keyed by field name.
///
/// Each field holds at most one value; that is the contract the facet
/// layer builds on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentFields {
    pub values: BTreeMap<String, String>,
}

impl DocumentFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for one field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|v| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }
}
