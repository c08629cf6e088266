//! Immutable segments: the storage the facet layer reads from
//!
//! # Architecture
//!
//! - `SegmentWriter`: buffers stored documents and writes one segment
//! - `SegmentReader`: keyword columns, per-field value dictionaries and
//!   postings of one segment; implements `FieldSource`
//! - `SegmentStore`: persists segments to a directory with a checksum

mod types;
mod postings;
mod term_dict;
mod docvalues;
mod reader;
mod writer;
mod store;

pub use types::*;
pub use postings::*;
pub use term_dict::*;
pub use docvalues::*;
pub use reader::*;
pub use writer::*;
pub use store::*;
