//! Ordinal-encoded facets
//!
//! # Architecture
//!
//! - `FacetDataCache`: per-segment dictionary, ordinal array and
//!   frequency table, built once and shared by every query
//! - `FacetSegment`: an opened segment with its facet caches
//! - `SimpleFacetHandler`: builds caches, filters, collectors and scorers
//!   for one single-valued field

mod cache;
mod dictionary;
mod handler;
mod segment;
mod selection;
mod sort;
mod value;

pub use cache::*;
pub use dictionary::*;
pub use handler::*;
pub use segment::*;
pub use selection::*;
pub use sort::*;
pub use value::*;
