pub mod collector;
pub mod config;
pub mod error;
pub mod facet;
pub mod filter;
pub mod scoring;
pub mod segment;

pub use collector::{
    merge_facets, CountMode, FacetCountCollector, FacetCountCollectorSource, FacetCounts,
};
pub use config::{FacetFieldConfig, FacetSettings, ScoringKind, ValueOrder, ValueType};
pub use error::{FacetError, Result};
pub use facet::{
    BrowseFacet, BrowseSelection, FacetDataCache, FacetDataRef, FacetSegment, FacetSortOrder,
    FacetSpec, FieldSource, RawValue, SelectionOperation, SimpleFacetHandler,
};
pub use filter::{DocIdSet, FilterRef, FilterStrategy, RandomAccessFilter};
pub use scoring::{Explanation, FacetDocScorer};
pub use segment::{DocNo, DocumentFields, SegmentId, SegmentReader, SegmentStore, SegmentWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
