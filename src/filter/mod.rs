//! Document filters over facet ordinals
//!
//! A filter is a per-query value that resolves, per segment, into a
//! [`DocIdSet`]. Exact and or-filters only hold a [`FacetDataRef`] and the
//! requested values; the segment's shared cache is looked up on evaluation.
//!
//! [`FacetDataRef`]: crate::facet::FacetDataRef

mod adaptive;
mod facet_filter;

pub use adaptive::*;
pub use facet_filter::*;

use std::fmt;
use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::error::Result;
use crate::facet::{FacetDataCache, FacetSegment};
use crate::segment::DocNo;

/// Kind of a built filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
    Exact,
    Or,
    Adaptive,
    Empty,
    MatchAll,
}

/// A filter evaluated segment by segment
pub trait RandomAccessFilter: Send + Sync + fmt::Debug {
    /// Matching documents of one segment
    fn doc_id_set(&self, segment: &FacetSegment) -> Result<DocIdSet>;

    /// Estimated fraction of the segment's documents matched, in [0, 1]
    fn selectivity(&self, segment: &FacetSegment) -> Result<f64>;

    fn filter_type(&self) -> FilterType;
}

pub type FilterRef = Arc<dyn RandomAccessFilter>;

/// Which ordinals an [`OrdinalDocIdSet`] accepts
#[derive(Clone, Debug)]
pub enum OrdinalMatcher {
    Single(u32),
    /// Membership bitset indexed by ordinal
    Set(Vec<bool>),
}

impl OrdinalMatcher {
    /// Build a matcher over `ordinals` for a cache with `ordinal_count` ordinals
    pub fn from_ordinals(ordinals: &[u32], ordinal_count: usize) -> Self {
        match ordinals {
            [single] => OrdinalMatcher::Single(*single),
            _ => {
                let mut set = vec![false; ordinal_count];
                for &ord in ordinals {
                    if let Some(slot) = set.get_mut(ord as usize) {
                        *slot = true;
                    }
                }
                OrdinalMatcher::Set(set)
            }
        }
    }

    #[inline]
    pub fn matches(&self, ordinal: u32) -> bool {
        match self {
            OrdinalMatcher::Single(ord) => *ord == ordinal,
            OrdinalMatcher::Set(set) => set.get(ordinal as usize).copied().unwrap_or(false),
        }
    }
}

/// Dense-scan document set: tests each document's ordinal
#[derive(Clone, Debug)]
pub struct OrdinalDocIdSet {
    cache: Arc<FacetDataCache>,
    matcher: OrdinalMatcher,
    negate: bool,
    /// Docnos outside `start..end` never match
    start: u32,
    end: u32,
}

impl OrdinalDocIdSet {
    pub fn new(cache: Arc<FacetDataCache>, ordinals: &[u32], negate: bool) -> Self {
        let matcher = OrdinalMatcher::from_ordinals(ordinals, cache.ordinal_count());
        let (start, end) = if negate {
            (0, cache.doc_count())
        } else {
            ordinals
                .iter()
                .filter_map(|&ord| cache.doc_bounds(ord))
                .fold(None, |acc: Option<(u32, u32)>, (min, max)| match acc {
                    Some((lo, hi)) => Some((lo.min(min), hi.max(max + 1))),
                    None => Some((min, max + 1)),
                })
                .unwrap_or((0, 0))
        };
        Self {
            cache,
            matcher,
            negate,
            start,
            end,
        }
    }

    #[inline]
    pub fn contains(&self, docno: DocNo) -> bool {
        if docno.as_u32() < self.start || docno.as_u32() >= self.end {
            return false;
        }
        match self.cache.ordinal_of(docno) {
            Some(ord) => self.matcher.matches(ord) != self.negate,
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = DocNo> + '_ {
        (self.start..self.end)
            .map(DocNo::new)
            .filter(move |&doc| self.contains(doc))
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }
}

/// Documents matched by a filter on one segment
#[derive(Clone, Debug)]
pub enum DocIdSet {
    Empty,
    All { doc_count: u32 },
    Ordinals(OrdinalDocIdSet),
    Bitmap(RoaringBitmap),
}

impl DocIdSet {
    pub fn contains(&self, docno: DocNo) -> bool {
        match self {
            DocIdSet::Empty => false,
            DocIdSet::All { doc_count } => docno.as_u32() < *doc_count,
            DocIdSet::Ordinals(set) => set.contains(docno),
            DocIdSet::Bitmap(bitmap) => bitmap.contains(docno.as_u32()),
        }
    }

    /// Matching docnos in increasing order
    pub fn iter(&self) -> Box<dyn Iterator<Item = DocNo> + '_> {
        match self {
            DocIdSet::Empty => Box::new(std::iter::empty()),
            DocIdSet::All { doc_count } => Box::new((0..*doc_count).map(DocNo::new)),
            DocIdSet::Ordinals(set) => Box::new(set.iter()),
            DocIdSet::Bitmap(bitmap) => Box::new(bitmap.iter().map(DocNo::new)),
        }
    }

    pub fn docs(&self) -> Vec<DocNo> {
        self.iter().collect()
    }

    pub fn to_bitmap(&self) -> RoaringBitmap {
        match self {
            DocIdSet::Bitmap(bitmap) => bitmap.clone(),
            other => other.iter().map(|d| d.as_u32()).collect(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            DocIdSet::Empty => 0,
            DocIdSet::All { doc_count } => u64::from(*doc_count),
            DocIdSet::Ordinals(set) => set.iter().count() as u64,
            DocIdSet::Bitmap(bitmap) => bitmap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Matches nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyFilter;

impl RandomAccessFilter for EmptyFilter {
    fn doc_id_set(&self, _segment: &FacetSegment) -> Result<DocIdSet> {
        Ok(DocIdSet::Empty)
    }

    fn selectivity(&self, _segment: &FacetSegment) -> Result<f64> {
        Ok(0.0)
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Empty
    }
}

/// Matches every document of the segment
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchAllFilter;

impl RandomAccessFilter for MatchAllFilter {
    fn doc_id_set(&self, segment: &FacetSegment) -> Result<DocIdSet> {
        Ok(DocIdSet::All {
            doc_count: segment.doc_count(),
        })
    }

    fn selectivity(&self, _segment: &FacetSegment) -> Result<f64> {
        Ok(1.0)
    }

    fn filter_type(&self) -> FilterType {
        FilterType::MatchAll
    }
}
