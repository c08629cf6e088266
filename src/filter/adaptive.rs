//! Dense scan vs sparse union
//!
//! A selective filter is cheaper to answer by merging the posting lists of
//! the selected values than by testing every document of the segment.

use roaring::RoaringBitmap;
use tracing::trace;

use crate::config::DEFAULT_SPARSE_THRESHOLD;
use crate::error::Result;
use crate::facet::{FacetSegment, FieldSource};

use super::facet_filter::{estimate, FacetOrFilter};
use super::{DocIdSet, FilterType, RandomAccessFilter};

/// Evaluation strategy for a built filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterStrategy {
    /// Test every document's ordinal, O(segment size)
    DenseScan,
    /// Merge the posting lists of the selected values, O(matching documents)
    SparseUnion,
}

/// Picks a [`FilterStrategy`] from the estimated match count
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveSelector {
    threshold: f64,
}

impl Default for AdaptiveSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SPARSE_THRESHOLD)
    }
}

impl AdaptiveSelector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sparse union only for positive selections below the threshold, and
    /// only when per-value postings can be read
    pub fn choose(
        &self,
        estimate: u64,
        doc_count: u32,
        negated: bool,
        postings_available: bool,
    ) -> FilterStrategy {
        if negated || !postings_available {
            return FilterStrategy::DenseScan;
        }
        if (estimate as f64) < self.threshold * f64::from(doc_count) {
            FilterStrategy::SparseUnion
        } else {
            FilterStrategy::DenseScan
        }
    }
}

/// Or-filter that picks its evaluation strategy per segment
#[derive(Clone, Debug)]
pub struct AdaptiveFacetFilter {
    inner: FacetOrFilter,
    selector: AdaptiveSelector,
}

impl AdaptiveFacetFilter {
    pub fn new(inner: FacetOrFilter, selector: AdaptiveSelector) -> Self {
        Self { inner, selector }
    }

    /// Strategy this filter would use on `segment`
    pub fn strategy(&self, segment: &FacetSegment) -> Result<FilterStrategy> {
        let cache = self.inner.data().cache(segment)?;
        let ordinals = self.inner.resolve(&cache);
        Ok(self.strategy_for(segment, estimate(&cache, &ordinals), cache.has_canonical_terms()))
    }

    fn strategy_for(&self, segment: &FacetSegment, estimate: u64, canonical: bool) -> FilterStrategy {
        let field = self.inner.data().field();
        let postings_available = canonical && FieldSource::has_postings(segment.reader(), field);
        let strategy = self.selector.choose(
            estimate,
            segment.doc_count(),
            self.inner.is_negated(),
            postings_available,
        );
        trace!(
            segment = %segment.id(),
            field,
            estimate,
            doc_count = segment.doc_count(),
            ?strategy,
            "filter strategy"
        );
        strategy
    }
}

/// Union of the posting lists of `values`; values without postings add nothing
pub fn sparse_union<I, S>(source: &dyn FieldSource, field: &str, values: I) -> Result<RoaringBitmap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bitmap = RoaringBitmap::new();
    for value in values {
        if let Some(postings) = source.posting_iterator(field, value.as_ref())? {
            bitmap |= postings.into_bitmap();
        }
    }
    Ok(bitmap)
}

impl RandomAccessFilter for AdaptiveFacetFilter {
    fn doc_id_set(&self, segment: &FacetSegment) -> Result<DocIdSet> {
        let cache = self.inner.data().cache(segment)?;
        let ordinals = self.inner.resolve(&cache);
        let strategy =
            self.strategy_for(segment, estimate(&cache, &ordinals), cache.has_canonical_terms());

        match strategy {
            FilterStrategy::DenseScan => self.inner.doc_id_set(segment),
            FilterStrategy::SparseUnion => {
                let values = ordinals.into_iter().filter_map(|ord| cache.value_of(ord));
                let bitmap = sparse_union(segment.reader(), self.inner.data().field(), values)?;
                Ok(DocIdSet::Bitmap(bitmap))
            }
        }
    }

    fn selectivity(&self, segment: &FacetSegment) -> Result<f64> {
        self.inner.selectivity(segment)
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Adaptive
    }
}
