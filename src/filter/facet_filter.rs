use crate::error::Result;
use crate::facet::{FacetDataCache, FacetDataRef, FacetSegment};

use super::{DocIdSet, FilterType, OrdinalDocIdSet, RandomAccessFilter};

/// Matches documents whose value equals one target value
#[derive(Clone, Debug)]
pub struct FacetFilter {
    data: FacetDataRef,
    value: String,
}

impl FacetFilter {
    pub fn new(data: FacetDataRef, value: impl Into<String>) -> Self {
        Self {
            data,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RandomAccessFilter for FacetFilter {
    fn doc_id_set(&self, segment: &FacetSegment) -> Result<DocIdSet> {
        let cache = self.data.cache(segment)?;
        Ok(match cache.ordinal_of_value(&self.value) {
            Some(ord) => DocIdSet::Ordinals(OrdinalDocIdSet::new(cache, &[ord], false)),
            None => DocIdSet::Empty,
        })
    }

    fn selectivity(&self, segment: &FacetSegment) -> Result<f64> {
        let cache = self.data.cache(segment)?;
        let freq = cache
            .ordinal_of_value(&self.value)
            .map(|ord| cache.frequency_of(ord))
            .unwrap_or(0);
        Ok(fraction(u64::from(freq), cache.doc_count()))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Exact
    }
}

/// Matches documents whose value is any of the target values, or with
/// `negate` set, none of them
#[derive(Clone, Debug)]
pub struct FacetOrFilter {
    data: FacetDataRef,
    values: Vec<String>,
    negate: bool,
}

impl FacetOrFilter {
    pub fn new(data: FacetDataRef, values: Vec<String>, negate: bool) -> Self {
        Self {
            data,
            values,
            negate,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn data(&self) -> &FacetDataRef {
        &self.data
    }

    /// Distinct ordinals of the values present in `cache`, ascending.
    /// Absent values resolve to nothing.
    pub fn resolve(&self, cache: &FacetDataCache) -> Vec<u32> {
        let mut ordinals: Vec<u32> = self
            .values
            .iter()
            .filter_map(|v| cache.ordinal_of_value(v))
            .collect();
        ordinals.sort_unstable();
        ordinals.dedup();
        ordinals
    }
}

impl RandomAccessFilter for FacetOrFilter {
    fn doc_id_set(&self, segment: &FacetSegment) -> Result<DocIdSet> {
        let cache = self.data.cache(segment)?;
        let ordinals = self.resolve(&cache);
        Ok(match (ordinals.is_empty(), self.negate) {
            (true, false) => DocIdSet::Empty,
            (true, true) => DocIdSet::All {
                doc_count: cache.doc_count(),
            },
            (false, negate) => DocIdSet::Ordinals(OrdinalDocIdSet::new(cache, &ordinals, negate)),
        })
    }

    fn selectivity(&self, segment: &FacetSegment) -> Result<f64> {
        let cache = self.data.cache(segment)?;
        let matched = estimate(&cache, &self.resolve(&cache));
        let matched = if self.negate {
            u64::from(cache.doc_count()) - matched
        } else {
            matched
        };
        Ok(fraction(matched, cache.doc_count()))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Or
    }
}

/// Number of documents carrying any of `ordinals`
pub(crate) fn estimate(cache: &FacetDataCache, ordinals: &[u32]) -> u64 {
    ordinals
        .iter()
        .map(|&ord| u64::from(cache.frequency_of(ord)))
        .sum()
}

fn fraction(matched: u64, doc_count: u32) -> f64 {
    if doc_count == 0 {
        0.0
    } else {
        matched as f64 / f64::from(doc_count)
    }
}
