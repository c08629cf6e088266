//! Per-request facet counting
//!
//! A [`FacetCountCollector`] owns a fresh accumulator for one segment and
//! one query. It counts matching documents by ordinal, then [`finish`]
//! turns it into read-only [`FacetCounts`].
//!
//! [`finish`]: FacetCountCollector::finish

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::config::ValueOrder;
use crate::error::Result;
use crate::facet::{
    BrowseFacet, FacetDataCache, FacetDataRef, FacetSegment, FacetSortOrder, FacetSpec, RawValue,
};
use crate::filter::DocIdSet;
use crate::segment::DocNo;

/// Whether a collector tracks the number of distinct values hit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountMode {
    #[default]
    Simple,
    GroupBy,
}

/// Counts matching documents per ordinal for one segment
#[derive(Debug)]
pub struct FacetCountCollector {
    name: String,
    cache: Arc<FacetDataCache>,
    mode: CountMode,
    spec: FacetSpec,
    /// Ordinals of the selected values present in this segment
    selected: Vec<u32>,
    counts: Vec<u32>,
    /// Distinct ordinals hit so far; `None` once `collect_all` bypassed tracking
    groups: Option<u32>,
}

impl FacetCountCollector {
    pub fn new(
        name: impl Into<String>,
        cache: Arc<FacetDataCache>,
        mode: CountMode,
        spec: FacetSpec,
        selected: Vec<String>,
    ) -> Self {
        let counts = vec![0; cache.ordinal_count()];
        // resolved by parsed value, so "010" selects 10 on a numeric facet
        let mut selected: Vec<u32> = selected
            .iter()
            .filter_map(|value| cache.ordinal_of_value(value))
            .collect();
        selected.sort_unstable();
        selected.dedup();
        Self {
            name: name.into(),
            cache,
            mode,
            spec,
            selected,
            counts,
            groups: Some(0),
        }
    }

    /// Count one matching document
    #[inline]
    pub fn collect(&mut self, docno: DocNo) {
        let Some(ord) = self.cache.ordinal_of(docno) else {
            return;
        };
        let count = &mut self.counts[ord as usize];
        *count += 1;
        if *count == 1 {
            if let Some(groups) = self.groups.as_mut() {
                *groups += 1;
            }
        }
    }

    /// Count every document of the segment at once.
    ///
    /// Only meaningful when no filter narrows the result set.
    pub fn collect_all(&mut self) {
        self.counts.clear();
        self.counts.extend_from_slice(self.cache.freqs());
        self.groups = None;
    }

    /// Count the documents of a filter result
    pub fn collect_matches(&mut self, docs: &DocIdSet) {
        match docs {
            DocIdSet::All { .. } => self.collect_all(),
            other => {
                for docno in other.iter() {
                    self.collect(docno);
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> CountMode {
        self.mode
    }

    pub fn finish(self) -> FacetCounts {
        let total_groups = OnceLock::new();
        if self.mode == CountMode::GroupBy {
            if let Some(groups) = self.groups {
                let _ = total_groups.set(groups);
            }
        }
        FacetCounts {
            name: self.name,
            cache: self.cache,
            mode: self.mode,
            spec: self.spec,
            selected: self.selected,
            counts: self.counts,
            total_groups,
        }
    }
}

/// Finished counts of one segment
#[derive(Debug)]
pub struct FacetCounts {
    name: String,
    cache: Arc<FacetDataCache>,
    mode: CountMode,
    spec: FacetSpec,
    selected: Vec<u32>,
    counts: Vec<u32>,
    total_groups: OnceLock<u32>,
}

impl FacetCounts {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> CountMode {
        self.mode
    }

    pub fn spec(&self) -> &FacetSpec {
        &self.spec
    }

    /// Per-ordinal counts
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of ordinals with a non-zero count; `None` in simple mode.
    ///
    /// Computed on first read when `collect_all` was used.
    pub fn total_groups(&self) -> Option<u32> {
        match self.mode {
            CountMode::Simple => None,
            CountMode::GroupBy => Some(*self.total_groups.get_or_init(|| {
                self.counts.iter().filter(|&&c| c > 0).count() as u32
            })),
        }
    }

    /// Documents counted without a value
    pub fn missing_count(&self) -> u32 {
        self.cache
            .missing_ordinal()
            .map(|ord| self.counts[ord as usize])
            .unwrap_or(0)
    }

    /// Count of one value; 0 when absent from this segment
    pub fn hit_count(&self, value: &str) -> u32 {
        self.cache
            .ordinal_of_value(value)
            .map(|ord| self.counts[ord as usize])
            .unwrap_or(0)
    }

    /// Facet of one value, `None` when absent from this segment
    pub fn facet(&self, value: &str) -> Option<BrowseFacet> {
        let ord = self.cache.ordinal_of_value(value)?;
        let value = self.cache.value_of(ord)?;
        Some(self.browse_facet(ord, value, self.counts[ord as usize]))
    }

    /// Non-zero counts in dictionary order
    pub fn iter(&self) -> impl Iterator<Item = (String, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .filter_map(|(ord, &count)| {
                self.cache.value_of(ord as u32).map(|value| (value, count))
            })
    }

    /// Facets shaped by the collector's [`FacetSpec`]
    pub fn facets(&self) -> Vec<BrowseFacet> {
        let mut hits: Vec<(u32, u32)> = self
            .counts
            .iter()
            .enumerate()
            .map(|(ord, &count)| (ord as u32, count))
            .filter(|&(ord, count)| {
                count >= self.spec.min_hit_count && Some(ord) != self.cache.missing_ordinal()
            })
            .collect();

        if self.spec.order_by == FacetSortOrder::HitsDesc {
            hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        }
        if let Some(max) = self.spec.max_count {
            hits.truncate(max);
        }

        hits.into_iter()
            .filter_map(|(ord, count)| {
                self.cache
                    .value_of(ord)
                    .map(|value| self.browse_facet(ord, value, count))
            })
            .collect()
    }

    fn is_selected(&self, ord: u32) -> bool {
        self.selected.binary_search(&ord).is_ok()
    }

    fn browse_facet(&self, ord: u32, value: String, count: u32) -> BrowseFacet {
        let selected = self.is_selected(ord);
        BrowseFacet {
            value,
            count,
            selected,
        }
    }
}

/// Creates one collector per segment for a facet
#[derive(Clone, Debug)]
pub struct FacetCountCollectorSource {
    data: FacetDataRef,
    mode: CountMode,
    spec: FacetSpec,
    selected: Vec<String>,
}

impl FacetCountCollectorSource {
    pub fn new(data: FacetDataRef, mode: CountMode, spec: FacetSpec, selected: Vec<String>) -> Self {
        Self {
            data,
            mode,
            spec,
            selected,
        }
    }

    pub fn collector(&self, segment: &FacetSegment) -> Result<FacetCountCollector> {
        let cache = self.data.cache(segment)?;
        Ok(FacetCountCollector::new(
            self.data.facet(),
            cache,
            self.mode,
            self.spec.clone(),
            self.selected.clone(),
        ))
    }

    pub fn spec(&self) -> &FacetSpec {
        &self.spec
    }
}

/// Combine per-segment counts by value and shape them with `spec`.
///
/// Value order follows the facet's configured [`ValueOrder`].
pub fn merge_facets(results: &[FacetCounts], spec: &FacetSpec) -> Vec<BrowseFacet> {
    let order = results
        .first()
        .map(|counts| counts.cache.value_order())
        .unwrap_or_default();
    let mut merged: BTreeMap<String, (Option<RawValue>, u32, bool)> = BTreeMap::new();
    for counts in results {
        for (ord, &count) in counts.counts.iter().enumerate() {
            let ord = ord as u32;
            if count == 0 {
                continue;
            }
            let Some(value) = counts.cache.value_of(ord) else {
                continue;
            };
            let selected = counts.is_selected(ord);
            let entry = merged
                .entry(value)
                .or_insert_with(|| (counts.cache.raw_value_of(ord), 0, false));
            entry.1 += count;
            entry.2 |= selected;
        }
    }

    let mut facets: Vec<(Option<RawValue>, BrowseFacet)> = merged
        .into_iter()
        .filter(|(_, (_, count, _))| *count >= spec.min_hit_count)
        .map(|(value, (raw, count, selected))| {
            (
                raw,
                BrowseFacet {
                    value,
                    count,
                    selected,
                },
            )
        })
        .collect();

    facets.sort_by(|a, b| {
        let by_value = compare_values(&a.0, &b.0).then_with(|| a.1.value.cmp(&b.1.value));
        let by_value = match order {
            ValueOrder::Natural => by_value,
            ValueOrder::Reverse => by_value.reverse(),
        };
        match spec.order_by {
            FacetSortOrder::HitsDesc => b.1.count.cmp(&a.1.count).then(by_value),
            FacetSortOrder::ValueAsc => by_value,
        }
    });
    if let Some(max) = spec.max_count {
        facets.truncate(max);
    }
    facets.into_iter().map(|(_, facet)| facet).collect()
}

fn compare_values(a: &Option<RawValue>, b: &Option<RawValue>) -> Ordering {
    match (a, b) {
        (Some(RawValue::Text(x)), Some(RawValue::Text(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}
