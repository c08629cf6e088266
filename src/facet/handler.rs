use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::cache::{FacetDataCache, FieldSource};
use super::segment::FacetSegment;
use super::selection::{BrowseSelection, FacetSpec, SelectionOperation};
use super::sort::FacetDocComparator;
use super::value::RawValue;
use crate::collector::{CountMode, FacetCountCollectorSource};
use crate::config::{FacetFieldConfig, FacetSettings, ValueType};
use crate::error::Result;
use crate::filter::{
    AdaptiveFacetFilter, AdaptiveSelector, EmptyFilter, FacetOrFilter, FilterRef,
    MatchAllFilter,
};
use crate::scoring::{DefaultScoringFactory, FacetDocScorer, ScoringFunctionFactory};
use crate::segment::DocNo;

/// Names the cache a filter or collector reads: the facet's name (the key
/// its cache is registered under on each segment) and the stored field
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FacetDataRef {
    facet: String,
    field: String,
}

impl FacetDataRef {
    pub fn new(facet: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            facet: facet.into(),
            field: field.into(),
        }
    }

    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The referenced cache on `segment`
    pub fn cache(&self, segment: &FacetSegment) -> Result<Arc<FacetDataCache>> {
        segment.cache(&self.facet)
    }
}

/// Facet over a single-valued field: each document carries at most one value
#[derive(Clone, Debug)]
pub struct SimpleFacetHandler {
    name: String,
    index_field: String,
    value_type: ValueType,
    settings: FacetSettings,
}

impl SimpleFacetHandler {
    /// Handler reading the field of the same name
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        Self {
            index_field: name.clone(),
            name,
            value_type,
            settings: FacetSettings::default(),
        }
    }

    pub fn from_config(config: &FacetFieldConfig) -> Result<Self> {
        config.settings.validate()?;
        Ok(Self {
            name: config.name.clone(),
            index_field: config.index_field().to_string(),
            value_type: config.value_type,
            settings: config.settings.clone(),
        })
    }

    pub fn with_index_field(mut self, field: impl Into<String>) -> Self {
        self.index_field = field.into();
        self
    }

    pub fn with_settings(mut self, settings: FacetSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_field(&self) -> &str {
        &self.index_field
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn settings(&self) -> &FacetSettings {
        &self.settings
    }

    /// Build this facet's cache for one segment
    pub fn load(&self, source: &dyn FieldSource) -> Result<FacetDataCache> {
        FacetDataCache::load_typed(
            source,
            &self.index_field,
            self.value_type,
            self.settings.value_order,
        )
    }

    pub fn data_ref(&self) -> FacetDataRef {
        FacetDataRef::new(&self.name, &self.index_field)
    }

    /// Number of values of a document: 0 or 1
    pub fn num_items(&self, segment: &FacetSegment, docno: DocNo) -> Result<usize> {
        Ok(self.field_values(segment, docno)?.len())
    }

    pub fn field_values(&self, segment: &FacetSegment, docno: DocNo) -> Result<Vec<String>> {
        let cache = segment.cache(&self.name)?;
        Ok(cache
            .ordinal_of(docno)
            .and_then(|ord| cache.value_of(ord))
            .into_iter()
            .collect())
    }

    pub fn raw_field_values(&self, segment: &FacetSegment, docno: DocNo) -> Result<Vec<RawValue>> {
        let cache = segment.cache(&self.name)?;
        Ok(cache
            .ordinal_of(docno)
            .and_then(|ord| cache.raw_value_of(ord))
            .into_iter()
            .collect())
    }

    fn selector(&self) -> AdaptiveSelector {
        AdaptiveSelector::new(self.settings.sparse_threshold)
    }

    fn adaptive(&self, values: Vec<String>, negate: bool) -> FilterRef {
        Arc::new(AdaptiveFacetFilter::new(
            FacetOrFilter::new(self.data_ref(), values, negate),
            self.selector(),
        ))
    }

    /// Documents whose value equals `value`; a rare value is answered from
    /// its posting list
    pub fn build_filter(&self, value: &str) -> FilterRef {
        self.adaptive(vec![value.to_string()], false)
    }

    /// Documents carrying every one of `values`.
    ///
    /// A document holds one value, so two or more distinct values can never
    /// match together.
    pub fn build_and_filter(&self, values: &[String]) -> FilterRef {
        let distinct: BTreeSet<&str> = values.iter().map(|v| v.as_str()).collect();
        let distinct_count = distinct.len();
        let mut distinct = distinct.into_iter();
        match (distinct.next(), distinct.next()) {
            (None, _) => Arc::new(MatchAllFilter),
            (Some(value), None) => self.build_filter(value),
            (Some(_), Some(_)) => {
                debug!(
                    facet = %self.name,
                    values = distinct_count,
                    "conjunction of distinct values on a single-valued facet matches nothing"
                );
                Arc::new(EmptyFilter)
            }
        }
    }

    /// Documents carrying any of `values`, or with `negate`, none of them
    pub fn build_or_filter(&self, values: &[String], negate: bool) -> FilterRef {
        match (values, negate) {
            ([], false) => Arc::new(EmptyFilter),
            ([], true) => Arc::new(MatchAllFilter),
            ([value], false) => self.build_filter(value),
            _ => self.adaptive(values.to_vec(), negate),
        }
    }

    /// Filter for a whole selection: selected values minus excluded ones
    pub fn build_selection_filter(&self, selection: &BrowseSelection) -> FilterRef {
        let excluded: BTreeSet<&str> = selection.not_values.iter().map(|v| v.as_str()).collect();

        if selection.values.is_empty() {
            let not_values: Vec<String> = excluded.iter().map(|v| v.to_string()).collect();
            return self.build_or_filter(&not_values, true);
        }

        match selection.operation {
            SelectionOperation::And => {
                let distinct: BTreeSet<&str> =
                    selection.values.iter().map(|v| v.as_str()).collect();
                if distinct.len() == 1 && distinct.iter().any(|v| excluded.contains(v)) {
                    return Arc::new(EmptyFilter);
                }
                self.build_and_filter(&selection.values)
            }
            SelectionOperation::Or => {
                let mut seen = BTreeSet::new();
                let remaining: Vec<String> = selection
                    .values
                    .iter()
                    .filter(|v| !excluded.contains(v.as_str()) && seen.insert(v.as_str()))
                    .cloned()
                    .collect();
                self.build_or_filter(&remaining, false)
            }
        }
    }

    /// Per-segment collector factory; `selection` marks selected facets
    pub fn count_collector_source(
        &self,
        selection: Option<&BrowseSelection>,
        spec: FacetSpec,
        mode: CountMode,
    ) -> FacetCountCollectorSource {
        let selected = selection.map(|s| s.values.clone()).unwrap_or_default();
        FacetCountCollectorSource::new(self.data_ref(), mode, spec, selected)
    }

    /// Scoring factory matching this facet's settings
    pub fn scoring_factory(&self) -> DefaultScoringFactory {
        DefaultScoringFactory::new(self.settings.scoring)
    }

    pub fn doc_scorer(
        &self,
        segment: &FacetSegment,
        factory: &dyn ScoringFunctionFactory,
        boosts: &HashMap<String, f32>,
    ) -> Result<FacetDocScorer> {
        let cache = segment.cache(&self.name)?;
        Ok(FacetDocScorer::new(cache, factory, boosts))
    }

    pub fn doc_comparator(&self, segment: &FacetSegment) -> Result<FacetDocComparator> {
        Ok(FacetDocComparator::new(segment.cache(&self.name)?))
    }
}
