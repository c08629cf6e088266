//! Facet score contribution
//!
//! A document's score for a facet depends only on its value: the value's
//! frequency in the segment and the boost the query assigns to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ScoringKind;
use crate::facet::FacetDataCache;
use crate::segment::DocNo;

/// Boost of values the query does not mention
pub const NEUTRAL_BOOST: f32 = 1.0;

/// BM25-style inverse document frequency
///
/// # Arguments
/// * `df` - Number of documents carrying the value
/// * `total_docs` - Number of documents in the segment
pub fn idf(df: f32, total_docs: f32) -> f32 {
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Structured breakdown of a score
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn new(value: f32, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: Explanation) -> Self {
        self.details.push(detail);
        self
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write(e: &Explanation, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "{:indent$}{} = {}", "", e.value, e.description, indent = depth * 2)?;
            e.details.iter().try_for_each(|d| write(d, depth + 1, f))
        }
        write(self, 0, f)
    }
}

/// Score of one facet value from its frequency and boost
pub trait FacetTermScoringFunction: Send + Sync + fmt::Debug {
    fn score(&self, df: u32, boost: f32) -> f32;

    fn explain(&self, df: u32, boost: f32) -> Explanation;
}

/// Creates the scoring function for one segment
pub trait ScoringFunctionFactory: Send + Sync + fmt::Debug {
    fn scoring_function(
        &self,
        value_count: usize,
        doc_count: u32,
    ) -> Box<dyn FacetTermScoringFunction>;
}

/// boost × idf(df)
#[derive(Clone, Copy, Debug)]
pub struct IdfBoostScoring {
    doc_count: u32,
}

impl IdfBoostScoring {
    pub fn new(doc_count: u32) -> Self {
        Self { doc_count }
    }
}

impl FacetTermScoringFunction for IdfBoostScoring {
    fn score(&self, df: u32, boost: f32) -> f32 {
        boost * idf(df as f32, self.doc_count as f32)
    }

    fn explain(&self, df: u32, boost: f32) -> Explanation {
        let idf = idf(df as f32, self.doc_count as f32);
        Explanation::new(boost * idf, "boost * idf")
            .with_detail(Explanation::new(boost, "boost"))
            .with_detail(
                Explanation::new(idf, "idf, ln((n - df + 0.5) / (df + 0.5) + 1)")
                    .with_detail(Explanation::new(df as f32, "df"))
                    .with_detail(Explanation::new(self.doc_count as f32, "n")),
            )
    }
}

/// boost only
#[derive(Clone, Copy, Debug, Default)]
pub struct BoostScoring;

impl FacetTermScoringFunction for BoostScoring {
    fn score(&self, _df: u32, boost: f32) -> f32 {
        boost
    }

    fn explain(&self, _df: u32, boost: f32) -> Explanation {
        Explanation::new(boost, "boost")
    }
}

/// Factory for the built-in scoring functions
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultScoringFactory {
    kind: ScoringKind,
}

impl DefaultScoringFactory {
    pub fn new(kind: ScoringKind) -> Self {
        Self { kind }
    }
}

impl ScoringFunctionFactory for DefaultScoringFactory {
    fn scoring_function(
        &self,
        _value_count: usize,
        doc_count: u32,
    ) -> Box<dyn FacetTermScoringFunction> {
        match self.kind {
            ScoringKind::Idf => Box::new(IdfBoostScoring::new(doc_count)),
            ScoringKind::BoostOnly => Box::new(BoostScoring),
        }
    }
}

/// Per-ordinal boosts; values without a boost get [`NEUTRAL_BOOST`].
///
/// Keys are matched through the dictionary, so `"010"` boosts the int 10.
pub fn build_boost_list(cache: &FacetDataCache, boosts: &HashMap<String, f32>) -> Vec<f32> {
    let mut list = vec![NEUTRAL_BOOST; cache.ordinal_count()];
    for (value, &boost) in boosts {
        if let Some(ord) = cache.ordinal_of_value(value) {
            list[ord as usize] = boost;
        }
    }
    list
}

/// Scores documents of one segment by their facet value
#[derive(Debug)]
pub struct FacetDocScorer {
    cache: Arc<FacetDataCache>,
    function: Box<dyn FacetTermScoringFunction>,
    boosts: Vec<f32>,
}

impl FacetDocScorer {
    pub fn new(
        cache: Arc<FacetDataCache>,
        factory: &dyn ScoringFunctionFactory,
        boosts: &HashMap<String, f32>,
    ) -> Self {
        let function = factory.scoring_function(cache.dictionary().len(), cache.doc_count());
        let boosts = build_boost_list(&cache, boosts);
        Self {
            cache,
            function,
            boosts,
        }
    }

    /// Ordinal of a document with a value
    fn valued_ordinal(&self, docno: DocNo) -> Option<u32> {
        self.cache
            .ordinal_of(docno)
            .filter(|&ord| Some(ord) != self.cache.missing_ordinal())
    }

    /// Score contribution; 0.0 for documents without a value
    pub fn score(&self, docno: DocNo) -> f32 {
        match self.valued_ordinal(docno) {
            Some(ord) => self
                .function
                .score(self.cache.frequency_of(ord), self.boosts[ord as usize]),
            None => 0.0,
        }
    }

    pub fn explain(&self, docno: DocNo) -> Explanation {
        match self.valued_ordinal(docno) {
            Some(ord) => {
                let value = self.cache.value_of(ord).unwrap_or_default();
                let inner = self
                    .function
                    .explain(self.cache.frequency_of(ord), self.boosts[ord as usize]);
                Explanation::new(
                    inner.value,
                    format!("{}:{} in doc {}", self.cache.field(), value, docno),
                )
                .with_detail(inner)
            }
            None => Explanation::new(
                0.0,
                format!("no {} value in doc {}", self.cache.field(), docno),
            ),
        }
    }

    pub fn boosts(&self) -> &[f32] {
        &self.boosts
    }
}
