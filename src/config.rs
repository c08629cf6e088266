use serde::{Deserialize, Serialize};

use crate::error::{FacetError, Result};

/// Default sparse-union threshold: a selection touching fewer than 1/32 of
/// the segment's documents is answered from postings.
pub const DEFAULT_SPARSE_THRESHOLD: f64 = 1.0 / 32.0;

/// Total order used to assign ordinals to a field's distinct values
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrder {
    /// Natural order of the value type (lexicographic for text, numeric for numbers)
    #[default]
    Natural,
    /// Reverse of the natural order
    Reverse,
}

/// Element type of a facet dictionary, fixed when the cache is built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Text,
    Int,
    Float,
}

/// Scoring function used by facet doc scorers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringKind {
    /// boost × idf(value frequency)
    #[default]
    Idf,
    /// boost only; frequency is ignored
    BoostOnly,
}

/// Per-facet tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetSettings {
    /// Fraction of the segment size below which sparse union is chosen
    pub sparse_threshold: f64,
    pub value_order: ValueOrder,
    pub scoring: ScoringKind,
}

impl Default for FacetSettings {
    fn default() -> Self {
        Self {
            sparse_threshold: DEFAULT_SPARSE_THRESHOLD,
            value_order: ValueOrder::Natural,
            scoring: ScoringKind::Idf,
        }
    }
}

impl FacetSettings {
    pub fn with_sparse_threshold(mut self, threshold: f64) -> Self {
        self.sparse_threshold = threshold;
        self
    }

    pub fn with_value_order(mut self, order: ValueOrder) -> Self {
        self.value_order = order;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringKind) -> Self {
        self.scoring = scoring;
        self
    }

    /// Reject thresholds outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sparse_threshold) {
            return Err(FacetError::InvalidRequest(format!(
                "sparse_threshold must be within [0, 1], got {}",
                self.sparse_threshold
            )));
        }
        Ok(())
    }
}

/// Declarative description of one facet handler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FacetFieldConfig {
    /// Facet name used by selections and result lookups
    pub name: String,
    /// Stored field the facet reads; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_field: Option<String>,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub settings: FacetSettings,
}

impl FacetFieldConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index_field: None,
            value_type: ValueType::Text,
            settings: FacetSettings::default(),
        }
    }

    pub fn with_index_field(mut self, field: impl Into<String>) -> Self {
        self.index_field = Some(field.into());
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_settings(mut self, settings: FacetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stored field this facet reads
    pub fn index_field(&self) -> &str {
        self.index_field.as_deref().unwrap_or(&self.name)
    }
}
