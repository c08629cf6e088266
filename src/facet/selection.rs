//! Request-side types: what a query selects and how facet output is shaped

use serde::{Deserialize, Serialize};

/// How multiple selected values combine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOperation {
    And,
    #[default]
    Or,
}

/// Values selected (and excluded) on one facet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseSelection {
    pub values: Vec<String>,
    pub not_values: Vec<String>,
    pub operation: SelectionOperation,
}

impl BrowseSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_not_value(mut self, value: impl Into<String>) -> Self {
        self.not_values.push(value.into());
        self
    }

    pub fn with_operation(mut self, operation: SelectionOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.not_values.is_empty()
    }

    /// Whether `value` was selected positively
    pub fn is_selected(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Ordering of facet output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetSortOrder {
    /// Highest count first; ties by dictionary order
    #[default]
    HitsDesc,
    /// Dictionary order
    ValueAsc,
}

/// Shapes the facets returned from a finished collector
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetSpec {
    pub order_by: FacetSortOrder,
    /// Facets with fewer hits are omitted
    pub min_hit_count: u32,
    /// At most this many facets; `None` for all
    pub max_count: Option<usize>,
}

impl Default for FacetSpec {
    fn default() -> Self {
        Self {
            order_by: FacetSortOrder::HitsDesc,
            min_hit_count: 1,
            max_count: None,
        }
    }
}

impl FacetSpec {
    pub fn with_order(mut self, order_by: FacetSortOrder) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_min_hit_count(mut self, min_hit_count: u32) -> Self {
        self.min_hit_count = min_hit_count;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }
}

/// One facet value with its hit count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseFacet {
    pub value: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl BrowseFacet {
    pub fn new(value: impl Into<String>, count: u32) -> Self {
        Self {
            value: value.into(),
            count,
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_builder() {
        let sel = BrowseSelection::new()
            .with_value("red")
            .with_not_value("blue")
            .with_operation(SelectionOperation::And);

        assert!(sel.is_selected("red"));
        assert!(!sel.is_selected("blue"));
        assert!(!sel.is_empty());
        assert!(BrowseSelection::new().is_empty());
    }

    #[test]
    fn test_selection_from_json() {
        let sel: BrowseSelection = serde_json::from_str(r#"{"values": ["a", "b"]}"#).unwrap();
        assert_eq!(sel.operation, SelectionOperation::Or);
        assert!(sel.not_values.is_empty());
    }

    #[test]
    fn test_facet_spec_defaults() {
        let spec = FacetSpec::default();
        assert_eq!(spec.order_by, FacetSortOrder::HitsDesc);
        assert_eq!(spec.min_hit_count, 1);
        assert_eq!(spec.max_count, None);
    }

    #[test]
    fn test_browse_facet_json_omits_unselected() {
        let json = serde_json::to_string(&BrowseFacet::new("red", 3)).unwrap();
        assert_eq!(json, r#"{"value":"red","count":3}"#);
    }
}
