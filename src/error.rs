use thiserror::Error;

/// Main error type for facet operations
#[derive(Error, Debug)]
pub enum FacetError {
    #[error("Missing column data for field: {0}")]
    MissingColumn(String),

    #[error("Corrupt column data for field {field}: {reason}")]
    CorruptColumn { field: String, reason: String },

    #[error("Facet {name} is unavailable on this segment: {reason}")]
    FacetUnavailable { name: String, reason: String },

    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type alias for facet operations
pub type Result<T> = std::result::Result<T, FacetError>;

impl FacetError {
    pub fn corrupt(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FacetError::CorruptColumn {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborted building a facet cache for a segment
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            FacetError::MissingColumn(_) | FacetError::CorruptColumn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FacetError::MissingColumn("color".to_string());
        assert_eq!(err.to_string(), "Missing column data for field: color");

        let err = FacetError::corrupt("price", "unparseable value 'abc'");
        assert_eq!(
            err.to_string(),
            "Corrupt column data for field price: unparseable value 'abc'"
        );
    }

    #[test]
    fn test_load_errors() {
        assert!(FacetError::MissingColumn("a".to_string()).is_load_error());
        assert!(FacetError::corrupt("a", "b").is_load_error());
        assert!(!FacetError::UnknownFacet("a".to_string()).is_load_error());
        assert!(!FacetError::InvalidRequest("a".to_string()).is_load_error());
    }
}
