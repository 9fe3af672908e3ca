//! Error types for schema interpretation
//!
//! Only malformed schemas produce errors. A value that fails validation is
//! reported as `false` or as a list of [`ValidationError`](crate::ValidationError)s,
//! never through this type.

use thiserror::Error;

/// Fatal errors raised while interpreting a schema document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A `#/...` pointer names a location that does not exist
    #[error("Unresolvable reference: {reference}")]
    UnresolvableReference { reference: String },

    /// The reference points outside the current document
    #[error("Unsupported reference: {reference} (only '#' and '#/...' pointers are resolved)")]
    UnsupportedReference { reference: String },

    /// Reference expansion nested deeper than the configured limit
    #[error("Schema recursion limit of {limit} exceeded while resolving '{reference}'")]
    RecursionLimit { reference: String, limit: usize },

    /// A known keyword carries a value of the wrong shape
    #[error("Invalid schema at '{keyword}': {reason}")]
    InvalidSchema { keyword: String, reason: String },

    /// A `pattern` or `patternProperties` key does not compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Options could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SchemaError {
    /// Create an invalid schema error
    pub fn invalid(keyword: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidSchema {
            keyword: keyword.into(),
            reason: reason.into(),
        }
    }

    /// Create an unresolvable reference error
    pub fn unresolvable(reference: impl Into<String>) -> Self {
        SchemaError::UnresolvableReference {
            reference: reference.into(),
        }
    }

    /// Check if this error comes from reference handling
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            SchemaError::UnresolvableReference { .. }
                | SchemaError::UnsupportedReference { .. }
                | SchemaError::RecursionLimit { .. }
        )
    }
}

impl From<toml::de::Error> for SchemaError {
    fn from(err: toml::de::Error) -> Self {
        SchemaError::Config(format!("TOML error: {}", err))
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::invalid("$", format!("JSON error: {}", err))
    }
}

/// Result type alias for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::unresolvable("#/definitions/missing");
        assert_eq!(
            err.to_string(),
            "Unresolvable reference: #/definitions/missing"
        );

        let err = SchemaError::RecursionLimit {
            reference: "#".to_string(),
            limit: 8,
        };
        assert_eq!(
            err.to_string(),
            "Schema recursion limit of 8 exceeded while resolving '#'"
        );
    }

    #[test]
    fn test_is_reference_error() {
        assert!(SchemaError::unresolvable("#/x").is_reference_error());
        assert!(SchemaError::UnsupportedReference {
            reference: "http://example.com".to_string()
        }
        .is_reference_error());
        assert!(!SchemaError::invalid("type", "bad").is_reference_error());
    }
}
