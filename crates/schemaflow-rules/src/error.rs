//! Error types for translation and emission

use schemaflow_core::SchemaError;
use thiserror::Error;

/// Result type for rule emission
pub type Result<T> = std::result::Result<T, EmitError>;

/// Configuration errors surfaced while replaying rules against a chain builder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    /// The supplied builder lacks a method the record needs
    #[error("Chain builder does not support '{method}'")]
    MissingCapability { method: &'static str },

    /// A format nobody recognizes, under the strict policy
    #[error("Unknown format '{name}'")]
    UnknownFormat { name: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl EmitError {
    /// Create a missing capability error
    pub fn missing(method: &'static str) -> Self {
        EmitError::MissingCapability { method }
    }
}
