//! Validation options
//!
//! Options can be built in code, read from `SCHEMAFLOW_*` environment
//! variables, or loaded from a TOML table.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default limit on nested `$ref` expansion
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 256;

/// Options shared by the direct validator and the error generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Maximum number of consecutive `$ref` hops on one value
    ///
    /// Descending into an array item or object member starts a fresh count,
    /// so recursion anchored in the data is bounded only by the data.
    pub max_reference_depth: usize,

    /// Whether `format` is asserted or treated as an annotation
    pub validate_formats: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            validate_formats: true,
        }
    }
}

impl ValidationOptions {
    /// Create a new options builder
    pub fn builder() -> ValidationOptionsBuilder {
        ValidationOptionsBuilder::new()
    }

    /// Create options from environment variables
    ///
    /// Unset variables keep their defaults; malformed ones are logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_reference_depth: env_or("SCHEMAFLOW_MAX_REFERENCE_DEPTH", defaults.max_reference_depth),
            validate_formats: env_or("SCHEMAFLOW_VALIDATE_FORMATS", defaults.validate_formats),
        }
    }

    /// Parse options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, value = %raw, error = %e, default = ?default, "Ignoring malformed option");
                default
            }
        },
        Err(_) => default,
    }
}

/// Builder for ValidationOptions
pub struct ValidationOptionsBuilder {
    options: ValidationOptions,
}

impl ValidationOptionsBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            options: ValidationOptions::default(),
        }
    }

    /// Set the reference depth limit
    pub fn max_reference_depth(mut self, depth: usize) -> Self {
        self.options.max_reference_depth = depth;
        self
    }

    /// Enable or disable format assertions
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.options.validate_formats = enabled;
        self
    }

    /// Build the options
    pub fn build(self) -> ValidationOptions {
        self.options
    }
}

impl Default for ValidationOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
