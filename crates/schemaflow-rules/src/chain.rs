//! Chain builder capability trait
//!
//! The emitter drives an externally owned validator-construction chain
//! through this trait. Every method defaults to
//! [`EmitError::MissingCapability`], so an implementation only overrides
//! what its framework supports and the emitter reports anything else as a
//! configuration error.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{EmitError, Result};

/// Predicate handed to [`ChainBuilder::custom`]
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

macro_rules! unsupported {
    ($method:literal) => {
        Err(EmitError::missing($method))
    };
}

/// Validator chain capabilities, consumed by value and returned for chaining
pub trait ChainBuilder: Sized {
    /// A fresh, untyped builder from the same framework
    fn fork(&self) -> Result<Self> {
        unsupported!("fork")
    }

    // Type entry points

    fn string(self) -> Result<Self> {
        unsupported!("string")
    }

    fn number(self) -> Result<Self> {
        unsupported!("number")
    }

    /// Narrow a number chain to integers
    fn integer(self) -> Result<Self> {
        unsupported!("integer")
    }

    fn boolean(self) -> Result<Self> {
        unsupported!("boolean")
    }

    fn null(self) -> Result<Self> {
        unsupported!("null")
    }

    fn array(self) -> Result<Self> {
        unsupported!("array")
    }

    fn object(self) -> Result<Self> {
        unsupported!("object")
    }

    fn any(self) -> Result<Self> {
        unsupported!("any")
    }

    /// Accept a value matching any of the typed alternatives
    fn union(self, _alternatives: Vec<Self>) -> Result<Self> {
        unsupported!("union")
    }

    // Presence

    fn required(self) -> Result<Self> {
        unsupported!("required")
    }

    fn optional(self) -> Result<Self> {
        unsupported!("optional")
    }

    fn nullable(self) -> Result<Self> {
        unsupported!("nullable")
    }

    // Bounds

    fn min(self, _value: f64, _exclusive: bool) -> Result<Self> {
        unsupported!("min")
    }

    fn max(self, _value: f64, _exclusive: bool) -> Result<Self> {
        unsupported!("max")
    }

    fn multiple_of(self, _divisor: f64) -> Result<Self> {
        unsupported!("multiple_of")
    }

    fn min_length(self, _length: u64) -> Result<Self> {
        unsupported!("min_length")
    }

    fn max_length(self, _length: u64) -> Result<Self> {
        unsupported!("max_length")
    }

    fn min_items(self, _count: u64) -> Result<Self> {
        unsupported!("min_items")
    }

    fn max_items(self, _count: u64) -> Result<Self> {
        unsupported!("max_items")
    }

    fn min_properties(self, _count: u64) -> Result<Self> {
        unsupported!("min_properties")
    }

    fn max_properties(self, _count: u64) -> Result<Self> {
        unsupported!("max_properties")
    }

    // Strings

    fn pattern(self, _pattern: &str) -> Result<Self> {
        unsupported!("pattern")
    }

    fn email(self) -> Result<Self> {
        unsupported!("email")
    }

    fn url(self) -> Result<Self> {
        unsupported!("url")
    }

    /// UUID, optionally of one version
    fn uuid(self, _version: Option<u8>) -> Result<Self> {
        unsupported!("uuid")
    }

    fn date(self) -> Result<Self> {
        unsupported!("date")
    }

    fn datetime(self) -> Result<Self> {
        unsupported!("datetime")
    }

    fn time(self) -> Result<Self> {
        unsupported!("time")
    }

    /// IP address of version 4 or 6
    fn ip(self, _version: u8) -> Result<Self> {
        unsupported!("ip")
    }

    // Values

    fn one_of(self, _values: Vec<Value>) -> Result<Self> {
        unsupported!("one_of")
    }

    fn literal(self, _value: Value) -> Result<Self> {
        unsupported!("literal")
    }

    fn custom(self, _name: &str, _predicate: Predicate) -> Result<Self> {
        unsupported!("custom")
    }

    // Arrays

    fn unique(self) -> Result<Self> {
        unsupported!("unique")
    }

    fn items(self, _item: Self) -> Result<Self> {
        unsupported!("items")
    }

    fn tuple(self, _elements: Vec<Self>) -> Result<Self> {
        unsupported!("tuple")
    }

    fn contains(self, _item: Self, _min: Option<u64>, _max: Option<u64>) -> Result<Self> {
        unsupported!("contains")
    }

    /// Reject elements past the tuple prefix
    fn strict_items(self) -> Result<Self> {
        unsupported!("strict_items")
    }

    /// Validate elements past the tuple prefix against a rule
    fn catchall_items(self, _rule: Self) -> Result<Self> {
        unsupported!("catchall_items")
    }

    // Objects

    fn property_names(self, _name: Self) -> Result<Self> {
        unsupported!("property_names")
    }

    /// Reject members nothing else claims
    fn strict(self) -> Result<Self> {
        unsupported!("strict")
    }

    /// Validate unclaimed members against a rule
    fn catchall(self, _rule: Self) -> Result<Self> {
        unsupported!("catchall")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl ChainBuilder for Bare {}

    #[test]
    fn test_defaults_report_missing_capability() {
        assert_eq!(Bare.string().err(), Some(EmitError::missing("string")));
        assert_eq!(Bare.min(1.0, false).err(), Some(EmitError::missing("min")));
        assert_eq!(Bare.fork().err(), Some(EmitError::missing("fork")));
        assert_eq!(Bare.strict_items().err(), Some(EmitError::missing("strict_items")));
    }
}
