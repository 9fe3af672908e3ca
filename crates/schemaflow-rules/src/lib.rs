//! Schemaflow Rules
//!
//! Flattens schemas into path-keyed [`RuleRecord`]s and replays them against
//! an external validator-construction framework through [`ChainBuilder`].
//!
//! ```rust
//! use schemaflow_core::{Schema, SchemaType};
//! use schemaflow_rules::translate;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "type": "object",
//!     "properties": { "age": { "type": "number", "minimum": 0 } }
//! })).unwrap();
//!
//! let records = translate(&schema).unwrap();
//! let age = records.iter().find(|r| r.path == "age").unwrap();
//! assert_eq!(age.primary_type, Some(SchemaType::Number));
//! assert_eq!(age.constraints.min, Some(0.0));
//! ```

pub mod chain;
pub mod emit;
pub mod error;
pub mod rule;
pub mod translate;

pub use chain::{ChainBuilder, Predicate};
pub use emit::{emit, emit_all, emit_schema};
pub use error::{EmitError, Result};
pub use rule::{Additional, CompositeRule, Constraints, RuleRecord};
pub use translate::{translate, translate_root};
