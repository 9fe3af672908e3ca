//! Schemaflow Core
//!
//! Interprets JSON Schema documents against `serde_json` values: a direct
//! boolean validator, a detailed error generator with path-qualified
//! messages, same-document `$ref` resolution and a pluggable format
//! registry.
//!
//! # Design Principles
//! - Deterministic: the same value and schema always give the same answer
//! - Stateless: nothing is cached between calls; validators are `Send + Sync`
//! - Consistent: an instance has no detailed errors exactly when it is valid
//!
//! # Example
//!
//! ```rust
//! use schemaflow_core::{detailed_errors, validate, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": ["name"]
//! })).unwrap();
//!
//! assert!(validate(&json!({"name": "x"}), &schema, None, None).unwrap());
//!
//! let errors = detailed_errors(&json!({}), &schema, None, None).unwrap();
//! assert_eq!(errors[0].path, "name");
//! ```

pub mod error;
pub mod formats;
pub mod options;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod validator;
pub mod value;

pub use error::{Result, SchemaError};
pub use formats::{validate_format, BuiltinFormat, FormatFn, FormatLookup, FormatPolicy, FormatRegistry};
pub use options::{ValidationOptions, ValidationOptionsBuilder, DEFAULT_MAX_REFERENCE_DEPTH};
pub use report::{ErrorCode, ValidationError};
pub use resolver::{resolve, resolve_in, Document};
pub use schema::{
    ArrayConstraints, Bound, Composition, Conditional, Dependency, ExclusiveBound, Items, NumberConstraints,
    ObjectConstraints, Pattern, RootSchema, Schema, SchemaMap, SchemaObject, SchemaType, StringConstraints,
};
pub use validator::Validator;
pub use value::ValueKind;

use serde_json::Value;

fn validator_for<'a>(
    schema: &'a Schema,
    formats: Option<&'a FormatRegistry>,
    root: Option<&'a RootSchema>,
) -> Validator<'a> {
    let document = match root {
        Some(root) => Document::from(root),
        None => Document::from_schema(schema),
    };
    let validator = Validator::with_document(document);
    match formats {
        Some(formats) => validator.with_formats(formats),
        None => validator,
    }
}

/// Decide whether `value` satisfies `schema`
///
/// References resolve against `root` when given, otherwise against `schema`
/// itself. Returns `Err` only for schema faults such as an unresolvable
/// `$ref` or an unbounded reference cycle.
pub fn validate(
    value: &Value,
    schema: &Schema,
    formats: Option<&FormatRegistry>,
    root: Option<&RootSchema>,
) -> Result<bool> {
    validator_for(schema, formats, root).is_valid_against(value, schema)
}

/// Every failed check for `value` against `schema`, in evaluation order
pub fn detailed_errors(
    value: &Value,
    schema: &Schema,
    formats: Option<&FormatRegistry>,
    root: Option<&RootSchema>,
) -> Result<Vec<ValidationError>> {
    validator_for(schema, formats, root).errors_against(value, schema)
}

/// Errors located at `target_path` or beneath it
///
/// An empty `target_path` returns every error.
pub fn specific_errors(
    value: &Value,
    schema: &Schema,
    target_path: &str,
    formats: Option<&FormatRegistry>,
) -> Result<Vec<ValidationError>> {
    let mut errors = detailed_errors(value, schema, formats, None)?;
    errors.retain(|error| report::is_within(&error.path, target_path));
    Ok(errors)
}
