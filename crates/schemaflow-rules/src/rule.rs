//! Rule record model
//!
//! A [`RuleRecord`] is the flattened form of one schema location. Paths use
//! `.` between members, `*` for "every element" and `[i]` for tuple
//! positions; the empty path is the root.

use schemaflow_core::{FormatRegistry, RootSchema, Schema, SchemaType, Validator};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::chain::Predicate;

/// One path-keyed rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleRecord {
    pub path: String,
    /// `None` when the location accepts any type
    pub primary_type: Option<SchemaType>,
    /// Alternatives from a union `type`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_types: Vec<SchemaType>,
    pub nullable: bool,
    pub is_required: bool,
    pub constraints: Constraints,
}

impl RuleRecord {
    pub fn new(path: impl Into<String>, is_required: bool) -> Self {
        Self {
            path: path.into(),
            primary_type: None,
            secondary_types: Vec::new(),
            nullable: false,
            is_required,
            constraints: Constraints::default(),
        }
    }

    /// Whether the record is a union of several types
    pub fn is_union(&self) -> bool {
        !self.secondary_types.is_empty()
    }
}

/// What happens to members or elements no other keyword claims
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "policy", content = "rule", rename_all = "snake_case")]
pub enum Additional {
    Forbidden,
    Rule(Box<RuleRecord>),
}

/// Constraint values carried by a record
///
/// Numeric bounds are already normalized: `exclusive_min`/`exclusive_max`
/// qualify `min`/`max` whichever draft spelled them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_min: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_max: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RuleRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuple: Option<Vec<RuleRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Additional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<RuleRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contains: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_names: Option<Box<RuleRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Additional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeRule>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Constraints {
    /// Whether no constraint is set
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.multiple_of.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.format.is_none()
            && self.enumeration.is_none()
            && self.literal.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique_items
            && self.items.is_none()
            && self.tuple.is_none()
            && self.additional_items.is_none()
            && self.contains.is_none()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.property_names.is_none()
            && self.additional_properties.is_none()
            && self.composite.is_none()
    }
}

/// Keywords a flat record cannot express, checked by the direct validator
#[derive(Clone, Serialize)]
pub struct CompositeRule {
    /// Keywords this rule stands in for, e.g. `oneOf` or `$ref`
    pub keywords: Vec<String>,
    #[serde(skip)]
    pub schema: Arc<Schema>,
    #[serde(skip)]
    pub root: Arc<RootSchema>,
}

impl fmt::Debug for CompositeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRule").field("keywords", &self.keywords).finish()
    }
}

impl CompositeRule {
    /// Label passed to the builder's custom-predicate method
    pub fn label(&self) -> String {
        self.keywords.join("+")
    }

    /// Predicate deciding values with the direct validator
    ///
    /// Schema faults met at run time are logged and count as a rejection.
    pub fn predicate(&self, formats: &FormatRegistry) -> Predicate {
        let schema = Arc::clone(&self.schema);
        let root = Arc::clone(&self.root);
        let formats = formats.clone();
        let label = self.label();
        Arc::new(move |value: &Value| {
            let validator = Validator::new(&root).with_formats(&formats);
            match validator.is_valid_against(value, &schema) {
                Ok(valid) => valid,
                Err(e) => {
                    tracing::warn!(rule = %label, error = %e, "Composite rule hit a schema error");
                    false
                }
            }
        })
    }
}
