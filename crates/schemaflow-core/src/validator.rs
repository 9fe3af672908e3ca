//! Direct validator
//!
//! A pure recursive decision over `(value, schema)`. Checks run in a fixed
//! order and stop at the first failure: reference, type, const/enum,
//! kind-specific keywords, combinators, then `if`/`then`/`else`.
//! Keywords for a kind the value is not (say `minLength` on a number) are
//! inert. Data failures return `Ok(false)`; only a malformed schema
//! produces an `Err`.

use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::formats::{FormatRegistry, DEFAULT_REGISTRY};
use crate::options::ValidationOptions;
use crate::resolver::{self, Document};
use crate::schema::{
    ArrayConstraints, Composition, Conditional, Dependency, Items, NumberConstraints, ObjectConstraints,
    RootSchema, Schema, StringConstraints,
};
use crate::value::{self, ValueKind};

/// Validates values against one schema document
///
/// Holds only shared references, so one validator can be used from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    document: Document<'a>,
    formats: &'a FormatRegistry,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    /// Create a validator for a root schema with built-in formats and default options
    pub fn new(root: &'a RootSchema) -> Self {
        Self::with_document(Document::from(root))
    }

    /// Create a validator whose `#` is the given schema
    pub fn for_schema(schema: &'a Schema) -> Self {
        Self::with_document(Document::from_schema(schema))
    }

    /// Create a validator over a borrowed document
    pub fn with_document(document: Document<'a>) -> Self {
        Self {
            document,
            formats: &DEFAULT_REGISTRY,
            options: ValidationOptions::default(),
        }
    }

    /// Use a custom format registry
    pub fn with_formats(mut self, formats: &'a FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Use custom options
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// The document references resolve against
    pub fn document(&self) -> Document<'a> {
        self.document
    }

    /// The format registry in use
    pub fn formats(&self) -> &'a FormatRegistry {
        self.formats
    }

    /// The options in use
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Decide whether a value satisfies the document's root schema
    pub fn is_valid(&self, instance: &Value) -> Result<bool> {
        self.decide(instance, self.document.schema, 0)
    }

    /// Decide whether a value satisfies `schema`, resolving references in this document
    pub fn is_valid_against(&self, instance: &Value, schema: &Schema) -> Result<bool> {
        self.decide(instance, schema, 0)
    }

    /// Resolve a reference, enforcing the depth limit
    ///
    /// `depth` counts reference hops taken without moving to a child value;
    /// callers pass `0` when they descend into an item or member.
    pub(crate) fn follow(&self, reference: &str, depth: usize) -> Result<&'a Schema> {
        if depth >= self.options.max_reference_depth {
            tracing::warn!(
                reference = %reference,
                limit = self.options.max_reference_depth,
                "Reference depth limit reached"
            );
            return Err(SchemaError::RecursionLimit {
                reference: reference.to_string(),
                limit: self.options.max_reference_depth,
            });
        }
        resolver::resolve_in(reference, self.document)
    }

    pub(crate) fn decide(&self, instance: &Value, schema: &Schema, depth: usize) -> Result<bool> {
        let object = match schema {
            Schema::Boolean(accept) => return Ok(*accept),
            Schema::Object(object) => object,
        };

        if let Some(reference) = &object.reference {
            let target = self.follow(reference, depth)?;
            return self.decide(instance, target, depth + 1);
        }

        if let Some(types) = &object.types {
            if !types.iter().any(|t| t.matches(instance)) {
                return Ok(false);
            }
        }

        if let Some(expected) = &object.const_value {
            if !value::json_equal(expected, instance) {
                return Ok(false);
            }
        }

        if let Some(allowed) = &object.enum_values {
            if !allowed.iter().any(|candidate| value::json_equal(candidate, instance)) {
                return Ok(false);
            }
        }

        let kind_ok = match ValueKind::of(instance) {
            ValueKind::String => instance
                .as_str()
                .map_or(true, |s| self.string_ok(s, &object.string)),
            ValueKind::Number => value::as_number(instance)
                .map_or(true, |n| number_ok(n, &object.number)),
            ValueKind::Array => match instance.as_array() {
                Some(items) => self.array_ok(items, &object.array)?,
                None => true,
            },
            ValueKind::Object => match instance.as_object() {
                Some(members) => self.object_ok(instance, members, &object.object, depth)?,
                None => true,
            },
            ValueKind::Null | ValueKind::Boolean => true,
        };
        if !kind_ok {
            return Ok(false);
        }

        if !self.composition_ok(instance, &object.composition, depth)? {
            return Ok(false);
        }

        match &object.conditional {
            Some(conditional) => self.conditional_ok(instance, conditional, depth),
            None => Ok(true),
        }
    }

    pub(crate) fn string_ok(&self, s: &str, constraints: &StringConstraints) -> bool {
        let length = value::char_length(s);
        if constraints.min_length.map_or(false, |min| length < min) {
            return false;
        }
        if constraints.max_length.map_or(false, |max| length > max) {
            return false;
        }
        if let Some(pattern) = &constraints.pattern {
            if !pattern.is_match(s) {
                return false;
            }
        }
        match &constraints.format {
            Some(format) if self.options.validate_formats => self.formats.validate(format, s),
            _ => true,
        }
    }

    fn array_ok(&self, items: &[Value], constraints: &ArrayConstraints) -> Result<bool> {
        let len = items.len() as u64;
        if constraints.min_items.map_or(false, |min| len < min)
            || constraints.max_items.map_or(false, |max| len > max)
        {
            return Ok(false);
        }
        if constraints.unique_items && !value::all_unique(items) {
            return Ok(false);
        }

        match &constraints.items {
            Some(Items::Single(schema)) => {
                for item in items {
                    if !self.decide(item, schema, 0)? {
                        return Ok(false);
                    }
                }
            }
            Some(Items::Tuple(schemas)) => {
                for (i, item) in items.iter().enumerate() {
                    let schema = match schemas.get(i) {
                        Some(schema) => schema,
                        None => match &constraints.additional_items {
                            Some(additional) => additional,
                            None => break,
                        },
                    };
                    if !self.decide(item, schema, 0)? {
                        return Ok(false);
                    }
                }
            }
            None => {}
        }

        if let Some(contains) = &constraints.contains {
            let mut matches = 0u64;
            for item in items {
                if self.decide(item, contains, 0)? {
                    matches += 1;
                }
            }
            if matches < constraints.min_contains.unwrap_or(1) {
                return Ok(false);
            }
            if constraints.max_contains.map_or(false, |max| matches > max) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn object_ok(
        &self,
        instance: &Value,
        members: &Map<String, Value>,
        constraints: &ObjectConstraints,
        depth: usize,
    ) -> Result<bool> {
        if constraints.required.iter().any(|name| !members.contains_key(name)) {
            return Ok(false);
        }

        let count = members.len() as u64;
        if constraints.min_properties.map_or(false, |min| count < min)
            || constraints.max_properties.map_or(false, |max| count > max)
        {
            return Ok(false);
        }

        for (name, member) in members {
            let mut claimed = false;
            if let Some(schema) = constraints.properties.get(name) {
                claimed = true;
                if !self.decide(member, schema, 0)? {
                    return Ok(false);
                }
            }
            for (pattern, schema) in &constraints.pattern_properties {
                if pattern.is_match(name) {
                    claimed = true;
                    if !self.decide(member, schema, 0)? {
                        return Ok(false);
                    }
                }
            }
            if !claimed {
                if let Some(additional) = &constraints.additional_properties {
                    if !self.decide(member, additional, 0)? {
                        return Ok(false);
                    }
                }
            }
            if let Some(names) = &constraints.property_names {
                if !self.decide(&Value::String(name.clone()), names, 0)? {
                    return Ok(false);
                }
            }
        }

        for (trigger, dependency) in &constraints.dependencies {
            if !members.contains_key(trigger) {
                continue;
            }
            let satisfied = match dependency {
                Dependency::Required(needed) => needed.iter().all(|name| members.contains_key(name)),
                Dependency::Schema(schema) => self.decide(instance, schema, depth)?,
            };
            if !satisfied {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn composition_ok(&self, instance: &Value, composition: &Composition, depth: usize) -> Result<bool> {
        for schema in &composition.all_of {
            if !self.decide(instance, schema, depth)? {
                return Ok(false);
            }
        }

        if let Some(any_of) = &composition.any_of {
            let mut any = false;
            for schema in any_of {
                if self.decide(instance, schema, depth)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
        }

        if let Some(one_of) = &composition.one_of {
            if self.count_matches(instance, one_of, depth, 2)? != 1 {
                return Ok(false);
            }
        }

        if let Some(not) = &composition.not {
            if self.decide(instance, not, depth)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Count matching schemas, stopping once `stop_at` is reached
    pub(crate) fn count_matches(
        &self,
        instance: &Value,
        schemas: &[Schema],
        depth: usize,
        stop_at: usize,
    ) -> Result<usize> {
        let mut matches = 0;
        for schema in schemas {
            if self.decide(instance, schema, depth)? {
                matches += 1;
                if matches >= stop_at {
                    break;
                }
            }
        }
        Ok(matches)
    }

    fn conditional_ok(&self, instance: &Value, conditional: &Conditional, depth: usize) -> Result<bool> {
        let branch = if self.decide(instance, &conditional.if_schema, depth)? {
            conditional.then_schema.as_deref()
        } else {
            conditional.else_schema.as_deref()
        };
        match branch {
            Some(schema) => self.decide(instance, schema, depth),
            None => Ok(true),
        }
    }
}

/// Number keywords; bounds come normalized from the schema
pub(crate) fn number_ok(n: f64, constraints: &NumberConstraints) -> bool {
    if let Some(bound) = constraints.lower_bound() {
        if !bound.admits_min(n) {
            return false;
        }
    }
    if let Some(bound) = constraints.upper_bound() {
        if !bound.admits_max(n) {
            return false;
        }
    }
    constraints
        .multiple_of
        .map_or(true, |divisor| value::is_multiple_of(n, divisor))
}
