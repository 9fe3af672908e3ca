//! Detailed error reporting
//!
//! The error generator walks the same keywords as the direct validator but
//! never stops early: every failing check contributes a [`ValidationError`].
//! For combinators and conditionals it asks the direct validator which
//! branches pass, so an instance yields no errors exactly when
//! [`Validator::is_valid`] returns `true`.
//!
//! Paths use `.` between members and `[i]` for array indices; the root is
//! the empty string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::schema::{
    ArrayConstraints, Composition, Conditional, Dependency, Items, NumberConstraints, ObjectConstraints,
    Schema, StringConstraints,
};
use crate::validator::Validator;
use crate::value::{self, ValueKind};

/// Machine-readable identifier of the check that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Type,
    Required,
    Const,
    Enum,
    MinLength,
    MaxLength,
    Pattern,
    Format,
    Minimum,
    Maximum,
    MultipleOf,
    MinItems,
    MaxItems,
    UniqueItems,
    Contains,
    AdditionalItems,
    MinProperties,
    MaxProperties,
    AdditionalProperties,
    PropertyNames,
    Dependencies,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    FalseSchema,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Type => "type",
            ErrorCode::Required => "required",
            ErrorCode::Const => "const",
            ErrorCode::Enum => "enum",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MaxLength => "max_length",
            ErrorCode::Pattern => "pattern",
            ErrorCode::Format => "format",
            ErrorCode::Minimum => "minimum",
            ErrorCode::Maximum => "maximum",
            ErrorCode::MultipleOf => "multiple_of",
            ErrorCode::MinItems => "min_items",
            ErrorCode::MaxItems => "max_items",
            ErrorCode::UniqueItems => "unique_items",
            ErrorCode::Contains => "contains",
            ErrorCode::AdditionalItems => "additional_items",
            ErrorCode::MinProperties => "min_properties",
            ErrorCode::MaxProperties => "max_properties",
            ErrorCode::AdditionalProperties => "additional_properties",
            ErrorCode::PropertyNames => "property_names",
            ErrorCode::Dependencies => "dependencies",
            ErrorCode::AllOf => "all_of",
            ErrorCode::AnyOf => "any_of",
            ErrorCode::OneOf => "one_of",
            ErrorCode::Not => "not",
            ErrorCode::FalseSchema => "false_schema",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed check, located by instance path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location in the instance; empty for the root
    pub path: String,
    pub code: ErrorCode,
    /// Human-readable description
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.code, self.path, self.message)
        }
    }
}

/// Path of a member below `parent`
pub fn member_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Path of an array element below `parent`
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Whether `path` is `target` or lies beneath it
pub fn is_within(path: &str, target: &str) -> bool {
    if target.is_empty() {
        return true;
    }
    match path.strip_prefix(target) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

impl<'a> Validator<'a> {
    /// Every failed check for a value against the document's root schema
    pub fn detailed_errors(&self, instance: &Value) -> Result<Vec<ValidationError>> {
        self.errors_against(instance, self.document().schema)
    }

    /// Every failed check for a value against `schema`
    pub fn errors_against(&self, instance: &Value, schema: &Schema) -> Result<Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.collect(instance, schema, "", 0, &mut errors)?;
        tracing::debug!(count = errors.len(), "Collected validation errors");
        Ok(errors)
    }

    /// Errors located at `target_path` or beneath it
    pub fn specific_errors(&self, instance: &Value, target_path: &str) -> Result<Vec<ValidationError>> {
        let mut errors = self.detailed_errors(instance)?;
        errors.retain(|error| is_within(&error.path, target_path));
        Ok(errors)
    }

    fn collect(
        &self,
        instance: &Value,
        schema: &Schema,
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let object = match schema {
            Schema::Boolean(true) => return Ok(()),
            Schema::Boolean(false) => {
                out.push(ValidationError::new(path, ErrorCode::FalseSchema, "No value is allowed here"));
                return Ok(());
            }
            Schema::Object(object) => object,
        };

        if let Some(reference) = &object.reference {
            let target = self.follow(reference, depth)?;
            return self.collect(instance, target, path, depth + 1, out);
        }

        if let Some(types) = &object.types {
            if !types.iter().any(|t| t.matches(instance)) {
                let expected = types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ");
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Type,
                    format!("Expected {} but found {}", expected, ValueKind::of(instance)),
                ));
            }
        }

        if let Some(expected) = &object.const_value {
            if !value::json_equal(expected, instance) {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Const,
                    format!("Expected {}", value::describe(expected)),
                ));
            }
        }

        if let Some(allowed) = &object.enum_values {
            if !allowed.iter().any(|candidate| value::json_equal(candidate, instance)) {
                let listed = allowed.iter().map(value::describe).collect::<Vec<_>>().join(", ");
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Enum,
                    format!("Value must be one of: {}", listed),
                ));
            }
        }

        match instance {
            Value::String(s) => self.string_errors(s, &object.string, path, out),
            Value::Number(_) => {
                if let Some(n) = value::as_number(instance) {
                    number_errors(n, &object.number, path, out);
                }
            }
            Value::Array(items) => self.array_errors(items, &object.array, path, out)?,
            Value::Object(members) => self.object_errors(instance, members, &object.object, path, depth, out)?,
            Value::Null | Value::Bool(_) => {}
        }

        self.composition_errors(instance, &object.composition, path, depth, out)?;

        if let Some(conditional) = &object.conditional {
            self.conditional_errors(instance, conditional, path, depth, out)?;
        }

        Ok(())
    }

    fn string_errors(&self, s: &str, constraints: &StringConstraints, path: &str, out: &mut Vec<ValidationError>) {
        let length = value::char_length(s);
        if let Some(min) = constraints.min_length {
            if length < min {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MinLength,
                    format!("String is shorter than {} characters", min),
                ));
            }
        }
        if let Some(max) = constraints.max_length {
            if length > max {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MaxLength,
                    format!("String is longer than {} characters", max),
                ));
            }
        }
        if let Some(pattern) = &constraints.pattern {
            if !pattern.is_match(s) {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Pattern,
                    format!("String does not match pattern '{}'", pattern.as_str()),
                ));
            }
        }
        if let Some(format) = &constraints.format {
            if self.options().validate_formats && !self.formats().validate(format, s) {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Format,
                    format!("String is not a valid '{}'", format),
                ));
            }
        }
    }

    fn array_errors(
        &self,
        items: &[Value],
        constraints: &ArrayConstraints,
        path: &str,
        out: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let len = items.len() as u64;
        if let Some(min) = constraints.min_items {
            if len < min {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MinItems,
                    format!("Array has fewer than {} items", min),
                ));
            }
        }
        if let Some(max) = constraints.max_items {
            if len > max {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MaxItems,
                    format!("Array has more than {} items", max),
                ));
            }
        }
        if constraints.unique_items && !value::all_unique(items) {
            out.push(ValidationError::new(path, ErrorCode::UniqueItems, "Array items are not unique"));
        }

        match &constraints.items {
            Some(Items::Single(schema)) => {
                for (i, item) in items.iter().enumerate() {
                    self.collect(item, schema, &index_path(path, i), 0, out)?;
                }
            }
            Some(Items::Tuple(schemas)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = index_path(path, i);
                    match (schemas.get(i), constraints.additional_items.as_deref()) {
                        (Some(schema), _) => self.collect(item, schema, &item_path, 0, out)?,
                        (None, Some(Schema::Boolean(false))) => out.push(ValidationError::new(
                            item_path,
                            ErrorCode::AdditionalItems,
                            format!("Only {} items are allowed", schemas.len()),
                        )),
                        (None, Some(additional)) => self.collect(item, additional, &item_path, 0, out)?,
                        (None, None) => break,
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
            let min = constraints.min_contains.unwrap_or(1);
            if matches < min {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::Contains,
                    format!("Array must contain at least {} matching items, found {}", min, matches),
                ));
            }
            if let Some(max) = constraints.max_contains {
                if matches > max {
                    out.push(ValidationError::new(
                        path,
                        ErrorCode::Contains,
                        format!("Array must contain at most {} matching items, found {}", max, matches),
                    ));
                }
            }
        }

        Ok(())
    }

    fn object_errors(
        &self,
        instance: &Value,
        members: &Map<String, Value>,
        constraints: &ObjectConstraints,
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationError>,
    ) -> Result<()> {
        for name in &constraints.required {
            if !members.contains_key(name) {
                out.push(ValidationError::new(
                    member_path(path, name),
                    ErrorCode::Required,
                    format!("'{}' is a required property", name),
                ));
            }
        }

        let count = members.len() as u64;
        if let Some(min) = constraints.min_properties {
            if count < min {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MinProperties,
                    format!("Object has fewer than {} properties", min),
                ));
            }
        }
        if let Some(max) = constraints.max_properties {
            if count > max {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::MaxProperties,
                    format!("Object has more than {} properties", max),
                ));
            }
        }

        // Declared properties first, in schema order
        for (name, schema) in constraints.properties.iter() {
            if let Some(member) = members.get(name) {
                self.collect(member, schema, &member_path(path, name), 0, out)?;
            }
        }

        for (name, member) in members {
            let child = member_path(path, name);
            let mut claimed = constraints.properties.contains_key(name);
            for (pattern, schema) in &constraints.pattern_properties {
                if pattern.is_match(name) {
                    claimed = true;
                    self.collect(member, schema, &child, 0, out)?;
                }
            }
            if !claimed {
                match constraints.additional_properties.as_deref() {
                    Some(Schema::Boolean(false)) => out.push(ValidationError::new(
                        child.as_str(),
                        ErrorCode::AdditionalProperties,
                        format!("Property '{}' is not allowed", name),
                    )),
                    Some(additional) => self.collect(member, additional, &child, 0, out)?,
                    None => {}
                }
            }
            if let Some(names) = &constraints.property_names {
                if !self.decide(&Value::String(name.clone()), names, 0)? {
                    out.push(ValidationError::new(
                        child,
                        ErrorCode::PropertyNames,
                        format!("Property name '{}' is invalid", name),
                    ));
                }
            }
        }

        for (trigger, dependency) in &constraints.dependencies {
            if !members.contains_key(trigger) {
                continue;
            }
            match dependency {
                Dependency::Required(needed) => {
                    for name in needed.iter().filter(|name| !members.contains_key(*name)) {
                        out.push(ValidationError::new(
                            member_path(path, name),
                            ErrorCode::Dependencies,
                            format!("'{}' is required when '{}' is present", name, trigger),
                        ));
                    }
                }
                Dependency::Schema(schema) => self.collect(instance, schema, path, depth, out)?,
            }
        }

        Ok(())
    }

    fn composition_errors(
        &self,
        instance: &Value,
        composition: &Composition,
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationError>,
    ) -> Result<()> {
        for schema in &composition.all_of {
            if !self.decide(instance, schema, depth)? {
                self.collect(instance, schema, path, depth, out)?;
            }
        }

        if let Some(any_of) = &composition.any_of {
            if self.count_matches(instance, any_of, depth, 1)? == 0 {
                out.push(ValidationError::new(
                    path,
                    ErrorCode::AnyOf,
                    "Value does not match any of the allowed schemas",
                ));
            }
        }

        if let Some(one_of) = &composition.one_of {
            match self.count_matches(instance, one_of, depth, one_of.len().max(1))? {
                1 => {}
                0 => out.push(ValidationError::new(
                    path,
                    ErrorCode::OneOf,
                    "Value does not match any of the oneOf schemas",
                )),
                matched => out.push(ValidationError::new(
                    path,
                    ErrorCode::OneOf,
                    format!("Value matches {} of the oneOf schemas, expected exactly one", matched),
                )),
            }
        }

        if let Some(not) = &composition.not {
            if self.decide(instance, not, depth)? {
                out.push(ValidationError::new(path, ErrorCode::Not, "Value must not match the 'not' schema"));
            }
        }

        Ok(())
    }

    fn conditional_errors(
        &self,
        instance: &Value,
        conditional: &Conditional,
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let branch = if self.decide(instance, &conditional.if_schema, depth)? {
            conditional.then_schema.as_deref()
        } else {
            conditional.else_schema.as_deref()
        };
        match branch {
            Some(schema) => self.collect(instance, schema, path, depth, out),
            None => Ok(()),
        }
    }
}

fn number_errors(n: f64, constraints: &NumberConstraints, path: &str, out: &mut Vec<ValidationError>) {
    if let Some(bound) = constraints.lower_bound() {
        if !bound.admits_min(n) {
            let relation = if bound.exclusive { "greater than" } else { "at least" };
            out.push(ValidationError::new(
                path,
                ErrorCode::Minimum,
                format!("Value must be {} {}", relation, bound.value),
            ));
        }
    }
    if let Some(bound) = constraints.upper_bound() {
        if !bound.admits_max(n) {
            let relation = if bound.exclusive { "less than" } else { "at most" };
            out.push(ValidationError::new(
                path,
                ErrorCode::Maximum,
                format!("Value must be {} {}", relation, bound.value),
            ));
        }
    }
    if let Some(divisor) = constraints.multiple_of {
        if !value::is_multiple_of(n, divisor) {
            out.push(ValidationError::new(
                path,
                ErrorCode::MultipleOf,
                format!("Value must be a multiple of {}", divisor),
            ));
        }
    }
}
