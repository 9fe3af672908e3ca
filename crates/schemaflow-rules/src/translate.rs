//! Schema-to-rule translation
//!
//! Walks a schema depth-first and flattens it into [`RuleRecord`]s: one per
//! object property path, `field.*` records for arrays of objects, and a
//! root record (empty path) when the root carries whole-value constraints.
//! References are expanded in place; a reference that is already being
//! expanded stops the walk and is carried as a [`CompositeRule`].

use schemaflow_core::report::{index_path, member_path};
use schemaflow_core::{resolve, Items, Result, RootSchema, Schema, SchemaObject, SchemaType};
use std::sync::Arc;

use crate::rule::{Additional, CompositeRule, Constraints, RuleRecord};

/// Translate a self-contained schema
pub fn translate(schema: &Schema) -> Result<Vec<RuleRecord>> {
    translate_root(&RootSchema::new(schema.clone()))
}

/// Translate a root schema, resolving references against its definitions
pub fn translate_root(root: &RootSchema) -> Result<Vec<RuleRecord>> {
    let mut translator = Translator {
        root,
        shared: Arc::new(root.clone()),
        active: vec!["#".to_string()],
        records: Vec::new(),
    };
    translator.visit_root()?;
    tracing::debug!(records = translator.records.len(), "Translated schema into rule records");
    Ok(translator.records)
}

#[derive(Clone, Copy)]
enum Resolved<'a> {
    Schema(&'a Schema),
    /// A reference already being expanded further up
    Cycle(&'a Schema),
}

struct Translator<'a> {
    root: &'a RootSchema,
    shared: Arc<RootSchema>,
    /// References currently being expanded
    active: Vec<String>,
    records: Vec<RuleRecord>,
}

impl<'a> Translator<'a> {
    fn visit_root(&mut self) -> Result<()> {
        let root = self.root;
        self.with_resolved(&root.schema, |this, resolved| {
            let record = this.record("", resolved, true, false)?;
            let plain_object = record.primary_type == Some(SchemaType::Object)
                && !record.is_union()
                && !record.nullable
                && record.constraints.is_empty();
            if !plain_object {
                this.records.push(record);
            }
            if let Resolved::Schema(Schema::Object(object)) = resolved {
                this.visit_properties("", object)?;
            }
            Ok(())
        })
    }

    /// Push the record for one property and everything below it
    fn visit(&mut self, path: &str, schema: &'a Schema, required: bool) -> Result<()> {
        self.with_resolved(schema, |this, resolved| {
            let object_items = match resolved {
                Resolved::Schema(Schema::Object(object)) => this.object_items(object)?,
                _ => None,
            };

            let mut record = this.record(path, resolved, required, false)?;
            if object_items.is_some() {
                record.constraints.items = None;
            }
            this.records.push(record);

            if let Resolved::Schema(Schema::Object(object)) = resolved {
                this.visit_properties(path, object)?;
            }
            if let Some(item) = object_items {
                this.visit(&member_path(path, "*"), item, true)?;
            }
            Ok(())
        })
    }

    fn visit_properties(&mut self, path: &str, object: &'a SchemaObject) -> Result<()> {
        let constraints = &object.object;
        for (name, schema) in constraints.properties.iter() {
            let required = constraints.required.iter().any(|r| r == name);
            self.visit(&member_path(path, name), schema, required)?;
        }
        // Required members without a declared schema only assert presence
        for (i, name) in constraints.required.iter().enumerate() {
            if constraints.properties.contains_key(name) || constraints.required[..i].contains(name) {
                continue;
            }
            self.records.push(RuleRecord::new(member_path(path, name), true));
        }
        Ok(())
    }

    /// Item schema of an array whose elements are objects with properties
    fn object_items(&mut self, object: &'a SchemaObject) -> Result<Option<&'a Schema>> {
        let Some(Items::Single(item)) = &object.array.items else {
            return Ok(None);
        };
        self.with_resolved(item, |_, resolved| {
            Ok(match resolved {
                Resolved::Schema(Schema::Object(target))
                    if infer_type(target) == Some(SchemaType::Object) && !target.object.properties.is_empty() =>
                {
                    Some(&**item)
                }
                _ => None,
            })
        })
    }

    /// Build one record; `nested` records cannot carry child property records
    fn record(&mut self, path: &str, resolved: Resolved<'a>, required: bool, nested: bool) -> Result<RuleRecord> {
        let mut record = RuleRecord::new(path, required);
        let object = match resolved {
            Resolved::Schema(Schema::Boolean(true)) => return Ok(record),
            Resolved::Schema(schema @ Schema::Boolean(false)) => {
                record.constraints.composite = Some(self.composite(vec!["false".to_string()], schema));
                return Ok(record);
            }
            Resolved::Cycle(schema) => {
                record.constraints.composite = Some(self.composite(vec!["$ref".to_string()], schema));
                return Ok(record);
            }
            Resolved::Schema(Schema::Object(object)) => object,
        };

        match &object.types {
            Some(types) => {
                let mut named: Vec<SchemaType> = types.iter().copied().filter(|t| *t != SchemaType::Null).collect();
                record.nullable = types.contains(&SchemaType::Null);
                if named.is_empty() {
                    record.primary_type = Some(SchemaType::Null);
                    record.nullable = false;
                } else {
                    record.primary_type = Some(named.remove(0));
                    record.secondary_types = named;
                }
            }
            None => record.primary_type = infer_type(object),
        }

        let mut constraints = Constraints::default();
        self.scalar_constraints(object, &mut constraints);
        self.array_constraints(path, object, &mut constraints)?;
        self.object_constraints(path, object, &mut constraints)?;

        let keywords = composite_keywords(object, nested);
        if !keywords.is_empty() {
            let schema = Schema::Object(object.clone());
            constraints.composite = Some(CompositeRule {
                keywords,
                schema: Arc::new(schema),
                root: Arc::clone(&self.shared),
            });
        }

        record.constraints = constraints;
        tracing::trace!(path = %path, primary = ?record.primary_type, "Built rule record");
        Ok(record)
    }

    fn scalar_constraints(&self, object: &SchemaObject, constraints: &mut Constraints) {
        let number = &object.number;
        if let Some(bound) = number.lower_bound() {
            constraints.min = Some(bound.value);
            constraints.exclusive_min = bound.exclusive;
        }
        if let Some(bound) = number.upper_bound() {
            constraints.max = Some(bound.value);
            constraints.exclusive_max = bound.exclusive;
        }
        constraints.multiple_of = number.multiple_of;

        let string = &object.string;
        constraints.min_length = string.min_length;
        constraints.max_length = string.max_length;
        constraints.pattern = string.pattern.as_ref().map(|p| p.as_str().to_string());
        constraints.format = string.format.clone();

        constraints.enumeration = object.enum_values.clone();
        constraints.literal = object.const_value.clone();
    }

    fn array_constraints(&mut self, path: &str, object: &'a SchemaObject, constraints: &mut Constraints) -> Result<()> {
        let array = &object.array;
        constraints.min_items = array.min_items;
        constraints.max_items = array.max_items;
        constraints.unique_items = array.unique_items;

        match &array.items {
            Some(Items::Single(item)) => {
                let record = self.nested(&member_path(path, "*"), item)?;
                constraints.items = Some(Box::new(record));
            }
            Some(Items::Tuple(elements)) => {
                let mut tuple = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    tuple.push(self.nested(&index_path(path, i), element)?);
                }
                constraints.tuple = Some(tuple);
                constraints.additional_items = match array.additional_items.as_deref() {
                    Some(additional) => self.additional(&member_path(path, "*"), additional)?,
                    None => None,
                };
            }
            None => {}
        }

        if let Some(contains) = &array.contains {
            constraints.contains = Some(Box::new(self.nested(&member_path(path, "*"), contains)?));
            constraints.min_contains = array.min_contains;
            constraints.max_contains = array.max_contains;
        }
        Ok(())
    }

    fn object_constraints(&mut self, path: &str, object: &'a SchemaObject, constraints: &mut Constraints) -> Result<()> {
        let members = &object.object;
        constraints.min_properties = members.min_properties;
        constraints.max_properties = members.max_properties;

        if let Some(names) = &members.property_names {
            constraints.property_names = Some(Box::new(self.nested(path, names)?));
        }
        // Pattern-keyed members are claimed inside the composite rule
        if members.pattern_properties.is_empty() {
            if let Some(additional) = members.additional_properties.as_deref() {
                constraints.additional_properties = self.additional(&member_path(path, "*"), additional)?;
            }
        }
        Ok(())
    }

    fn additional(&mut self, path: &str, schema: &'a Schema) -> Result<Option<Additional>> {
        Ok(match schema {
            Schema::Boolean(true) => None,
            Schema::Boolean(false) => Some(Additional::Forbidden),
            other => Some(Additional::Rule(Box::new(self.nested(path, other)?))),
        })
    }

    /// A self-contained sub-record for items, tuple positions, contains and names
    fn nested(&mut self, path: &str, schema: &'a Schema) -> Result<RuleRecord> {
        self.with_resolved(schema, |this, resolved| this.record(path, resolved, true, true))
    }

    fn composite(&self, keywords: Vec<String>, schema: &Schema) -> CompositeRule {
        CompositeRule {
            keywords,
            schema: Arc::new(schema.clone()),
            root: Arc::clone(&self.shared),
        }
    }

    /// Follow `$ref`s, run `f` on the target, then unwind the expansion stack
    fn with_resolved<T>(
        &mut self,
        schema: &'a Schema,
        f: impl FnOnce(&mut Self, Resolved<'a>) -> Result<T>,
    ) -> Result<T> {
        let mut current = schema;
        let mut pushed = 0;
        let resolved = loop {
            match current.reference() {
                None => break Resolved::Schema(current),
                Some(reference) if self.active.iter().any(|active| active == reference) => {
                    tracing::trace!(reference = %reference, "Reference cycle, keeping as composite rule");
                    break Resolved::Cycle(current);
                }
                Some(reference) => match resolve(reference, self.root) {
                    Ok(target) => {
                        self.active.push(reference.to_string());
                        pushed += 1;
                        current = target;
                    }
                    Err(e) => {
                        self.active.truncate(self.active.len() - pushed);
                        return Err(e);
                    }
                },
            }
        };
        let outcome = f(self, resolved);
        self.active.truncate(self.active.len() - pushed);
        outcome
    }
}

/// The single kind implied by a schema's keywords, if exactly one is
fn infer_type(object: &SchemaObject) -> Option<SchemaType> {
    if let Some(types) = &object.types {
        return types.iter().copied().find(|t| *t != SchemaType::Null);
    }
    let implied: Vec<SchemaType> = [
        (!object.string.is_empty(), SchemaType::String),
        (!object.number.is_empty(), SchemaType::Number),
        (!object.array.is_empty(), SchemaType::Array),
        (!object.object.is_empty(), SchemaType::Object),
    ]
    .into_iter()
    .filter_map(|(present, kind)| present.then_some(kind))
    .collect();
    match implied.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// Keywords that need the direct validator rather than flat constraints
fn composite_keywords(object: &SchemaObject, nested: bool) -> Vec<String> {
    let mut keywords = Vec::new();
    let composition = &object.composition;
    if !composition.all_of.is_empty() {
        keywords.push("allOf");
    }
    if composition.any_of.is_some() {
        keywords.push("anyOf");
    }
    if composition.one_of.is_some() {
        keywords.push("oneOf");
    }
    if composition.not.is_some() {
        keywords.push("not");
    }
    if object.conditional.is_some() {
        keywords.push("if");
    }
    let members = &object.object;
    if !members.dependencies.is_empty() {
        keywords.push("dependencies");
    }
    if !members.pattern_properties.is_empty() {
        keywords.push("patternProperties");
    }
    if nested && (!members.properties.is_empty() || !members.required.is_empty()) {
        keywords.push("properties");
    }
    keywords.into_iter().map(String::from).collect()
}
