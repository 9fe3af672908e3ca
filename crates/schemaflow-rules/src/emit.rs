//! Rule-to-chain emission
//!
//! Replays one [`RuleRecord`] against a [`ChainBuilder`] in a fixed order:
//! type entry, presence, nullability, bounds, pattern, format, values,
//! array sub-rules, object sub-rules, and finally the composite predicate.
//! [`emit_schema`] runs translation and emission in one step.

use schemaflow_core::{BuiltinFormat, FormatLookup, FormatPolicy, FormatRegistry, RootSchema, SchemaType};
use serde_json::Value;
use std::sync::Arc;

use crate::chain::{ChainBuilder, Predicate};
use crate::error::{EmitError, Result};
use crate::rule::{Additional, RuleRecord};
use crate::translate::translate_root;

/// Apply a record to `builder` and return the extended chain
///
/// `formats` decides how `format` constraints map onto builder calls;
/// without one only the built-in formats are known.
pub fn emit<B: ChainBuilder>(record: &RuleRecord, builder: B, formats: Option<&FormatRegistry>) -> Result<B> {
    let fallback;
    let formats = match formats {
        Some(formats) => formats,
        None => {
            fallback = FormatRegistry::default();
            &fallback
        }
    };
    tracing::trace!(path = %record.path, primary = ?record.primary_type, "Emitting rule record");
    emit_record(record, builder, formats)
}

/// Emit every record on its own fork of `builder`, keyed by path
pub fn emit_all<B: ChainBuilder>(
    records: &[RuleRecord],
    builder: &B,
    formats: Option<&FormatRegistry>,
) -> Result<Vec<(String, B)>> {
    let mut chains = Vec::with_capacity(records.len());
    for record in records {
        let chain = emit(record, builder.fork()?, formats)?;
        chains.push((record.path.clone(), chain));
    }
    tracing::debug!(chains = chains.len(), "Emitted rule records");
    Ok(chains)
}

/// Translate `root` and emit every resulting record on a fork of `builder`
pub fn emit_schema<B: ChainBuilder>(
    root: &RootSchema,
    builder: &B,
    formats: Option<&FormatRegistry>,
) -> Result<Vec<(String, B)>> {
    let records = translate_root(root)?;
    emit_all(&records, builder, formats)
}

fn emit_record<B: ChainBuilder>(record: &RuleRecord, builder: B, formats: &FormatRegistry) -> Result<B> {
    let c = &record.constraints;

    let mut chain = if record.is_union() {
        let mut alternatives = Vec::with_capacity(record.secondary_types.len() + 1);
        for kind in record.primary_type.iter().chain(&record.secondary_types) {
            alternatives.push(typed(builder.fork()?, *kind)?);
        }
        builder.union(alternatives)?
    } else {
        match record.primary_type {
            Some(kind) => typed(builder, kind)?,
            None => builder.any()?,
        }
    };

    chain = if record.is_required { chain.required()? } else { chain.optional()? };
    if record.nullable {
        chain = chain.nullable()?;
    }

    if let Some(min) = c.min {
        chain = chain.min(min, c.exclusive_min)?;
    }
    if let Some(max) = c.max {
        chain = chain.max(max, c.exclusive_max)?;
    }
    if let Some(length) = c.min_length {
        chain = chain.min_length(length)?;
    }
    if let Some(length) = c.max_length {
        chain = chain.max_length(length)?;
    }
    if let Some(count) = c.min_items {
        chain = chain.min_items(count)?;
    }
    if let Some(count) = c.max_items {
        chain = chain.max_items(count)?;
    }
    if let Some(count) = c.min_properties {
        chain = chain.min_properties(count)?;
    }
    if let Some(count) = c.max_properties {
        chain = chain.max_properties(count)?;
    }
    if let Some(divisor) = c.multiple_of {
        chain = chain.multiple_of(divisor)?;
    }

    if let Some(pattern) = &c.pattern {
        chain = chain.pattern(pattern)?;
    }
    if let Some(format) = &c.format {
        chain = emit_format(chain, format, formats)?;
    }

    if let Some(values) = &c.enumeration {
        chain = chain.one_of(values.clone())?;
    }
    if let Some(value) = &c.literal {
        chain = chain.literal(value.clone())?;
    }

    if c.unique_items {
        chain = chain.unique()?;
    }
    if let Some(item) = &c.items {
        let item = emit_record(item, chain.fork()?, formats)?;
        chain = chain.items(item)?;
    }
    if let Some(elements) = &c.tuple {
        let mut built = Vec::with_capacity(elements.len());
        for element in elements {
            built.push(emit_record(element, chain.fork()?, formats)?);
        }
        chain = chain.tuple(built)?;
    }
    if let Some(contains) = &c.contains {
        let item = emit_record(contains, chain.fork()?, formats)?;
        chain = chain.contains(item, c.min_contains, c.max_contains)?;
    }
    match &c.additional_items {
        Some(Additional::Forbidden) => chain = chain.strict_items()?,
        Some(Additional::Rule(rule)) => {
            let rule = emit_record(rule, chain.fork()?, formats)?;
            chain = chain.catchall_items(rule)?;
        }
        None => {}
    }

    if let Some(names) = &c.property_names {
        let names = emit_record(names, chain.fork()?, formats)?;
        chain = chain.property_names(names)?;
    }
    match &c.additional_properties {
        Some(Additional::Forbidden) => chain = chain.strict()?,
        Some(Additional::Rule(rule)) => {
            let rule = emit_record(rule, chain.fork()?, formats)?;
            chain = chain.catchall(rule)?;
        }
        None => {}
    }

    if let Some(composite) = &c.composite {
        chain = chain.custom(&composite.label(), composite.predicate(formats))?;
    }

    Ok(chain)
}

fn typed<B: ChainBuilder>(builder: B, kind: SchemaType) -> Result<B> {
    match kind {
        SchemaType::String => builder.string(),
        SchemaType::Number => builder.number(),
        SchemaType::Integer => builder.number()?.integer(),
        SchemaType::Boolean => builder.boolean(),
        SchemaType::Null => builder.null(),
        SchemaType::Array => builder.array(),
        SchemaType::Object => builder.object(),
    }
}

fn emit_format<B: ChainBuilder>(chain: B, name: &str, formats: &FormatRegistry) -> Result<B> {
    match formats.lookup(name) {
        FormatLookup::Custom(check) => {
            let check = Arc::clone(check);
            chain.custom(name, string_predicate(move |s| check(s)))
        }
        FormatLookup::Builtin(builtin) => match builtin {
            BuiltinFormat::Email => chain.email(),
            BuiltinFormat::Uri => chain.url(),
            BuiltinFormat::Uuid(version) => chain.uuid(version),
            BuiltinFormat::Date => chain.date(),
            BuiltinFormat::DateTime => chain.datetime(),
            BuiltinFormat::Time => chain.time(),
            BuiltinFormat::Ipv4 => chain.ip(4),
            BuiltinFormat::Ipv6 => chain.ip(6),
            other => chain.custom(name, string_predicate(move |s| other.check(s))),
        },
        FormatLookup::Unknown => match formats.policy() {
            FormatPolicy::Permissive => {
                tracing::debug!(format = %name, "Skipping unknown format");
                Ok(chain)
            }
            FormatPolicy::Strict => Err(EmitError::UnknownFormat { name: name.to_string() }),
        },
    }
}

/// Lift a string check to a value predicate; non-strings pass
fn string_predicate<F>(check: F) -> Predicate
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    Arc::new(move |value: &Value| value.as_str().map_or(true, |s| check(s)))
}
