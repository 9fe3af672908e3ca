//! Reference resolution
//!
//! Only same-document pointers are supported: `#` names the root schema and
//! `#/a/b/...` walks keyword segments from it. Each resolution is independent;
//! nothing is cached between calls.

use crate::error::{Result, SchemaError};
use crate::schema::{Dependency, Items, RootSchema, Schema, SchemaMap};

/// Borrowed view of the document a reference is resolved against
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    /// Schema that `#` designates
    pub schema: &'a Schema,
    /// Extra definitions consulted before the schema's own
    pub definitions: Option<&'a SchemaMap>,
}

impl<'a> Document<'a> {
    /// A document made of a single schema
    pub fn from_schema(schema: &'a Schema) -> Self {
        Self {
            schema,
            definitions: None,
        }
    }
}

impl<'a> From<&'a RootSchema> for Document<'a> {
    fn from(root: &'a RootSchema) -> Self {
        Self {
            schema: &root.schema,
            definitions: Some(&root.definitions),
        }
    }
}

/// Resolve a reference against a root schema
pub fn resolve<'a>(reference: &str, root: &'a RootSchema) -> Result<&'a Schema> {
    resolve_in(reference, Document::from(root))
}

/// Resolve a reference against a borrowed document
pub fn resolve_in<'a>(reference: &str, document: Document<'a>) -> Result<&'a Schema> {
    let unsupported = || SchemaError::UnsupportedReference {
        reference: reference.to_string(),
    };

    let pointer = reference.strip_prefix('#').ok_or_else(unsupported)?;
    if pointer.is_empty() {
        tracing::trace!(reference = %reference, "Resolved reference to document root");
        return Ok(document.schema);
    }
    let pointer = pointer.strip_prefix('/').ok_or_else(unsupported)?;

    let segments = pointer
        .split('/')
        .map(|segment| decode_segment(segment).ok_or_else(|| SchemaError::unresolvable(reference)))
        .collect::<Result<Vec<String>>>()?;

    if let (Some(definitions), [keyword, name, rest @ ..]) = (document.definitions, segments.as_slice()) {
        if keyword == "definitions" || keyword == "$defs" {
            if let Some(found) = definitions.get(name) {
                let target = walk(found, rest, reference)?;
                tracing::trace!(reference = %reference, "Resolved reference via root definitions");
                return Ok(target);
            }
        }
    }

    let target = walk(document.schema, &segments, reference)?;
    tracing::trace!(reference = %reference, depth = segments.len(), "Resolved schema reference");
    Ok(target)
}

fn walk<'a>(start: &'a Schema, segments: &[String], reference: &str) -> Result<&'a Schema> {
    let mut current = start;
    let mut position = 0;

    while position < segments.len() {
        let object = current
            .as_object()
            .ok_or_else(|| SchemaError::unresolvable(reference))?;
        let keyword = segments[position].as_str();
        let next = segments.get(position + 1).map(String::as_str);
        let index = next.and_then(|n| n.parse::<usize>().ok());

        let (found, consumed): (Option<&'a Schema>, usize) = match keyword {
            "definitions" | "$defs" => (next.and_then(|name| object.definitions.get(name)), 2),
            "properties" => (next.and_then(|name| object.object.properties.get(name)), 2),
            "patternProperties" => (
                next.and_then(|source| {
                    object
                        .object
                        .pattern_properties
                        .iter()
                        .find(|(pattern, _)| pattern.as_str() == source)
                        .map(|(_, schema)| schema)
                }),
                2,
            ),
            "dependencies" | "dependentSchemas" => (
                next.and_then(|name| {
                    object.object.dependencies.iter().find_map(|(key, dependency)| match dependency {
                        Dependency::Schema(schema) if key == name => Some(&**schema),
                        _ => None,
                    })
                }),
                2,
            ),
            "items" => match &object.array.items {
                Some(Items::Single(schema)) => (Some(&**schema), 1),
                Some(Items::Tuple(list)) => match index {
                    Some(i) => (list.get(i), 2),
                    None => (object.array.additional_items.as_deref(), 1),
                },
                None => (None, 1),
            },
            "prefixItems" => match &object.array.items {
                Some(Items::Tuple(list)) => (index.and_then(|i| list.get(i)), 2),
                _ => (None, 2),
            },
            "additionalItems" => (object.array.additional_items.as_deref(), 1),
            "allOf" => (index.and_then(|i| object.composition.all_of.get(i)), 2),
            "anyOf" => (
                index.and_then(|i| object.composition.any_of.as_ref().and_then(|list| list.get(i))),
                2,
            ),
            "oneOf" => (
                index.and_then(|i| object.composition.one_of.as_ref().and_then(|list| list.get(i))),
                2,
            ),
            "not" => (object.composition.not.as_deref(), 1),
            "if" => (object.conditional.as_ref().map(|c| &*c.if_schema), 1),
            "then" => (
                object.conditional.as_ref().and_then(|c| c.then_schema.as_deref()),
                1,
            ),
            "else" => (
                object.conditional.as_ref().and_then(|c| c.else_schema.as_deref()),
                1,
            ),
            "additionalProperties" => (object.object.additional_properties.as_deref(), 1),
            "propertyNames" => (object.object.property_names.as_deref(), 1),
            "contains" => (object.array.contains.as_deref(), 1),
            _ => (None, 1),
        };

        current = found.ok_or_else(|| SchemaError::unresolvable(reference))?;
        position += consumed;
    }

    Ok(current)
}

/// Percent-decode a pointer segment, then undo `~1` and `~0` escapes
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    decoded.push(high << 4 | low);
                    i += 3;
                    continue;
                }
                _ => decoded.push(bytes[i]),
            }
        } else {
            decoded.push(bytes[i]);
        }
        i += 1;
    }
    let text = String::from_utf8(decoded).ok()?;
    Some(text.replace("~1", "/").replace("~0", "~"))
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
