//! Typed schema model
//!
//! A schema document is parsed once into [`Schema`], a recursive structure
//! whose keywords are grouped by the kind of value they constrain. Keywords
//! this crate does not interpret are ignored; known keywords with the wrong
//! shape are rejected with [`SchemaError::InvalidSchema`].
//!
//! # Example
//!
//! ```rust
//! use schemaflow_core::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "type": "object",
//!     "properties": { "age": { "type": "integer", "minimum": 0 } },
//!     "required": ["age"]
//! })).unwrap();
//!
//! let object = schema.as_object().unwrap();
//! assert_eq!(object.object.required, vec!["age".to_string()]);
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::value;

/// Keywords the interpreter understands; anything else is ignored
const KNOWN_KEYWORDS: &[&str] = &[
    "$ref", "$schema", "$id", "$comment", "$defs", "definitions", "title", "description",
    "default", "examples", "type", "const", "enum", "minLength", "maxLength", "pattern",
    "format", "minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum", "multipleOf",
    "items", "prefixItems", "additionalItems", "minItems", "maxItems", "uniqueItems",
    "contains", "minContains", "maxContains", "properties", "patternProperties",
    "additionalProperties", "propertyNames", "required", "minProperties", "maxProperties",
    "dependencies", "dependentRequired", "dependentSchemas", "allOf", "anyOf", "oneOf", "not",
    "if", "then", "else",
];

/// Primitive type names accepted by `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SchemaType {
    /// Parse a type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(SchemaType::Null),
            "boolean" => Some(SchemaType::Boolean),
            "integer" => Some(SchemaType::Integer),
            "number" => Some(SchemaType::Number),
            "string" => Some(SchemaType::String),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            _ => None,
        }
    }

    /// Keyword spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Boolean => "boolean",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::String => "string",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// Check whether a value is an instance of this type
    ///
    /// `integer` requires a zero fractional part; NaN matches no numeric type.
    pub fn matches(&self, instance: &Value) -> bool {
        match self {
            SchemaType::Null => instance.is_null(),
            SchemaType::Boolean => instance.is_boolean(),
            SchemaType::Integer => value::as_number(instance).is_some() && value::is_integer(instance),
            SchemaType::Number => value::as_number(instance).is_some(),
            SchemaType::String => instance.is_string(),
            SchemaType::Array => instance.is_array(),
            SchemaType::Object => instance.is_object(),
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered name to schema map; keeps declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMap(Vec<(String, Schema)>);

impl SchemaMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = schema,
            None => self.0.push((name, schema)),
        }
    }

    /// Look up a schema by name
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, schema)| schema)
    }

    /// Check whether a name is declared
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(key, schema)| (key.as_str(), schema))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Schema)> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        let mut map = SchemaMap::new();
        for (name, schema) in iter {
            map.insert(name, schema);
        }
        map
    }
}

/// A compiled regular expression that compares by its source text
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern
    pub fn new(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Pattern)
            .map_err(|e| SchemaError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })
    }

    /// Unanchored search, as schema patterns are
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// Source text of the pattern
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// A numeric bound with its exclusivity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub exclusive: bool,
}

impl Bound {
    /// Bound that admits its own value
    pub fn inclusive(value: f64) -> Self {
        Self { value, exclusive: false }
    }

    /// Bound that rejects its own value
    pub fn exclusive(value: f64) -> Self {
        Self { value, exclusive: true }
    }

    /// Whether `n` satisfies this bound used as a minimum
    pub fn admits_min(&self, n: f64) -> bool {
        if self.exclusive {
            n > self.value
        } else {
            n >= self.value
        }
    }

    /// Whether `n` satisfies this bound used as a maximum
    pub fn admits_max(&self, n: f64) -> bool {
        if self.exclusive {
            n < self.value
        } else {
            n <= self.value
        }
    }
}

/// `exclusiveMinimum`/`exclusiveMaximum` in either of their two spellings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExclusiveBound {
    /// Legacy boolean flag modifying `minimum`/`maximum`
    Flag(bool),
    /// Standalone exclusive limit
    Value(f64),
}

/// String keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub format: Option<String>,
}

impl StringConstraints {
    /// Whether no string keyword is present
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.format.is_none()
    }
}

/// Number keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberConstraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub multiple_of: Option<f64>,
}

impl NumberConstraints {
    /// Whether no number keyword is present
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.multiple_of.is_none()
    }

    /// Effective lower bound
    ///
    /// A boolean `exclusiveMinimum` modifies `minimum`. A numeric one is an
    /// independent limit; when both limits exist the tighter one is kept.
    pub fn lower_bound(&self) -> Option<Bound> {
        match (self.minimum, self.exclusive_minimum) {
            (Some(min), Some(ExclusiveBound::Flag(flag))) => Some(Bound { value: min, exclusive: flag }),
            (None, Some(ExclusiveBound::Flag(_))) => None,
            (Some(min), Some(ExclusiveBound::Value(limit))) if min > limit => Some(Bound::inclusive(min)),
            (_, Some(ExclusiveBound::Value(limit))) => Some(Bound::exclusive(limit)),
            (Some(min), None) => Some(Bound::inclusive(min)),
            (None, None) => None,
        }
    }

    /// Effective upper bound, mirroring [`lower_bound`](Self::lower_bound)
    pub fn upper_bound(&self) -> Option<Bound> {
        match (self.maximum, self.exclusive_maximum) {
            (Some(max), Some(ExclusiveBound::Flag(flag))) => Some(Bound { value: max, exclusive: flag }),
            (None, Some(ExclusiveBound::Flag(_))) => None,
            (Some(max), Some(ExclusiveBound::Value(limit))) if max < limit => Some(Bound::inclusive(max)),
            (_, Some(ExclusiveBound::Value(limit))) => Some(Bound::exclusive(limit)),
            (Some(max), None) => Some(Bound::inclusive(max)),
            (None, None) => None,
        }
    }
}

/// `items` in its single-schema or positional form
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    Single(Box<Schema>),
    Tuple(Vec<Schema>),
}

/// Array keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayConstraints {
    pub items: Option<Items>,
    /// Applies past the tuple length; only meaningful with [`Items::Tuple`]
    pub additional_items: Option<Box<Schema>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<Box<Schema>>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,
}

impl ArrayConstraints {
    /// Whether no array keyword is present
    pub fn is_empty(&self) -> bool {
        self.items.is_none()
            && self.additional_items.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique_items
            && self.contains.is_none()
            && self.min_contains.is_none()
            && self.max_contains.is_none()
    }
}

/// A `dependencies` entry
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// Sibling members that must be present
    Required(Vec<String>),
    /// Schema the whole object must satisfy
    Schema(Box<Schema>),
}

/// Object keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectConstraints {
    pub properties: SchemaMap,
    pub pattern_properties: Vec<(Pattern, Schema)>,
    pub additional_properties: Option<Box<Schema>>,
    pub property_names: Option<Box<Schema>>,
    pub required: Vec<String>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: Vec<(String, Dependency)>,
}

impl ObjectConstraints {
    /// Whether no object keyword is present
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.pattern_properties.is_empty()
            && self.additional_properties.is_none()
            && self.property_names.is_none()
            && self.required.is_empty()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.dependencies.is_empty()
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub all_of: Vec<Schema>,
    pub any_of: Option<Vec<Schema>>,
    pub one_of: Option<Vec<Schema>>,
    pub not: Option<Box<Schema>>,
}

impl Composition {
    /// Whether no combinator is present
    pub fn is_empty(&self) -> bool {
        self.all_of.is_empty() && self.any_of.is_none() && self.one_of.is_none() && self.not.is_none()
    }
}

/// `if`/`then`/`else`; absent unless `if` is declared
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub if_schema: Box<Schema>,
    pub then_schema: Option<Box<Schema>>,
    pub else_schema: Option<Box<Schema>>,
}

/// The keyword groups of a non-boolean schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaObject {
    /// `$ref`; when set, every other keyword is ignored
    pub reference: Option<String>,
    pub types: Option<Vec<SchemaType>>,
    pub const_value: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub string: StringConstraints,
    pub number: NumberConstraints,
    pub array: ArrayConstraints,
    pub object: ObjectConstraints,
    pub composition: Composition,
    pub conditional: Option<Conditional>,
    /// `definitions` and `$defs`, merged
    pub definitions: SchemaMap,
}

impl SchemaObject {
    /// Whether the schema allows `null` through its `type`
    pub fn allows_null(&self) -> bool {
        self.types
            .as_ref()
            .map_or(true, |types| types.contains(&SchemaType::Null))
    }
}

/// A schema: either a boolean schema or a keyword object
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// `true` accepts every value, `false` none
    Boolean(bool),
    Object(Box<SchemaObject>),
}

impl Default for Schema {
    fn default() -> Self {
        Schema::Boolean(true)
    }
}

impl Schema {
    /// Parse a schema document
    pub fn from_value(document: &Value) -> Result<Self> {
        parse_schema(document, "#")
    }

    /// Parse a schema from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;
        Self::from_value(&document)
    }

    /// Keyword groups, if this is not a boolean schema
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Object(object) => Some(object),
            Schema::Boolean(_) => None,
        }
    }

    /// The `$ref` of this schema, if any
    pub fn reference(&self) -> Option<&str> {
        self.as_object().and_then(|object| object.reference.as_deref())
    }

    /// Whether this is the `false` schema
    pub fn is_false(&self) -> bool {
        matches!(self, Schema::Boolean(false))
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(document: &Value) -> Result<Self> {
        Schema::from_value(document)
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(document: Value) -> Result<Self> {
        Schema::from_value(&document)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Value::deserialize(deserializer)?;
        Schema::from_value(&document).map_err(serde::de::Error::custom)
    }
}

/// A top-level schema plus extra definitions that references may target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootSchema {
    pub schema: Schema,
    /// Consulted before the schema's own `definitions` for `#/definitions/...`
    pub definitions: SchemaMap,
}

impl RootSchema {
    /// Wrap a schema with no extra definitions
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            definitions: SchemaMap::new(),
        }
    }

    /// Parse a root schema document
    pub fn from_value(document: &Value) -> Result<Self> {
        Ok(Self::new(Schema::from_value(document)?))
    }

    /// Add an addressable definition
    pub fn with_definition(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.definitions.insert(name, schema);
        self
    }
}

impl From<Schema> for RootSchema {
    fn from(schema: Schema) -> Self {
        RootSchema::new(schema)
    }
}

impl<'de> Deserialize<'de> for RootSchema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Schema::deserialize(deserializer).map(RootSchema::new)
    }
}

fn parse_schema(document: &Value, at: &str) -> Result<Schema> {
    match document {
        Value::Bool(flag) => Ok(Schema::Boolean(*flag)),
        Value::Object(map) => parse_object(map, at).map(|object| Schema::Object(Box::new(object))),
        other => Err(SchemaError::invalid(
            at,
            format!("expected an object or boolean, found {}", value::ValueKind::of(other)),
        )),
    }
}

fn parse_object(map: &Map<String, Value>, at: &str) -> Result<SchemaObject> {
    for key in map.keys() {
        if !KNOWN_KEYWORDS.contains(&key.as_str()) {
            tracing::trace!(keyword = %key, location = %at, "Ignoring unsupported schema keyword");
        }
    }

    let mut object = SchemaObject {
        reference: get_str(map, "$ref", at)?.map(str::to_string),
        types: parse_types(map, at)?,
        const_value: map.get("const").cloned(),
        enum_values: match map.get("enum") {
            None => None,
            Some(Value::Array(values)) => Some(values.clone()),
            Some(_) => return Err(SchemaError::invalid(child(at, "enum"), "expected an array")),
        },
        ..Default::default()
    };

    object.string = StringConstraints {
        min_length: get_u64(map, "minLength", at)?,
        max_length: get_u64(map, "maxLength", at)?,
        pattern: get_str(map, "pattern", at)?.map(Pattern::new).transpose()?,
        format: get_str(map, "format", at)?.map(str::to_string),
    };

    object.number = NumberConstraints {
        minimum: get_f64(map, "minimum", at)?,
        maximum: get_f64(map, "maximum", at)?,
        exclusive_minimum: get_exclusive(map, "exclusiveMinimum", at)?,
        exclusive_maximum: get_exclusive(map, "exclusiveMaximum", at)?,
        multiple_of: get_f64(map, "multipleOf", at)?,
    };
    if let Some(divisor) = object.number.multiple_of {
        if divisor <= 0.0 {
            return Err(SchemaError::invalid(child(at, "multipleOf"), "must be greater than 0"));
        }
    }

    object.array = parse_array(map, at)?;
    object.object = parse_object_keywords(map, at)?;

    object.composition = Composition {
        all_of: get_schema_list(map, "allOf", at)?.unwrap_or_default(),
        any_of: get_schema_list(map, "anyOf", at)?,
        one_of: get_schema_list(map, "oneOf", at)?,
        not: get_schema(map, "not", at)?,
    };

    object.conditional = match get_schema(map, "if", at)? {
        Some(if_schema) => Some(Conditional {
            if_schema,
            then_schema: get_schema(map, "then", at)?,
            else_schema: get_schema(map, "else", at)?,
        }),
        None => None,
    };

    for keyword in ["definitions", "$defs"] {
        if let Some(definitions) = get_schema_map(map, keyword, at)? {
            for (name, schema) in definitions.0 {
                object.definitions.insert(name, schema);
            }
        }
    }

    Ok(object)
}

fn parse_types(map: &Map<String, Value>, at: &str) -> Result<Option<Vec<SchemaType>>> {
    let parse_name = |name: &str| {
        SchemaType::from_name(name)
            .ok_or_else(|| SchemaError::invalid(child(at, "type"), format!("unknown type '{}'", name)))
    };
    match map.get("type") {
        None => Ok(None),
        Some(Value::String(name)) => Ok(Some(vec![parse_name(name)?])),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| match name {
                Value::String(name) => parse_name(name),
                _ => Err(SchemaError::invalid(child(at, "type"), "type names must be strings")),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(SchemaError::invalid(child(at, "type"), "expected a string or an array")),
    }
}

fn parse_array(map: &Map<String, Value>, at: &str) -> Result<ArrayConstraints> {
    let (items, additional_items) = if let Some(prefix) = get_schema_list(map, "prefixItems", at)? {
        (Some(Items::Tuple(prefix)), get_schema(map, "items", at)?)
    } else {
        match map.get("items") {
            None => (None, None),
            Some(Value::Array(_)) => (
                get_schema_list(map, "items", at)?.map(Items::Tuple),
                get_schema(map, "additionalItems", at)?,
            ),
            Some(_) => (get_schema(map, "items", at)?.map(Items::Single), None),
        }
    };

    Ok(ArrayConstraints {
        items,
        additional_items,
        min_items: get_u64(map, "minItems", at)?,
        max_items: get_u64(map, "maxItems", at)?,
        unique_items: get_bool(map, "uniqueItems", at)?.unwrap_or(false),
        contains: get_schema(map, "contains", at)?,
        min_contains: get_u64(map, "minContains", at)?,
        max_contains: get_u64(map, "maxContains", at)?,
    })
}

fn parse_object_keywords(map: &Map<String, Value>, at: &str) -> Result<ObjectConstraints> {
    let pattern_properties = match get_schema_map(map, "patternProperties", at)? {
        Some(entries) => entries
            .0
            .into_iter()
            .map(|(source, schema)| Pattern::new(&source).map(|pattern| (pattern, schema)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let mut dependencies = Vec::new();
    if let Some(value) = map.get("dependencies") {
        let entries = value
            .as_object()
            .ok_or_else(|| SchemaError::invalid(child(at, "dependencies"), "expected an object"))?;
        let location = child(at, "dependencies");
        for (name, entry) in entries {
            let dependency = match entry {
                Value::Array(_) => Dependency::Required(get_string_list_value(entry, &child(&location, name))?),
                _ => Dependency::Schema(Box::new(parse_schema(entry, &child(&location, name))?)),
            };
            dependencies.push((name.clone(), dependency));
        }
    }
    if let Some(value) = map.get("dependentRequired") {
        let entries = value
            .as_object()
            .ok_or_else(|| SchemaError::invalid(child(at, "dependentRequired"), "expected an object"))?;
        for (name, entry) in entries {
            let members = get_string_list_value(entry, &child(&child(at, "dependentRequired"), name))?;
            dependencies.push((name.clone(), Dependency::Required(members)));
        }
    }
    if let Some(entries) = get_schema_map(map, "dependentSchemas", at)? {
        for (name, schema) in entries.0 {
            dependencies.push((name, Dependency::Schema(Box::new(schema))));
        }
    }

    Ok(ObjectConstraints {
        properties: get_schema_map(map, "properties", at)?.unwrap_or_default(),
        pattern_properties,
        additional_properties: get_schema(map, "additionalProperties", at)?,
        property_names: get_schema(map, "propertyNames", at)?,
        required: match map.get("required") {
            Some(value) => get_string_list_value(value, &child(at, "required"))?,
            None => Vec::new(),
        },
        min_properties: get_u64(map, "minProperties", at)?,
        max_properties: get_u64(map, "maxProperties", at)?,
        dependencies,
    })
}

fn child(at: &str, segment: &str) -> String {
    format!("{}/{}", at, segment)
}

fn get_str<'a>(map: &'a Map<String, Value>, key: &str, at: &str) -> Result<Option<&'a str>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(SchemaError::invalid(child(at, key), "expected a string")),
    }
}

fn get_bool(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(SchemaError::invalid(child(at, key), "expected a boolean")),
    }
}

fn get_f64(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<f64>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value::as_number(value)
            .map(Some)
            .ok_or_else(|| SchemaError::invalid(child(at, key), "expected a number")),
    }
}

fn get_u64(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) => Ok(Some(n)),
            None => match value.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
                _ => Err(SchemaError::invalid(child(at, key), "expected a non-negative integer")),
            },
        },
    }
}

fn get_exclusive(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<ExclusiveBound>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(ExclusiveBound::Flag(*flag))),
        Some(value) => value::as_number(value)
            .map(|limit| Some(ExclusiveBound::Value(limit)))
            .ok_or_else(|| SchemaError::invalid(child(at, key), "expected a number or a boolean")),
    }
}

fn get_schema(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<Box<Schema>>> {
    map.get(key)
        .map(|value| parse_schema(value, &child(at, key)).map(Box::new))
        .transpose()
}

fn get_schema_list(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<Vec<Schema>>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Array(values)) => {
            let location = child(at, key);
            values
                .iter()
                .enumerate()
                .map(|(i, value)| parse_schema(value, &child(&location, &i.to_string())))
                .collect::<Result<Vec<_>>>()
                .map(Some)
        }
        Some(_) => Err(SchemaError::invalid(child(at, key), "expected an array of schemas")),
    }
}

fn get_schema_map(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<SchemaMap>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Object(entries)) => {
            let location = child(at, key);
            entries
                .iter()
                .map(|(name, value)| {
                    parse_schema(value, &child(&location, name)).map(|schema| (name.clone(), schema))
                })
                .collect::<Result<SchemaMap>>()
                .map(Some)
        }
        Some(_) => Err(SchemaError::invalid(child(at, key), "expected an object of schemas")),
    }
}

fn get_string_list_value(value: &Value, at: &str) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::invalid(at, "expected an array of strings"))
            })
            .collect(),
        _ => Err(SchemaError::invalid(at, "expected an array of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_boolean_schemas() {
        assert_eq!(Schema::from_value(&json!(true)).unwrap(), Schema::Boolean(true));
        assert!(Schema::from_value(&json!(false)).unwrap().is_false());
        assert!(Schema::from_value(&json!(42)).is_err());
    }

    #[test]
    fn test_parse_type_list() {
        let schema = Schema::from_value(&json!({"type": ["string", "null"]})).unwrap();
        let object = schema.as_object().unwrap();
        assert_eq!(object.types, Some(vec![SchemaType::String, SchemaType::Null]));
        assert!(object.allows_null());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = Schema::from_value(&json!({"type": "any"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Schema::from_value(&json!({"pattern": "(unclosed"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_legacy_and_modern_bounds() {
        let legacy = Schema::from_value(&json!({"minimum": 10, "exclusiveMinimum": true})).unwrap();
        assert_eq!(
            legacy.as_object().unwrap().number.lower_bound(),
            Some(Bound::exclusive(10.0))
        );

        let modern = Schema::from_value(&json!({"exclusiveMaximum": 5})).unwrap();
        assert_eq!(
            modern.as_object().unwrap().number.upper_bound(),
            Some(Bound::exclusive(5.0))
        );

        let both = Schema::from_value(&json!({"minimum": 7, "exclusiveMinimum": 3})).unwrap();
        assert_eq!(both.as_object().unwrap().number.lower_bound(), Some(Bound::inclusive(7.0)));

        let flag_only = Schema::from_value(&json!({"exclusiveMaximum": true})).unwrap();
        assert_eq!(flag_only.as_object().unwrap().number.upper_bound(), None);
    }

    #[test]
    fn test_tuple_forms() {
        let draft7 = Schema::from_value(&json!({
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": false
        }))
        .unwrap();
        let array = &draft7.as_object().unwrap().array;
        assert!(matches!(array.items, Some(Items::Tuple(ref items)) if items.len() == 2));
        assert!(array.additional_items.as_ref().unwrap().is_false());

        let prefixed = Schema::from_value(&json!({
            "prefixItems": [{"type": "string"}],
            "items": false
        }))
        .unwrap();
        let array = &prefixed.as_object().unwrap().array;
        assert!(matches!(array.items, Some(Items::Tuple(ref items)) if items.len() == 1));
        assert!(array.additional_items.as_ref().unwrap().is_false());
    }

    #[test]
    fn test_contains_bounds_make_array_group_non_empty() {
        let schema = Schema::from_value(&json!({"minContains": 2})).unwrap();
        assert!(!schema.as_object().unwrap().array.is_empty());
        assert!(ArrayConstraints::default().is_empty());
    }

    #[test]
    fn test_parse_from_json_text() {
        let schema = Schema::from_json_str(r#"{"type": "string", "maxLength": 4}"#).unwrap();
        assert_eq!(schema.as_object().unwrap().string.max_length, Some(4));

        assert!(matches!(
            Schema::from_json_str("{\"type\": "),
            Err(SchemaError::InvalidSchema { ref keyword, .. }) if keyword == "$"
        ));
    }

    #[test]
    fn test_properties_keep_declaration_order() {
        let schema = Schema::from_value(&json!({
            "properties": {"zeta": {}, "alpha": {}, "mid": {}}
        }))
        .unwrap();
        let names: Vec<&str> = schema
            .as_object()
            .unwrap()
            .object
            .properties
            .iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_dependencies_forms() {
        let schema = Schema::from_value(&json!({
            "dependencies": {"card": ["billing"], "vip": {"required": ["tier"]}},
            "dependentRequired": {"a": ["b"]}
        }))
        .unwrap();
        let deps = &schema.as_object().unwrap().object.dependencies;
        assert_eq!(deps.len(), 3);
        assert!(matches!(&deps[0].1, Dependency::Required(m) if m == &vec!["billing".to_string()]));
        assert!(matches!(&deps[1].1, Dependency::Schema(_)));
    }

    #[test]
    fn test_definitions_are_merged() {
        let schema = Schema::from_value(&json!({
            "definitions": {"a": {"type": "string"}},
            "$defs": {"b": {"type": "number"}}
        }))
        .unwrap();
        let definitions = &schema.as_object().unwrap().definitions;
        assert!(definitions.contains_key("a"));
        assert!(definitions.contains_key("b"));
    }

    #[test]
    fn test_deserialize_schema_from_yaml() {
        let schema: Schema = serde_yaml::from_str("type: string\nminLength: 2\n").unwrap();
        assert_eq!(schema.as_object().unwrap().string.min_length, Some(2));
    }

    #[test]
    fn test_multiple_of_must_be_positive() {
        assert!(Schema::from_value(&json!({"multipleOf": 0})).is_err());
    }
}
