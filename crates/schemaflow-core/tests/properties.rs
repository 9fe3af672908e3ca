//! Property tests: determinism and agreement between the two traversals

use proptest::prelude::*;
use schemaflow_core::{detailed_errors, validate, Schema};
use serde_json::{json, Value};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(|n| json!(n)),
        (-50.0f64..50.0).prop_map(|n| json!(n)),
        "[a-z0-9@.]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]{1,2}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn fixture_schemas() -> Vec<Schema> {
    [
        json!({"type": "integer", "minimum": 0, "multipleOf": 3}),
        json!({"type": ["string", "null"], "minLength": 2, "format": "email"}),
        json!({
            "type": "object",
            "properties": {"a": {"type": "number", "exclusiveMaximum": 10}, "b": {"type": "array"}},
            "patternProperties": {"^c": {"type": "string"}},
            "additionalProperties": {"type": "boolean"},
            "required": ["a"]
        }),
        json!({"items": [{"type": "string"}], "additionalItems": false, "uniqueItems": true}),
        json!({"contains": {"type": "integer"}, "maxItems": 3}),
        json!({"oneOf": [{"type": "number"}, {"type": "integer"}, {"type": "object"}]}),
        json!({"anyOf": [{"type": "string"}, {"minimum": 5}], "not": {"const": 7}}),
        json!({
            "if": {"type": "object"},
            "then": {"propertyNames": {"maxLength": 1}, "minProperties": 1},
            "else": {"enum": [null, true, 1]}
        }),
        json!({"dependencies": {"a": ["b"], "c": {"maxProperties": 2}}}),
        json!({
            "definitions": {"node": {"type": ["object", "integer"], "additionalProperties": {"$ref": "#/definitions/node"}}},
            "$ref": "#/definitions/node"
        }),
    ]
    .iter()
    .map(|document| Schema::from_value(document).expect("fixture schema"))
    .collect()
}

proptest! {
    /// No detailed errors exactly when the direct validator accepts
    #[test]
    fn errors_empty_iff_valid(value in json_value(), index in 0usize..10) {
        let schemas = fixture_schemas();
        let schema = &schemas[index];
        let valid = validate(&value, schema, None, None).unwrap();
        let errors = detailed_errors(&value, schema, None, None).unwrap();
        prop_assert_eq!(errors.is_empty(), valid, "errors: {:?}", errors);
    }

    /// Repeated validation gives the same verdict
    #[test]
    fn validate_is_deterministic(value in json_value(), index in 0usize..10) {
        let schemas = fixture_schemas();
        let schema = &schemas[index];
        let first = validate(&value, schema, None, None).unwrap();
        let second = validate(&value, schema, None, None).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Legacy flag and modern numeric exclusive bounds agree
    #[test]
    fn exclusive_minimum_forms_agree(bound in -1000i64..1000, n in -1000.0f64..1000.0) {
        let legacy = Schema::from_value(&json!({"minimum": bound, "exclusiveMinimum": true})).unwrap();
        let modern = Schema::from_value(&json!({"exclusiveMinimum": bound})).unwrap();
        let expected = n > bound as f64;
        prop_assert_eq!(validate(&json!(n), &legacy, None, None).unwrap(), expected);
        prop_assert_eq!(validate(&json!(n), &modern, None, None).unwrap(), expected);
    }
}
