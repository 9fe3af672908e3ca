//! Integration tests for Schemaflow Core

use schemaflow_core::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn schema(document: Value) -> Schema {
    Schema::from_value(&document).expect("schema should parse")
}

fn person_schema() -> Schema {
    schema(json!({
        "type": "object",
        "properties": {"name": {"type": "string", "minLength": 3}},
        "required": ["name"]
    }))
}

#[test]
fn test_end_to_end_required_name() {
    init_tracing();
    let schema = person_schema();

    assert!(!validate(&json!({"name": "Jo"}), &schema, None, None).unwrap());
    assert!(validate(&json!({"name": "John"}), &schema, None, None).unwrap());
    assert!(!validate(&json!({}), &schema, None, None).unwrap());

    let errors = detailed_errors(&json!({}), &schema, None, None).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "name");
    assert_eq!(errors[0].code, ErrorCode::Required);
}

#[test]
fn test_exclusive_bounds_legacy_and_modern() {
    let legacy = schema(json!({"minimum": 10, "exclusiveMinimum": true}));
    let modern = schema(json!({"exclusiveMinimum": 10}));
    for s in [&legacy, &modern] {
        assert!(!validate(&json!(10), s, None, None).unwrap());
        assert!(validate(&json!(10.0001), s, None, None).unwrap());
    }
}

#[test]
fn test_one_of_exactly_one() {
    let s = schema(json!({"oneOf": [{"type": "number"}, {"type": "integer"}]}));
    assert!(!validate(&json!(1), &s, None, None).unwrap());
    assert!(validate(&json!(1.5), &s, None, None).unwrap());
    assert!(!validate(&json!("x"), &s, None, None).unwrap());
}

#[test]
fn test_contains() {
    let s = schema(json!({"contains": {"type": "string"}}));
    assert!(!validate(&json!([]), &s, None, None).unwrap());
    assert!(!validate(&json!([1, 2]), &s, None, None).unwrap());
    assert!(validate(&json!([1, "a"]), &s, None, None).unwrap());
}

#[test]
fn test_conditional_matches_branch_decisions() {
    let p = json!({"type": "string"});
    let t = json!({"minLength": 3});
    let e = json!({"minimum": 0});
    let with_else = schema(json!({"if": p.clone(), "then": t.clone(), "else": e.clone()}));
    let without_else = schema(json!({"if": p.clone(), "then": t.clone()}));

    for v in [json!("abcd"), json!("ab"), json!(5), json!(-5)] {
        let branch = if validate(&v, &schema(p.clone()), None, None).unwrap() {
            validate(&v, &schema(t.clone()), None, None).unwrap()
        } else {
            validate(&v, &schema(e.clone()), None, None).unwrap()
        };
        assert_eq!(validate(&v, &with_else, None, None).unwrap(), branch);
    }
    assert!(validate(&json!(-5), &without_else, None, None).unwrap());
}

#[test]
fn test_resolve_against_root_definitions() {
    let root = RootSchema::from_value(&json!({
        "type": "object",
        "properties": {"port": {"$ref": "#/definitions/port"}},
        "definitions": {"port": {"type": "integer", "minimum": 1, "maximum": 65535}}
    }))
    .unwrap();

    let port = resolve("#/definitions/port", &root).unwrap();
    assert_eq!(port.as_object().unwrap().types, Some(vec![SchemaType::Integer]));

    assert!(matches!(
        resolve("#/definitions/missing", &root),
        Err(SchemaError::UnresolvableReference { .. })
    ));
    assert!(matches!(
        resolve("http://external", &root),
        Err(SchemaError::UnsupportedReference { .. })
    ));

    assert!(validate(&json!({"port": 8080}), &root.schema, None, Some(&root)).unwrap());
    assert!(!validate(&json!({"port": 0}), &root.schema, None, Some(&root)).unwrap());
}

#[test]
fn test_unresolvable_reference_is_an_error_not_a_failure() {
    let s = schema(json!({"properties": {"a": {"$ref": "#/definitions/nope"}}}));
    assert!(validate(&json!({"b": 1}), &s, None, None).unwrap());
    let err = validate(&json!({"a": 1}), &s, None, None).unwrap_err();
    assert!(err.is_reference_error());
    assert!(detailed_errors(&json!({"a": 1}), &s, None, None).is_err());
}

#[test]
fn test_recursive_tree_schema() {
    let s = schema(json!({
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "children": {"type": "array", "items": {"$ref": "#"}}
        },
        "required": ["value"]
    }));
    let tree = json!({"value": 1, "children": [{"value": 2, "children": [{"value": 3}]}]});
    assert!(validate(&tree, &s, None, None).unwrap());

    let broken = json!({"value": 1, "children": [{"value": 2, "children": [{}]}]});
    let errors = detailed_errors(&broken, &s, None, None).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "children[0].children[0].value");
}

#[test]
fn test_reference_cycle_reports_recursion_limit() {
    let s = schema(json!({"allOf": [{"$ref": "#"}]}));
    let err = validate(&json!({}), &s, None, None).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::RecursionLimit {
            limit: DEFAULT_MAX_REFERENCE_DEPTH,
            ..
        }
    ));
}

#[test]
fn test_deep_linked_list_stays_valid() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let s = schema(json!({
                "type": "object",
                "properties": {"value": {"type": "integer"}, "next": {"$ref": "#"}}
            }));
            let mut list = json!({"value": 0});
            for i in 1..=320 {
                list = json!({"value": i, "next": list});
            }
            assert!(validate(&list, &s, None, None).unwrap());
            assert!(detailed_errors(&list, &s, None, None).unwrap().is_empty());

            let mut broken = json!({"value": "tail"});
            for i in 1..=320 {
                broken = json!({"value": i, "next": broken});
            }
            assert!(!validate(&broken, &s, None, None).unwrap());
            let errors = detailed_errors(&broken, &s, None, None).unwrap();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].path.ends_with("next.value"));
        })
        .unwrap();
    handle.join().unwrap();
}

#[test]
fn test_custom_format_overrides_builtin() {
    let s = schema(json!({"type": "string", "format": "email"}));
    let registry = FormatRegistry::new().with_format("email", |v: &str| v.ends_with("@corp.example"));

    assert!(validate(&json!("someone@elsewhere.org"), &s, None, None).unwrap());
    assert!(!validate(&json!("someone@elsewhere.org"), &s, Some(&registry), None).unwrap());
    assert!(validate(&json!("me@corp.example"), &s, Some(&registry), None).unwrap());
}

#[test]
fn test_unknown_format_policy() {
    let s = schema(json!({"format": "x-color"}));
    assert!(validate(&json!("anything"), &s, None, None).unwrap());

    let strict = FormatRegistry::new().with_policy(FormatPolicy::Strict);
    assert!(!validate(&json!("anything"), &s, Some(&strict), None).unwrap());

    let errors = detailed_errors(&json!("anything"), &s, Some(&strict), None).unwrap();
    assert_eq!(errors[0].code, ErrorCode::Format);
}

#[test]
fn test_specific_errors_restricts_to_subtree() {
    let s = schema(json!({
        "properties": {
            "server": {"properties": {"port": {"type": "integer"}, "host": {"format": "hostname"}}},
            "tags": {"items": {"type": "string"}}
        }
    }));
    let v = json!({"server": {"port": "80", "host": "-bad"}, "tags": [1]});

    let server = specific_errors(&v, &s, "server", None).unwrap();
    assert_eq!(server.len(), 2);
    assert!(server.iter().all(|e| e.path.starts_with("server.")));

    let tags = specific_errors(&v, &s, "tags", None).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].path, "tags[0]");

    assert_eq!(specific_errors(&v, &s, "", None).unwrap().len(), 3);
}

#[test]
fn test_schema_loads_from_yaml() {
    let document = r#"
type: object
properties:
  replicas:
    type: integer
    minimum: 1
required: [replicas]
"#;
    let s: Schema = serde_yaml::from_str(document).unwrap();
    assert!(validate(&json!({"replicas": 3}), &s, None, None).unwrap());
    assert!(!validate(&json!({"replicas": 0}), &s, None, None).unwrap());
}

#[test]
fn test_validator_is_shareable_across_threads() {
    let root = Arc::new(RootSchema::new(person_schema()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let root = Arc::clone(&root);
            std::thread::spawn(move || {
                let validator = Validator::new(&root);
                let name = "x".repeat(i + 1);
                validator.is_valid(&json!({ "name": name })).unwrap()
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, false, true, true]);
}

#[test]
fn test_options_from_toml_drive_validator() {
    let options = ValidationOptions::from_toml_str("validate_formats = false\nmax_reference_depth = 8").unwrap();
    let s = schema(json!({"format": "ipv4"}));
    let validator = Validator::for_schema(&s).with_options(options);
    assert!(validator.is_valid(&json!("not-an-ip")).unwrap());
}
