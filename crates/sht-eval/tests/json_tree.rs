/// Integration tests for trees handed over as JSON

use serde_json::json;
use sht_ast::Node;
use sht_eval::run;

fn decode(value: serde_json::Value) -> Node {
    Node::from_json(&value.to_string()).expect("tree should decode")
}

#[test]
fn test_function_with_default_from_json() {
    // fn add(a, b = 1) { a + b }; add(5)
    let tree = decode(json!({
        "block": [
            {"function_def": {
                "name": "add",
                "params": [{"name": "a"}, {"name": "b", "default": {"number": 1.0}}],
                "body": {"block": [
                    {"binary": {"operator": "+", "left": {"identifier": "a"}, "right": {"identifier": "b"}}}
                ]}
            }},
            {"call": {"target": {"identifier": "add"}, "arguments": [{"number": 5.0}]}}
        ]
    }));
    let result = run(&tree);
    assert!(result.is_ok(), "Run failed: {}", result.display);
    assert_eq!(result.display, "6");
}

#[test]
fn test_unit_nodes_from_json() {
    // let i = 0; for { i++; if i == 3 { break } }; i
    let tree = decode(json!({
        "block": [
            {"assignment": {"targets": [{"identifier": "i"}], "expression": {"number": 0.0}, "definition": true}},
            {"for": {"body": {"block": [
                {"postfix": {"operator": "++", "left": {"identifier": "i"}}},
                {"if": {
                    "condition": {"binary": {"operator": "==", "left": {"identifier": "i"}, "right": {"number": 3.0}}},
                    "then_body": {"block": ["break"]}
                }}
            ]}}},
            {"identifier": "i"}
        ]
    }));
    let result = run(&tree);
    assert!(result.is_ok(), "Run failed: {}", result.display);
    assert_eq!(result.display, "3");
}

#[test]
fn test_data_declaration_from_json() {
    let tree = decode(json!({
        "block": [
            {"data_def": {
                "name": "Point",
                "properties": [{"name": "x", "value": {"number": 2.0}}],
                "meta_functions": [{"function_def": {
                    "name": "repr",
                    "params": [{"name": "self"}],
                    "body": {"binary": {
                        "operator": "..",
                        "left": {"string": "P"},
                        "right": {"access": {"target": {"identifier": "self"}, "name": "x"}}
                    }}
                }}]
            }},
            {"call": {"target": {"identifier": "Point"}, "initializer": {"map": [["x", {"number": 7.0}]]}}}
        ]
    }));
    let result = run(&tree);
    assert!(result.is_ok(), "Run failed: {}", result.display);
    assert_eq!(result.display, "P7");
}

#[test]
fn test_malformed_tree_is_rejected() {
    let err = Node::from_json(r#"{"frobnicate": 1}"#).unwrap_err();
    assert!(err.to_string().starts_with("Malformed syntax tree"));
}
