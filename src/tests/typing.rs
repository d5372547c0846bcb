// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;

fn analyze(expression: &str) -> AnalysisResult {
    Analyzer::with_standard_builtins().analyze(expression)
}

fn list_of(properties: &[&str]) -> InputType {
    InputType::List {
        item_properties: properties.iter().map(|p| p.to_string()).collect(),
    }
}

#[test]
fn comparison_with_literal_types_variable() {
    let result = analyze("x = 1");
    assert_eq!(result.input_types["x"], InputType::Number);

    // Either side works.
    let result = analyze(r#""ready" = status"#);
    assert_eq!(result.input_types["status"], InputType::String);

    let result = analyze("flag != true");
    assert_eq!(result.input_types["flag"], InputType::Boolean);
}

#[test]
fn comparison_between_variables_types_nothing() {
    let result = analyze("x < y");
    assert_eq!(result.input_types["x"], InputType::Unknown);
    assert_eq!(result.input_types["y"], InputType::Unknown);
}

#[test]
fn first_evidence_wins() {
    let result = analyze(r#"x = "high" and x + 1 > 2"#);
    assert_eq!(result.input_types["x"], InputType::String);

    let result = analyze(r#"x + 1 > 2 and x = "high""#);
    assert_eq!(result.input_types["x"], InputType::Number);
}

#[test]
fn arithmetic_with_uniform_literals() {
    let result = analyze("a + b + 1");
    assert_eq!(result.input_types["a"], InputType::Number);
    assert_eq!(result.input_types["b"], InputType::Number);

    let result = analyze(r#"greeting + ", " + name"#);
    assert_eq!(result.input_types["greeting"], InputType::String);
    assert_eq!(result.input_types["name"], InputType::String);
}

#[test]
fn arithmetic_with_mixed_literals_types_nothing() {
    let result = analyze(r#"a + 1 + "s""#);
    assert_eq!(result.input_types["a"], InputType::Unknown);
}

#[test]
fn arithmetic_without_literals_types_nothing() {
    let result = analyze("price * quantity");
    assert_eq!(result.input_types["price"], InputType::Unknown);
    assert_eq!(result.input_types["quantity"], InputType::Unknown);
}

#[test]
fn path_root_stays_a_context() {
    // The dotted reference already shaped the root; the numeric evidence
    // does not overwrite it.
    let result = analyze("order.total * 2");
    assert_eq!(result.needed_inputs, ["order.total"]);
    let InputType::Context { properties } = &result.input_types["order"] else {
        panic!("expected context");
    };
    assert_eq!(properties["total"], InputType::Unknown);
}

#[test]
fn plain_and_dotted_references_combine() {
    let result = analyze("a = 1 and a.b");
    assert_eq!(result.needed_inputs, ["a", "a.b"]);
    let InputType::Context { properties } = &result.input_types["a"] else {
        panic!("expected context");
    };
    assert_eq!(properties["b"], InputType::Unknown);
}

#[test]
fn filter_types_base_as_list() {
    let result = analyze("xs[a > 1]");
    assert_eq!(result.input_types["xs"], list_of(&["a"]));
}

#[test]
fn filter_evidence_does_not_override_scalar() {
    let result = analyze(r#"xs = "s" and xs[p]"#);
    assert_eq!(result.input_types["xs"], InputType::String);
}

#[test]
fn item_properties_are_sorted_and_deduplicated() {
    let result = analyze("xs[b > 1 and a > 2 and b < 9]");
    assert_eq!(result.input_types["xs"], list_of(&["a", "b"]));
}

#[test]
fn item_properties_from_dotted_item_paths() {
    let result = analyze("xs[item.address.city = \"Rome\"]");
    assert_eq!(result.input_types["xs"], list_of(&["address.city"]));
}

#[test]
fn deeply_nested_paths() {
    let result = analyze("a.b.c + a.b.d");
    assert_eq!(result.needed_inputs, ["a.b.c", "a.b.d"]);

    let InputType::Context { properties } = &result.input_types["a"] else {
        panic!("expected context");
    };
    let InputType::Context { properties: inner } = &properties["b"] else {
        panic!("expected nested context");
    };
    assert_eq!(inner["c"], InputType::Unknown);
    assert_eq!(inner["d"], InputType::Unknown);
}

#[test]
fn output_type_of_arithmetic() {
    assert_eq!(analyze("1 + 2").output_type, OutputType::Number);
    assert_eq!(analyze(r#""a" + "b""#).output_type, OutputType::String);
    assert_eq!(analyze(r#"1 + "a""#).output_type, OutputType::Unknown);
    // A single typed operand decides.
    assert_eq!(analyze("1 + x").output_type, OutputType::Number);
}

#[test]
fn duplicate_context_keys_reported_once() {
    let result = analyze("{a: 1, a: 2}");
    assert_eq!(
        result.output_type,
        OutputType::Context {
            keys: vec!["a".to_string()],
        }
    );
}

#[test]
fn untracked_filter_bases() {
    // Filtering a path yields no list input and no implicit item
    // properties; names in the predicate are ordinary references.
    let result = analyze("a.b[c > 1] + d");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["c", "d"]);
}
