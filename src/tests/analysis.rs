// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;

use anyhow::Result;

fn analyze(expression: &str) -> AnalysisResult {
    Analyzer::with_standard_builtins().analyze(expression)
}

#[test]
fn two_free_variables() {
    let result = analyze("firstName + lastName");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["firstName", "lastName"]);
    assert_eq!(result.input_types["firstName"], InputType::Unknown);
    assert_eq!(result.input_types["lastName"], InputType::Unknown);
    assert_eq!(result.output_type, OutputType::Unknown);
}

#[test]
fn string_concatenation_types_operand() {
    let result = analyze(r#""Hello, " + name"#);
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["name"]);
    assert_eq!(result.input_types["name"], InputType::String);
    assert_eq!(result.output_type, OutputType::String);
}

#[test]
fn dotted_paths_become_nested_contexts() {
    let result = analyze(r#"user.age > 18 and user.name != "admin""#);
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["user.age", "user.name"]);

    let InputType::Context { properties } = &result.input_types["user"] else {
        panic!("expected context, got {:?}", result.input_types["user"]);
    };
    assert_eq!(properties["age"], InputType::Unknown);
    assert_eq!(properties["name"], InputType::Unknown);
}

#[test]
fn filter_collects_item_properties() {
    let result = analyze("applicants[age > 21]");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["applicants"]);
    assert_eq!(
        result.input_types["applicants"],
        InputType::List {
            item_properties: vec!["age".to_string()],
        }
    );
    assert_eq!(result.output_type, OutputType::List);
}

#[test]
fn explicit_item_reference_in_filter() {
    let result = analyze("orders[item.total > 100]");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["orders"]);
    assert_eq!(
        result.input_types["orders"],
        InputType::List {
            item_properties: vec!["total".to_string()],
        }
    );
}

#[test]
fn context_keys_bind_forward_only() {
    let result = analyze("{a: 1, b: a + c}");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["c"]);
    assert_eq!(
        result.output_type,
        OutputType::Context {
            keys: vec!["a".to_string(), "b".to_string()],
        }
    );

    // `b` may not see itself or later keys.
    let result = analyze("{a: b, b: 2}");
    assert_eq!(result.needed_inputs, ["b"]);
}

#[test]
fn builtins_are_not_inputs() {
    let result = analyze("abs(x)");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["x"]);

    // A bare reference to a builtin name is suppressed too.
    let result = analyze("if defined then abs else floor");
    assert!(result.needed_inputs.contains(&"defined".to_string()));
    assert!(!result.needed_inputs.contains(&"abs".to_string()));
    assert!(!result.needed_inputs.contains(&"floor".to_string()));
}

#[test]
fn multiword_builtin_parses_as_one_name() {
    let result = analyze(r#"get or else(value, "fallback")"#);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(result.needed_inputs, ["value"]);

    // Without the declaration the same text does not parse cleanly.
    let result = Analyzer::new().analyze(r#"get or else(value, "fallback")"#);
    assert!(!result.valid);
}

#[test]
fn backtick_names() {
    let result = analyze("`first name` + `last name`");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["first name", "last name"]);
}

#[test]
fn backtick_names_rejected_outside_camunda() {
    let mut analyzer = Analyzer::with_standard_builtins();
    analyzer.set_dialect(Dialect::Standard);
    let result = analyzer.analyze("`first name`");
    assert!(!result.valid);
    assert!(result.errors[0].message.contains("backtick"));
    assert!(result.needed_inputs.is_empty());
}

#[test]
fn parse_failure_reports_message() {
    let result = analyze("if x then 1");
    assert!(!result.valid);
    assert!(result.errors[0].message.contains("expecting `else`"));
    assert!(result.needed_inputs.is_empty());
    assert!(result.input_types.is_empty());
    assert_eq!(result.output_type, OutputType::Unknown);
}

#[test]
fn recovered_error_keeps_partial_analysis() {
    let result = analyze("(a + )");
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.needed_inputs, ["a"]);
    assert_eq!(result.output_type, OutputType::Unknown);
}

#[test]
fn lone_reserved_word_is_an_error() {
    let result = analyze("return");
    assert!(!result.valid);
    assert!(result.needed_inputs.is_empty());
}

#[test]
fn output_classified_from_sample_context() -> Result<()> {
    let mut analyzer = Analyzer::with_standard_builtins();
    analyzer.set_context(Value::from_json_str(
        r#"{
            "user": {"name": "alice", "age": 30},
            "tags": ["a", "b"],
            "count": 3,
            "active": true,
            "label": "x"
        }"#,
    )?);

    assert_eq!(
        analyzer.analyze("user").output_type,
        OutputType::Context {
            keys: vec!["age".to_string(), "name".to_string()],
        }
    );
    assert_eq!(analyzer.analyze("tags").output_type, OutputType::List);
    assert_eq!(analyzer.analyze("count").output_type, OutputType::Number);
    assert_eq!(analyzer.analyze("active").output_type, OutputType::Boolean);
    assert_eq!(analyzer.analyze("label").output_type, OutputType::String);
    assert_eq!(analyzer.analyze("missing").output_type, OutputType::Unknown);
    Ok(())
}

#[test]
fn output_classified_from_syntax() {
    assert_eq!(analyze("1").output_type, OutputType::Number);
    assert_eq!(analyze(r#""x""#).output_type, OutputType::String);
    assert_eq!(analyze("true").output_type, OutputType::Boolean);
    assert_eq!(analyze("[1, 2]").output_type, OutputType::List);
    assert_eq!(analyze("x = 1").output_type, OutputType::Boolean);
    assert_eq!(
        analyze("some x in xs satisfies x > 1").output_type,
        OutputType::Boolean
    );
    assert_eq!(analyze("a.b").output_type, OutputType::Value);
    assert_eq!(
        analyze("{a: 1}").output_type,
        OutputType::Context {
            keys: vec!["a".to_string()],
        }
    );
}

#[test]
fn analysis_is_repeatable() -> Result<()> {
    let analyzer = Analyzer::with_standard_builtins();
    let first = serde_json::to_string(&analyzer.analyze("users[age > 21] and user.name"))?;
    let second = serde_json::to_string(&analyzer.analyze("users[age > 21] and user.name"))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn result_serialization_shape() -> Result<()> {
    let result = analyze("applicants[age > 21]");
    let json = serde_json::to_value(&result)?;
    assert_eq!(json["valid"], serde_json::json!(true));
    assert_eq!(json["neededInputs"], serde_json::json!(["applicants"]));
    assert_eq!(
        json["inputTypes"]["applicants"],
        serde_json::json!({"type": "list", "itemProperties": ["age"]})
    );
    assert_eq!(json["outputType"], serde_json::json!({"type": "list"}));
    Ok(())
}
