// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;

fn analyze(expression: &str) -> AnalysisResult {
    Analyzer::with_standard_builtins().analyze(expression)
}

#[test]
fn for_binds_iteration_variable() {
    let result = analyze("for x in items return x + 1");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["items"]);
}

#[test]
fn iterable_is_evaluated_in_outer_scope() {
    // The `x` being iterated over is not the `x` being bound.
    let result = analyze("for x in x return x");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["x"]);
}

#[test]
fn multiple_iteration_clauses() {
    let result = analyze("for x in xs, y in ys return x + y + z");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["xs", "ys", "z"]);
}

#[test]
fn quantifier_binds_iteration_variable() {
    let result = analyze("every e in employees satisfies e.salary > limit");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["employees", "limit"]);
    assert_eq!(result.output_type, OutputType::Boolean);
}

#[test]
fn function_parameters_are_bound() {
    let result = analyze("function(a, b) a + b + c");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["c"]);
}

#[test]
fn filter_binds_item() {
    let result = analyze("xs[item > 2]");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["xs"]);
    assert_eq!(
        result.input_types["xs"],
        InputType::List {
            item_properties: vec![],
        }
    );
}

#[test]
fn filter_over_list_literal_binds_element_keys() {
    let result = analyze("[{grade: 1}, {grade: 2}][grade > 1]");
    assert!(result.valid);
    assert!(result.needed_inputs.is_empty());
    assert_eq!(result.output_type, OutputType::List);
}

#[test]
fn list_element_context_binds_nothing() {
    // Unlike a filtered list literal, a plain list does not put its
    // element keys in any scope.
    let result = analyze("[{a: 1, b: a}]");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["a"]);
}

#[test]
fn nested_context_values_see_outer_keys() {
    let result = analyze("{a: 1, b: {c: a, d: e}}");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["e"]);
}

#[test]
fn path_roots_respect_scope() {
    let result = analyze("for order in orders return order.total");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["orders"]);
}

#[test]
fn loop_body_is_not_a_filter_predicate() {
    // A bare name in a loop body nested inside a filter predicate is a
    // real reference, not an implicit item property.
    let result = analyze("xs[for v in item.vs return v + other]");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["other", "xs"]);
}

#[test]
fn inputs_are_sorted_and_deduplicated() {
    let result = analyze("zeta + alpha + zeta + mid.point + alpha");
    assert!(result.valid);
    assert_eq!(result.needed_inputs, ["alpha", "mid.point", "zeta"]);
}
