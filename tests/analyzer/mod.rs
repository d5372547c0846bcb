// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;
use std::env;

use anyhow::{bail, Result};
use feel_analyzer::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
struct Case {
    note: String,
    expression: String,

    dialect: Option<Dialect>,
    /// Builtin names to declare. "standard" in the list pulls in the
    /// whole standard catalog.
    builtins: Option<Vec<String>>,
    context: Option<Value>,

    valid: Option<bool>,
    error: Option<String>,
    needed_inputs: Option<Vec<String>>,
    input_types: Option<BTreeMap<String, InputType>>,
    output_type: Option<OutputType>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn analyzer_for(case: &Case) -> Analyzer {
    let mut analyzer = match &case.builtins {
        None => Analyzer::with_standard_builtins(),
        Some(names) => {
            let mut list: Vec<Builtin> = vec![];
            for name in names {
                if name == "standard" {
                    list.extend(builtins::standard().iter().cloned());
                } else {
                    list.push(Builtin::named(name.clone()));
                }
            }
            let mut analyzer = Analyzer::new();
            analyzer.set_builtins(list);
            analyzer
        }
    };
    if let Some(dialect) = case.dialect {
        analyzer.set_dialect(dialect);
    }
    if let Some(context) = &case.context {
        analyzer.set_context(context.clone());
    }
    analyzer
}

fn check_case(case: &Case) -> Result<()> {
    let result = analyzer_for(case).analyze(&case.expression);

    if let Some(valid) = case.valid {
        assert_eq!(result.valid, valid, "valid mismatch: {result:#?}");
    }

    if let Some(expected) = &case.error {
        let found = result
            .errors
            .iter()
            .any(|e| e.message.contains(expected.as_str()));
        if !found {
            bail!(
                "no error message containing `{}` in {:#?}",
                expected,
                result.errors
            );
        }
    }

    if let Some(inputs) = &case.needed_inputs {
        assert_eq!(&result.needed_inputs, inputs, "inputs mismatch");
    }

    if let Some(types) = &case.input_types {
        assert_eq!(&result.input_types, types, "input types mismatch");
    }

    if let Some(output) = &case.output_type {
        assert_eq!(&result.output_type, output, "output type mismatch");
    }

    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        check_case(case)?;
        println!("passed");
    }

    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for use by scripts/yaml-test-analyze"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    if file.is_empty() {
        bail!("missing yaml test file");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/analyzer/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
