// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// A function the evaluation environment provides. Declared builtins are
/// excluded from the needed inputs, and multi-word builtin names
/// ("get or else") are recognized by the parser as single names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builtin {
    pub name: String,

    /// Parameter names, for callers that surface signatures. Not used by
    /// the analysis itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

impl Builtin {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            info: None,
        }
    }
}

// Names of the standard library functions defined by DMN plus the Camunda
// extensions, grouped by category.
const STANDARD_NAMES: &[&str] = &[
    // Conversion
    "date",
    "date and time",
    "time",
    "number",
    "string",
    "duration",
    "years and months duration",
    // Boolean
    "not",
    "is defined",
    "get or else",
    "assert",
    // String
    "substring",
    "string length",
    "upper case",
    "lower case",
    "substring before",
    "substring after",
    "replace",
    "contains",
    "starts with",
    "ends with",
    "matches",
    "split",
    "extract",
    // List
    "list contains",
    "count",
    "min",
    "max",
    "sum",
    "mean",
    "all",
    "any",
    "sublist",
    "append",
    "concatenate",
    "insert before",
    "remove",
    "reverse",
    "index of",
    "union",
    "distinct values",
    "flatten",
    "product",
    "median",
    "stddev",
    "mode",
    "string join",
    // Numeric
    "decimal",
    "floor",
    "ceiling",
    "round up",
    "round down",
    "round half up",
    "round half down",
    "abs",
    "modulo",
    "sqrt",
    "log",
    "exp",
    "odd",
    "even",
    "random number",
    // Range
    "before",
    "after",
    "meets",
    "met by",
    "overlaps",
    "overlaps before",
    "overlaps after",
    "finishes",
    "finished by",
    "includes",
    "during",
    "starts",
    "started by",
    "coincides",
    // Temporal
    "day of year",
    "day of week",
    "month of year",
    "week of year",
    "last day of month",
    "now",
    "today",
    // Context
    "get value",
    "get entries",
    "context",
    "context put",
    "context merge",
];

lazy_static! {
    static ref STANDARD: Vec<Builtin> = STANDARD_NAMES
        .iter()
        .map(|name| Builtin::named(*name))
        .collect();
}

/// The standard catalog. [`crate::Analyzer::with_standard_builtins`] uses
/// it; callers with a custom environment pass their own list instead.
pub fn standard() -> &'static [Builtin] {
    STANDARD.as_slice()
}
