// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::builtins::{self, Builtin};
use crate::inputs::InputCollector;
use crate::lexer::Source;
use crate::parser::{Dialect, Parser};
use crate::typing::{infer_output_type, InputType, OutputType, TypeInference};
use crate::value::Value;

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The static analyzer. Holds the configuration (dialect, declared
/// builtins, optional sample context) and analyzes expressions against
/// it. Construct one per configuration; `analyze` may be called any
/// number of times.
///
/// `analyze` never fails: malformed expressions produce a result with
/// `valid == false` and diagnostic messages instead of an error.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    dialect: Dialect,
    builtins: Vec<Builtin>,
    context: Option<Value>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An analyzer preloaded with the standard builtin catalog.
    pub fn with_standard_builtins() -> Self {
        let mut analyzer = Self::new();
        analyzer.set_builtins(builtins::standard().to_vec());
        analyzer
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// Declare the functions the evaluation environment provides. Their
    /// names are excluded from the needed inputs, and multi-word names
    /// are recognized by the parser as single names.
    pub fn set_builtins(&mut self, builtins: Vec<Builtin>) {
        self.builtins = builtins;
    }

    /// Supply a sample input context. It only sharpens the output type of
    /// expressions whose outermost node is a variable reference; input
    /// collection is unaffected.
    pub fn set_context(&mut self, context: Value) {
        self.context = Some(context);
    }

    pub fn analyze(&self, expression: &str) -> AnalysisResult {
        match self.parse(expression) {
            Ok(root) => self.analyze_tree(expression, &root),
            Err(err) => AnalysisResult {
                valid: false,
                expression: expression.to_string(),
                errors: vec![AnalysisError {
                    message: err.to_string(),
                }],
                needed_inputs: vec![],
                input_types: BTreeMap::new(),
                output_type: OutputType::Unknown,
            },
        }
    }

    fn parse(&self, expression: &str) -> Result<ExprRef> {
        let source = Source::from_expression(expression)?;
        let mut parser = Parser::new(&source)?;
        parser.set_dialect(self.dialect);
        for builtin in &self.builtins {
            parser.add_known_name(builtin.name.clone());
        }
        parser.parse_expression()
    }

    fn analyze_tree(&self, expression: &str, root: &ExprRef) -> AnalysisResult {
        let builtin_names: HashSet<String> =
            self.builtins.iter().map(|b| b.name.clone()).collect();

        let collected = InputCollector::new(&builtin_names).collect(root);
        let errors: Vec<AnalysisError> = collected
            .error_spans
            .iter()
            .map(|span| AnalysisError {
                message: span.message("error", "unparseable expression fragment"),
            })
            .collect();

        let input_types = TypeInference::new(&collected.inputs).infer(root);
        let output_type = infer_output_type(root, self.context.as_ref());

        AnalysisResult {
            valid: !collected.has_errors(),
            expression: expression.to_string(),
            errors,
            needed_inputs: collected.inputs,
            input_types,
            output_type,
        }
    }
}

/// Everything the analysis determined about one expression.
///
/// When the expression could not be parsed at all, `valid` is false, a
/// message describes the failure and the remaining fields are empty.
/// When the parser recovered from localized errors, `valid` is false but
/// the analysis of the healthy parts is still reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub valid: bool,

    /// The analyzed expression, verbatim.
    pub expression: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<AnalysisError>,

    /// External variables the expression reads, sorted, deduplicated,
    /// with dotted paths joined (`user.name`).
    pub needed_inputs: Vec<String>,

    /// Inferred shape of each root input variable.
    pub input_types: BTreeMap<String, InputType>,

    /// Coarse type of the expression's result.
    pub output_type: OutputType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisError {
    pub message: String,
}
