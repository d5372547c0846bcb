// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![doc = include_str!("../README.md")]

mod analyzer;
mod ast;
pub mod builtins;
mod inputs;
mod lexer;
mod parser;
mod scope;
mod typing;
mod value;
mod visitor;

pub use analyzer::{AnalysisError, AnalysisResult, Analyzer};
pub use builtins::Builtin;
pub use parser::Dialect;
pub use typing::{InputType, OutputType};
pub use value::Value;

/// Lower-level access to the expression machinery: source handling,
/// lexer, parser and syntax tree. No stability guarantees; the
/// [`Analyzer`] interface is the supported surface.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
    pub use crate::scope::*;
    pub use crate::visitor::*;
}

#[cfg(test)]
mod tests;
