// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::Span;
use crate::scope::ScopeStack;
use crate::visitor::{FilterContext, NodeSink, ScopedWalker};

use std::collections::{BTreeSet, HashSet};

/// Collects the distinct external variable references of an expression:
/// names that are not bound by any enclosing construct, not declared
/// builtins, and not the implicit `item` of a filter predicate. Dotted
/// paths are reported as one input (`user.name`).
pub struct InputCollector<'a> {
    builtins: &'a HashSet<String>,
    inputs: BTreeSet<String>,
    error_spans: Vec<Span>,
}

impl<'a> InputCollector<'a> {
    pub fn new(builtins: &'a HashSet<String>) -> Self {
        Self {
            builtins,
            inputs: BTreeSet::new(),
            error_spans: vec![],
        }
    }

    pub fn collect(mut self, root: &ExprRef) -> CollectedInputs {
        ScopedWalker::new(&mut self).walk(root, FilterContext::None);
        CollectedInputs {
            inputs: self.inputs.into_iter().collect(),
            error_spans: self.error_spans,
        }
    }

    fn is_external(&self, name: &str, scopes: &ScopeStack, ctx: FilterContext) -> bool {
        !scopes.is_bound(name)
            && !self.builtins.contains(name)
            && !(ctx.in_filter() && name == "item")
    }
}

impl NodeSink for InputCollector<'_> {
    fn syntax_error(&mut self, span: &Span) {
        self.error_spans.push(span.clone());
    }

    fn variable(&mut self, span: &Span, scopes: &ScopeStack, ctx: FilterContext) {
        let name = name_text(span);
        // Inside a filter over a variable, a bare name other than `item`
        // is an implicit item property, not an input.
        let implicit_property = ctx == FilterContext::VariableList && name != "item";
        if self.is_external(&name, scopes, ctx) && !implicit_property {
            self.inputs.insert(name);
        }
    }

    fn path(&mut self, parts: &[String], scopes: &ScopeStack, ctx: FilterContext) {
        if let Some(root) = parts.first() {
            if self.is_external(root, scopes, ctx) {
                self.inputs.insert(parts.join("."));
            }
        }
    }

    fn invocation(&mut self, name: &str, scopes: &ScopeStack, ctx: FilterContext) {
        if self.is_external(name, scopes, ctx) {
            self.inputs.insert(name.to_string());
        }
    }

    fn filter_base(&mut self, name: &str, scopes: &ScopeStack) {
        // The filtered variable is a dependency in its own right.
        if self.is_external(name, scopes, FilterContext::None) {
            self.inputs.insert(name.to_string());
        }
    }
}

/// Result of the collection pass. `inputs` is sorted and deduplicated;
/// `error_spans` holds one span per error node encountered.
#[derive(Debug)]
pub struct CollectedInputs {
    pub inputs: Vec<String>,
    pub error_spans: Vec<Span>,
}

impl CollectedInputs {
    pub fn has_errors(&self) -> bool {
        !self.error_spans.is_empty()
    }
}
