// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::scope::ScopeStack;
use crate::value::Value;
use crate::visitor::{FilterContext, NodeSink, ScopedWalker};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inferred shape of one external input. Scalar refinements are
/// first-wins: once a type is no longer `Unknown` it is never changed,
/// only deepened (a context gains properties, a list gains item
/// properties).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Unknown,
    String,
    Number,
    Boolean,
    Context {
        properties: BTreeMap<String, InputType>,
    },
    #[serde(rename_all = "camelCase")]
    List {
        item_properties: Vec<String>,
    },
}

impl InputType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, InputType::Unknown)
    }

    /// Make this entry a context (if it is not already something else)
    /// and return its property map. Returns None when the entry already
    /// has a conflicting concrete type, in which case the earlier
    /// evidence stands.
    fn as_context(&mut self) -> Option<&mut BTreeMap<String, InputType>> {
        if self.is_unknown() {
            *self = InputType::Context {
                properties: BTreeMap::new(),
            };
        }
        match self {
            InputType::Context { properties } => Some(properties),
            _ => None,
        }
    }

    fn refine(&mut self, kind: &InputType) {
        if self.is_unknown() {
            *self = kind.clone();
        }
    }

    fn add_item_property(&mut self, name: String) {
        if let InputType::List { item_properties } = self {
            item_properties.push(name);
        }
    }

    fn normalize(&mut self) {
        match self {
            InputType::Context { properties } => {
                for property in properties.values_mut() {
                    property.normalize();
                }
            }
            InputType::List { item_properties } => {
                item_properties.sort();
                item_properties.dedup();
            }
            _ => {}
        }
    }
}

/// Record a dotted reference in the type map: intermediate segments
/// become nested contexts, the leaf stays as it is (or Unknown when new).
fn add_path(types: &mut BTreeMap<String, InputType>, parts: &[String]) {
    let Some((root, rest)) = parts.split_first() else {
        return;
    };
    let entry = types.entry(root.clone()).or_insert(InputType::Unknown);
    if rest.is_empty() {
        return;
    }
    let Some(properties) = entry.as_context() else {
        return;
    };
    add_path(properties, rest);
}

/// Second analysis pass: walks the expression once more and refines the
/// collected inputs into an [`InputType`] per root variable, using the
/// surrounding operators as evidence. Comparisons against literals type
/// the compared variable; arithmetic with a uniform literal kind types
/// every free variable in the arithmetic subtree; filtering a variable
/// makes it a list and bare names in the predicate become its item
/// properties.
pub struct TypeInference {
    types: BTreeMap<String, InputType>,
}

impl TypeInference {
    /// Seed the map from the collected inputs: one entry per root name,
    /// with dotted inputs pre-expanded into nested contexts.
    pub fn new(inputs: &[String]) -> Self {
        let mut types = BTreeMap::new();
        for input in inputs {
            let parts: Vec<String> = input.split('.').map(str::to_string).collect();
            add_path(&mut types, &parts);
        }
        Self { types }
    }

    pub fn infer(mut self, root: &ExprRef) -> BTreeMap<String, InputType> {
        ScopedWalker::new(&mut self).walk(root, FilterContext::None);
        for input_type in self.types.values_mut() {
            input_type.normalize();
        }
        self.types
    }

    /// Free root name of a variable or path operand, if any.
    fn free_root(expr: &ExprRef, scopes: &ScopeStack) -> Option<String> {
        let parts = flatten_path(expr)?;
        let root = parts.into_iter().next()?;
        (!scopes.is_bound(&root)).then_some(root)
    }

    fn refine_name(&mut self, name: &str, kind: &InputType) {
        if let Some(existing) = self.types.get_mut(name) {
            existing.refine(kind);
        }
    }

    /// One direction of a comparison: when one side is a free variable
    /// and the other a scalar literal, the literal's kind is evidence
    /// for the variable.
    fn infer_from_comparison(&mut self, var: &ExprRef, literal: &ExprRef, scopes: &ScopeStack) {
        let Some(kind) = literal_kind(literal) else {
            return;
        };
        if let Some(root) = Self::free_root(var, scopes) {
            self.refine_name(&root, &kind);
        }
    }

    /// Assign `kind` to every free, still-unknown variable or path root
    /// in an arithmetic subtree.
    fn assign_in_subtree(&mut self, expr: &ExprRef, scopes: &ScopeStack, kind: &InputType) {
        match expr.as_ref() {
            Expr::Var { .. } | Expr::Path { .. } => {
                if let Some(root) = Self::free_root(expr, scopes) {
                    self.refine_name(&root, kind);
                }
            }
            other => {
                for_each_child(other, &mut |child| {
                    self.assign_in_subtree(child, scopes, kind)
                });
            }
        }
    }

    /// Record the item properties a filter predicate touches: `item.x`
    /// paths and bare free names (implicit item properties).
    fn track_item_properties(&mut self, expr: &ExprRef, list: &str, scopes: &ScopeStack) {
        match expr.as_ref() {
            Expr::Path { .. } => {
                if let Some(parts) = flatten_path(expr) {
                    if parts.len() > 1 && parts[0] == "item" {
                        if let Some(list_type) = self.types.get_mut(list) {
                            list_type.add_item_property(parts[1..].join("."));
                        }
                    }
                }
            }
            Expr::Var { span } => {
                let name = name_text(span);
                if name != "item" && !scopes.is_bound(&name) {
                    if let Some(list_type) = self.types.get_mut(list) {
                        list_type.add_item_property(name);
                    }
                }
            }
            other => {
                for_each_child(other, &mut |child| {
                    self.track_item_properties(child, list, scopes)
                });
            }
        }
    }
}

impl NodeSink for TypeInference {
    fn path(&mut self, parts: &[String], scopes: &ScopeStack, ctx: FilterContext) {
        let Some(root) = parts.first() else {
            return;
        };
        if scopes.is_bound(root) || (ctx.in_filter() && root == "item") {
            return;
        }
        // Only deepen names the collection pass produced; a path that was
        // not an input (e.g. suppressed as an implicit item property)
        // must not resurface here.
        if self.types.contains_key(root) {
            add_path(&mut self.types, parts);
        }
    }

    fn filter_base(&mut self, name: &str, scopes: &ScopeStack) {
        if !scopes.is_bound(name) {
            self.refine_name(
                name,
                &InputType::List {
                    item_properties: vec![],
                },
            );
        }
    }

    fn filter_predicate(&mut self, name: &str, predicate: &ExprRef, scopes: &ScopeStack) {
        if matches!(self.types.get(name), Some(InputType::List { .. })) {
            self.track_item_properties(predicate, name, scopes);
        }
    }

    fn comparison(&mut self, lhs: &ExprRef, rhs: &ExprRef, scopes: &ScopeStack) {
        self.infer_from_comparison(lhs, rhs, scopes);
        self.infer_from_comparison(rhs, lhs, scopes);
    }

    fn arithmetic(&mut self, expr: &ExprRef, scopes: &ScopeStack) -> bool {
        if let Some(kind) = arithmetic_literal_kind(expr) {
            self.assign_in_subtree(expr, scopes, &kind);
        }
        true
    }
}

fn literal_kind(expr: &ExprRef) -> Option<InputType> {
    match expr.as_ref() {
        Expr::String { .. } => Some(InputType::String),
        Expr::Number { .. } => Some(InputType::Number),
        Expr::Bool { .. } => Some(InputType::Boolean),
        _ => None,
    }
}

/// Scan an arithmetic chain for scalar literal operands. Evidence is
/// only usable when all literals agree: `a + 1` types `a` as number,
/// `a + 1 + "x"` types nothing.
fn arithmetic_literal_kind(expr: &ExprRef) -> Option<InputType> {
    fn scan(expr: &ExprRef, strings: &mut bool, numbers: &mut bool) {
        if let Expr::Arith { lhs, rhs, .. } = expr.as_ref() {
            for operand in [lhs, rhs] {
                match operand.as_ref() {
                    Expr::String { .. } => *strings = true,
                    Expr::Number { .. } => *numbers = true,
                    Expr::Arith { .. } => scan(operand, strings, numbers),
                    _ => {}
                }
            }
        }
    }

    let (mut strings, mut numbers) = (false, false);
    scan(expr, &mut strings, &mut numbers);
    match (strings, numbers) {
        (true, false) => Some(InputType::String),
        (false, true) => Some(InputType::Number),
        _ => None,
    }
}

/// Coarse type of the value an expression evaluates to, judged from its
/// top-level node only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Some value; nothing more specific can be said statically.
    Value,
    Context {
        keys: Vec<String>,
    },
    List,
    Boolean,
    Number,
    String,
    Unknown,
}

/// Classify the expression's result by its outermost node. A runtime
/// context, when supplied, resolves top-level variable references to the
/// type of their sample value.
pub fn infer_output_type(root: &ExprRef, context: Option<&Value>) -> OutputType {
    match root.as_ref() {
        Expr::Var { span } => context
            .and_then(|c| c.get(&name_text(span)))
            .map(classify_value)
            .unwrap_or(OutputType::Unknown),
        Expr::Path { .. } => OutputType::Value,
        Expr::Context { entries, .. } => {
            let mut keys: Vec<String> = vec![];
            for (key, _) in entries {
                let key = name_text(key);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            OutputType::Context { keys }
        }
        Expr::List { .. } | Expr::Filter { .. } => OutputType::List,
        Expr::Bool { .. } => OutputType::Boolean,
        Expr::Number { .. } => OutputType::Number,
        Expr::String { .. } => OutputType::String,
        Expr::Cmp { .. } | Expr::Quantified { .. } => OutputType::Boolean,
        Expr::Arith { lhs, rhs, .. } => {
            // The result kind is knowable when every typed operand agrees.
            let mut kinds: Vec<OutputType> = vec![];
            for operand in [lhs, rhs] {
                let kind = infer_output_type(operand, context);
                if !matches!(kind, OutputType::Unknown | OutputType::Value)
                    && !kinds.contains(&kind)
                {
                    kinds.push(kind);
                }
            }
            match kinds.as_slice() {
                [OutputType::Number] => OutputType::Number,
                [OutputType::String] => OutputType::String,
                _ => OutputType::Unknown,
            }
        }
        Expr::Error { .. } => OutputType::Unknown,
        _ => OutputType::Value,
    }
}

fn classify_value(value: &Value) -> OutputType {
    match value {
        Value::String(_) => OutputType::String,
        Value::Number(_) => OutputType::Number,
        Value::Bool(_) => OutputType::Boolean,
        Value::Array(_) => OutputType::List,
        Value::Object(fields) => OutputType::Context {
            keys: fields.keys().cloned().collect(),
        },
        Value::Null => OutputType::Unknown,
    }
}
