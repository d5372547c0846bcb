// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::Span;
use crate::scope::{Scope, ScopeStack};

/// Tells a node whether it is being visited inside a filter predicate, and
/// what is being filtered. Inside a filter over a variable, bare names are
/// implicit `item` properties rather than external references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterContext {
    None,
    ListLiteral,
    VariableList,
}

impl FilterContext {
    pub fn in_filter(self) -> bool {
        self != FilterContext::None
    }
}

/// Events emitted by the scoped walk. The input collector and the type
/// inference engine are both sinks over the same traversal; all scope and
/// binding-construct logic lives in the walker, once.
pub trait NodeSink {
    /// An error node produced by parser recovery. The walker does not
    /// descend past it.
    fn syntax_error(&mut self, _span: &Span) {}

    /// A bare variable reference (not a path segment, not a callee).
    fn variable(&mut self, _span: &Span, _scopes: &ScopeStack, _ctx: FilterContext) {}

    /// A dotted path whose base is a plain variable, flattened.
    fn path(&mut self, _parts: &[String], _scopes: &ScopeStack, _ctx: FilterContext) {}

    /// A function invocation through a plain (possibly multi-word) name.
    /// Arguments are visited separately by the walker.
    fn invocation(&mut self, _name: &str, _scopes: &ScopeStack, _ctx: FilterContext) {}

    /// A filter over a plain variable, observed before the filter scope is
    /// pushed.
    fn filter_base(&mut self, _name: &str, _scopes: &ScopeStack) {}

    /// The predicate of a filter over a plain variable, observed after the
    /// `item` scope has been pushed and before the predicate is walked.
    fn filter_predicate(
        &mut self,
        _name: &str,
        _predicate: &ExprRef,
        _scopes: &ScopeStack,
    ) {
    }

    /// A comparison; operands are also visited normally afterwards.
    fn comparison(&mut self, _lhs: &ExprRef, _rhs: &ExprRef, _scopes: &ScopeStack) {}

    /// An arithmetic expression. Returning true claims the whole subtree:
    /// the walker then skips nested arithmetic nodes and scalar literals
    /// and only descends into other children (contexts, filters, ...).
    fn arithmetic(&mut self, _expr: &ExprRef, _scopes: &ScopeStack) -> bool {
        false
    }
}

/// Walks an expression tree depth-first, maintaining the lexical scope
/// stack across the six binding constructs and threading the filter
/// context, emitting events to the sink.
pub struct ScopedWalker<'a, S: NodeSink> {
    scopes: ScopeStack,
    sink: &'a mut S,
}

impl<'a, S: NodeSink> ScopedWalker<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            scopes: ScopeStack::new(),
            sink,
        }
    }

    pub fn walk(&mut self, expr: &ExprRef, ctx: FilterContext) {
        match expr.as_ref() {
            Expr::Error { span } => {
                self.sink.syntax_error(span);
            }

            Expr::Number { .. } | Expr::String { .. } | Expr::Bool { .. } | Expr::Null { .. } => {}

            Expr::Var { span } => {
                self.sink.variable(span, &self.scopes, ctx);
            }

            Expr::Path { base, .. } => {
                if has_context_base(expr) {
                    // The chain bottoms out at an inline context literal;
                    // external references can only occur inside it.
                    self.walk(base, ctx);
                } else if let Some(parts) = flatten_path(expr) {
                    self.sink.path(&parts, &self.scopes, ctx);
                } else {
                    // Base is a call, filter or similar; the field access
                    // itself names no external variable.
                    self.walk(base, ctx);
                }
            }

            Expr::Call { fcn, params, .. } => {
                match fcn.as_ref() {
                    Expr::Var { span } => {
                        let name = name_text(span);
                        self.sink.invocation(&name, &self.scopes, ctx);
                    }
                    _ => self.walk(fcn, ctx),
                }
                for param in params {
                    self.walk(param, ctx);
                }
            }

            Expr::Context { entries, .. } => {
                self.walk_context(entries, ctx);
            }

            Expr::List { items, .. } => {
                for item in items {
                    match item.as_ref() {
                        // A context that is a list element does not open a
                        // scope; its keys bind nothing.
                        Expr::Context { entries, .. } => {
                            for (_key, value) in entries {
                                self.walk(value, ctx);
                            }
                        }
                        _ => self.walk(item, ctx),
                    }
                }
            }

            Expr::Filter {
                base, predicate, ..
            } => {
                self.walk_filter(base, predicate);
            }

            Expr::For { clauses, body, .. } => {
                self.walk_loop(clauses, body, ctx);
            }

            Expr::Quantified {
                clauses, satisfies, ..
            } => {
                self.walk_loop(clauses, satisfies, ctx);
            }

            Expr::FunctionDefinition { params, body, .. } => {
                let names: Vec<String> = params.iter().map(name_text).collect();
                self.scoped(Scope::new(names), |w| {
                    w.walk(body, FilterContext::None);
                });
            }

            Expr::Cmp { lhs, rhs, .. } => {
                self.sink.comparison(lhs, rhs, &self.scopes);
                self.walk(lhs, ctx);
                self.walk(rhs, ctx);
            }

            Expr::Arith { lhs, rhs, .. } => {
                if self.sink.arithmetic(expr, &self.scopes) {
                    for child in [lhs, rhs] {
                        match child.as_ref() {
                            Expr::Arith { .. }
                            | Expr::Number { .. }
                            | Expr::String { .. } => {}
                            _ => self.walk(child, ctx),
                        }
                    }
                } else {
                    self.walk(lhs, ctx);
                    self.walk(rhs, ctx);
                }
            }

            Expr::Logic { lhs, rhs, .. } => {
                self.walk(lhs, ctx);
                self.walk(rhs, ctx);
            }

            Expr::If {
                cond,
                then,
                otherwise,
                ..
            } => {
                self.walk(cond, ctx);
                self.walk(then, ctx);
                self.walk(otherwise, ctx);
            }

            Expr::Unary { expr, .. } => {
                self.walk(expr, ctx);
            }
        }
    }

    // Context entries bind forward only: each value is visited under the
    // scope as of the previous entries, then its key is added.
    fn walk_context(&mut self, entries: &[(Span, ExprRef)], ctx: FilterContext) {
        self.scoped(Scope::default(), |w| {
            for (key, value) in entries {
                w.walk(value, ctx);
                w.scopes.bind(name_text(key));
            }
        });
    }

    fn walk_filter(&mut self, base: &ExprRef, predicate: &ExprRef) {
        let mut names = vec!["item".to_string()];
        let mut ctx = FilterContext::None;
        let mut list_var: Option<String> = None;

        match base.as_ref() {
            // Filtering an inline list: keys of its context elements are
            // in scope inside the predicate, so bare references to element
            // properties are not inputs.
            Expr::List { items, .. } => {
                for item in items {
                    names.extend(context_keys(item));
                }
                ctx = FilterContext::ListLiteral;
            }
            // Filtering a variable: the variable itself is a dependency,
            // and bare names in the predicate are implicit item properties.
            Expr::Var { span } => {
                let name = name_text(span);
                self.sink.filter_base(&name, &self.scopes);
                ctx = FilterContext::VariableList;
                list_var = Some(name);
            }
            // Other bases (paths, chained filters, calls) are not tracked.
            _ => {}
        }

        self.scoped(Scope::new(names), |w| {
            if let Some(name) = &list_var {
                w.sink.filter_predicate(name, predicate, &w.scopes);
            }
            w.walk(predicate, ctx);
        });
    }

    // Iterables are visited under the outer scope; the loop variables are
    // only bound for the body. Loop bodies are not filter predicates, so
    // any inherited filter context is cleared.
    fn walk_loop(&mut self, clauses: &[InClause], body: &ExprRef, ctx: FilterContext) {
        for clause in clauses {
            self.walk(&clause.iterable, ctx);
        }
        let names: Vec<String> = clauses.iter().map(|c| name_text(&c.var)).collect();
        self.scoped(Scope::new(names), |w| {
            w.walk(body, FilterContext::None);
        });
    }

    fn scoped(&mut self, scope: Scope, f: impl FnOnce(&mut Self)) {
        self.scopes.push(scope);
        f(self);
        self.scopes.pop();
    }
}
