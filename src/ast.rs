// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::Span;

use core::{cmp, fmt, ops::Deref};
use std::rc::Rc;

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;
pub type ExprRef = Ref<Expr>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Quantifier {
    Some,
    Every,
}

/// One `name in iterable` clause of a for or quantified expression.
#[derive(Debug)]
pub struct InClause {
    pub var: Span,
    pub iterable: ExprRef,
}

#[derive(Debug)]
pub enum Expr {
    Number {
        span: Span,
    },

    String {
        span: Span,
    },

    Bool {
        span: Span,
        value: bool,
    },

    Null {
        span: Span,
    },

    Var {
        span: Span,
    },

    /// One step of a dotted path, `base.field`. `a.b.c` parses as
    /// `Path(Path(a, b), c)`.
    Path {
        span: Span,
        base: ExprRef,
        field: Span,
    },

    List {
        span: Span,
        items: Vec<ExprRef>,
    },

    /// Context literal `{ key: value, ... }`.
    Context {
        span: Span,
        entries: Vec<(Span, ExprRef)>,
    },

    Call {
        span: Span,
        fcn: ExprRef,
        params: Vec<ExprRef>,
    },

    /// `base[predicate]`.
    Filter {
        span: Span,
        base: ExprRef,
        predicate: ExprRef,
    },

    If {
        span: Span,
        cond: ExprRef,
        then: ExprRef,
        otherwise: ExprRef,
    },

    For {
        span: Span,
        clauses: Vec<InClause>,
        body: ExprRef,
    },

    Quantified {
        span: Span,
        quantifier: Quantifier,
        clauses: Vec<InClause>,
        satisfies: ExprRef,
    },

    FunctionDefinition {
        span: Span,
        params: Vec<Span>,
        body: ExprRef,
    },

    Unary {
        span: Span,
        expr: ExprRef,
    },

    Arith {
        span: Span,
        op: ArithOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    Cmp {
        span: Span,
        op: CmpOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    Logic {
        span: Span,
        op: LogicOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    /// Produced by error recovery for an unparseable fragment. Analysis
    /// flags it and does not descend.
    Error {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        use Expr::*;
        match self {
            Number { span }
            | String { span }
            | Bool { span, .. }
            | Null { span }
            | Var { span }
            | Path { span, .. }
            | List { span, .. }
            | Context { span, .. }
            | Call { span, .. }
            | Filter { span, .. }
            | If { span, .. }
            | For { span, .. }
            | Quantified { span, .. }
            | FunctionDefinition { span, .. }
            | Unary { span, .. }
            | Arith { span, .. }
            | Cmp { span, .. }
            | Logic { span, .. }
            | Error { span } => span,
        }
    }
}

/// Strip a single pair of surrounding backticks from a name. Backtick
/// syntax lets identifiers contain reserved words or punctuation
/// (`` `hello world` ``). Idempotent: applying it twice strips one pair.
pub fn unquote(text: &str) -> &str {
    let text = text.strip_prefix('`').unwrap_or(text);
    text.strip_suffix('`').unwrap_or(text)
}

/// Read a name span with backtick quotes removed.
pub fn name_text(span: &Span) -> String {
    unquote(span.text()).to_string()
}

/// Flatten a dotted path into its parts (`a.b.c` → `["a", "b", "c"]`).
/// Returns None when the base of the chain is not a plain variable.
pub fn flatten_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Var { span } => Some(vec![name_text(span)]),
        Expr::Path { base, field, .. } => {
            let mut parts = flatten_path(base)?;
            parts.push(name_text(field));
            Some(parts)
        }
        _ => None,
    }
}

/// Whether a path chain bottoms out at a context literal, as in
/// `{a: 1}.a`, where the base is inline data rather than an external
/// variable.
pub fn has_context_base(expr: &Expr) -> bool {
    match expr {
        Expr::Path { base, .. } => matches!(base.as_ref(), Expr::Context { .. }) || has_context_base(base),
        _ => false,
    }
}

/// Invoke `f` on each direct child expression, in source order.
pub fn for_each_child(expr: &Expr, f: &mut dyn FnMut(&ExprRef)) {
    match expr {
        Expr::Number { .. }
        | Expr::String { .. }
        | Expr::Bool { .. }
        | Expr::Null { .. }
        | Expr::Var { .. }
        | Expr::Error { .. } => {}
        Expr::Path { base, .. } => f(base),
        Expr::List { items, .. } => items.iter().for_each(f),
        Expr::Context { entries, .. } => entries.iter().for_each(|(_, value)| f(value)),
        Expr::Call { fcn, params, .. } => {
            f(fcn);
            params.iter().for_each(f);
        }
        Expr::Filter {
            base, predicate, ..
        } => {
            f(base);
            f(predicate);
        }
        Expr::If {
            cond,
            then,
            otherwise,
            ..
        } => {
            f(cond);
            f(then);
            f(otherwise);
        }
        Expr::For { clauses, body, .. } => {
            clauses.iter().for_each(|c| f(&c.iterable));
            f(body);
        }
        Expr::Quantified {
            clauses, satisfies, ..
        } => {
            clauses.iter().for_each(|c| f(&c.iterable));
            f(satisfies);
        }
        Expr::FunctionDefinition { body, .. } => f(body),
        Expr::Unary { expr, .. } => f(expr),
        Expr::Arith { lhs, rhs, .. }
        | Expr::Cmp { lhs, rhs, .. }
        | Expr::Logic { lhs, rhs, .. } => {
            f(lhs);
            f(rhs);
        }
    }
}

/// Key names of a context literal, in source order, unquoted.
pub fn context_keys(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Context { entries, .. } => {
            entries.iter().map(|(key, _)| name_text(key)).collect()
        }
        _ => vec![],
    }
}
