// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;

use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::Result;

/// Parser configuration variant. Camunda (the default) additionally allows
/// backtick-quoted names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Standard,
    #[default]
    Camunda,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown FEEL dialect `{0}`")]
pub struct DialectError(pub String);

impl FromStr for Dialect {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, DialectError> {
        match s {
            "standard" => Ok(Dialect::Standard),
            "camunda" => Ok(Dialect::Camunda),
            _ => Err(DialectError(s.to_string())),
        }
    }
}

const RESERVED: [&str; 15] = [
    "and",
    "else",
    "every",
    "false",
    "for",
    "function",
    "if",
    "in",
    "null",
    "or",
    "return",
    "satisfies",
    "some",
    "then",
    "true",
];

#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    dialect: Dialect,
    // Names the parser recognizes even when they span several words or
    // contain reserved words (`get or else`). Seeded from declared
    // builtins.
    known_names: BTreeSet<String>,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            dialect: Dialect::default(),
            known_names: BTreeSet::new(),
        })
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub fn add_known_name(&mut self, name: impl Into<String>) {
        self.known_names.insert(name.into());
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::QuotedName => "",
        }
    }

    fn next_token(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.token_text() == text {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    fn is_reserved(&self, ident: &str) -> bool {
        RESERVED.contains(&ident)
    }

    fn span_to(&self, start: &Span, end: &Span) -> Span {
        Span {
            source: start.source.clone(),
            line: start.line,
            col: start.col,
            start: start.start,
            end: end.end,
        }
    }

    /// Parse a complete expression; all input must be consumed.
    pub fn parse_expression(&mut self) -> Result<ExprRef> {
        let expr = self.parse_expr()?;
        if self.tok.0 != TokenKind::Eof {
            return Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                "unexpected input after expression",
            ));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<ExprRef> {
        self.parse_logic_or()
    }

    fn parse_logic_or(&mut self) -> Result<ExprRef> {
        let mut expr = self.parse_logic_and()?;
        while self.tok.0 == TokenKind::Ident && self.token_text() == "or" {
            self.next_token()?;
            let rhs = self.parse_logic_and()?;
            let span = self.span_to(expr.span(), rhs.span());
            expr = Ref::new(Expr::Logic {
                span,
                op: LogicOp::Or,
                lhs: expr,
                rhs,
            });
        }
        Ok(expr)
    }

    fn parse_logic_and(&mut self) -> Result<ExprRef> {
        let mut expr = self.parse_cmp()?;
        while self.tok.0 == TokenKind::Ident && self.token_text() == "and" {
            self.next_token()?;
            let rhs = self.parse_cmp()?;
            let span = self.span_to(expr.span(), rhs.span());
            expr = Ref::new(Expr::Logic {
                span,
                op: LogicOp::And,
                lhs: expr,
                rhs,
            });
        }
        Ok(expr)
    }

    // Comparisons do not associate: `a < b < c` is rejected by FEEL.
    fn parse_cmp(&mut self) -> Result<ExprRef> {
        let lhs = self.parse_additive()?;
        let op = match self.token_text() {
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Le,
            "=" => CmpOp::Eq,
            ">=" => CmpOp::Ge,
            ">" => CmpOp::Gt,
            "!=" => CmpOp::Ne,
            _ => return Ok(lhs),
        };
        self.next_token()?;
        let rhs = self.parse_additive()?;
        let span = self.span_to(lhs.span(), rhs.span());
        Ok(Ref::new(Expr::Cmp { span, op, lhs, rhs }))
    }

    fn parse_additive(&mut self) -> Result<ExprRef> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.token_text() {
                "+" => ArithOp::Add,
                "-" => ArithOp::Sub,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let rhs = self.parse_multiplicative()?;
            let span = self.span_to(expr.span(), rhs.span());
            expr = Ref::new(Expr::Arith {
                span,
                op,
                lhs: expr,
                rhs,
            });
        }
    }

    fn parse_multiplicative(&mut self) -> Result<ExprRef> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.token_text() {
                "*" => ArithOp::Mul,
                "/" => ArithOp::Div,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let rhs = self.parse_unary()?;
            let span = self.span_to(expr.span(), rhs.span());
            expr = Ref::new(Expr::Arith {
                span,
                op,
                lhs: expr,
                rhs,
            });
        }
    }

    fn parse_unary(&mut self) -> Result<ExprRef> {
        if self.token_text() == "-" {
            let start = self.tok.1.clone();
            self.next_token()?;
            let expr = self.parse_unary()?;
            let span = self.span_to(&start, expr.span());
            return Ok(Ref::new(Expr::Unary { span, expr }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ExprRef> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.token_text() {
                "." => {
                    self.next_token()?;
                    let field = self.parse_path_segment()?;
                    let span = self.span_to(expr.span(), &field);
                    expr = Ref::new(Expr::Path {
                        span,
                        base: expr,
                        field,
                    });
                }
                "[" => {
                    self.next_token()?;
                    let predicate = self.parse_expr()?;
                    let end = self.tok.1.clone();
                    self.expect("]", "to close filter expression")?;
                    let span = self.span_to(expr.span(), &end);
                    expr = Ref::new(Expr::Filter {
                        span,
                        base: expr,
                        predicate,
                    });
                }
                "(" => {
                    self.next_token()?;
                    let mut params = vec![];
                    if self.token_text() != ")" {
                        loop {
                            params.push(self.parse_expr()?);
                            if self.token_text() != "," {
                                break;
                            }
                            self.next_token()?;
                        }
                    }
                    let end = self.tok.1.clone();
                    self.expect(")", "to close function invocation")?;
                    let span = self.span_to(expr.span(), &end);
                    expr = Ref::new(Expr::Call {
                        span,
                        fcn: expr,
                        params,
                    });
                }
                _ => return Ok(expr),
            }
        }
    }

    // A path segment is a single name; reserved words are allowed here
    // (`order.return` is a valid property access).
    fn parse_path_segment(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            TokenKind::QuotedName => {
                self.check_quoted_name(&span)?;
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting property name")),
        }
    }

    fn check_quoted_name(&self, span: &Span) -> Result<()> {
        if self.dialect != Dialect::Camunda {
            return Err(span.error("backtick-quoted names require the camunda dialect"));
        }
        Ok(())
    }

    /// Parse a variable or function name. When the upcoming identifiers
    /// join into a declared multi-word name (`get or else`), the whole
    /// sequence is consumed as a single name, longest match winning.
    fn parse_name(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::QuotedName => {
                self.check_quoted_name(&span)?;
                self.next_token()?;
                Ok(span)
            }
            TokenKind::Ident if !self.is_reserved(span.text()) => {
                self.next_token()?;
                match self.extend_known_name(&span)? {
                    Some(joined) => Ok(joined),
                    None => Ok(span),
                }
            }
            TokenKind::Ident => Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                &format!("unexpected keyword `{}`", span.text()),
            )),
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting name")),
        }
    }

    fn is_known_prefix(&self, candidate: &str) -> bool {
        let lead = format!("{candidate} ");
        self.known_names
            .iter()
            .any(|n| n == candidate || n.starts_with(&lead))
    }

    // Greedy multi-word name matching. Words are consumed while the joined
    // text is still a prefix of some known name; the parser state is then
    // rewound to the longest joined text that is itself a known name.
    // Uses the same save/restore-the-parser technique the rest of the
    // parser uses for lookahead.
    fn extend_known_name(&mut self, first: &Span) -> Result<Option<Span>> {
        let mut joined = first.text().to_string();
        if !self.is_known_prefix(&joined) {
            return Ok(None);
        }

        let mut probe = self.clone();
        let mut span = first.clone();
        let mut best: Option<(Parser<'source>, Span)> = None;

        while probe.tok.0 == TokenKind::Ident {
            let candidate = format!("{joined} {}", probe.tok.1.text());
            if !self.is_known_prefix(&candidate) {
                break;
            }
            span = self.span_to(&span, &probe.tok.1);
            joined = candidate;
            probe.next_token()?;
            if self.known_names.contains(&joined) {
                best = Some((probe.clone(), span.clone()));
            }
        }

        match best {
            Some((state, span)) => {
                *self = state;
                Ok(Some(span))
            }
            None => Ok(None),
        }
    }

    // Error recovery: represent an unparseable fragment as an error node so
    // the surrounding tree still analyzes. Closing delimiters, separators
    // and EOF are left for the caller; anything else is skipped.
    fn error_node(&mut self) -> Result<ExprRef> {
        let span = self.tok.1.clone();
        let at_boundary = self.tok.0 == TokenKind::Eof
            || matches!(self.token_text(), ")" | "]" | "}" | ",");
        if !at_boundary {
            self.next_token()?;
        }
        Ok(Ref::new(Expr::Error { span }))
    }

    fn parse_primary(&mut self) -> Result<ExprRef> {
        let span = self.tok.1.clone();
        match &self.tok.0 {
            TokenKind::Number => {
                self.next_token()?;
                Ok(Ref::new(Expr::Number { span }))
            }
            TokenKind::String => {
                self.next_token()?;
                Ok(Ref::new(Expr::String { span }))
            }
            TokenKind::QuotedName => {
                let span = self.parse_name()?;
                Ok(Ref::new(Expr::Var { span }))
            }
            TokenKind::Ident => match span.text() {
                "true" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::Bool { span, value: true }))
                }
                "false" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::Bool { span, value: false }))
                }
                "null" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::Null { span }))
                }
                "if" => self.parse_if(),
                "for" => self.parse_for(),
                "some" | "every" => self.parse_quantified(),
                "function" => self.parse_function_definition(),
                t if self.is_reserved(t) => self.error_node(),
                _ => {
                    let span = self.parse_name()?;
                    Ok(Ref::new(Expr::Var { span }))
                }
            },
            TokenKind::Symbol => match span.text() {
                "(" => {
                    self.next_token()?;
                    let expr = self.parse_expr()?;
                    self.expect(")", "to close parenthesized expression")?;
                    Ok(expr)
                }
                "[" => self.parse_list(),
                "{" => self.parse_context(),
                _ => self.error_node(),
            },
            TokenKind::Eof => self.error_node(),
        }
    }

    fn parse_list(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        self.expect("[", "to begin list")?;
        let mut items = vec![];
        if self.token_text() != "]" {
            loop {
                items.push(self.parse_expr()?);
                if self.token_text() != "," {
                    break;
                }
                self.next_token()?;
            }
        }
        let end = self.tok.1.clone();
        self.expect("]", "to close list")?;
        Ok(Ref::new(Expr::List {
            span: self.span_to(&start, &end),
            items,
        }))
    }

    // Context keys are a single identifier (reserved words allowed), a
    // backtick-quoted name, or a string literal.
    fn parse_context_key(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident | TokenKind::String => {
                self.next_token()?;
                Ok(span)
            }
            TokenKind::QuotedName => {
                self.check_quoted_name(&span)?;
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting context key")),
        }
    }

    fn parse_context(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        self.expect("{", "to begin context")?;
        let mut entries = vec![];
        if self.token_text() != "}" {
            loop {
                let key = self.parse_context_key()?;
                self.expect(":", "after context key")?;
                let value = self.parse_expr()?;
                entries.push((key, value));
                if self.token_text() != "," {
                    break;
                }
                self.next_token()?;
            }
        }
        let end = self.tok.1.clone();
        self.expect("}", "to close context")?;
        Ok(Ref::new(Expr::Context {
            span: self.span_to(&start, &end),
            entries,
        }))
    }

    fn parse_if(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;
        let cond = self.parse_expr()?;
        self.expect("then", "in if expression")?;
        let then = self.parse_expr()?;
        self.expect("else", "in if expression")?;
        let otherwise = self.parse_expr()?;
        let span = self.span_to(&start, otherwise.span());
        Ok(Ref::new(Expr::If {
            span,
            cond,
            then,
            otherwise,
        }))
    }

    fn parse_in_clauses(&mut self, context: &str) -> Result<Vec<InClause>> {
        let mut clauses = vec![];
        loop {
            let var = self.tok.1.clone();
            match self.tok.0 {
                TokenKind::Ident if !self.is_reserved(var.text()) => self.next_token()?,
                _ => {
                    return Err(self.source.error(
                        self.tok.1.line,
                        self.tok.1.col,
                        &format!("expecting iteration variable {context}"),
                    ))
                }
            }
            self.expect("in", context)?;
            let iterable = self.parse_expr()?;
            clauses.push(InClause { var, iterable });
            if self.token_text() != "," {
                break;
            }
            self.next_token()?;
        }
        Ok(clauses)
    }

    fn parse_for(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;
        let clauses = self.parse_in_clauses("in for expression")?;
        self.expect("return", "in for expression")?;
        let body = self.parse_expr()?;
        let span = self.span_to(&start, body.span());
        Ok(Ref::new(Expr::For {
            span,
            clauses,
            body,
        }))
    }

    fn parse_quantified(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        let quantifier = match self.token_text() {
            "some" => Quantifier::Some,
            _ => Quantifier::Every,
        };
        self.next_token()?;
        let clauses = self.parse_in_clauses("in quantified expression")?;
        self.expect("satisfies", "in quantified expression")?;
        let satisfies = self.parse_expr()?;
        let span = self.span_to(&start, satisfies.span());
        Ok(Ref::new(Expr::Quantified {
            span,
            quantifier,
            clauses,
            satisfies,
        }))
    }

    fn parse_function_definition(&mut self) -> Result<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;
        self.expect("(", "after `function`")?;
        let mut params = vec![];
        if self.token_text() != ")" {
            loop {
                let span = self.tok.1.clone();
                match self.tok.0 {
                    TokenKind::Ident if !self.is_reserved(span.text()) => self.next_token()?,
                    TokenKind::QuotedName => {
                        self.check_quoted_name(&span)?;
                        self.next_token()?;
                    }
                    _ => {
                        return Err(self.source.error(
                            self.tok.1.line,
                            self.tok.1.col,
                            "expecting parameter name",
                        ))
                    }
                }
                params.push(span);
                if self.token_text() != "," {
                    break;
                }
                self.next_token()?;
            }
        }
        self.expect(")", "to close parameter list")?;
        let body = self.parse_expr()?;
        let span = self.span_to(&start, body.span());
        Ok(Ref::new(Expr::FunctionDefinition { span, params, body }))
    }
}
