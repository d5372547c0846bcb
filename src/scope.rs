// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

/// A single lexical scope: the set of names bound by one binding construct
/// (context literal, filter, loop, quantifier, function definition).
#[derive(Debug, Default)]
pub struct Scope {
    names: BTreeSet<String>,
}

impl Scope {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Stack of lexically nested scopes. One stack exists per traversal; scopes
/// are pushed on entering a binding construct's body and popped on exit.
/// A name is external iff it is bound in no active scope.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Bind a name in the innermost scope. Context entries use this to make
    /// each key visible only to subsequent entries: entry N's value may
    /// reference keys 1..N-1 but not N or later.
    pub fn bind(&mut self, name: impl Into<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.into());
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
