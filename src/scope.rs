//! Chained symbol tables for template rendering.
//!
//! Every loop body gets its own [`Scope`] whose bindings shadow the
//! enclosing ones until the loop finishes. Scopes live in a
//! [`ScopeStack`] owned by the renderer; a scope refers to its parent by
//! index into that stack.

use std::collections::HashMap;

/// Printable bindings: identifier to the string substituted for it.
pub type Values = HashMap<String, String>;

/// Iterable bindings: identifier to the sequence a loop walks over.
pub type Arrays = HashMap<String, Vec<String>>;

/// Id of the scope built from the caller's bindings.
pub const ROOT_ID: &str = "root";

/// Lookup of a name no scope in the chain binds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Identifier '{0}' is undefined")]
    UndefinedIdentifier(String),
    #[error("Array '{0}' is undefined")]
    UndefinedArray(String),
}

/// One level of bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    id: String,
    parent: Option<usize>,
    printable: Values,
    iterable: Arrays,
}

impl Scope {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Index of the enclosing scope, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    fn local_value(&self, identifier: &str) -> Option<&str> {
        self.printable.get(identifier).map(String::as_str)
    }

    fn local_iterable(&self, identifier: &str) -> Option<&[String]> {
        self.iterable.get(identifier).map(Vec::as_slice)
    }
}

/// The scope chain of one renderer. The root scope sits at index 0 and
/// is never popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    #[must_use]
    pub fn new(values: Values, arrays: Arrays) -> Self {
        Self {
            scopes: vec![Scope {
                id: ROOT_ID.to_string(),
                parent: None,
                printable: values,
                iterable: arrays,
            }],
        }
    }

    /// The innermost scope.
    #[must_use]
    pub fn top(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Number of loop scopes above the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Open a child of the current top.
    pub fn push(&mut self, id: impl Into<String>) {
        let parent = self.scopes.len() - 1;
        self.scopes.push(Scope {
            id: id.into(),
            parent: Some(parent),
            printable: Values::new(),
            iterable: Arrays::new(),
        });
    }

    /// Close the current top. Returns `None` at the root, which stays.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.is_root() {
            return None;
        }
        self.scopes.pop()
    }

    /// Drop every loop scope, leaving only the root.
    pub fn unwind(&mut self) {
        self.scopes.truncate(1);
    }

    /// Scopes from the top outwards, following parent links.
    fn chain(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(self.scopes.last(), |scope| {
            scope.parent.map(|index| &self.scopes[index])
        })
    }

    pub fn get_value(&self, identifier: &str) -> Result<&str, ResolutionError> {
        self.chain()
            .find_map(|scope| scope.local_value(identifier))
            .ok_or_else(|| ResolutionError::UndefinedIdentifier(identifier.to_string()))
    }

    #[must_use]
    pub fn contains_value(&self, identifier: &str) -> bool {
        self.chain()
            .any(|scope| scope.local_value(identifier).is_some())
    }

    pub fn get_iterable(&self, identifier: &str) -> Result<&[String], ResolutionError> {
        self.chain()
            .find_map(|scope| scope.local_iterable(identifier))
            .ok_or_else(|| ResolutionError::UndefinedArray(identifier.to_string()))
    }

    #[must_use]
    pub fn contains_iterable(&self, identifier: &str) -> bool {
        self.chain()
            .any(|scope| scope.local_iterable(identifier).is_some())
    }

    /// Bind `identifier` in the top scope, replacing any local binding.
    /// Ancestors are left untouched, so an outer binding of the same
    /// name reappears once this scope is popped.
    pub fn put_value(&mut self, identifier: impl Into<String>, value: impl Into<String>) {
        let top = self.scopes.len() - 1;
        self.scopes[top]
            .printable
            .insert(identifier.into(), value.into());
    }
}
