use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use super::error::ScopeError;
use super::symbol::Symbol;

/// A single level of name bindings, active for one lexical block.
pub type Scope = HashMap<String, Rc<Symbol>>;

/// Stack of nested scopes for lexical scoping.
///
/// The innermost (current) scope is the last element of `scopes`. A new
/// table starts with exactly one scope.
#[derive(Debug)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
        }
    }

    /// Number of scopes currently on the stack.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare `name` in the innermost scope. On error the table is left
    /// unchanged.
    pub fn add_declaration(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), ScopeError> {
        let scope = self.scopes.last_mut().ok_or(ScopeError::EmptyScopeStack)?;
        if scope.contains_key(name) {
            return Err(ScopeError::DuplicateDeclaration(name.to_string()));
        }
        trace!("declare `{}`: {}", name, symbol);
        scope.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Push a new, empty innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
        trace!("push scope (depth {})", self.scopes.len());
    }

    /// Drop the innermost scope with everything declared in it.
    pub fn pop_scope(&mut self) -> Result<(), ScopeError> {
        self.scopes.pop().ok_or(ScopeError::EmptyScopeStack)?;
        trace!("pop scope (depth {})", self.scopes.len());
        Ok(())
    }

    /// Look `name` up in the innermost scope only.
    pub fn lookup_local(&self, name: &str) -> Result<Option<&Rc<Symbol>>, ScopeError> {
        let scope = self.scopes.last().ok_or(ScopeError::EmptyScopeStack)?;
        Ok(scope.get(name))
    }

    /// Look `name` up from the innermost scope outward; inner declarations
    /// shadow outer ones.
    pub fn lookup_global(&self, name: &str) -> Result<Option<&Rc<Symbol>>, ScopeError> {
        if self.scopes.is_empty() {
            return Err(ScopeError::EmptyScopeStack);
        }
        Ok(self.scopes.iter().rev().find_map(|scope| scope.get(name)))
    }
}
