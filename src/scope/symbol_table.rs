use std::fmt::Debug;

use crate::{
    ast::ast::DeclId,
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl Debug for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// One block's scope: its nesting depth and the declarations it introduces.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub nest: u32,
    pub declarations: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub scope: ScopeId,
    pub decl: DeclId,
    pub name: String,
}

/// How an identifier use was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Found in one of the open scopes, innermost first.
    Enclosing(DeclId),
    /// Not visible lexically; bound to the latest matching entry anywhere.
    Fallback(DeclId),
}

impl Resolution {
    pub fn decl(&self) -> DeclId {
        match self {
            Resolution::Enclosing(decl) | Resolution::Fallback(decl) => *decl,
        }
    }
}

/// Flat table of `(scope, declaration)` entries plus the stack of open scopes.
///
/// Scope ids come from a counter. Calling [`SymbolTable::restart`] between
/// two traversals makes the second one re-enter the scopes created by the
/// first, in the same order and with the same ids.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Entry>,
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
    next_scope: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the scope counter and the open-scope stack. Entries are kept.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.next_scope = 0;
    }

    /// Opens the next scope. The outermost scope has depth 0 and every
    /// scope opened inside it is one level deeper.
    pub fn enter_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;

        if id.0 as usize == self.scopes.len() {
            self.scopes.push(Scope {
                id,
                nest: self.stack.len() as u32,
                declarations: vec![],
            });
        }

        self.stack.push(id);
        id
    }

    pub fn close_scope(&mut self) {
        self.stack.pop();
    }

    /// Nesting depth of the innermost open scope.
    pub fn current_nest(&self) -> u32 {
        self.stack.len().saturating_sub(1) as u32
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    /// Records `decl` under the innermost open scope.
    pub fn declare(&mut self, name: &str, decl: DeclId, position: Position) -> Result<(), Error> {
        let scope = match self.current_scope() {
            Some(scope) => scope,
            None => {
                return Err(Error::internal(format!(
                    "declaration of `{}` outside of any scope",
                    name
                )))
            }
        };

        if self
            .entries
            .iter()
            .any(|entry| entry.scope == scope && entry.name == name)
        {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    identifier: name.to_string(),
                },
                position,
            ));
        }

        self.entries.push(Entry {
            scope,
            decl,
            name: name.to_string(),
        });
        self.scopes[scope.0 as usize].declarations.push(decl);
        Ok(())
    }

    /// Finds the declaration an identifier refers to.
    ///
    /// Open scopes are searched innermost to outermost. If none declares the
    /// name, the most recently recorded entry with that name anywhere in the
    /// table is used instead.
    pub fn lookup(&self, name: &str) -> Option<Resolution> {
        for scope in self.stack.iter().rev() {
            if let Some(entry) = self
                .entries
                .iter()
                .find(|entry| entry.scope == *scope && entry.name == name)
            {
                return Some(Resolution::Enclosing(entry.decl));
            }
        }

        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .map(|entry| Resolution::Fallback(entry.decl))
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
