use std::fmt::Debug;

use crate::lexer::tokens::Token;

use super::{
    statements::Stmt,
    types::{ConstValue, Type, TypeSlot},
};

/// Handle to a declaration stored in a [`DeclarationTable`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeclId({})", self.0)
    }
}

/// Declaration Kinds
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Const(ConstValue),
    Var,
    Proc,
}

/// A `CONST`, `VAR` or `PROCEDURE` declaration.
///
/// `nest` is fixed by the scope resolver's declare pass and `ty` by type
/// inference; neither changes once set.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub token: Token,
    pub nest: Option<u32>,
    pub ty: TypeSlot,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, token: Token) -> Self {
        Declaration {
            kind,
            token,
            nest: None,
            ty: TypeSlot::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.token.value
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, DeclarationKind::Const(_))
    }

    pub fn set_nest(&mut self, nest: u32) {
        if self.nest.is_none() {
            self.nest = Some(nest);
        }
    }

    pub fn get_type(&self) -> Option<Type> {
        self.ty.get()
    }
}

/// Arena owning every declaration of a program.
///
/// Blocks refer to the declarations they introduce by [`DeclId`]; identifier
/// uses hold the same handles, so a declaration is stored exactly once.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    declarations: Vec<Declaration>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, declaration: Declaration) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        self.declarations.push(declaration);
        id
    }

    pub fn get(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.declarations[id.index()]
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.declarations
            .iter()
            .enumerate()
            .map(|(index, declaration)| (DeclId(index as u32), declaration))
    }
}

/// A `PROCEDURE` declaration together with its body.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub decl: DeclId,
    pub block: Block,
}

/// A block: its declarations in source order, then its single statement.
#[derive(Debug, Clone)]
pub struct Block {
    pub consts: Vec<DeclId>,
    pub vars: Vec<DeclId>,
    pub procedures: Vec<Procedure>,
    pub statement: Stmt,
}

impl Block {
    /// Const then var declarations, the order fields are laid out in.
    pub fn field_decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.consts.iter().chain(self.vars.iter()).copied()
    }
}

/// Root of the tree: the outermost block and the table owning all declarations.
#[derive(Debug, Clone)]
pub struct Program {
    pub block: Block,
    pub declarations: DeclarationTable,
    pub token: Token,
}
