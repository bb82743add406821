use crate::lexer::tokens::Token;

use super::expressions::{Expr, IdentRef};

/// Statement Kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `ident := expression`
    Assign { target: IdentRef, value: Expr },
    /// `CALL ident`
    Call(IdentRef),
    /// `? ident`
    Input(IdentRef),
    /// `! expression`
    Output(Expr),
    /// `BEGIN statement ; ... END`
    Block(Vec<Stmt>),
    /// `IF expression THEN statement`
    If { condition: Expr, body: Box<Stmt> },
    /// `WHILE expression DO statement`
    While { condition: Expr, body: Box<Stmt> },
    Empty,
}

/// A statement and the token it starts at.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub token: Token,
}

impl Stmt {
    pub fn new(kind: StmtKind, token: Token) -> Self {
        Stmt { kind, token }
    }
}
