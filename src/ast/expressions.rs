use std::fmt::Display;

use crate::lexer::tokens::{Token, TokenKind};

use super::{ast::DeclId, types::TypeSlot};

/// Binary operators, grouped by how the type checker treats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
}

impl BinaryOperator {
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOperator::Plus),
            TokenKind::Dash => Some(BinaryOperator::Minus),
            TokenKind::Star => Some(BinaryOperator::Times),
            TokenKind::Slash => Some(BinaryOperator::Div),
            TokenKind::Percent => Some(BinaryOperator::Mod),
            TokenKind::Equals => Some(BinaryOperator::Equals),
            TokenKind::NotEquals => Some(BinaryOperator::NotEquals),
            TokenKind::Less => Some(BinaryOperator::Less),
            TokenKind::LessEquals => Some(BinaryOperator::LessEquals),
            TokenKind::Greater => Some(BinaryOperator::Greater),
            TokenKind::GreaterEquals => Some(BinaryOperator::GreaterEquals),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Times => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "#",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEquals => ">=",
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A use of an identifier, as an expression or as a statement target.
///
/// `nest` and `decl` are filled in by the scope resolver's resolve pass.
#[derive(Debug, Clone)]
pub struct IdentRef {
    pub token: Token,
    pub nest: Option<u32>,
    pub decl: Option<DeclId>,
}

impl IdentRef {
    pub fn new(token: Token) -> Self {
        IdentRef {
            token,
            nest: None,
            decl: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.token.value
    }

    pub fn bind(&mut self, nest: u32, decl: DeclId) {
        if self.decl.is_none() {
            self.nest = Some(nest);
            self.decl = Some(decl);
        }
    }
}

/// Expression Kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ident(IdentRef),
    Number(i32),
    String(String),
    Boolean(bool),
}

/// An expression node. `token` is the first token of the expression for
/// literals and identifiers, and the operator token for binary expressions.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub token: Token,
    pub ty: TypeSlot,
}

impl Expr {
    pub fn new(kind: ExprKind, token: Token) -> Self {
        Expr {
            kind,
            token,
            ty: TypeSlot::new(),
        }
    }
}
