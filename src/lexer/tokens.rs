use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Position;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("CONST", TokenKind::Const);
        map.insert("VAR", TokenKind::Var);
        map.insert("PROCEDURE", TokenKind::Procedure);
        map.insert("CALL", TokenKind::Call);
        map.insert("BEGIN", TokenKind::Begin);
        map.insert("END", TokenKind::End);
        map.insert("IF", TokenKind::If);
        map.insert("THEN", TokenKind::Then);
        map.insert("WHILE", TokenKind::While);
        map.insert("DO", TokenKind::Do);
        map.insert("TRUE", TokenKind::Boolean);
        map.insert("FALSE", TokenKind::Boolean);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Boolean,
    Identifier,

    OpenParen,
    CloseParen,

    Assignment, // :=
    Equals,     // =
    NotEquals,  // #
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Dot,
    Comma,
    Semicolon,
    Question,
    Bang,

    Plus,
    Dash,
    Star,
    Slash,
    Percent,

    // Reserved
    Const,
    Var,
    Procedure,
    Call,
    Begin,
    End,
    If,
    Then,
    While,
    Do,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexed token. `value` holds the source text, except for string literals
/// where it holds the decoded contents without quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} `{}` at {}", self.kind, self.value, self.position)
    }
}
