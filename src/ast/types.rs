//! Type system definitions for the AST.
//!
//! The language has no type annotations: every slot starts unset and is
//! filled at most once by the inference engine. This module defines:
//!
//! - The four inferable types
//! - Constant literal values and the type each one implies
//! - The once-settable type slot shared by expressions and declarations

use std::fmt::Display;

/// Represents the types a slot can be inferred to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Number,
    Boolean,
    String,
    Procedure,
}

impl Type {
    /// Whether values of the type can be printed, read or compared.
    pub fn is_value(&self) -> bool {
        !matches!(self, Type::Procedure)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Number => write!(f, "NUMBER"),
            Type::Boolean => write!(f, "BOOLEAN"),
            Type::String => write!(f, "STRING"),
            Type::Procedure => write!(f, "PROCEDURE"),
        }
    }
}

/// Literal value carried by a `CONST` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Number(i32),
    Boolean(bool),
    String(String),
}

impl ConstValue {
    pub fn get_type(&self) -> Type {
        match self {
            ConstValue::Number(_) => Type::Number,
            ConstValue::Boolean(_) => Type::Boolean,
            ConstValue::String(_) => Type::String,
        }
    }
}

/// A type slot that transitions from unset to one concrete type exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeSlot(Option<Type>);

impl TypeSlot {
    pub fn new() -> Self {
        TypeSlot(None)
    }

    pub fn get(&self) -> Option<Type> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Sets the slot if it is still unset. Returns whether the slot changed.
    pub fn set(&mut self, ty: Type) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(ty);
        true
    }
}

/// Formats an optional type the way diagnostics show it.
pub fn describe(ty: Option<Type>) -> String {
    match ty {
        Some(ty) => ty.to_string(),
        None => String::from("<unknown>"),
    }
}
