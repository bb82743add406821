//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a [`Program`](crate::ast::ast::Program). It handles:
//!
//! - Block parsing (constant, variable and procedure declarations)
//! - Statement parsing (assignment, calls, input/output, control flow)
//! - Expression parsing with relational, additive and multiplicative levels
//!
//! Expressions use NUD (null denotation) and LED (left denotation) functions
//! with binding powers for precedence handling.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
