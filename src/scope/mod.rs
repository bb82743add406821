//! Scope resolution for nested blocks.
//!
//! Builds the symbol table for a parsed program and binds every identifier
//! use to the declaration it refers to.

pub mod resolver;
pub mod symbol_table;

#[cfg(test)]
mod tests;
