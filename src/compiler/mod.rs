//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that turns a resolved,
//! typed program into one compiled unit per block. It handles:
//!
//! - Frame layouts and enclosing-instance hops for nested procedures
//! - Compilation of expressions and statements
//! - Runtime declarations and string helpers

pub mod compiler;
pub mod expr;
pub mod frame;
pub mod runtime;
pub mod stmt;

#[cfg(test)]
mod tests;
