//! Type inference over a resolved program.
//!
//! There are no type annotations in the language. Every declaration and
//! expression gets a slot, and each use places a constraint on the slots it
//! touches:
//!
//! - Literals and declarations fix their own slot
//! - Identifier uses copy their declaration's type
//! - Assignments give an untyped target the value's type
//! - Binary operators propagate a known operand type and apply the operator table
//! - Statements check guards, output, input and call targets
//!
//! Constraints are evaluated from a worklist until no slot changes. Any slot
//! still untyped at that point is an error.

pub mod constraints;
pub mod type_checker;

#[cfg(test)]
mod tests;
