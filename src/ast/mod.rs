/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Program, blocks and the declaration table
/// - expressions: Definitions for the expression kinds
/// - statements: Definitions for the statement kinds
/// - types: Inferable types and once-settable type slots
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
