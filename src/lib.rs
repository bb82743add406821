#![allow(clippy::module_inception)]

use std::fmt::Display;

use inkwell::context::Context;
use log::info;

use crate::{
    compiler::compiler::{compile, CompiledUnit, CompilerOptions},
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::resolver::resolve_program,
    type_checker::type_checker::infer_types,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod scope;
pub mod type_checker;

extern crate regex;

/// 1-based line and column of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    pub fn null() -> Self {
        Position { line: 0, column: 0 }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Runs the whole pipeline on a source string.
///
/// Lexing, parsing, scope resolution, type inference and code generation run
/// in order; the first failure aborts the compile and no units are returned.
pub fn compile_source(
    source: &str,
    context: &Context,
    options: &CompilerOptions,
) -> Result<Vec<CompiledUnit>, Error> {
    let tokens = tokenize(source)?;
    let mut program = parse(tokens)?;

    resolve_program(&mut program)?;
    infer_types(&mut program)?;

    let units = compile(&program, context, options)?;
    info!(
        "compiled {} into {} unit(s)",
        options.program_name,
        units.len()
    );

    Ok(units)
}
