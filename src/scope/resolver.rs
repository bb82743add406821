//! Binds every identifier use to a declaration.
//!
//! Resolution is two passes over the tree with the same traversal order:
//! within a block the constants, then the variables, then each procedure
//! (recursing into its body), then the block's statement.
//!
//! - `declare` records each declaration under its scope and fixes its depth
//! - `resolve` binds each identifier use and records the depth of the use

use log::{debug, trace, warn};

use crate::{
    ast::{
        ast::{Block, DeclarationTable, Program},
        expressions::{Expr, ExprKind, IdentRef},
        statements::{Stmt, StmtKind},
    },
    errors::errors::{Error, ErrorImpl},
};

use super::symbol_table::{Resolution, SymbolTable};

/// Runs both passes over `program`, annotating it in place.
pub fn resolve_program(program: &mut Program) -> Result<SymbolTable, Error> {
    let mut table = SymbolTable::new();

    table.enter_scope();
    declare_block(&mut table, &mut program.declarations, &program.block)?;
    table.close_scope();

    debug!(
        "declared {} identifiers in {} scopes",
        table.entries().len(),
        table.scopes().len()
    );

    table.restart();

    table.enter_scope();
    resolve_block(&mut table, &program.declarations, &mut program.block)?;
    table.close_scope();

    Ok(table)
}

fn declare_block(
    table: &mut SymbolTable,
    declarations: &mut DeclarationTable,
    block: &Block,
) -> Result<(), Error> {
    let nest = table.current_nest();

    for id in block.field_decls() {
        let declaration = declarations.get_mut(id);
        declaration.set_nest(nest);
        table.declare(declaration.name(), id, declaration.token.position)?;
    }

    for procedure in &block.procedures {
        let declaration = declarations.get_mut(procedure.decl);
        declaration.set_nest(nest);
        table.declare(declaration.name(), procedure.decl, declaration.token.position)?;

        table.enter_scope();
        declare_block(table, declarations, &procedure.block)?;
        table.close_scope();
    }

    Ok(())
}

fn resolve_block(
    table: &mut SymbolTable,
    declarations: &DeclarationTable,
    block: &mut Block,
) -> Result<(), Error> {
    for procedure in &mut block.procedures {
        table.enter_scope();
        resolve_block(table, declarations, &mut procedure.block)?;
        table.close_scope();
    }

    resolve_stmt(table, declarations, &mut block.statement)
}

fn resolve_stmt(
    table: &SymbolTable,
    declarations: &DeclarationTable,
    stmt: &mut Stmt,
) -> Result<(), Error> {
    match &mut stmt.kind {
        StmtKind::Assign { target, value } => {
            resolve_ident(table, declarations, target)?;
            resolve_expr(table, declarations, value)
        }
        StmtKind::Call(target) | StmtKind::Input(target) => {
            resolve_ident(table, declarations, target)
        }
        StmtKind::Output(value) => resolve_expr(table, declarations, value),
        StmtKind::Block(body) => {
            for stmt in body {
                resolve_stmt(table, declarations, stmt)?;
            }
            Ok(())
        }
        StmtKind::If { condition, body } | StmtKind::While { condition, body } => {
            resolve_expr(table, declarations, condition)?;
            resolve_stmt(table, declarations, body)
        }
        StmtKind::Empty => Ok(()),
    }
}

fn resolve_expr(
    table: &SymbolTable,
    declarations: &DeclarationTable,
    expr: &mut Expr,
) -> Result<(), Error> {
    match &mut expr.kind {
        ExprKind::Binary { left, right, .. } => {
            resolve_expr(table, declarations, left)?;
            resolve_expr(table, declarations, right)
        }
        ExprKind::Ident(ident) => resolve_ident(table, declarations, ident),
        ExprKind::Number(_) | ExprKind::String(_) | ExprKind::Boolean(_) => Ok(()),
    }
}

fn resolve_ident(
    table: &SymbolTable,
    declarations: &DeclarationTable,
    ident: &mut IdentRef,
) -> Result<(), Error> {
    let resolution = match table.lookup(ident.name()) {
        Some(resolution) => resolution,
        None => {
            return Err(Error::new(
                ErrorImpl::IdentifierNotFound {
                    identifier: ident.name().to_string(),
                },
                ident.token.position,
            ))
        }
    };

    let nest = table.current_nest();
    let decl = resolution.decl();

    if let Resolution::Fallback(_) = resolution {
        warn!(
            "`{}` at {} is not declared in an enclosing scope, using the declaration at {}",
            ident.name(),
            ident.token.position,
            declarations.get(decl).token.position
        );
    }

    trace!(
        "bound `{}` at depth {} to {:?} (depth {:?})",
        ident.name(),
        nest,
        decl,
        declarations.get(decl).nest
    );

    ident.bind(nest, decl);
    Ok(())
}
