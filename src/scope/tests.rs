use crate::{
    ast::{
        ast::{DeclId, Program},
        expressions::IdentRef,
        statements::StmtKind,
    },
    errors::errors::{ErrorCategory, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    resolver::resolve_program,
    symbol_table::{Resolution, ScopeId, SymbolTable},
};

fn parse_source(source: &str) -> Program {
    parse(tokenize(source).unwrap()).unwrap()
}

fn assign_target(stmt: &StmtKind) -> &IdentRef {
    match stmt {
        StmtKind::Assign { target, .. } => target,
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_declarations_get_nest() {
    let mut program = parse_source("VAR x; PROCEDURE p; VAR y; PROCEDURE q; VAR z; ; ; .");
    resolve_program(&mut program).unwrap();

    let nests: Vec<_> = program
        .declarations
        .iter()
        .map(|(_, decl)| (decl.name().to_string(), decl.nest))
        .collect();
    assert_eq!(
        nests,
        vec![
            (String::from("x"), Some(0)),
            (String::from("p"), Some(0)),
            (String::from("y"), Some(1)),
            (String::from("q"), Some(1)),
            (String::from("z"), Some(2)),
        ]
    );
}

#[test]
fn test_scopes_follow_traversal_order() {
    let mut program = parse_source("PROCEDURE p; PROCEDURE q; ; ; PROCEDURE r; ; .");
    let table = resolve_program(&mut program).unwrap();

    let scopes: Vec<_> = table
        .scopes()
        .iter()
        .map(|scope| (scope.id, scope.nest, scope.declarations.clone()))
        .collect();
    assert_eq!(
        scopes,
        vec![
            (ScopeId(0), 0, vec![DeclId(0), DeclId(2)]),
            (ScopeId(1), 1, vec![DeclId(1)]),
            (ScopeId(2), 2, vec![]),
            (ScopeId(3), 1, vec![]),
        ]
    );
}

#[test]
fn test_use_binds_declaration_and_nest() {
    let mut program = parse_source("VAR x; PROCEDURE p; x := 1; x := 2.");
    resolve_program(&mut program).unwrap();

    let outer = assign_target(&program.block.statement.kind);
    assert_eq!(outer.decl, Some(DeclId(0)));
    assert_eq!(outer.nest, Some(0));

    let inner = assign_target(&program.block.procedures[0].block.statement.kind);
    assert_eq!(inner.decl, Some(DeclId(0)));
    assert_eq!(inner.nest, Some(1));
}

#[test]
fn test_nearest_enclosing_declaration_shadows() {
    let mut program = parse_source("VAR x; PROCEDURE p; VAR x; x := 1; x := 2.");
    resolve_program(&mut program).unwrap();

    let inner = assign_target(&program.block.procedures[0].block.statement.kind);
    assert_eq!(inner.decl, Some(DeclId(2)));

    let outer = assign_target(&program.block.statement.kind);
    assert_eq!(outer.decl, Some(DeclId(0)));
}

#[test]
fn test_sibling_procedures_call_each_other() {
    let mut program = parse_source("PROCEDURE p; CALL q; PROCEDURE q; CALL p; !\"done\".");
    resolve_program(&mut program).unwrap();

    let StmtKind::Call(from_p) = &program.block.procedures[0].block.statement.kind else {
        panic!("expected call");
    };
    assert_eq!(from_p.decl, Some(program.block.procedures[1].decl));

    let StmtKind::Call(from_q) = &program.block.procedures[1].block.statement.kind else {
        panic!("expected call");
    };
    assert_eq!(from_q.decl, Some(program.block.procedures[0].decl));
}

#[test]
fn test_fallback_binds_latest_declaration_outside_enclosing_scopes() {
    let mut program =
        parse_source("PROCEDURE p; VAR y; ; PROCEDURE r; VAR y; ; PROCEDURE q; y := 1; .");
    resolve_program(&mut program).unwrap();

    let target = assign_target(&program.block.procedures[2].block.statement.kind);
    assert_eq!(target.decl, Some(DeclId(3)));
    assert_eq!(target.nest, Some(1));
}

#[test]
fn test_duplicate_declaration() {
    let mut program = parse_source("VAR x, x; .");
    let error = resolve_program(&mut program).unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Scope);
    assert_eq!(
        *error.get_impl(),
        ErrorImpl::DuplicateDeclaration {
            identifier: String::from("x")
        }
    );
    assert_eq!(error.get_position().column, 8);
}

#[test]
fn test_duplicate_across_declaration_kinds() {
    let mut program = parse_source("CONST a = 1; PROCEDURE a; ; .");

    assert!(matches!(
        resolve_program(&mut program).unwrap_err().get_impl(),
        ErrorImpl::DuplicateDeclaration { .. }
    ));
}

#[test]
fn test_same_name_in_different_scopes() {
    let mut program = parse_source("VAR x; PROCEDURE x; VAR x; ; .");

    // The procedure duplicates the variable in the outer scope
    assert!(resolve_program(&mut program).is_err());

    let mut program = parse_source("VAR x; PROCEDURE p; VAR x; ; .");
    assert!(resolve_program(&mut program).is_ok());
}

#[test]
fn test_identifier_not_found() {
    let mut program = parse_source("VAR x; y := 1.");
    let error = resolve_program(&mut program).unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Scope);
    assert_eq!(
        *error.get_impl(),
        ErrorImpl::IdentifierNotFound {
            identifier: String::from("y")
        }
    );
}

#[test]
fn test_identifier_not_found_in_expression() {
    let mut program = parse_source("! 1 + z.");

    assert!(matches!(
        resolve_program(&mut program).unwrap_err().get_impl(),
        ErrorImpl::IdentifierNotFound { .. }
    ));
}

#[test]
fn test_lookup_prefers_open_scopes() {
    let mut table = SymbolTable::new();
    table.enter_scope();
    table.declare("a", DeclId(0), crate::Position::null()).unwrap();
    table.enter_scope();
    table.declare("a", DeclId(1), crate::Position::null()).unwrap();
    table.close_scope();

    assert_eq!(table.lookup("a"), Some(Resolution::Enclosing(DeclId(0))));

    table.enter_scope();
    table.declare("b", DeclId(2), crate::Position::null()).unwrap();
    table.close_scope();
    table.close_scope();

    assert_eq!(table.lookup("b"), Some(Resolution::Fallback(DeclId(2))));
    assert_eq!(table.lookup("c"), None);
}

#[test]
fn test_restart_reuses_scope_ids() {
    let mut table = SymbolTable::new();
    let first = table.enter_scope();
    let second = table.enter_scope();
    table.close_scope();
    table.close_scope();

    table.restart();

    assert_eq!(table.enter_scope(), first);
    assert_eq!(table.enter_scope(), second);
    assert_eq!(table.scopes().len(), 2);
}
