use crate::{
    ast::{
        ast::Program,
        expressions::ExprKind,
        statements::StmtKind,
        types::Type,
    },
    errors::errors::{Error, ErrorCategory, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::resolver::resolve_program,
};

use super::type_checker::{binary_result, infer_types, InferenceReport};

fn check(source: &str) -> Result<(Program, InferenceReport), Error> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut program = parse(tokenize(source)?)?;
    resolve_program(&mut program)?;
    let report = infer_types(&mut program)?;

    Ok((program, report))
}

fn declared_types(program: &Program) -> Vec<(String, Option<Type>)> {
    program
        .declarations
        .iter()
        .map(|(_, decl)| (decl.name().to_string(), decl.get_type()))
        .collect()
}

fn type_error(source: &str) -> ErrorImpl {
    let error = check(source).unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Type, "{}", error);
    error.get_impl().clone()
}

#[test]
fn test_infers_from_assignments() {
    let (program, _) = check("VAR x,y,z; BEGIN x:=0; y:=1; z:=FALSE; !(x=y)*z END.").unwrap();

    assert_eq!(
        declared_types(&program),
        vec![
            (String::from("x"), Some(Type::Number)),
            (String::from("y"), Some(Type::Number)),
            (String::from("z"), Some(Type::Boolean)),
        ]
    );

    let StmtKind::Block(body) = &program.block.statement.kind else {
        panic!("expected compound statement");
    };
    let StmtKind::Output(expr) = &body[3].kind else {
        panic!("expected output");
    };
    assert_eq!(expr.ty.get(), Some(Type::Boolean));
}

#[test]
fn test_assign_to_constant() {
    assert_eq!(
        type_error("CONST a=3; a:=\"Bye\"."),
        ErrorImpl::AssignToConstant {
            identifier: String::from("a")
        }
    );
}

#[test]
fn test_assign_to_constant_with_matching_type() {
    assert!(matches!(
        type_error("CONST a=3; a:=4."),
        ErrorImpl::AssignToConstant { .. }
    ));
}

#[test]
fn test_mutually_calling_procedures() {
    let (program, _) = check("PROCEDURE p; CALL q; PROCEDURE q; CALL p; !\"done\".").unwrap();

    assert_eq!(
        declared_types(&program),
        vec![
            (String::from("p"), Some(Type::Procedure)),
            (String::from("q"), Some(Type::Procedure)),
        ]
    );
}

#[test]
fn test_variable_cannot_change_type() {
    assert_eq!(
        type_error("VAR v; BEGIN v:=0; v:=\"Hi\" END."),
        ErrorImpl::TypeMatchError {
            expected: String::from("NUMBER"),
            received: String::from("STRING"),
        }
    );
}

#[test]
fn test_incompatible_operands() {
    let error = check("! 1 + \"Hi\".").unwrap_err();

    assert_eq!(
        *error.get_impl(),
        ErrorImpl::IncompatibleOperands {
            operator: String::from("+"),
            left: String::from("NUMBER"),
            right: String::from("STRING"),
        }
    );
    assert_eq!(error.get_position().column, 5);
}

#[test]
fn test_no_anchor_is_insufficient() {
    assert_eq!(
        type_error("VAR x; x := x."),
        ErrorImpl::InsufficientTypeInformation {
            identifier: String::from("x")
        }
    );
}

#[test]
fn test_unused_variable_is_insufficient() {
    assert!(matches!(
        type_error("VAR x; ."),
        ErrorImpl::InsufficientTypeInformation { .. }
    ));
}

#[test]
fn test_operand_propagates_to_variable() {
    let (program, _) = check("VAR x; ! x + 1.").unwrap();

    assert_eq!(program.declarations.iter().next().unwrap().1.get_type(), Some(Type::Number));
}

#[test]
fn test_anchor_later_in_program() {
    let (program, _) = check("VAR x, y; BEGIN x := y; y := \"s\" END.").unwrap();

    assert_eq!(
        declared_types(&program),
        vec![
            (String::from("x"), Some(Type::String)),
            (String::from("y"), Some(Type::String)),
        ]
    );
}

#[test]
fn test_anchor_in_nested_procedure() {
    let (program, _) = check("VAR x; PROCEDURE p; x := TRUE; ! x.").unwrap();

    assert_eq!(program.declarations.iter().next().unwrap().1.get_type(), Some(Type::Boolean));
}

#[test]
fn test_inference_is_idempotent() {
    let (mut program, first) = check("VAR a, b; BEGIN a := 2; b := a * 3; ! b > a END.").unwrap();
    let before = declared_types(&program);

    let second = infer_types(&mut program).unwrap();

    assert!(first.newly_typed > 0);
    assert_eq!(second.newly_typed, 0);
    assert_eq!(declared_types(&program), before);
}

#[test]
fn test_guard_must_be_boolean() {
    assert_eq!(
        type_error("IF 1 THEN ! 2."),
        ErrorImpl::NonBooleanGuard {
            received: String::from("NUMBER")
        }
    );
    assert!(matches!(
        type_error("WHILE \"s\" DO ! 2."),
        ErrorImpl::NonBooleanGuard { .. }
    ));
}

#[test]
fn test_procedure_cannot_be_output() {
    assert_eq!(type_error("PROCEDURE p; ; ! p."), ErrorImpl::NotPrintable);
}

#[test]
fn test_call_requires_procedure() {
    assert_eq!(
        type_error("VAR x; BEGIN x := 1; CALL x END."),
        ErrorImpl::NotCallable {
            identifier: String::from("x"),
            received: String::from("NUMBER"),
        }
    );
}

#[test]
fn test_input_into_procedure() {
    assert!(matches!(
        type_error("PROCEDURE p; ; ? p."),
        ErrorImpl::InvalidInputTarget { .. }
    ));
}

#[test]
fn test_propagated_type_conflicts_with_own_rule() {
    assert_eq!(
        type_error("VAR x, y; BEGIN ! 1 + (x = y); y := 2 END."),
        ErrorImpl::TypeMatchError {
            expected: String::from("NUMBER"),
            received: String::from("BOOLEAN"),
        }
    );
}

#[test]
fn test_string_comparison_is_boolean() {
    let (program, _) = check("! \"a\" < \"ab\".").unwrap();

    let StmtKind::Output(expr) = &program.block.statement.kind else {
        panic!("expected output");
    };
    assert_eq!(expr.ty.get(), Some(Type::Boolean));
    let ExprKind::Binary { left, .. } = &expr.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(left.ty.get(), Some(Type::String));
}

#[test]
fn test_operator_table() {
    use crate::ast::expressions::BinaryOperator::*;

    assert_eq!(binary_result(Plus, Type::String, Type::String), Some(Type::String));
    assert_eq!(binary_result(Plus, Type::Boolean, Type::Boolean), Some(Type::Boolean));
    assert_eq!(binary_result(Times, Type::Boolean, Type::Boolean), Some(Type::Boolean));
    assert_eq!(binary_result(Times, Type::String, Type::String), None);
    assert_eq!(binary_result(Minus, Type::Boolean, Type::Boolean), None);
    assert_eq!(binary_result(Mod, Type::Number, Type::Number), Some(Type::Number));
    assert_eq!(binary_result(GreaterEquals, Type::String, Type::String), Some(Type::Boolean));
    assert_eq!(binary_result(Equals, Type::Procedure, Type::Procedure), None);
    assert_eq!(binary_result(Plus, Type::Number, Type::Boolean), None);
}

#[test]
fn test_boolean_arithmetic_operators() {
    assert!(check("! TRUE * FALSE + TRUE.").is_ok());
    assert!(matches!(
        type_error("! TRUE - FALSE."),
        ErrorImpl::IncompatibleOperands { .. }
    ));
}

#[test]
fn test_procedure_is_not_assignable() {
    assert_eq!(
        type_error("VAR x; PROCEDURE p;; x := p."),
        ErrorImpl::ProcedureAssignment {
            identifier: String::from("x")
        }
    );
    assert!(matches!(
        type_error("PROCEDURE p;; p := p."),
        ErrorImpl::ProcedureAssignment { .. }
    ));
}
