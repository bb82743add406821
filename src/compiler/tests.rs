use inkwell::context::Context;

use crate::{
    compile_source,
    errors::errors::{Error, ErrorCategory, ErrorImpl},
};

use super::compiler::{CompiledUnit, CompilerOptions, EmitFormat};

fn ir_options() -> CompilerOptions {
    CompilerOptions {
        emit: EmitFormat::Ir,
        ..CompilerOptions::default()
    }
}

fn compile_ir(source: &str) -> Result<Vec<CompiledUnit>, Error> {
    let _ = env_logger::builder().is_test(true).try_init();

    let context = Context::create();
    compile_source(source, &context, &ir_options())
}

fn unit_text<'u>(units: &'u [CompiledUnit], name: &str) -> &'u str {
    let unit = units
        .iter()
        .find(|unit| unit.name == name)
        .unwrap_or_else(|| panic!("no unit named {}", name));
    std::str::from_utf8(&unit.code).unwrap()
}

fn prog_ir(source: &str) -> String {
    let units = compile_ir(source).unwrap();
    unit_text(&units, "prog").to_string()
}

/// Text of the function whose definition line contains `signature`.
fn function_body<'t>(ir: &'t str, signature: &str) -> &'t str {
    let start = ir
        .lines()
        .find(|line| line.starts_with("define") && line.contains(signature))
        .and_then(|line| ir.find(line))
        .unwrap_or_else(|| panic!("no definition of {}", signature));
    let end = ir[start..].find("\n}").map_or(ir.len(), |end| start + end);
    &ir[start..end]
}

fn parent_loads(ir: &str) -> usize {
    ir.lines()
        .filter(|line| line.contains("load i8*, i8** %parent.ref"))
        .count()
}

#[test]
fn test_single_unit_program() {
    let units = compile_ir("VAR x; BEGIN x := 42; !x END.").unwrap();

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, "prog");

    let ir = unit_text(&units, "prog");
    assert!(ir.contains("define %prog* @prog.new()"));
    assert!(ir.contains("define void @prog.run(%prog*"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
}

#[test]
fn test_units_in_declaration_order() {
    let units = compile_ir(
        "VAR x; PROCEDURE p; PROCEDURE q; x := 1; CALL q; PROCEDURE r; x := 2; BEGIN CALL p; CALL r END.",
    )
    .unwrap();

    let names: Vec<&str> = units.iter().map(|unit| unit.name.as_str()).collect();
    assert_eq!(names, vec!["prog", "prog$p", "prog$p$q", "prog$r"]);
}

#[test]
fn test_nested_constructor_takes_parent() {
    let units = compile_ir("VAR x; PROCEDURE p; x := 1; CALL p.").unwrap();

    let ir = unit_text(&units, "prog$p");
    assert!(ir.contains("define %\"prog$p\"* @\"prog$p.new\"(i8* %0)"));
    assert!(ir.contains("%parent.ref = getelementptr"));
    assert!(ir.contains("store i8* %0, i8** %parent.ref"));
}

#[test]
fn test_two_hops_for_grandparent_variable() {
    let units =
        compile_ir("VAR x; PROCEDURE p; PROCEDURE q; !x; CALL q; BEGIN x := 1; CALL p END.").unwrap();

    assert_eq!(parent_loads(unit_text(&units, "prog$p$q")), 2);
    assert_eq!(parent_loads(unit_text(&units, "prog$p")), 0);
    assert_eq!(parent_loads(unit_text(&units, "prog")), 0);
}

#[test]
fn test_one_hop_for_parent_variable() {
    let units = compile_ir("VAR x; PROCEDURE p; x := x + 1; BEGIN x := 0; CALL p; !x END.").unwrap();

    assert_eq!(parent_loads(unit_text(&units, "prog$p")), 2);
}

#[test]
fn test_local_variable_needs_no_hop() {
    let units = compile_ir("PROCEDURE p; VAR y; y := 3; CALL p.").unwrap();

    assert_eq!(parent_loads(unit_text(&units, "prog$p")), 0);
}

#[test]
fn test_sibling_calls_compile() {
    let units = compile_ir("PROCEDURE p; CALL q; PROCEDURE q; CALL p; !\"done\".").unwrap();

    assert_eq!(units.len(), 3);
    let p = unit_text(&units, "prog$p");
    assert!(p.contains("call %\"prog$q\"* @\"prog$q.new\"(i8* %parent.raw)"));
    assert!(p.contains("call void @\"prog$q.run\"(%\"prog$q\"* %q)"));
    assert_eq!(parent_loads(p), 1);
}

#[test]
fn test_constants_stored_on_entry() {
    let units = compile_ir("CONST n = 7, s = \"hi\", t = TRUE; !n.").unwrap();

    let ir = unit_text(&units, "prog");
    assert!(ir.contains("store i32 7"));
    assert!(ir.contains("store i1 true"));
    assert!(ir.contains("c\"hi\\00\""));
}

#[test]
fn test_boolean_output_selects_text() {
    let units = compile_ir("VAR z; BEGIN z := 1 = 1; !z END.").unwrap();

    let ir = unit_text(&units, "prog");
    assert!(ir.contains("c\"true\\00\""));
    assert!(ir.contains("c\"false\\00\""));
    assert!(ir.contains("select i1"));
}

#[test]
fn test_string_helpers_defined_on_use() {
    let units = compile_ir("VAR a; BEGIN a := \"ab\" + \"c\"; !a <= \"abc\"; !a > \"c\" END.").unwrap();

    let ir = unit_text(&units, "prog");
    assert!(ir.contains("define linkonce_odr i8* @string.concat"));
    assert!(ir.contains("define linkonce_odr i1 @string.starts_with"));
    assert!(ir.contains("define linkonce_odr i1 @string.ends_with"));
    assert!(ir.contains("ptrtoint"));
}

#[test]
fn test_unused_helpers_not_emitted() {
    let units = compile_ir("!1 + 2.").unwrap();

    let ir = unit_text(&units, "prog");
    assert!(!ir.contains("string.concat"));
    assert!(!ir.contains("string.ends_with"));
}

#[test]
fn test_while_loop_blocks() {
    let units = compile_ir("VAR i; BEGIN i := 0; WHILE i < 3 DO i := i + 1; !i END.").unwrap();

    let ir = unit_text(&units, "prog");
    let run = function_body(ir, "@prog.run(");

    // entry jumps straight to the guard, which loops back into the body
    let first_branch = run.lines().find(|line| line.contains(" br ")).unwrap();
    assert!(first_branch.contains("br label %guard"));
    assert!(run
        .lines()
        .any(|line| line.contains("%cmp = icmp slt i32 %i") && line.ends_with(", 3")));
    assert!(run.contains("br i1 %cmp, label %do, label %endwhile"));

    let body = run.find("\ndo:").unwrap();
    let guard = run.find("\nguard:").unwrap();
    let end = run.find("\nendwhile:").unwrap();
    assert!(body < guard && guard < end);
    assert!(run[body..guard].contains("br label %guard"));
}

#[test]
fn test_if_statement_blocks() {
    let units = compile_ir("VAR b; BEGIN b := TRUE; IF b THEN !\"yes\" END.").unwrap();

    let ir = unit_text(&units, "prog");
    assert!(ir.contains("br i1 %b, label %then, label %endif"));
    assert!(ir.contains("then:"));
    assert!(ir.contains("endif:"));
}

#[test]
fn test_string_prefix_relation_operands() {
    let ir = prog_ir("VAR a, b; BEGIN a := \"ab\"; b := \"abc\"; !a <= b END.");
    assert!(ir.contains("call i1 @string.starts_with(i8* %b, i8* %a)"));

    let ir = prog_ir("VAR a, b; BEGIN a := \"ab\"; b := \"abc\"; !a < b END.");
    assert!(ir.contains("%prefix = call i1 @string.starts_with(i8* %b, i8* %a)"));
    assert!(ir.contains("%left.addr = ptrtoint i8* %a to i64"));
    assert!(ir.contains("%right.addr = ptrtoint i8* %b to i64"));
    assert!(ir.contains("%distinct = icmp ne i64 %left.addr, %right.addr"));
    assert!(ir.contains("and i1 %prefix, %distinct"));
}

#[test]
fn test_string_suffix_relation_operands() {
    let ir = prog_ir("VAR a, b; BEGIN a := \"bc\"; b := \"abc\"; !a >= b END.");
    assert!(ir.contains("call i1 @string.ends_with(i8* %b, i8* %a)"));

    let ir = prog_ir("VAR a, b; BEGIN a := \"bc\"; b := \"abc\"; !a > b END.");
    assert!(ir.contains("%suffix = call i1 @string.ends_with(i8* %b, i8* %a)"));
    assert!(ir.contains("and i1 %suffix, %distinct"));
}

#[test]
fn test_string_equality_and_concat_operands() {
    let ir = prog_ir("VAR a, b; BEGIN a := \"x\"; b := \"y\"; !a = b END.");
    assert!(ir.contains("%strcmp = call i32 @strcmp(i8* %a, i8* %b)"));
    assert!(ir.contains("icmp eq i32 %strcmp, 0"));

    let ir = prog_ir("VAR a, b; BEGIN a := \"x\"; b := \"y\"; !a # b END.");
    assert!(ir.contains("icmp ne i32 %strcmp, 0"));

    let ir = prog_ir("VAR a, b; BEGIN a := \"x\"; b := \"y\"; !a + b END.");
    assert!(ir.contains("call i8* @string.concat(i8* %a, i8* %b)"));
}

#[test]
fn test_equal_literals_share_one_global() {
    let ir = prog_ir("! \"a\" < \"a\".");
    assert_eq!(ir.matches("c\"a\\00\"").count(), 1);

    let ir = prog_ir("CONST s = \"x\"; VAR t; BEGIN t := \"x\"; !s < t; !\"x\" END.");
    assert_eq!(ir.matches("c\"x\\00\"").count(), 1);
}

#[test]
fn test_boolean_operators() {
    let source = |operator: &str| {
        format!("VAR p, q; BEGIN p := TRUE; q := FALSE; !p {} q END.", operator)
    };

    assert!(prog_ir(&source("+")).contains("%or = or i1 %p, %q"));
    assert!(prog_ir(&source("*")).contains("%and = and i1 %p, %q"));
    assert!(prog_ir(&source("<")).contains("%cmp = icmp ult i1 %p, %q"));
    assert!(prog_ir(&source(">=")).contains("%cmp = icmp uge i1 %p, %q"));
    assert!(prog_ir(&source("#")).contains("%cmp = icmp ne i1 %p, %q"));
}

#[test]
fn test_number_operators() {
    let source = |operator: &str| format!("VAR m, n; BEGIN m := 7; n := 2; !m {} n END.", operator);

    assert!(prog_ir(&source("-")).contains("%sub = sub i32 %m, %n"));
    assert!(prog_ir(&source("*")).contains("%mul = mul i32 %m, %n"));
    assert!(prog_ir(&source(">")).contains("%cmp = icmp sgt i32 %m, %n"));
}

#[test]
fn test_division_is_guarded() {
    let ir = prog_ir("VAR m, n; BEGIN m := 7; n := 2; !m / n END.");

    assert!(ir.contains("%divisor.zero = icmp eq i32 %n, 0"));
    assert!(ir.contains("br i1 %divisor.zero, label %div.trap, label %div.ok"));
    assert!(ir.contains("call void @abort()"));
    assert!(ir.contains("unreachable"));
    assert!(ir.contains("%divisor.minus_one = icmp eq i32 %n, -1"));
    assert!(ir.contains("%divisor = select i1 %divisor.minus_one, i32 1, i32 %n"));
    assert!(ir.contains("%div = sdiv i32 %m, %divisor"));
    assert!(ir.contains("%quotient = select i1 %divisor.minus_one, i32 %neg, i32 %div"));

    let ir = prog_ir("VAR m, n; BEGIN m := 7; n := 2; !m % n END.");
    assert!(ir.contains("%rem = srem i32 %m, %divisor"));
    assert!(ir.contains("%remainder = select i1 %divisor.minus_one, i32 0, i32 %rem"));
}

#[test]
fn test_input_not_implemented() {
    let error = compile_ir("VAR x; BEGIN x := 0; ?x END.").unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Internal);
    assert!(matches!(
        error.get_impl(),
        ErrorImpl::NotImplementedError { .. }
    ));
    assert_eq!(error.get_position().line, 1);
}

#[test]
fn test_bitcode_is_emitted_by_default() {
    let context = Context::create();
    let units = compile_source("!1.", &context, &CompilerOptions::default()).unwrap();

    assert_eq!(units.len(), 1);
    // LLVM bitcode magic
    assert_eq!(&units[0].code[..4], b"BC\xC0\xDE");
}

#[test]
fn test_target_triple_is_stamped() {
    let options = CompilerOptions {
        target_triple: Some(String::from("x86_64-unknown-linux-gnu")),
        ..ir_options()
    };
    let context = Context::create();
    let units = compile_source("PROCEDURE p; !1; CALL p.", &context, &options).unwrap();

    for unit in &units {
        let ir = std::str::from_utf8(&unit.code).unwrap();
        assert!(ir.contains("target triple = \"x86_64-unknown-linux-gnu\""));
    }
}

#[test]
fn test_no_entry_point_when_disabled() {
    let options = CompilerOptions {
        entry_point: false,
        program_name: String::from("lib"),
        ..ir_options()
    };
    let context = Context::create();
    let units = compile_source("!1.", &context, &options).unwrap();

    assert_eq!(units[0].name, "lib");
    let ir = std::str::from_utf8(&units[0].code).unwrap();
    assert!(!ir.contains("@main"));
    assert!(ir.contains("@lib.new"));
}
