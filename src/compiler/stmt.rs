use inkwell::values::BasicValueEnum;

use crate::{
    ast::{
        expressions::Expr,
        statements::{Stmt, StmtKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::Compiler,
    expr::gen_expression,
    runtime::{runtime_function, PRINTF},
};

pub fn gen_statement<'a>(compiler: &Compiler<'a, '_>, statement: &Stmt) -> Result<(), Error> {
    match &statement.kind {
        StmtKind::Assign { target, value } => {
            let value = gen_expression(compiler, value)?;
            let field = compiler.field_pointer(target)?;
            compiler.builder.build_store(field, value)?;
        }
        StmtKind::Call(target) => compiler.gen_call(target)?,
        StmtKind::Input(_) => {
            return Err(Error::new(
                ErrorImpl::NotImplementedError {
                    feature: String::from("input statement"),
                },
                statement.token.position,
            ))
        }
        StmtKind::Output(value) => gen_output(compiler, value)?,
        StmtKind::Block(body) => {
            for stmt in body {
                gen_statement(compiler, stmt)?;
            }
        }
        StmtKind::If { condition, body } => {
            let condition = gen_expression(compiler, condition)?.into_int_value();

            let parent_function = compiler.current_function()?;
            let then_block = compiler.context.append_basic_block(parent_function, "then");
            let end_block = compiler.context.append_basic_block(parent_function, "endif");

            compiler
                .builder
                .build_conditional_branch(condition, then_block, end_block)?;

            compiler.builder.position_at_end(then_block);
            gen_statement(compiler, body)?;
            compiler.builder.build_unconditional_branch(end_block)?;

            compiler.builder.position_at_end(end_block);
        }
        StmtKind::While { condition, body } => {
            let parent_function = compiler.current_function()?;
            let body_block = compiler.context.append_basic_block(parent_function, "do");
            let guard_block = compiler.context.append_basic_block(parent_function, "guard");
            let end_block = compiler.context.append_basic_block(parent_function, "endwhile");

            // The guard sits after the body and branches back to it
            compiler.builder.build_unconditional_branch(guard_block)?;

            compiler.builder.position_at_end(body_block);
            gen_statement(compiler, body)?;
            compiler.builder.build_unconditional_branch(guard_block)?;

            compiler.builder.position_at_end(guard_block);
            let condition = gen_expression(compiler, condition)?.into_int_value();
            compiler
                .builder
                .build_conditional_branch(condition, body_block, end_block)?;

            compiler.builder.position_at_end(end_block);
        }
        StmtKind::Empty => {}
    }

    Ok(())
}

fn gen_output<'a>(compiler: &Compiler<'a, '_>, value: &Expr) -> Result<(), Error> {
    let generated = gen_expression(compiler, value)?;

    let (format, printed): (&str, BasicValueEnum<'a>) = match value.ty.get() {
        Some(Type::Number) => ("%d\n", generated),
        Some(Type::String) => ("%s\n", generated),
        Some(Type::Boolean) => {
            let true_text = compiler.string_literal("true")?;
            let false_text = compiler.string_literal("false")?;
            let text = compiler.builder.build_select(
                generated.into_int_value(),
                true_text,
                false_text,
                "bool.text",
            )?;
            ("%s\n", text)
        }
        Some(Type::Procedure) | None => {
            return Err(Error::new(ErrorImpl::NotPrintable, value.token.position))
        }
    };

    let format = compiler.string_literal(format)?;
    compiler.builder.build_call(
        runtime_function(compiler, PRINTF)?,
        &[format.into(), printed.into()],
        "",
    )?;

    Ok(())
}
