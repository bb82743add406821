use inkwell::{
    values::{BasicValueEnum, IntValue, PointerValue},
    IntPredicate,
};

use crate::{
    ast::{
        expressions::{BinaryOperator, Expr, ExprKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    compiler::Compiler,
    runtime::{call_value, runtime_function, string_helper, StringHelper, ABORT, STRCMP},
};

/// Generates LLVM IR for the given expression.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a, '_>,
    expression: &Expr,
) -> Result<BasicValueEnum<'a>, Error> {
    match &expression.kind {
        ExprKind::Number(value) => Ok(compiler
            .context
            .i32_type()
            .const_int(*value as i64 as u64, true)
            .into()),
        ExprKind::Boolean(value) => Ok(compiler
            .context
            .bool_type()
            .const_int(*value as u64, false)
            .into()),
        ExprKind::String(value) => Ok(compiler.string_literal(value)?.into()),
        ExprKind::Ident(ident) => {
            let field = compiler.field_pointer(ident)?;
            Ok(compiler.builder.build_load(field, ident.name())?)
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            let operand_type = left.ty.get().ok_or_else(|| {
                Error::new(
                    ErrorImpl::CodegenError {
                        message: String::from("untyped operand"),
                    },
                    left.token.position,
                )
            })?;

            let lhs = gen_expression(compiler, left)?;
            let rhs = gen_expression(compiler, right)?;

            let position = expression.token.position;
            match operand_type {
                Type::Number => {
                    gen_number_binary(compiler, *operator, lhs.into_int_value(), rhs.into_int_value())
                }
                Type::Boolean => gen_boolean_binary(
                    compiler,
                    *operator,
                    lhs.into_int_value(),
                    rhs.into_int_value(),
                    position,
                ),
                Type::String => gen_string_binary(
                    compiler,
                    *operator,
                    lhs.into_pointer_value(),
                    rhs.into_pointer_value(),
                    position,
                ),
                Type::Procedure => Err(unsupported(*operator, operand_type, position)),
            }
        }
    }
}

fn unsupported(operator: BinaryOperator, ty: Type, position: Position) -> Error {
    Error::new(
        ErrorImpl::IncompatibleOperands {
            operator: operator.symbol().to_string(),
            left: ty.to_string(),
            right: ty.to_string(),
        },
        position,
    )
}

fn comparison(operator: BinaryOperator, signed: bool) -> Option<IntPredicate> {
    let predicate = match (operator, signed) {
        (BinaryOperator::Equals, _) => IntPredicate::EQ,
        (BinaryOperator::NotEquals, _) => IntPredicate::NE,
        (BinaryOperator::Less, true) => IntPredicate::SLT,
        (BinaryOperator::LessEquals, true) => IntPredicate::SLE,
        (BinaryOperator::Greater, true) => IntPredicate::SGT,
        (BinaryOperator::GreaterEquals, true) => IntPredicate::SGE,
        (BinaryOperator::Less, false) => IntPredicate::ULT,
        (BinaryOperator::LessEquals, false) => IntPredicate::ULE,
        (BinaryOperator::Greater, false) => IntPredicate::UGT,
        (BinaryOperator::GreaterEquals, false) => IntPredicate::UGE,
        _ => return None,
    };

    Some(predicate)
}

fn gen_number_binary<'a>(
    compiler: &Compiler<'a, '_>,
    operator: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match operator {
        BinaryOperator::Plus => builder.build_int_add(lhs, rhs, "add")?,
        BinaryOperator::Minus => builder.build_int_sub(lhs, rhs, "sub")?,
        BinaryOperator::Times => builder.build_int_mul(lhs, rhs, "mul")?,
        BinaryOperator::Div | BinaryOperator::Mod => gen_division(compiler, operator, lhs, rhs)?,
        _ => match comparison(operator, true) {
            Some(predicate) => builder.build_int_compare(predicate, lhs, rhs, "cmp")?,
            None => return Err(Error::internal(format!("no NUMBER operator {}", operator))),
        },
    };

    Ok(value.into())
}

/// Truncating division and remainder. A zero divisor aborts the program;
/// `MIN / -1` wraps to `MIN` with remainder 0.
fn gen_division<'a>(
    compiler: &Compiler<'a, '_>,
    operator: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<IntValue<'a>, Error> {
    let builder = &compiler.builder;
    let i32_type = compiler.context.i32_type();
    let zero = i32_type.const_zero();

    let parent_function = compiler.current_function()?;
    let trap_block = compiler.context.append_basic_block(parent_function, "div.trap");
    let ok_block = compiler.context.append_basic_block(parent_function, "div.ok");

    let is_zero = builder.build_int_compare(IntPredicate::EQ, rhs, zero, "divisor.zero")?;
    builder.build_conditional_branch(is_zero, trap_block, ok_block)?;

    builder.position_at_end(trap_block);
    builder.build_call(runtime_function(compiler, ABORT)?, &[], "")?;
    builder.build_unreachable()?;

    builder.position_at_end(ok_block);
    let is_minus_one = builder.build_int_compare(
        IntPredicate::EQ,
        rhs,
        i32_type.const_all_ones(),
        "divisor.minus_one",
    )?;
    let divisor = builder
        .build_select(is_minus_one, i32_type.const_int(1, false), rhs, "divisor")?
        .into_int_value();

    let result = if operator == BinaryOperator::Div {
        let quotient = builder.build_int_signed_div(lhs, divisor, "div")?;
        let negated = builder.build_int_neg(lhs, "neg")?;
        builder.build_select(is_minus_one, negated, quotient, "quotient")?
    } else {
        let remainder = builder.build_int_signed_rem(lhs, divisor, "rem")?;
        builder.build_select(is_minus_one, zero, remainder, "remainder")?
    };

    Ok(result.into_int_value())
}

fn gen_boolean_binary<'a>(
    compiler: &Compiler<'a, '_>,
    operator: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match operator {
        BinaryOperator::Plus => builder.build_or(lhs, rhs, "or")?,
        BinaryOperator::Times => builder.build_and(lhs, rhs, "and")?,
        _ => match comparison(operator, false) {
            Some(predicate) => builder.build_int_compare(predicate, lhs, rhs, "cmp")?,
            None => return Err(unsupported(operator, Type::Boolean, position)),
        },
    };

    Ok(value.into())
}

/// String operators. `a <= b` holds when `b` starts with `a` and `a >= b`
/// when `b` ends with `a`; the strict forms also need distinct references.
fn gen_string_binary<'a>(
    compiler: &Compiler<'a, '_>,
    operator: BinaryOperator,
    lhs: PointerValue<'a>,
    rhs: PointerValue<'a>,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match operator {
        BinaryOperator::Plus => {
            return call_value(
                builder,
                string_helper(compiler, StringHelper::Concat)?,
                &[lhs.into(), rhs.into()],
                "concat",
            )
        }
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let compared = call_value(
                builder,
                runtime_function(compiler, STRCMP)?,
                &[lhs.into(), rhs.into()],
                "strcmp",
            )?
            .into_int_value();
            let predicate = if operator == BinaryOperator::Equals {
                IntPredicate::EQ
            } else {
                IntPredicate::NE
            };
            builder.build_int_compare(
                predicate,
                compared,
                compiler.context.i32_type().const_zero(),
                "streq",
            )?
        }
        BinaryOperator::LessEquals | BinaryOperator::Less => {
            let prefix = call_value(
                builder,
                string_helper(compiler, StringHelper::StartsWith)?,
                &[rhs.into(), lhs.into()],
                "prefix",
            )?
            .into_int_value();

            if operator == BinaryOperator::Less {
                let distinct = gen_distinct(compiler, lhs, rhs)?;
                builder.build_and(prefix, distinct, "strict.prefix")?
            } else {
                prefix
            }
        }
        BinaryOperator::GreaterEquals | BinaryOperator::Greater => {
            let suffix = call_value(
                builder,
                string_helper(compiler, StringHelper::EndsWith)?,
                &[rhs.into(), lhs.into()],
                "suffix",
            )?
            .into_int_value();

            if operator == BinaryOperator::Greater {
                let distinct = gen_distinct(compiler, lhs, rhs)?;
                builder.build_and(suffix, distinct, "strict.suffix")?
            } else {
                suffix
            }
        }
        BinaryOperator::Minus | BinaryOperator::Times | BinaryOperator::Div | BinaryOperator::Mod => {
            return Err(unsupported(operator, Type::String, position))
        }
    };

    Ok(value.into())
}

/// True when the two strings are different references.
fn gen_distinct<'a>(
    compiler: &Compiler<'a, '_>,
    lhs: PointerValue<'a>,
    rhs: PointerValue<'a>,
) -> Result<IntValue<'a>, Error> {
    let builder = &compiler.builder;
    let i64_type = compiler.context.i64_type();

    let left = builder.build_ptr_to_int(lhs, i64_type, "left.addr")?;
    let right = builder.build_ptr_to_int(rhs, i64_type, "right.addr")?;
    Ok(builder.build_int_compare(IntPredicate::NE, left, right, "distinct")?)
}
