//! Runtime support shared by every unit.
//!
//! C library functions are declared external. String helpers are defined in
//! each module that uses them with `linkonce_odr` linkage so the linker keeps
//! a single copy.

use inkwell::{
    builder::Builder,
    module::Linkage,
    values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace, IntPredicate,
};

use crate::errors::errors::Error;

use super::compiler::Compiler;

pub const ABORT: &str = "abort";
pub const PRINTF: &str = "printf";
pub const MALLOC: &str = "malloc";
pub const STRLEN: &str = "strlen";
pub const STRCPY: &str = "strcpy";
pub const STRCAT: &str = "strcat";
pub const STRCMP: &str = "strcmp";
pub const STRNCMP: &str = "strncmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringHelper {
    /// `concat(a, b)`: a fresh heap string holding `a` followed by `b`
    Concat,
    /// `starts_with(s, prefix)`
    StartsWith,
    /// `ends_with(s, suffix)`
    EndsWith,
}

impl StringHelper {
    pub fn name(&self) -> &'static str {
        match self {
            StringHelper::Concat => "string.concat",
            StringHelper::StartsWith => "string.starts_with",
            StringHelper::EndsWith => "string.ends_with",
        }
    }
}

/// Declares the C library functions in the current module.
pub fn declare_runtime(compiler: &Compiler<'_, '_>) {
    let context = compiler.context;
    let i8_ptr_type = context.i8_type().ptr_type(AddressSpace::default());
    let i32_type = context.i32_type();
    let i64_type = context.i64_type();

    let externals = [
        (ABORT, context.void_type().fn_type(&[], false)),
        (PRINTF, i32_type.fn_type(&[i8_ptr_type.into()], true)),
        (MALLOC, i8_ptr_type.fn_type(&[i64_type.into()], false)),
        (STRLEN, i64_type.fn_type(&[i8_ptr_type.into()], false)),
        (
            STRCPY,
            i8_ptr_type.fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
        ),
        (
            STRCAT,
            i8_ptr_type.fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
        ),
        (
            STRCMP,
            i32_type.fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
        ),
        (
            STRNCMP,
            i32_type.fn_type(
                &[i8_ptr_type.into(), i8_ptr_type.into(), i64_type.into()],
                false,
            ),
        ),
    ];

    for (name, function_type) in externals {
        if compiler.module.get_function(name).is_none() {
            compiler
                .module
                .add_function(name, function_type, Some(Linkage::External));
        }
    }
}

pub fn runtime_function<'a>(
    compiler: &Compiler<'a, '_>,
    name: &str,
) -> Result<FunctionValue<'a>, Error> {
    compiler
        .module
        .get_function(name)
        .ok_or_else(|| Error::internal(format!("runtime function `{}` is not declared", name)))
}

/// Calls `function` and returns its result value.
pub fn call_value<'a>(
    builder: &Builder<'a>,
    function: FunctionValue<'a>,
    args: &[BasicMetadataValueEnum<'a>],
    name: &str,
) -> Result<BasicValueEnum<'a>, Error> {
    builder
        .build_call(function, args, name)?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| {
            Error::internal(format!(
                "call to `{}` produced no value",
                function.get_name().to_string_lossy()
            ))
        })
}

fn pointer_param<'a>(function: FunctionValue<'a>, index: u32) -> Result<PointerValue<'a>, Error> {
    function
        .get_nth_param(index)
        .map(|param| param.into_pointer_value())
        .ok_or_else(|| Error::internal(format!("missing parameter {}", index)))
}

/// Returns the helper, defining it in the current module on first use.
pub fn string_helper<'a>(
    compiler: &Compiler<'a, '_>,
    helper: StringHelper,
) -> Result<FunctionValue<'a>, Error> {
    if let Some(function) = compiler.module.get_function(helper.name()) {
        return Ok(function);
    }

    let context = compiler.context;
    let i8_ptr_type = context.i8_type().ptr_type(AddressSpace::default());
    let builder = context.create_builder();

    let strlen = runtime_function(compiler, STRLEN)?;
    let function = match helper {
        StringHelper::Concat => {
            let function = compiler.module.add_function(
                helper.name(),
                i8_ptr_type.fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
                Some(Linkage::LinkOnceODR),
            );
            builder.position_at_end(context.append_basic_block(function, "entry"));

            let left = pointer_param(function, 0)?;
            let right = pointer_param(function, 1)?;

            let left_len = call_value(&builder, strlen, &[left.into()], "len.left")?.into_int_value();
            let right_len =
                call_value(&builder, strlen, &[right.into()], "len.right")?.into_int_value();
            let len = builder.build_int_add(left_len, right_len, "len")?;
            let size = builder.build_int_add(len, context.i64_type().const_int(1, false), "size")?;

            let buffer = call_value(
                &builder,
                runtime_function(compiler, MALLOC)?,
                &[size.into()],
                "buffer",
            )?;
            builder.build_call(
                runtime_function(compiler, STRCPY)?,
                &[buffer.into(), left.into()],
                "",
            )?;
            builder.build_call(
                runtime_function(compiler, STRCAT)?,
                &[buffer.into(), right.into()],
                "",
            )?;
            builder.build_return(Some(&buffer))?;

            function
        }
        StringHelper::StartsWith => {
            let function = compiler.module.add_function(
                helper.name(),
                context
                    .bool_type()
                    .fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
                Some(Linkage::LinkOnceODR),
            );
            builder.position_at_end(context.append_basic_block(function, "entry"));

            let string = pointer_param(function, 0)?;
            let prefix = pointer_param(function, 1)?;

            let prefix_len = call_value(&builder, strlen, &[prefix.into()], "len.prefix")?;
            let compared = call_value(
                &builder,
                runtime_function(compiler, STRNCMP)?,
                &[string.into(), prefix.into(), prefix_len.into()],
                "cmp",
            )?;
            let result = builder.build_int_compare(
                IntPredicate::EQ,
                compared.into_int_value(),
                context.i32_type().const_zero(),
                "starts",
            )?;
            builder.build_return(Some(&result))?;

            function
        }
        StringHelper::EndsWith => {
            let function = compiler.module.add_function(
                helper.name(),
                context
                    .bool_type()
                    .fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false),
                Some(Linkage::LinkOnceODR),
            );
            let entry = context.append_basic_block(function, "entry");
            let check = context.append_basic_block(function, "check");
            let done = context.append_basic_block(function, "done");

            builder.position_at_end(entry);
            let string = pointer_param(function, 0)?;
            let suffix = pointer_param(function, 1)?;

            let string_len =
                call_value(&builder, strlen, &[string.into()], "len.string")?.into_int_value();
            let suffix_len =
                call_value(&builder, strlen, &[suffix.into()], "len.suffix")?.into_int_value();
            let fits = builder.build_int_compare(IntPredicate::UGE, string_len, suffix_len, "fits")?;
            builder.build_conditional_branch(fits, check, done)?;

            // Compare the last `suffix_len` bytes of the string
            builder.position_at_end(check);
            let offset = builder.build_int_sub(string_len, suffix_len, "offset")?;
            let tail = unsafe { builder.build_in_bounds_gep(string, &[offset], "tail")? };
            let compared = call_value(
                &builder,
                runtime_function(compiler, STRCMP)?,
                &[tail.into(), suffix.into()],
                "cmp",
            )?;
            let equal = builder.build_int_compare(
                IntPredicate::EQ,
                compared.into_int_value(),
                context.i32_type().const_zero(),
                "equal",
            )?;
            builder.build_unconditional_branch(done)?;

            builder.position_at_end(done);
            let result = builder.build_phi(context.bool_type(), "ends")?;
            result.add_incoming(&[(&context.bool_type().const_zero(), entry), (&equal, check)]);
            builder.build_return(Some(&result.as_basic_value()))?;

            function
        }
    };

    Ok(function)
}
