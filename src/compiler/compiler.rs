//! Main compiler module.
//!
//! This module contains the Compiler structure that turns a resolved, typed
//! program into compiled units. Each unit is its own LLVM module holding:
//!
//! - `<unit>.new`, which heap-allocates a frame and links it to its parent
//! - `<unit>.run`, which stores the block's constants and runs its statement
//! - declarations of whatever runtime functions and other units it uses
//!
//! Frame types are shared through the LLVM context, so a unit can walk the
//! frames of its enclosing units without their definitions.

use std::{cell::RefCell, collections::HashMap};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::TargetTriple,
    types::FunctionType,
    values::{FunctionValue, PointerValue},
    AddressSpace,
};
use log::{debug, trace};

use crate::{
    ast::{
        ast::{Block, DeclId, DeclarationKind, DeclarationTable, Program},
        expressions::IdentRef,
        types::ConstValue,
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    frame::{FrameLayout, FrameMap, PARENT_FIELD},
    runtime::{call_value, declare_runtime, runtime_function, MALLOC},
    stmt::gen_statement,
};

/// Output format of each unit's code blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitFormat {
    Bitcode,
    Ir,
}

/// Settings of a compile run.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Name of the outermost unit; nested unit names are derived from it
    pub program_name: String,
    pub emit: EmitFormat,
    /// Stamped on every unit when set
    pub target_triple: Option<String>,
    /// Run the LLVM verifier on every unit
    pub verify: bool,
    /// Emit a C `main` in the program unit
    pub entry_point: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            program_name: String::from("prog"),
            emit: EmitFormat::Bitcode,
            target_triple: None,
            verify: true,
            entry_point: true,
        }
    }
}

/// One compiled unit: the unit name and its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    pub name: String,
    pub code: Vec<u8>,
}

/// The compiler state while generating units.
///
/// `module` is replaced for every unit; `current_frame` and `instance` describe
/// the frame whose entry routine is being generated.
pub struct Compiler<'a, 'p> {
    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    /// The module of the unit being generated
    pub module: Module<'a>,
    /// The resolved and typed program
    pub program: &'p Program,
    pub frames: FrameMap<'a>,
    pub options: &'p CompilerOptions,
    pub current_frame: usize,
    /// The `this` parameter of the entry routine being generated
    pub instance: Option<PointerValue<'a>>,
    /// String constants of the current module, one global per distinct text
    pub strings: RefCell<HashMap<String, PointerValue<'a>>>,
}

impl<'a, 'p> Compiler<'a, 'p> {
    pub fn new(
        context: &'a Context,
        program: &'p Program,
        frames: FrameMap<'a>,
        options: &'p CompilerOptions,
    ) -> Self {
        Compiler {
            context,
            builder: context.create_builder(),
            module: context.create_module(&options.program_name),
            program,
            frames,
            options,
            current_frame: 0,
            instance: None,
            strings: RefCell::new(HashMap::new()),
        }
    }

    pub fn declarations(&self) -> &'p DeclarationTable {
        &self.program.declarations
    }

    pub fn frame(&self) -> &FrameLayout<'a> {
        self.frames.get(self.current_frame)
    }

    /// Compiles `block` as the unit of `frame`, then the units of its
    /// procedures in declaration order.
    fn compile_block(
        &mut self,
        frame: usize,
        block: &Block,
        units: &mut Vec<CompiledUnit>,
    ) -> Result<(), Error> {
        units.push(self.compile_unit(frame, block)?);

        for procedure in &block.procedures {
            let child = self
                .frames
                .frame_of_procedure(procedure.decl)
                .ok_or_else(|| Error::internal("procedure without a frame"))?;
            self.compile_block(child, &procedure.block, units)?;
        }

        Ok(())
    }

    fn compile_unit(&mut self, frame: usize, block: &Block) -> Result<CompiledUnit, Error> {
        let unit = self.frames.get(frame).unit.clone();

        self.module = self.context.create_module(&unit);
        if let Some(triple) = &self.options.target_triple {
            self.module.set_triple(&TargetTriple::create(triple));
        }
        self.current_frame = frame;
        self.instance = None;
        self.strings.get_mut().clear();

        declare_runtime(self);

        self.gen_constructor()?;
        self.gen_entry(block)?;
        if frame == 0 && self.options.entry_point {
            self.gen_main()?;
        }

        if self.options.verify {
            self.module
                .verify()
                .map_err(|message| Error::internal(format!("{}: {}", unit, message.to_string())))?;
        }

        let code = match self.options.emit {
            EmitFormat::Bitcode => self.module.write_bitcode_to_memory().as_slice().to_vec(),
            EmitFormat::Ir => self.module.print_to_string().to_string().into_bytes(),
        };
        debug!("emitted unit {} ({} bytes)", unit, code.len());

        Ok(CompiledUnit { name: unit, code })
    }

    fn constructor_type(&self, frame: &FrameLayout<'a>) -> FunctionType<'a> {
        if frame.is_nested() {
            let i8_ptr_type = self.context.i8_type().ptr_type(AddressSpace::default());
            frame.ptr_type().fn_type(&[i8_ptr_type.into()], false)
        } else {
            frame.ptr_type().fn_type(&[], false)
        }
    }

    fn entry_type(&self, frame: &FrameLayout<'a>) -> FunctionType<'a> {
        self.context
            .void_type()
            .fn_type(&[frame.ptr_type().into()], false)
    }

    /// Returns the initializer of a unit, declaring it in the current module
    /// if it is defined elsewhere.
    pub fn get_constructor(&self, frame: usize) -> FunctionValue<'a> {
        let layout = self.frames.get(frame);
        let name = layout.constructor_name();
        self.module.get_function(&name).unwrap_or_else(|| {
            self.module.add_function(
                &name,
                self.constructor_type(layout),
                Some(Linkage::External),
            )
        })
    }

    /// Returns the entry routine of a unit, declaring it if necessary.
    pub fn get_entry(&self, frame: usize) -> FunctionValue<'a> {
        let layout = self.frames.get(frame);
        let name = layout.entry_name();
        self.module
            .get_function(&name)
            .unwrap_or_else(|| self.module.add_function(&name, self.entry_type(layout), Some(Linkage::External)))
    }

    /// `<unit>.new`: allocate a zeroed frame and store the parent link.
    fn gen_constructor(&self) -> Result<(), Error> {
        let layout = self.frame();
        let function = self.create_function(self.get_constructor(self.current_frame));

        let size = layout
            .struct_type
            .size_of()
            .ok_or_else(|| Error::internal(format!("frame {} has no size", layout.unit)))?;
        let raw = call_value(
            &self.builder,
            runtime_function(self, MALLOC)?,
            &[size.into()],
            "raw",
        )?;
        let instance = self
            .builder
            .build_pointer_cast(raw.into_pointer_value(), layout.ptr_type(), "this")?;
        self.builder
            .build_store(instance, layout.struct_type.const_zero())?;

        if layout.is_nested() {
            let parent = function
                .get_nth_param(0)
                .ok_or_else(|| Error::internal("constructor without parent parameter"))?;
            let slot = self
                .builder
                .build_struct_gep(instance, PARENT_FIELD, "parent.ref")?;
            self.builder.build_store(slot, parent)?;
        }

        self.builder.build_return(Some(&instance))?;
        Ok(())
    }

    /// `<unit>.run`: initialise constants, then the block's statement.
    fn gen_entry(&mut self, block: &Block) -> Result<(), Error> {
        let function = self.create_function(self.get_entry(self.current_frame));
        let instance = function
            .get_nth_param(0)
            .ok_or_else(|| Error::internal("entry routine without instance parameter"))?
            .into_pointer_value();
        self.instance = Some(instance);

        for id in &block.consts {
            let declaration = self.declarations().get(*id);
            let DeclarationKind::Const(value) = &declaration.kind else {
                continue;
            };
            let field = self.field_in(instance, *id)?;
            match value {
                ConstValue::Number(number) => self.builder.build_store(
                    field,
                    self.context.i32_type().const_int(*number as i64 as u64, true),
                )?,
                ConstValue::Boolean(boolean) => self.builder.build_store(
                    field,
                    self.context.bool_type().const_int(*boolean as u64, false),
                )?,
                ConstValue::String(string) => {
                    self.builder.build_store(field, self.string_literal(string)?)?
                }
            };
        }

        gen_statement(self, &block.statement)?;

        self.builder.build_return(None)?;
        Ok(())
    }

    /// C entry point constructing and running the program instance.
    fn gen_main(&self) -> Result<(), Error> {
        self.create_function(self.module.add_function(
            "main",
            self.context.i32_type().fn_type(&[], false),
            Some(Linkage::External),
        ));

        let instance = call_value(&self.builder, self.get_constructor(0), &[], "program")?;
        self.builder
            .build_call(self.get_entry(0), &[instance.into()], "")?;
        self.builder
            .build_return(Some(&self.context.i32_type().const_zero()))?;
        Ok(())
    }

    /// Field pointer of a constant or variable inside a given frame instance.
    fn field_in(
        &self,
        instance: PointerValue<'a>,
        decl: DeclId,
    ) -> Result<PointerValue<'a>, Error> {
        let owner = self
            .frames
            .owner_of(decl)
            .ok_or_else(|| Error::internal("declaration without an owning frame"))?;
        let index = *self
            .frames
            .get(owner)
            .fields
            .get(&decl)
            .ok_or_else(|| Error::internal("declaration without a field"))?;
        let name = self.declarations().get(decl).name();

        Ok(self
            .builder
            .build_struct_gep(instance, index, &format!("{}.ref", name))?)
    }

    /// Follows `hops` enclosing-instance links from the current instance and
    /// checks that the walk ends at `target`.
    fn hop(&self, hops: u32, target: usize, ident: &IdentRef) -> Result<PointerValue<'a>, Error> {
        let unreachable = || {
            Error::new(
                ErrorImpl::UnreachableFrame {
                    identifier: ident.name().to_string(),
                },
                ident.token.position,
            )
        };

        let mut instance = self
            .instance
            .ok_or_else(|| Error::internal("no frame instance outside an entry routine"))?;
        let mut frame = self.current_frame;

        for _ in 0..hops {
            let parent = self.frames.get(frame).parent.ok_or_else(unreachable)?;
            let slot = self
                .builder
                .build_struct_gep(instance, PARENT_FIELD, "parent.ref")?;
            let raw = self.builder.build_load(slot, "parent")?.into_pointer_value();
            instance = self.builder.build_pointer_cast(
                raw,
                self.frames.get(parent).ptr_type(),
                "parent.frame",
            )?;
            frame = parent;
        }

        if frame != target {
            return Err(unreachable());
        }

        trace!(
            "`{}` in {} reaches {} after {} hop(s)",
            ident.name(),
            self.frame().unit,
            self.frames.get(target).unit,
            hops
        );
        Ok(instance)
    }

    /// Instance of frame `target` as seen from a use of `ident`, walking one
    /// link per level between the use and the declaration.
    pub fn enclosing_instance(&self, ident: &IdentRef, target: usize) -> Result<PointerValue<'a>, Error> {
        let decl = ident
            .decl
            .ok_or_else(|| Error::internal(format!("`{}` was never resolved", ident.name())))?;
        let use_nest = ident
            .nest
            .ok_or_else(|| Error::internal(format!("`{}` has no use depth", ident.name())))?;
        let decl_nest = self
            .declarations()
            .get(decl)
            .nest
            .ok_or_else(|| Error::internal(format!("`{}` has no depth", ident.name())))?;

        if use_nest < decl_nest {
            return Err(Error::new(
                ErrorImpl::UnreachableFrame {
                    identifier: ident.name().to_string(),
                },
                ident.token.position,
            ));
        }

        self.hop(use_nest - decl_nest, target, ident)
    }

    /// Field pointer of the constant or variable `ident` refers to.
    pub fn field_pointer(&self, ident: &IdentRef) -> Result<PointerValue<'a>, Error> {
        let decl = ident
            .decl
            .ok_or_else(|| Error::internal(format!("`{}` was never resolved", ident.name())))?;
        let owner = self.frames.owner_of(decl).ok_or_else(|| {
            Error::new(
                ErrorImpl::CodegenError {
                    message: format!("`{}` is not a constant or variable", ident.name()),
                },
                ident.token.position,
            )
        })?;

        let instance = self.enclosing_instance(ident, owner)?;
        self.field_in(instance, decl)
    }

    /// Instantiates the procedure `target` refers to with the right parent
    /// instance and runs it.
    pub fn gen_call(&self, target: &IdentRef) -> Result<(), Error> {
        let decl = target
            .decl
            .ok_or_else(|| Error::internal(format!("`{}` was never resolved", target.name())))?;
        let callee = self.frames.frame_of_procedure(decl).ok_or_else(|| {
            Error::new(
                ErrorImpl::CodegenError {
                    message: format!("`{}` is not a procedure", target.name()),
                },
                target.token.position,
            )
        })?;
        let parent = self
            .frames
            .get(callee)
            .parent
            .ok_or_else(|| Error::internal("procedure frame without a parent"))?;

        let parent_instance = self.enclosing_instance(target, parent)?;
        let raw = self.builder.build_pointer_cast(
            parent_instance,
            self.context.i8_type().ptr_type(AddressSpace::default()),
            "parent.raw",
        )?;

        let instance = call_value(
            &self.builder,
            self.get_constructor(callee),
            &[raw.into()],
            target.name(),
        )?;
        self.builder
            .build_call(self.get_entry(callee), &[instance.into()], "")?;

        Ok(())
    }

    /// Pointer to the module's global for `text`. Equal texts share one
    /// global, so they compare as the same reference.
    pub fn string_literal(&self, text: &str) -> Result<PointerValue<'a>, Error> {
        if let Some(pointer) = self.strings.borrow().get(text) {
            return Ok(*pointer);
        }

        let pointer = self
            .builder
            .build_global_string_ptr(text, "str")?
            .as_pointer_value();
        self.strings.borrow_mut().insert(text.to_string(), pointer);
        Ok(pointer)
    }

    /// Gives a function its entry block and attributes, and positions the
    /// builder there.
    pub fn create_function(&self, function: FunctionValue<'a>) -> FunctionValue<'a> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let nounwind = self
            .context
            .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0);
        function.add_attribute(AttributeLoc::Function, nounwind);

        function
    }

    pub fn current_function(&self) -> Result<FunctionValue<'a>, Error> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or_else(|| Error::internal("builder has no insertion point"))
    }
}

/// Generates one compiled unit per block of `program`: the program unit
/// first, then every procedure in declaration pre-order.
pub fn compile<'a>(
    program: &Program,
    context: &'a Context,
    options: &CompilerOptions,
) -> Result<Vec<CompiledUnit>, Error> {
    let frames = FrameMap::build(context, program, &options.program_name)?;
    debug!("laid out {} frames", frames.frames().len());

    let mut compiler = Compiler::new(context, program, frames, options);
    let mut units = vec![];
    compiler.compile_block(0, &program.block, &mut units)?;

    Ok(units)
}
