//! Frame layouts for the compiled units.
//!
//! Every block becomes one unit with a frame struct holding its constants and
//! variables. A nested unit's frame starts with an untyped pointer to the
//! frame of the enclosing unit instance.

use std::collections::HashMap;

use inkwell::{
    context::Context,
    types::{BasicTypeEnum, PointerType, StructType},
    AddressSpace,
};
use log::trace;

use crate::{
    ast::{
        ast::{Block, DeclId, Program},
        types::Type,
    },
    errors::errors::Error,
};

/// Index of the enclosing-instance field in a nested frame.
pub const PARENT_FIELD: u32 = 0;

#[derive(Debug)]
pub struct FrameLayout<'a> {
    /// Unit name, e.g. `prog$outer$inner`
    pub unit: String,
    /// Nesting depth of the statements running in this frame
    pub nest: u32,
    /// Frame of the lexically enclosing unit
    pub parent: Option<usize>,
    pub struct_type: StructType<'a>,
    /// Field index of each constant and variable of the block
    pub fields: HashMap<DeclId, u32>,
}

impl<'a> FrameLayout<'a> {
    pub fn ptr_type(&self) -> PointerType<'a> {
        self.struct_type.ptr_type(AddressSpace::default())
    }

    pub fn constructor_name(&self) -> String {
        format!("{}.new", self.unit)
    }

    pub fn entry_name(&self) -> String {
        format!("{}.run", self.unit)
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }
}

/// Maps a target type onto its field representation.
pub fn field_type(context: &Context, ty: Type) -> Option<BasicTypeEnum<'_>> {
    match ty {
        Type::Number => Some(context.i32_type().into()),
        Type::Boolean => Some(context.bool_type().into()),
        Type::String => Some(context.i8_type().ptr_type(AddressSpace::default()).into()),
        Type::Procedure => None,
    }
}

/// All frame layouts of a program, the program frame first and the
/// procedure frames in declaration pre-order.
#[derive(Debug)]
pub struct FrameMap<'a> {
    frames: Vec<FrameLayout<'a>>,
    owners: HashMap<DeclId, usize>,
    procedures: HashMap<DeclId, usize>,
}

impl<'a> FrameMap<'a> {
    pub fn build(context: &'a Context, program: &Program, program_name: &str) -> Result<Self, Error> {
        let mut map = FrameMap {
            frames: vec![],
            owners: HashMap::new(),
            procedures: HashMap::new(),
        };

        map.add_frame(context, program, &program.block, program_name.to_string(), 0, None)?;
        Ok(map)
    }

    fn add_frame(
        &mut self,
        context: &'a Context,
        program: &Program,
        block: &Block,
        unit: String,
        nest: u32,
        parent: Option<usize>,
    ) -> Result<usize, Error> {
        let mut field_types: Vec<BasicTypeEnum<'a>> = vec![];
        if parent.is_some() {
            field_types.push(context.i8_type().ptr_type(AddressSpace::default()).into());
        }

        let index = self.frames.len();
        let mut fields = HashMap::new();
        for id in block.field_decls() {
            let declaration = program.declarations.get(id);
            let ty = declaration
                .get_type()
                .and_then(|ty| field_type(context, ty))
                .ok_or_else(|| {
                    Error::internal(format!(
                        "`{}` has no field representation",
                        declaration.name()
                    ))
                })?;

            fields.insert(id, field_types.len() as u32);
            field_types.push(ty);
            self.owners.insert(id, index);
        }

        let struct_type = context.opaque_struct_type(&unit);
        struct_type.set_body(&field_types, false);
        trace!("frame {} has {} fields", unit, field_types.len());

        self.frames.push(FrameLayout {
            unit: unit.clone(),
            nest,
            parent,
            struct_type,
            fields,
        });

        for procedure in &block.procedures {
            let name = format!("{}${}", unit, program.declarations.get(procedure.decl).name());
            let child = self.add_frame(
                context,
                program,
                &procedure.block,
                name,
                nest + 1,
                Some(index),
            )?;
            self.procedures.insert(procedure.decl, child);
        }

        Ok(index)
    }

    pub fn get(&self, index: usize) -> &FrameLayout<'a> {
        &self.frames[index]
    }

    pub fn frames(&self) -> &[FrameLayout<'a>] {
        &self.frames
    }

    /// Frame holding the field of a constant or variable.
    pub fn owner_of(&self, decl: DeclId) -> Option<usize> {
        self.owners.get(&decl).copied()
    }

    /// Frame of the unit a procedure compiles to.
    pub fn frame_of_procedure(&self, decl: DeclId) -> Option<usize> {
        self.procedures.get(&decl).copied()
    }
}
