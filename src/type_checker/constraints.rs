//! Lowering of a resolved program into type slots and constraints.
//!
//! Slot `i` for `i < declarations.len()` is the slot of `DeclId(i)`; the
//! remaining slots belong to expressions, numbered in pre-order as the
//! statements are visited.

use crate::{
    ast::{
        ast::{Block, DeclId, DeclarationKind, DeclarationTable, Program},
        expressions::{BinaryOperator, Expr, ExprKind, IdentRef},
        statements::{Stmt, StmtKind},
        types::{Type, TypeSlot},
    },
    errors::errors::Error,
    Position,
};

pub type SlotId = usize;

/// Name and position reported when a slot stays untyped.
#[derive(Debug, Clone)]
pub struct SlotLabel {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy)]
pub struct Operand {
    pub slot: SlotId,
    /// Declaration slot when the operand is an identifier.
    pub decl: Option<SlotId>,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Literal { slot: SlotId, ty: Type },
    ConstDecl { slot: SlotId, ty: Type },
    ProcDecl { slot: SlotId },
    IdentUse { slot: SlotId, decl: SlotId },
    Assign {
        target: SlotId,
        value: SlotId,
        is_const: bool,
        name: String,
        position: Position,
    },
    Binary {
        slot: SlotId,
        operator: BinaryOperator,
        left: Operand,
        right: Operand,
        position: Position,
    },
    Guard { slot: SlotId, position: Position },
    Output { slot: SlotId, position: Position },
    Input { decl: SlotId, name: String, position: Position },
    Call { decl: SlotId, name: String, position: Position },
}

impl Constraint {
    /// Slots whose change can make this constraint produce something new.
    pub fn reads(&self) -> Vec<SlotId> {
        match self {
            Constraint::Literal { .. } | Constraint::ConstDecl { .. } | Constraint::ProcDecl { .. } => {
                vec![]
            }
            Constraint::IdentUse { slot, decl } => vec![*decl, *slot],
            Constraint::Assign { target, value, .. } => vec![*value, *target],
            Constraint::Binary {
                slot, left, right, ..
            } => vec![left.slot, right.slot, *slot],
            Constraint::Guard { slot, .. } | Constraint::Output { slot, .. } => vec![*slot],
            Constraint::Input { decl, .. } | Constraint::Call { decl, .. } => vec![*decl],
        }
    }
}

#[derive(Debug)]
pub struct ConstraintSet {
    pub slots: Vec<TypeSlot>,
    pub labels: Vec<SlotLabel>,
    pub constraints: Vec<Constraint>,
    pub declaration_count: usize,
}

pub fn lower_program(program: &Program) -> Result<ConstraintSet, Error> {
    let mut lowering = Lowering::new(&program.declarations);
    lowering.lower_block(&program.block)?;

    Ok(ConstraintSet {
        slots: lowering.slots,
        labels: lowering.labels,
        constraints: lowering.constraints,
        declaration_count: program.declarations.len(),
    })
}

struct Lowering<'a> {
    declarations: &'a DeclarationTable,
    slots: Vec<TypeSlot>,
    labels: Vec<SlotLabel>,
    constraints: Vec<Constraint>,
}

impl<'a> Lowering<'a> {
    fn new(declarations: &'a DeclarationTable) -> Self {
        let mut slots = Vec::with_capacity(declarations.len());
        let mut labels = Vec::with_capacity(declarations.len());
        for (_, declaration) in declarations.iter() {
            slots.push(declaration.ty);
            labels.push(SlotLabel {
                name: declaration.name().to_string(),
                position: declaration.token.position,
            });
        }

        Lowering {
            declarations,
            slots,
            labels,
            constraints: vec![],
        }
    }

    fn expr_slot(&mut self, expr: &Expr) -> SlotId {
        self.slots.push(expr.ty);
        self.labels.push(SlotLabel {
            name: expr.token.value.clone(),
            position: expr.token.position,
        });
        self.slots.len() - 1
    }

    fn decl_of(&self, ident: &IdentRef) -> Result<DeclId, Error> {
        match ident.decl {
            Some(decl) => Ok(decl),
            None => Err(Error::internal(format!(
                "identifier `{}` at {} was never resolved",
                ident.name(),
                ident.token.position
            ))),
        }
    }

    fn lower_block(&mut self, block: &Block) -> Result<(), Error> {
        for id in &block.consts {
            if let DeclarationKind::Const(value) = &self.declarations.get(*id).kind {
                self.constraints.push(Constraint::ConstDecl {
                    slot: id.index(),
                    ty: value.get_type(),
                });
            }
        }

        for procedure in &block.procedures {
            self.constraints.push(Constraint::ProcDecl {
                slot: procedure.decl.index(),
            });
            self.lower_block(&procedure.block)?;
        }

        self.lower_stmt(&block.statement)
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let decl = self.decl_of(target)?;
                let value_slot = self.lower_expr(value)?;
                self.constraints.push(Constraint::Assign {
                    target: decl.index(),
                    value: value_slot,
                    is_const: self.declarations.get(decl).is_const(),
                    name: target.name().to_string(),
                    position: target.token.position,
                });
            }
            StmtKind::Call(target) => {
                let decl = self.decl_of(target)?.index();
                self.constraints.push(Constraint::Call {
                    decl,
                    name: target.name().to_string(),
                    position: target.token.position,
                });
            }
            StmtKind::Input(target) => {
                let decl = self.decl_of(target)?.index();
                self.constraints.push(Constraint::Input {
                    decl,
                    name: target.name().to_string(),
                    position: target.token.position,
                });
            }
            StmtKind::Output(value) => {
                let slot = self.lower_expr(value)?;
                self.constraints.push(Constraint::Output {
                    slot,
                    position: stmt.token.position,
                });
            }
            StmtKind::Block(body) => {
                for stmt in body {
                    self.lower_stmt(stmt)?;
                }
            }
            StmtKind::If { condition, body } | StmtKind::While { condition, body } => {
                let slot = self.lower_expr(condition)?;
                self.constraints.push(Constraint::Guard {
                    slot,
                    position: condition.token.position,
                });
                self.lower_stmt(body)?;
            }
            StmtKind::Empty => {}
        }

        Ok(())
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<SlotId, Error> {
        let slot = self.expr_slot(expr);

        match &expr.kind {
            ExprKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.lower_operand(left)?;
                let right = self.lower_operand(right)?;
                self.constraints.push(Constraint::Binary {
                    slot,
                    operator: *operator,
                    left,
                    right,
                    position: expr.token.position,
                });
            }
            ExprKind::Ident(ident) => {
                let decl = self.decl_of(ident)?.index();
                self.constraints.push(Constraint::IdentUse { slot, decl });
            }
            ExprKind::Number(_) => self.constraints.push(Constraint::Literal {
                slot,
                ty: Type::Number,
            }),
            ExprKind::String(_) => self.constraints.push(Constraint::Literal {
                slot,
                ty: Type::String,
            }),
            ExprKind::Boolean(_) => self.constraints.push(Constraint::Literal {
                slot,
                ty: Type::Boolean,
            }),
        }

        Ok(slot)
    }

    fn lower_operand(&mut self, expr: &Expr) -> Result<Operand, Error> {
        let slot = self.lower_expr(expr)?;
        let decl = match &expr.kind {
            ExprKind::Ident(ident) => Some(self.decl_of(ident)?.index()),
            _ => None,
        };

        Ok(Operand { slot, decl })
    }
}

/// Copies inferred slots back onto the tree, visiting it in the same order
/// as [`lower_program`].
pub fn write_back(program: &mut Program, slots: &[TypeSlot]) {
    for (index, slot) in slots.iter().take(program.declarations.len()).enumerate() {
        if let Some(ty) = slot.get() {
            program
                .declarations
                .get_mut(DeclId(index as u32))
                .ty
                .set(ty);
        }
    }

    let mut next = program.declarations.len();
    write_block(&mut program.block, slots, &mut next);
}

fn write_block(block: &mut Block, slots: &[TypeSlot], next: &mut usize) {
    for procedure in &mut block.procedures {
        write_block(&mut procedure.block, slots, next);
    }
    write_stmt(&mut block.statement, slots, next);
}

fn write_stmt(stmt: &mut Stmt, slots: &[TypeSlot], next: &mut usize) {
    match &mut stmt.kind {
        StmtKind::Assign { value, .. } => write_expr(value, slots, next),
        StmtKind::Output(value) => write_expr(value, slots, next),
        StmtKind::Block(body) => {
            for stmt in body {
                write_stmt(stmt, slots, next);
            }
        }
        StmtKind::If { condition, body } | StmtKind::While { condition, body } => {
            write_expr(condition, slots, next);
            write_stmt(body, slots, next);
        }
        StmtKind::Call(_) | StmtKind::Input(_) | StmtKind::Empty => {}
    }
}

fn write_expr(expr: &mut Expr, slots: &[TypeSlot], next: &mut usize) {
    if let Some(ty) = slots.get(*next).and_then(|slot| slot.get()) {
        expr.ty.set(ty);
    }
    *next += 1;

    if let ExprKind::Binary { left, right, .. } = &mut expr.kind {
        write_expr(left, slots, next);
        write_expr(right, slots, next);
    }
}
