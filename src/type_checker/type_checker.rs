use std::collections::VecDeque;

use log::{debug, trace};

use crate::{
    ast::{
        ast::Program,
        expressions::BinaryOperator,
        types::{describe, Type, TypeSlot},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::constraints::{lower_program, write_back, Constraint, ConstraintSet, SlotId, SlotLabel};

/// Summary of one inference run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceReport {
    pub slots: usize,
    pub constraints: usize,
    /// Number of constraint evaluations until the worklist drained.
    pub evaluations: usize,
    /// Slots that went from unset to set during this run.
    pub newly_typed: usize,
}

/// Infers a type for every declaration and expression of a resolved program.
///
/// Slots already set on the tree are kept, so running inference again on an
/// annotated program changes nothing.
pub fn infer_types(program: &mut Program) -> Result<InferenceReport, Error> {
    let mut checker = TypeChecker::new(lower_program(program)?);
    checker.run()?;
    checker.check_complete()?;

    write_back(program, &checker.slots);

    let report = checker.report();
    debug!(
        "typed {} new slots of {} after {} evaluations",
        report.newly_typed, report.slots, report.evaluations
    );

    Ok(report)
}

/// Result type of `left operator right`, or None if the operator does not
/// accept the operand types.
pub fn binary_result(operator: BinaryOperator, left: Type, right: Type) -> Option<Type> {
    if left != right {
        return None;
    }

    match operator {
        BinaryOperator::Plus => match left {
            Type::Number | Type::Boolean | Type::String => Some(left),
            Type::Procedure => None,
        },
        BinaryOperator::Minus | BinaryOperator::Div | BinaryOperator::Mod => match left {
            Type::Number => Some(Type::Number),
            _ => None,
        },
        BinaryOperator::Times => match left {
            Type::Number | Type::Boolean => Some(left),
            _ => None,
        },
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::Less
        | BinaryOperator::LessEquals
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEquals => {
            if left.is_value() {
                Some(Type::Boolean)
            } else {
                None
            }
        }
    }
}

pub struct TypeChecker {
    slots: Vec<TypeSlot>,
    labels: Vec<SlotLabel>,
    constraints: Vec<Constraint>,
    declaration_count: usize,
    /// For each slot, the constraints that read it.
    dependents: Vec<Vec<usize>>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    evaluations: usize,
    newly_typed: usize,
}

impl TypeChecker {
    pub fn new(set: ConstraintSet) -> Self {
        let mut dependents = vec![vec![]; set.slots.len()];
        for (index, constraint) in set.constraints.iter().enumerate() {
            for slot in constraint.reads() {
                if !dependents[slot].contains(&index) {
                    dependents[slot].push(index);
                }
            }
        }

        let count = set.constraints.len();
        TypeChecker {
            slots: set.slots,
            labels: set.labels,
            constraints: set.constraints,
            declaration_count: set.declaration_count,
            dependents,
            queue: (0..count).collect(),
            queued: vec![true; count],
            evaluations: 0,
            newly_typed: 0,
        }
    }

    pub fn report(&self) -> InferenceReport {
        InferenceReport {
            slots: self.slots.len(),
            constraints: self.constraints.len(),
            evaluations: self.evaluations,
            newly_typed: self.newly_typed,
        }
    }

    /// Evaluates constraints until no slot changes.
    pub fn run(&mut self) -> Result<(), Error> {
        while let Some(index) = self.queue.pop_front() {
            self.queued[index] = false;
            self.evaluations += 1;
            self.evaluate(index)?;
        }

        Ok(())
    }

    /// Fails on the first slot left untyped, declarations before expressions.
    pub fn check_complete(&self) -> Result<(), Error> {
        match self.slots.iter().position(|slot| !slot.is_set()) {
            Some(slot) => {
                let label = &self.labels[slot];
                Err(Error::new(
                    ErrorImpl::InsufficientTypeInformation {
                        identifier: label.name.clone(),
                    },
                    label.position,
                ))
            }
            None => Ok(()),
        }
    }

    pub fn slot(&self, slot: SlotId) -> Option<Type> {
        self.slots[slot].get()
    }

    /// Sets `slot` to `ty`, or checks agreement if it is already set.
    fn assign(&mut self, slot: SlotId, ty: Type, position: Position) -> Result<(), Error> {
        match self.slots[slot].get() {
            Some(existing) if existing == ty => Ok(()),
            Some(existing) => Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: existing.to_string(),
                    received: ty.to_string(),
                },
                position,
            )),
            None => {
                self.slots[slot].set(ty);
                self.newly_typed += 1;
                trace!(
                    "{} `{}` at {} is {}",
                    if slot < self.declaration_count {
                        "declaration"
                    } else {
                        "expression"
                    },
                    self.labels[slot].name,
                    self.labels[slot].position,
                    ty
                );

                for index in 0..self.dependents[slot].len() {
                    let dependent = self.dependents[slot][index];
                    if !self.queued[dependent] {
                        self.queued[dependent] = true;
                        self.queue.push_back(dependent);
                    }
                }
                Ok(())
            }
        }
    }

    fn evaluate(&mut self, index: usize) -> Result<(), Error> {
        match self.constraints[index].clone() {
            Constraint::Literal { slot, ty } | Constraint::ConstDecl { slot, ty } => {
                let position = self.labels[slot].position;
                self.assign(slot, ty, position)
            }
            Constraint::ProcDecl { slot } => {
                let position = self.labels[slot].position;
                self.assign(slot, Type::Procedure, position)
            }
            Constraint::IdentUse { slot, decl } => match self.slot(decl) {
                Some(ty) => {
                    let position = self.labels[slot].position;
                    self.assign(slot, ty, position)
                }
                None => Ok(()),
            },
            Constraint::Assign {
                target,
                value,
                is_const,
                name,
                position,
            } => {
                if is_const {
                    return Err(Error::new(
                        ErrorImpl::AssignToConstant { identifier: name },
                        position,
                    ));
                }

                match self.slot(value) {
                    Some(ty) if !ty.is_value() => Err(Error::new(
                        ErrorImpl::ProcedureAssignment { identifier: name },
                        position,
                    )),
                    Some(ty) => self.assign(target, ty, position),
                    None => Ok(()),
                }
            }
            Constraint::Binary {
                slot,
                operator,
                left,
                right,
                position,
            } => {
                // Exactly one typed operand: the other one must match it
                match (self.slot(left.slot), self.slot(right.slot)) {
                    (Some(ty), None) => {
                        self.assign(right.slot, ty, position)?;
                        if let Some(decl) = right.decl {
                            self.assign(decl, ty, position)?;
                        }
                    }
                    (None, Some(ty)) => {
                        self.assign(left.slot, ty, position)?;
                        if let Some(decl) = left.decl {
                            self.assign(decl, ty, position)?;
                        }
                    }
                    _ => {}
                }

                match (self.slot(left.slot), self.slot(right.slot)) {
                    (Some(left_ty), Some(right_ty)) => {
                        match binary_result(operator, left_ty, right_ty) {
                            Some(result) => self.assign(slot, result, position),
                            None => Err(Error::new(
                                ErrorImpl::IncompatibleOperands {
                                    operator: operator.symbol().to_string(),
                                    left: left_ty.to_string(),
                                    right: right_ty.to_string(),
                                },
                                position,
                            )),
                        }
                    }
                    _ => Ok(()),
                }
            }
            Constraint::Guard { slot, position } => match self.slot(slot) {
                Some(Type::Boolean) | None => Ok(()),
                Some(ty) => Err(Error::new(
                    ErrorImpl::NonBooleanGuard {
                        received: ty.to_string(),
                    },
                    position,
                )),
            },
            Constraint::Output { slot, position } => match self.slot(slot) {
                Some(Type::Procedure) => Err(Error::new(ErrorImpl::NotPrintable, position)),
                _ => Ok(()),
            },
            Constraint::Input {
                decl,
                name,
                position,
            } => match self.slot(decl) {
                Some(Type::Procedure) => Err(Error::new(
                    ErrorImpl::InvalidInputTarget { identifier: name },
                    position,
                )),
                _ => Ok(()),
            },
            Constraint::Call {
                decl,
                name,
                position,
            } => match self.slot(decl) {
                Some(Type::Procedure) | None => Ok(()),
                Some(ty) => Err(Error::new(
                    ErrorImpl::NotCallable {
                        identifier: name,
                        received: describe(Some(ty)),
                    },
                    position,
                )),
            },
        }
    }
}
