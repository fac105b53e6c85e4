// Operand stack verification
//
//  Copyright (C) 2014-2021 Ryan Specialty Group, LLC.
//
//  This file is part of XAMLC.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Verification of the operand stack balance of emitted code.
//!
//! A [`VerifyingEmitter`] wraps another [`InstructionSink`] and forwards
//!   everything to it while tracking the net number of stack slots pushed
//!   by the instructions that pass through.
//! At the end of a block of code,
//!   [`VerifyingEmitter::verify`] checks that the block left exactly the
//!   expected number of values on the stack and that every label it
//!   defined was marked.
//!
//! Accounting
//! ==========
//! Most instructions have a fixed effect given by their
//!   [`StackBehaviour`](super::StackBehaviour).
//! Calls depend on their callee:
//!
//!   - `call` and `callvirt` pop each argument,
//!       and the receiver unless the callee is static,
//!       and push the return value if there is one;
//!   - `newobj` pops each argument and pushes the new instance;
//!       and
//!   - `call` of a constructor
//!       (chaining to a base constructor)
//!       pops each argument and the receiver without pushing anything.
//!
//! Any other instruction whose effect depends on its operand is an
//!   [`IlError::UnknownStackBehaviour`].
//!
//! Branches
//! ========
//! Verification is limited to straight-line code.
//! Once a branch has been emitted the balance of the block can no longer
//!   be determined without control flow analysis,
//!     and so [`VerifyingEmitter::verify`] no longer checks it.
//! Labels are still checked.

use super::{
    FlowControl, IlError, InstructionSink, Label, Local, OpCode, Operand,
    StackTracking,
};
use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    global::StackDepth,
    span::UNKNOWN_SPAN,
    ts::{TypeId, TypeSystem},
};
use fxhash::FxHashMap;
use std::{error::Error, fmt::Display};

/// Sink tracking the operand stack balance of the instructions it
///   forwards to `inner`.
pub struct VerifyingEmitter<'a, S: InstructionSink> {
    ts: &'a dyn TypeSystem,
    inner: S,

    depth: StackDepth,
    paused: bool,
    branch_seen: bool,

    /// Labels defined through this sink and whether they have been
    ///   marked.
    labels: FxHashMap<Label, bool>,
}

impl<'a, S: InstructionSink> VerifyingEmitter<'a, S> {
    pub fn new(ts: &'a dyn TypeSystem, inner: S) -> Self {
        Self {
            ts,
            inner,
            depth: 0,
            paused: false,
            branch_seen: false,
            labels: FxHashMap::default(),
        }
    }

    /// Net number of stack slots pushed so far.
    pub fn depth(&self) -> StackDepth {
        self.depth
    }

    /// Whether a branch has been emitted,
    ///   disabling the balance check of [`Self::verify`].
    pub fn branch_seen(&self) -> bool {
        self.branch_seen
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Check that the block left `expected` values on the stack and marked
    ///   every label that it defined.
    pub fn verify(&self, expected: StackDepth) -> Result<(), VerifyError> {
        if !self.branch_seen && self.depth != expected {
            return Err(VerifyError::Unbalanced {
                expected,
                actual: self.depth,
            });
        }

        let mut unmarked = self
            .labels
            .iter()
            .filter(|(_, marked)| !**marked)
            .map(|(label, _)| *label)
            .collect::<Vec<_>>();

        match unmarked.is_empty() {
            true => Ok(()),
            false => {
                unmarked.sort();
                Err(VerifyError::UnmarkedLabels(unmarked))
            }
        }
    }

    /// Stack effect of `opcode` with `operand`.
    fn delta(
        &self,
        opcode: OpCode,
        operand: &Operand,
    ) -> Result<StackDepth, IlError> {
        let count = |n: usize| n as StackDepth;

        match (opcode, operand) {
            (OpCode::Newobj, Operand::Method(id)) => {
                Ok(1 - count(self.ts.method(*id).params.len()))
            }

            (OpCode::Call | OpCode::Callvirt, Operand::Method(id)) => {
                let method = self.ts.method(*id);
                let receiver = count(!method.is_static as usize);
                let args = count(method.params.len()) + receiver;

                // Chaining to another constructor consumes the receiver
                //   without replacing it.
                match method.is_constructor {
                    true => Ok(-args),
                    false => {
                        Ok(count(method.returns.is_some() as usize) - args)
                    }
                }
            }

            _ => match (opcode.pop().delta(), opcode.push().delta()) {
                (Some(pop), Some(push)) => Ok(pop + push),
                _ => Err(IlError::UnknownStackBehaviour(opcode)),
            },
        }
    }
}

impl<'a, S: InstructionSink> InstructionSink for VerifyingEmitter<'a, S> {
    fn emit(
        &mut self,
        opcode: OpCode,
        operand: Operand,
    ) -> Result<(), IlError> {
        if !self.paused {
            if matches!(
                opcode.flow(),
                FlowControl::Branch | FlowControl::CondBranch
            ) {
                self.branch_seen = true;
            }

            self.depth += self.delta(opcode, &operand)?;
        }

        self.inner.emit(opcode, operand)
    }

    fn define_label(&mut self) -> Label {
        let label = self.inner.define_label();
        self.labels.insert(label, false);
        label
    }

    fn mark_label(&mut self, label: Label) -> Result<(), IlError> {
        match self.labels.get(&label) {
            None => Err(IlError::UndeclaredLabel(label)),
            Some(true) => Err(IlError::LabelAlreadyMarked(label)),
            Some(false) => {
                self.inner.mark_label(label)?;
                self.labels.insert(label, true);
                Ok(())
            }
        }
    }

    fn define_local(&mut self, ty: TypeId) -> Local {
        self.inner.define_local(ty)
    }

    fn tracking(&mut self) -> Option<&mut dyn StackTracking> {
        Some(self)
    }
}

impl<'a, S: InstructionSink> StackTracking for VerifyingEmitter<'a, S> {
    fn pause(&mut self) {
        self.paused = true;

        if let Some(inner) = self.inner.tracking() {
            inner.pause();
        }
    }

    fn resume(&mut self) {
        self.paused = false;

        if let Some(inner) = self.inner.tracking() {
            inner.resume();
        }
    }

    /// Adjust the tracked depth of this sink and of every tracking sink
    ///   that it wraps.
    ///
    /// Adjustments made while paused are ignored.
    fn explicit_stack(&mut self, delta: StackDepth) {
        if self.paused {
            return;
        }

        self.depth += delta;

        if let Some(inner) = self.inner.tracking() {
            inner.explicit_stack(delta);
        }
    }
}

/// Generated code failed verification.
///
/// These errors indicate a defect in code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The block did not leave the expected number of values on the
    ///   stack.
    Unbalanced {
        expected: StackDepth,
        actual: StackDepth,
    },

    /// Labels that were defined but never marked,
    ///   in the order they were defined.
    UnmarkedLabels(Vec<Label>),
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use VerifyError::*;

        match self {
            Unbalanced { expected, actual } => {
                write!(f, "unbalanced stack, expected {expected} got {actual}")
            }
            UnmarkedLabels(labels) => {
                write!(f, "code block has unmarked labels:")?;
                labels.iter().try_for_each(|label| write!(f, " {label}"))
            }
        }
    }
}

impl Error for VerifyError {}

impl Diagnostic for VerifyError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        UNKNOWN_SPAN
            .internal_error("this is a defect in code generation")
            .into()
    }
}
