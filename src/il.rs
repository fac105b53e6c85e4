// Intermediate language instructions
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

//! Stack-based instructions and the sinks that receive them.
//!
//! Emission writes [`OpCode`]s and their [`Operand`]s to an
//!   [`InstructionSink`].
//! Each opcode documents how many operand stack slots it pops and pushes
//!   (see [`StackBehaviour`]),
//!     which the [`VerifyingEmitter`](verify::VerifyingEmitter) uses to
//!     check that generated code leaves the stack as expected.
//!
//! The [`InstructionBuffer`] simply records instructions in order and is
//!   the artifact produced by compilation.
//! It can be rendered as a listing for inspection:
//!
//! ```text
//! IL_0000: newobj Demo.Button::.ctor()
//! IL_0001: dup
//! IL_0002: ldstr "Hi"
//! IL_0003: callvirt Demo.Button::set_Content(System.Object)
//! IL_0004: ret
//! ```

pub mod verify;

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    global::StackDepth,
    span::UNKNOWN_SPAN,
    ts::{MethodDisplay, MethodId, TypeId, TypeSystem},
};
use std::{error::Error, fmt::Display};

/// How an instruction affects one side of the operand stack.
///
/// Pops and pushes are described separately;
///   an instruction's net effect is the sum of its
///   [`OpCode::pop`] and [`OpCode::push`] deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackBehaviour {
    Pop0,
    Pop1,
    Pop1Pop1,
    Popi,
    PopiPopi,
    Popref,
    PoprefPopi,

    /// Pops a number of slots depending on the operand.
    Varpop,

    Push0,
    Push1,
    Push1Push1,
    Pushi,
    Pushi8,
    Pushr8,
    Pushref,

    /// Pushes a number of slots depending on the operand.
    Varpush,
}

impl StackBehaviour {
    /// Net change in stack depth,
    ///   or [`None`] if it depends on the operand.
    pub fn delta(self) -> Option<StackDepth> {
        use StackBehaviour::*;

        match self {
            Pop0 | Push0 => Some(0),
            Pop1 | Popi | Popref => Some(-1),
            Pop1Pop1 | PopiPopi | PoprefPopi => Some(-2),
            Push1 | Pushi | Pushi8 | Pushr8 | Pushref => Some(1),
            Push1Push1 => Some(2),
            Varpop | Varpush => None,
        }
    }
}

/// Effect of an instruction on control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    Next,
    Call,
    Branch,
    CondBranch,
    Return,
}

/// Instructions that may be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Nop,
    Ldnull,
    LdcI4,
    LdcI8,
    LdcR8,
    Ldstr,
    Ldtoken,
    Dup,
    Pop,
    Ldloc,
    Stloc,
    Call,
    Callvirt,
    Newobj,
    Box,
    UnboxAny,
    Castclass,
    Br,
    Brtrue,
    Brfalse,
    Ret,
}

impl OpCode {
    /// Mnemonic of the instruction as it appears in listings.
    pub fn mnemonic(self) -> &'static str {
        use OpCode::*;

        match self {
            Nop => "nop",
            Ldnull => "ldnull",
            LdcI4 => "ldc.i4",
            LdcI8 => "ldc.i8",
            LdcR8 => "ldc.r8",
            Ldstr => "ldstr",
            Ldtoken => "ldtoken",
            Dup => "dup",
            Pop => "pop",
            Ldloc => "ldloc",
            Stloc => "stloc",
            Call => "call",
            Callvirt => "callvirt",
            Newobj => "newobj",
            Box => "box",
            UnboxAny => "unbox.any",
            Castclass => "castclass",
            Br => "br",
            Brtrue => "brtrue",
            Brfalse => "brfalse",
            Ret => "ret",
        }
    }

    pub fn pop(self) -> StackBehaviour {
        use OpCode::*;
        use StackBehaviour::*;

        match self {
            Nop | Ldnull | LdcI4 | LdcI8 | LdcR8 | Ldstr | Ldtoken | Ldloc
            | Br => Pop0,
            Dup | OpCode::Pop | Stloc | OpCode::Box => Pop1,
            UnboxAny | Castclass => Popref,
            Brtrue | Brfalse => Popi,
            Call | Callvirt | Newobj | Ret => Varpop,
        }
    }

    pub fn push(self) -> StackBehaviour {
        use OpCode::*;
        use StackBehaviour::*;

        match self {
            Nop | OpCode::Pop | Stloc | Br | Brtrue | Brfalse | Ret => Push0,
            Ldnull | Ldstr | Newobj | OpCode::Box | Castclass => Pushref,
            LdcI4 | Ldtoken => Pushi,
            LdcI8 => Pushi8,
            LdcR8 => Pushr8,
            Dup => Push1Push1,
            Ldloc | UnboxAny => Push1,
            Call | Callvirt => Varpush,
        }
    }

    pub fn flow(self) -> FlowControl {
        use OpCode::*;

        match self {
            Call | Callvirt | Newobj => FlowControl::Call,
            Br => FlowControl::Branch,
            Brtrue | Brfalse => FlowControl::CondBranch,
            Ret => FlowControl::Return,
            _ => FlowControl::Next,
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A position in the instruction stream to branch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A local variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Local(pub u32);

/// Argument of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    I4(i32),
    I8(i64),
    R8(f64),
    Str(String),
    Type(TypeId),
    Method(MethodId),
    Label(Label),
    Local(Local),
}

/// An instruction and its operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Self { opcode, operand }
    }
}

/// Receiver of emitted instructions.
pub trait InstructionSink {
    fn emit(
        &mut self,
        opcode: OpCode,
        operand: Operand,
    ) -> Result<(), IlError>;

    fn define_label(&mut self) -> Label;

    /// Denote the position of the next emitted instruction by `label`.
    ///
    /// Each label must be marked exactly once.
    fn mark_label(&mut self, label: Label) -> Result<(), IlError>;

    fn define_local(&mut self, ty: TypeId) -> Local;

    /// Stack tracking provided by this sink,
    ///   if any.
    ///
    /// Sinks that wrap other sinks use this to reach tracking sinks further
    ///   down the chain.
    fn tracking(&mut self) -> Option<&mut dyn StackTracking> {
        None
    }
}

/// Control over a sink that tracks the depth of the operand stack.
pub trait StackTracking {
    /// Stop accounting for emitted instructions.
    fn pause(&mut self);

    /// Resume accounting for emitted instructions.
    fn resume(&mut self);

    /// Adjust the tracked depth by `delta` for code whose effect cannot be
    ///   derived from its instructions.
    fn explicit_stack(&mut self, delta: StackDepth);
}

/// Instructions recorded in the order they were emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionBuffer {
    instructions: Vec<Instruction>,

    /// Index of the instruction that each label denotes,
    ///   once marked.
    labels: Vec<Option<usize>>,

    locals: Vec<TypeId>,
}

impl InstructionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn opcodes(&self) -> impl Iterator<Item = OpCode> + '_ {
        self.instructions.iter().map(|i| i.opcode)
    }

    pub fn locals(&self) -> &[TypeId] {
        &self.locals
    }

    /// Index of the instruction denoted by `label`,
    ///   if it has been marked.
    pub fn label_target(&self, label: Label) -> Option<usize> {
        self.labels.get(label.0 as usize).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Human-readable listing of the instructions,
    ///   naming types and methods through `ts`.
    pub fn listing<'a>(&'a self, ts: &'a dyn TypeSystem) -> Listing<'a> {
        Listing { buf: self, ts }
    }
}

impl InstructionSink for InstructionBuffer {
    fn emit(
        &mut self,
        opcode: OpCode,
        operand: Operand,
    ) -> Result<(), IlError> {
        self.instructions.push(Instruction::new(opcode, operand));
        Ok(())
    }

    fn define_label(&mut self) -> Label {
        self.labels.push(None);
        Label((self.labels.len() - 1) as u32)
    }

    fn mark_label(&mut self, label: Label) -> Result<(), IlError> {
        let at = self.instructions.len();

        match self.labels.get_mut(label.0 as usize) {
            None => Err(IlError::UndeclaredLabel(label)),
            Some(Some(_)) => Err(IlError::LabelAlreadyMarked(label)),
            Some(slot) => {
                *slot = Some(at);
                Ok(())
            }
        }
    }

    fn define_local(&mut self, ty: TypeId) -> Local {
        self.locals.push(ty);
        Local((self.locals.len() - 1) as u32)
    }
}

/// Listing of an [`InstructionBuffer`].
pub struct Listing<'a> {
    buf: &'a InstructionBuffer,
    ts: &'a dyn TypeSystem,
}

impl<'a> Display for Listing<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { buf, ts } = self;

        for (i, ty) in buf.locals.iter().enumerate() {
            writeln!(f, ".local {i}: {}", ts.full_name(*ty))?;
        }

        for (i, instr) in buf.instructions.iter().enumerate() {
            for (label, _) in buf
                .labels
                .iter()
                .enumerate()
                .filter(|(_, at)| **at == Some(i))
            {
                writeln!(f, "{}:", Label(label as u32))?;
            }

            write!(f, "IL_{i:04x}: {}", instr.opcode)?;

            match &instr.operand {
                Operand::None => Ok(()),
                Operand::I4(n) => write!(f, " {n}"),
                Operand::I8(n) => write!(f, " {n}"),
                Operand::R8(n) => write!(f, " {n:?}"),
                Operand::Str(s) => write!(f, " {s:?}"),
                Operand::Type(ty) => write!(f, " {}", ts.full_name(*ty)),
                Operand::Method(m) => write!(f, " {}", MethodDisplay(*ts, *m)),
                Operand::Label(label) => write!(f, " {label}"),
                Operand::Local(Local(n)) => write!(f, " {n}"),
            }?;

            writeln!(f)?;
        }

        Ok(())
    }
}

/// Misuse of an [`InstructionSink`].
///
/// These errors indicate a defect in code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IlError {
    /// The stack effect of an instruction could not be determined from
    ///   its opcode and operand.
    UnknownStackBehaviour(OpCode),

    /// A label was marked that was never defined.
    UndeclaredLabel(Label),

    /// A label was marked more than once.
    LabelAlreadyMarked(Label),
}

impl Display for IlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use IlError::*;

        match self {
            UnknownStackBehaviour(opcode) => {
                write!(f, "unknown stack behaviour for `{opcode}`")
            }
            UndeclaredLabel(label) => {
                write!(f, "attempt to mark undeclared label {label}")
            }
            LabelAlreadyMarked(label) => {
                write!(f, "label {label} has already been marked")
            }
        }
    }
}

impl Error for IlError {}

impl Diagnostic for IlError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        UNKNOWN_SPAN
            .internal_error("this is a defect in code generation")
            .into()
    }
}
