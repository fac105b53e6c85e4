// Emission of instructions from transformed trees
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

//! Lowering of transformed trees into stack instructions.
//!
//! By the time a tree reaches emission,
//!   the [transformation passes](crate::transform) have rewritten every
//!   node into one of the emittable shapes
//!     ([`NodeKind::NewObject`], [`NodeKind::PropertyAssignment`], and so
//!     on).
//! An [`Emitter`] holds an ordered list of [`NodeEmitter`]s;
//!   each node is offered to them in turn and the first to claim it
//!   wins.
//! Nodes that no emitter claims fall back to their own
//!   [self-emission](emittable::emit_self).
//! A node that still goes unclaimed is a [`EmitError::NoEmitter`],
//!   which is always a defect in the transformation passes and never a
//!   problem with the document.
//!
//! Stack Conventions
//! =================
//! Emitted code follows two conventions:
//!
//!   - _Value_ nodes push exactly one slot
//!       (text, constants, intrinsics, new objects, static calls, casts,
//!       and provided values); and
//!   - _Manipulation_ nodes consume exactly one slot,
//!       being the instance that they manipulate,
//!       and push nothing
//!       (property assignments, property value manipulations, instance
//!       method calls, and manipulation groups).
//!
//! A [`NodeKind::NewObject`] duplicates its new instance before applying
//!   its manipulation so that the instance remains as its value.
//! A [`NodeKind::ManipulationGroup`] likewise duplicates its target for
//!   every child but the last.

mod emittable;
mod emitters;

pub use emitters::{
    GroupEmitter, LiteralEmitter, ManipulationEmitter, MethodCallEmitter,
    NewObjectEmitter, PropertyAssignmentEmitter,
};

use crate::{
    ast::Node,
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    il::{IlError, InstructionSink, OpCode, Operand},
    span::{Span, UNKNOWN_SPAN},
    ts::{LanguageTypeMappings, TypeSystem},
};
use std::{error::Error, fmt::Display};

/// Emitter of a particular kind of node.
pub trait NodeEmitter: Send + Sync {
    /// Emit `node` to `sink`,
    ///   or return `false` if this emitter does not handle it.
    ///
    /// Children are emitted through [`EmitContext::emit`].
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError>;
}

/// State of the emission of a single tree.
pub struct EmitContext<'a> {
    pub ts: &'a dyn TypeSystem,
    pub mappings: &'a LanguageTypeMappings,

    emitters: &'a [Box<dyn NodeEmitter>],

    /// Span of the nearest node with a known position.
    anchor: Span,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        ts: &'a dyn TypeSystem,
        mappings: &'a LanguageTypeMappings,
        emitters: &'a [Box<dyn NodeEmitter>],
    ) -> Self {
        Self {
            ts,
            mappings,
            emitters,
            anchor: UNKNOWN_SPAN,
        }
    }

    /// Emit `node` using the first emitter that claims it.
    pub fn emit(
        &mut self,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<(), EmitError> {
        let parent = self.anchor;
        self.anchor = node.span.or(parent);

        let result = self.dispatch(sink, node);

        self.anchor = parent;
        result
    }

    /// Emit each of `nodes` in order.
    pub fn emit_all<'n, I: IntoIterator<Item = &'n Node>>(
        &mut self,
        sink: &mut dyn InstructionSink,
        nodes: I,
    ) -> Result<(), EmitError> {
        nodes.into_iter().try_for_each(|node| self.emit(sink, node))
    }

    /// Emit a single instruction to `sink`.
    pub fn instr(
        &self,
        sink: &mut dyn InstructionSink,
        opcode: OpCode,
        operand: Operand,
    ) -> Result<(), EmitError> {
        sink.emit(opcode, operand)
            .map_err(|e| EmitError::Il(e, self.anchor))
    }

    /// Span of the nearest node with a known position.
    pub fn anchor(&self) -> Span {
        self.anchor
    }

    fn dispatch(
        &mut self,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<(), EmitError> {
        let emitters = self.emitters;

        for emitter in emitters {
            if emitter.emit(self, sink, node)? {
                return Ok(());
            }
        }

        match emittable::emit_self(self, sink, node)? {
            true => Ok(()),
            false => Err(EmitError::NoEmitter {
                kind: node.kind.name(),
                span: self.anchor,
            }),
        }
    }
}

/// Ordered list of [`NodeEmitter`]s.
pub struct Emitter {
    emitters: Vec<Box<dyn NodeEmitter>>,
}

impl Default for Emitter {
    /// The standard emitters in priority order.
    fn default() -> Self {
        Self::new(vec![
            Box::new(NewObjectEmitter),
            Box::new(LiteralEmitter),
            Box::new(MethodCallEmitter),
            Box::new(PropertyAssignmentEmitter),
            Box::new(ManipulationEmitter),
            Box::new(GroupEmitter),
        ])
    }
}

impl Emitter {
    pub fn new(emitters: Vec<Box<dyn NodeEmitter>>) -> Self {
        Self { emitters }
    }

    pub fn emitters(&self) -> impl Iterator<Item = &dyn NodeEmitter> {
        self.emitters.iter().map(|e| e.as_ref())
    }

    /// Emit the tree `root` to `sink`.
    pub fn emit(
        &self,
        ts: &dyn TypeSystem,
        mappings: &LanguageTypeMappings,
        sink: &mut dyn InstructionSink,
        root: &Node,
    ) -> Result<(), EmitError> {
        EmitContext::new(ts, mappings, &self.emitters).emit(sink, root)
    }
}

/// Failure to emit a tree.
///
/// These errors indicate a defect in the transformation passes or in the
///   type system,
///     never a problem with the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// No emitter claimed a node of the given kind.
    NoEmitter { kind: &'static str, span: Span },

    /// A reference that should have been resolved before emission.
    Unresolved { what: &'static str, span: Span },

    /// A language type required to emit a node is not provided by the
    ///   type system.
    MissingLanguageType(&'static str, Span),

    /// The sink rejected an instruction.
    Il(IlError, Span),
}

impl EmitError {
    pub fn span(&self) -> Span {
        use EmitError::*;

        match self {
            NoEmitter { span, .. }
            | Unresolved { span, .. }
            | MissingLanguageType(_, span)
            | Il(_, span) => *span,
        }
    }
}

impl Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use EmitError::*;

        match self {
            NoEmitter { kind, .. } => write!(f, "no emitter for {kind} node"),
            Unresolved { what, .. } => {
                write!(f, "unresolved {what} reached emission")
            }
            MissingLanguageType(name, _) => {
                write!(f, "type system does not provide `{name}`")
            }
            Il(e, _) => Display::fmt(e, f),
        }
    }
}

impl Error for EmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Il(e, _) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for EmitError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::MissingLanguageType(..) => self
                .span()
                .error("this value cannot be emitted")
                .with_help("the type catalog must declare this type"),

            _ => vec![
                self.span().internal_error("while emitting this node"),
                self.span().help(
                    "this is a bug in the compiler and not a problem \
                        with your document",
                ),
            ],
        }
    }
}
