// Standard node emitters
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

//! Emitters for each emittable kind of node.
//!
//! See the [parent module](super) for the stack conventions that these
//!   emitters uphold.

use super::{EmitContext, EmitError, NodeEmitter};
use crate::{
    ast::{ClrProperty, Constant, Node, NodeKind},
    il::{InstructionSink, OpCode, Operand},
    ts::MethodId,
};

/// Accessor of a property and the instruction that invokes it.
///
/// Regular properties are invoked virtually on their instance;
///   attached properties are static methods receiving the instance as
///   their first argument.
fn accessor(
    ctx: &EmitContext,
    property: &ClrProperty,
    setter: bool,
) -> Result<(OpCode, MethodId), EmitError> {
    let found = match property {
        ClrProperty::Regular(id) => {
            let prop = ctx.ts.property(*id);
            let method = if setter { prop.setter } else { prop.getter };

            method.map(|m| (OpCode::Callvirt, m))
        }

        ClrProperty::Attached(attached) => {
            let method = if setter {
                attached.setter
            } else {
                attached.getter
            };

            method.map(|m| (OpCode::Call, m))
        }
    };

    found.ok_or(EmitError::Unresolved {
        what: if setter {
            "property setter"
        } else {
            "property getter"
        },
        span: ctx.anchor(),
    })
}

/// `newobj` followed by the manipulation of the new instance.
pub struct NewObjectEmitter;

impl NodeEmitter for NewObjectEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let NodeKind::NewObject {
            ctor,
            args,
            manipulation,
            ..
        } = &node.kind
        else {
            return Ok(false);
        };

        ctx.emit_all(sink, args)?;
        ctx.instr(sink, OpCode::Newobj, Operand::Method(*ctor))?;

        if let Some(manipulation) = manipulation {
            ctx.instr(sink, OpCode::Dup, Operand::None)?;
            ctx.emit(sink, manipulation)?;
        }

        Ok(true)
    }
}

/// Strings and constants.
pub struct LiteralEmitter;

impl NodeEmitter for LiteralEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let (opcode, operand) = match &node.kind {
            NodeKind::Text { text, .. } => {
                (OpCode::Ldstr, Operand::Str(text.clone()))
            }

            NodeKind::Constant(constant) => match *constant {
                Constant::I4(n) => (OpCode::LdcI4, Operand::I4(n)),
                Constant::I8(n) => (OpCode::LdcI8, Operand::I8(n)),
                Constant::R8(n) => (OpCode::LdcR8, Operand::R8(n)),
                Constant::Bool(b) => (OpCode::LdcI4, Operand::I4(b as i32)),
            },

            _ => return Ok(false),
        };

        ctx.instr(sink, opcode, operand)?;
        Ok(true)
    }
}

/// Static calls producing a value,
///   and instance calls manipulating the instance on the stack.
pub struct MethodCallEmitter;

impl NodeEmitter for MethodCallEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let NodeKind::MethodCall { method, args } = &node.kind else {
            return Ok(false);
        };

        let def = ctx.ts.method(*method);
        let (is_static, returns) = (def.is_static, def.returns.is_some());

        ctx.emit_all(sink, args)?;

        if is_static {
            ctx.instr(sink, OpCode::Call, Operand::Method(*method))?;
        } else {
            ctx.instr(sink, OpCode::Callvirt, Operand::Method(*method))?;

            // Manipulations leave nothing behind.
            if returns {
                ctx.instr(sink, OpCode::Pop, Operand::None)?;
            }
        }

        Ok(true)
    }
}

/// Invocation of a property setter with the value of the assignment.
pub struct PropertyAssignmentEmitter;

impl NodeEmitter for PropertyAssignmentEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let NodeKind::PropertyAssignment { property, value } = &node.kind
        else {
            return Ok(false);
        };

        let (opcode, setter) = accessor(ctx, property, true)?;

        ctx.emit(sink, value)?;
        ctx.instr(sink, opcode, Operand::Method(setter))?;

        // Fluent setters return a value that nothing consumes.
        if ctx.ts.method(setter).returns.is_some() {
            ctx.instr(sink, OpCode::Pop, Operand::None)?;
        }

        Ok(true)
    }
}

/// Invocation of a property getter followed by the manipulation of the
///   value it returns.
pub struct ManipulationEmitter;

impl NodeEmitter for ManipulationEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let NodeKind::PropertyValueManipulation {
            property,
            manipulation,
        } = &node.kind
        else {
            return Ok(false);
        };

        let (opcode, getter) = accessor(ctx, property, false)?;

        ctx.instr(sink, opcode, Operand::Method(getter))?;
        ctx.emit(sink, manipulation)?;

        Ok(true)
    }
}

/// Manipulations applied in order to the same instance.
pub struct GroupEmitter;

impl NodeEmitter for GroupEmitter {
    fn emit(
        &self,
        ctx: &mut EmitContext,
        sink: &mut dyn InstructionSink,
        node: &Node,
    ) -> Result<bool, EmitError> {
        let NodeKind::ManipulationGroup { children } = &node.kind else {
            return Ok(false);
        };

        match children.split_last() {
            // The target must still be consumed.
            None => ctx.instr(sink, OpCode::Pop, Operand::None)?,

            Some((last, rest)) => {
                for child in rest {
                    ctx.instr(sink, OpCode::Dup, Operand::None)?;
                    ctx.emit(sink, child)?;
                }

                ctx.emit(sink, last)?;
            }
        }

        Ok(true)
    }
}
