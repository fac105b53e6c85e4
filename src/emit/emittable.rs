// Self-emission of value nodes
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

//! Nodes that know how to emit themselves.
//!
//! Intrinsics,
//!   provided values,
//!   and casts are not claimed by any of the standard emitters and
//!   instead emit themselves when nothing else does.

use super::{EmitContext, EmitError};
use crate::{
    ast::{CastKind, Intrinsic, Node, NodeKind, TypeRef},
    il::{InstructionSink, OpCode, Operand},
};

/// Emit `node` if it is able to emit itself.
pub fn emit_self(
    ctx: &mut EmitContext,
    sink: &mut dyn InstructionSink,
    node: &Node,
) -> Result<bool, EmitError> {
    match &node.kind {
        NodeKind::Intrinsic(intrinsic) => {
            emit_intrinsic(ctx, sink, intrinsic)?
        }

        // `value.ProvideValue(null)`
        NodeKind::ProvideValue { method, value } => {
            ctx.emit(sink, value)?;
            ctx.instr(sink, OpCode::Ldnull, Operand::None)?;
            ctx.instr(sink, OpCode::Callvirt, Operand::Method(*method))?;
        }

        NodeKind::Cast { kind, ty, value } => {
            let opcode = match kind {
                CastKind::Box => OpCode::Box,
                CastKind::UnboxAny => OpCode::UnboxAny,
                CastKind::Class => OpCode::Castclass,
            };

            ctx.emit(sink, value)?;
            ctx.instr(sink, opcode, Operand::Type(*ty))?;
        }

        _ => return Ok(false),
    }

    Ok(true)
}

fn emit_intrinsic(
    ctx: &mut EmitContext,
    sink: &mut dyn InstructionSink,
    intrinsic: &Intrinsic,
) -> Result<(), EmitError> {
    match intrinsic {
        Intrinsic::Null => ctx.instr(sink, OpCode::Ldnull, Operand::None),

        Intrinsic::TypeOf(TypeRef::Resolved(ty)) => {
            let get_type = ctx.mappings.get_type_from_handle.ok_or(
                EmitError::MissingLanguageType(
                    "System.Type.GetTypeFromHandle",
                    ctx.anchor(),
                ),
            )?;

            ctx.instr(sink, OpCode::Ldtoken, Operand::Type(*ty))?;
            ctx.instr(sink, OpCode::Call, Operand::Method(get_type))
        }

        Intrinsic::Static {
            getter: Some(getter),
            ..
        } => ctx.instr(sink, OpCode::Call, Operand::Method(*getter)),

        Intrinsic::TypeOf(TypeRef::Xml(..)) => Err(EmitError::Unresolved {
            what: "type",
            span: ctx.anchor(),
        }),

        Intrinsic::Static { getter: None, .. } => Err(EmitError::Unresolved {
            what: "static member",
            span: ctx.anchor(),
        }),
    }
}
