// Intrinsic recognition pass
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

//! Recognition of the built-in values of the XAML language.
//!
//! | Markup                                   | Intrinsic              |
//! |------------------------------------------|------------------------|
//! | `{x:Null}`, `<x:Null />`                 | [`Intrinsic::Null`]    |
//! | `{x:Type p:Name}`, `{x:Type TypeName=…}` | [`Intrinsic::TypeOf`]  |
//! | `{x:Static p:Type.Member}`, `Member=…`   | [`Intrinsic::Static`]  |
//!
//! Each may also be written with its `Extension` suffix,
//!   and in element form with named arguments as attributes.

use super::{Context, Pass, TransformError};
use crate::{
    ast::{Intrinsic, Node, NodeKind, PropertyRef, TypeRef, XmlTypeRef},
    global::XAML2006_NS,
    span::Span,
};

/// Replace `x:Null`,
///   `x:Type`,
///   and `x:Static` with [`NodeKind::Intrinsic`].
pub struct Intrinsics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Null,
    Type,
    Static,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name.strip_suffix("Extension").unwrap_or(name) {
            "Null" => Some(Self::Null),
            "Type" => Some(Self::Type),
            "Static" => Some(Self::Static),
            _ => None,
        }
    }
}

impl Pass for Intrinsics {
    fn name(&self) -> &'static str {
        "intrinsics"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let builtin = match &node.kind {
            NodeKind::MarkupExtension {
                ty: TypeRef::Xml(ty),
                ..
            }
            | NodeKind::Object {
                ty: TypeRef::Xml(ty),
                ..
            } if ty.xmlns == XAML2006_NS => Builtin::from_name(&ty.name),
            _ => None,
        };

        let Some(builtin) = builtin else {
            return Ok(Some(node));
        };

        let span = node.span;

        let (positional, named) = match &node.kind {
            NodeKind::MarkupExtension {
                positional, named, ..
            } => (&positional[..], &named[..]),
            NodeKind::Object { children, .. } => (&[][..], &children[..]),
            _ => (&[][..], &[][..]),
        };

        let intrinsic = match builtin {
            Builtin::Null => Ok(Intrinsic::Null),

            Builtin::Type => argument(positional, named, "TypeName")
                .ok_or(TransformError::MissingIntrinsicArgument {
                    intrinsic: "x:Type",
                    arg: "TypeName",
                    span,
                })
                .and_then(|(name, name_span)| {
                    type_name(ctx, name, name_span).map(Intrinsic::TypeOf)
                }),

            Builtin::Static => argument(positional, named, "Member")
                .ok_or(TransformError::MissingIntrinsicArgument {
                    intrinsic: "x:Static",
                    arg: "Member",
                    span,
                })
                .and_then(|(member, member_span)| {
                    static_member(ctx, member, member_span)
                }),
        };

        match intrinsic {
            Ok(intrinsic) => {
                Ok(Some(Node::new(span, NodeKind::Intrinsic(intrinsic))))
            }
            Err(e) => ctx.fail_or(e, None),
        }
    }
}

/// Textual argument named `name`,
///   or else the first positional argument.
fn argument<'n>(
    positional: &'n [Node],
    named: &'n [Node],
    name: &str,
) -> Option<(&'n str, Span)> {
    let named = named.iter().find_map(|node| match &node.kind {
        NodeKind::PropertyValue {
            property: PropertyRef::Name(prop),
            values,
            ..
        } if prop.name == name => values.first(),
        _ => None,
    });

    match named.or_else(|| positional.first()) {
        Some(Node {
            kind: NodeKind::Text { text, .. },
            span,
        }) => Some((text.trim(), *span)),
        _ => None,
    }
}

/// Resolve a `prefix:Name` type name to an unresolved type reference.
fn type_name(
    ctx: &Context,
    name: &str,
    span: Span,
) -> Result<TypeRef, TransformError> {
    let resolved = ctx
        .namespaces
        .resolve(name)
        .map_err(|e| TransformError::Namespace(e, span))?;

    Ok(TypeRef::Xml(XmlTypeRef::new(
        span,
        resolved.uri,
        resolved.local,
    )))
}

/// Resolve a `prefix:Type.Member` reference.
fn static_member(
    ctx: &Context,
    member: &str,
    span: Span,
) -> Result<Intrinsic, TransformError> {
    let resolved = ctx
        .namespaces
        .resolve(member)
        .map_err(|e| TransformError::Namespace(e, span))?;

    match resolved.local.rsplit_once('.') {
        Some((ty, name)) if !ty.is_empty() && !name.is_empty() => {
            Ok(Intrinsic::Static {
                ty: TypeRef::Xml(XmlTypeRef::new(span, resolved.uri, ty)),
                member: name.to_string(),
                getter: None,
            })
        }
        _ => Err(TransformError::InvalidStaticMember(member.to_string(), span)),
    }
}

#[cfg(test)]
mod test;
