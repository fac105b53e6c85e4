// Constructor argument pass
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

//! Constructor arguments.
//!
//! A markup extension is an object whose positional arguments are passed
//!   to its constructor;
//!     its named arguments are ordinary property values:
//!
//! ```text
//!   {Binding Items, Path=A}
//!     ==> Object(BindingExtension, arguments: [Items], children: [Path=A])
//! ```
//!
//! Objects written as elements provide their constructor arguments with
//!   an `<x:Arguments>` child,
//!     whose children are appended to the arguments of the object in
//!     order.

use super::{Context, Pass, TransformError};
use crate::{
    ast::{Node, NodeKind, TypeRef, XmlTypeRef},
    global::XAML2006_NS,
};

/// Turn markup extensions into objects and gather `x:Arguments`.
pub struct Arguments;

impl Pass for Arguments {
    fn name(&self) -> &'static str {
        "arguments"
    }

    fn transform(
        &self,
        _ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let span = node.span;

        let kind = match node.kind {
            NodeKind::MarkupExtension {
                ty,
                positional,
                named,
            } => NodeKind::Object {
                ty,
                arguments: positional,
                children: named,
                markup_extension: true,
            },

            NodeKind::Object {
                ty,
                mut arguments,
                children,
                markup_extension,
            } => {
                let mut rest = Vec::with_capacity(children.len());

                for child in children {
                    match child.kind {
                        NodeKind::Object {
                            ty: TypeRef::Xml(arg_ty),
                            children: args,
                            ..
                        } if is_arguments(&arg_ty) => arguments.extend(args),
                        _ => rest.push(child),
                    }
                }

                NodeKind::Object {
                    ty,
                    arguments,
                    children: rest,
                    markup_extension,
                }
            }

            kind => kind,
        };

        Ok(Some(Node::new(span, kind)))
    }
}

fn is_arguments(ty: &XmlTypeRef) -> bool {
    ty.xmlns == XAML2006_NS && ty.name == "Arguments"
}
