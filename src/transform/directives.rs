// Directive recognition pass
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

//! Recognition of directives in the XAML language namespace.
//!
//! Every `x:Name` is declared in the document's [`NameScope`],
//!   which does not permit a name to be declared twice.

use super::{Context, NameScope, Pass, TransformError};
use crate::{
    ast::{DirectiveKind, Node, NodeKind},
    global::XAML2006_NS,
};

/// Replace raw [`NodeKind::XmlDirective`]s with
///   [`NodeKind::Directive`]s.
pub struct Directives;

impl Pass for Directives {
    fn name(&self) -> &'static str {
        "directives"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let span = node.span;

        let (xmlns, name, values) = match node.kind {
            NodeKind::XmlDirective {
                xmlns,
                name,
                values,
            } => (xmlns, name, values),
            kind => return Ok(Some(Node::new(span, kind))),
        };

        let kind = match DirectiveKind::from_name(&name) {
            Some(kind) if xmlns == XAML2006_NS => kind,
            _ => {
                return ctx.fail_or(
                    TransformError::UnknownDirective { xmlns, name, span },
                    None,
                )
            }
        };

        if kind == DirectiveKind::Name {
            let value = match &values[..] {
                [Node {
                    kind: NodeKind::Text { text, .. },
                    span: value_span,
                }] => Some((text.trim(), *value_span)),
                _ => None,
            };

            let Some((name, name_span)) = value else {
                return ctx.fail_or(
                    TransformError::InvalidDirectiveValue {
                        name: "Name",
                        span,
                    },
                    None,
                );
            };

            let name_span = name_span.or(span);

            if let Err(first) =
                ctx.item_mut::<NameScope>().register(name, name_span)
            {
                let err = TransformError::DuplicateName {
                    name: name.to_string(),
                    span: name_span,
                    first,
                };

                return ctx.fail_or(err, None);
            }
        }

        Ok(Some(Node::new(span, NodeKind::Directive { kind, values })))
    }
}
