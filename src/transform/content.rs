// Content and collection pass
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

//! Content properties and collections.
//!
//! Text that does not preserve whitespace is normalized:
//!   runs of whitespace collapse into a single space and leading and
//!   trailing whitespace is removed.
//! Text left empty by normalization is dropped.
//!
//! Values given to an object without naming a property
//!   ("loose content")
//!   are assigned to the object's
//!   [content property](crate::ts::TypeSystem::content_property).
//! An object without a content property whose type is itself a collection
//!   receives its loose content through `Add` calls instead.
//! Otherwise an object may have a single text value as its only content,
//!   from which it is initialized
//!     (`<x:Int32>5</x:Int32>`).
//!
//! A property whose type is a collection receives its values through
//!   `Add` calls on the collection read from the property whenever the
//!   values cannot simply be assigned to it:
//!
//! ```text
//!   <StackPanel><Label /><Label /></StackPanel>
//!     ==> PropertyValueManipulation(Children,
//!           ManipulationGroup[Add(Label), Add(Label)])
//! ```
//!
//! A value carrying an `x:Key` directive is added with the two-argument
//!   `Add(key, value)` instead.

use super::{
    properties::{property_name, property_setter, property_type},
    Context, Pass, TransformError,
};
use crate::{
    ast::{ClrProperty, DirectiveKind, Node, NodeKind, PropertyRef, TypeRef},
    span::Span,
    ts::{MethodId, TypeId, TypeSystem},
};

/// Fold loose content and route collection values into `Add` calls.
pub struct Content;

impl Pass for Content {
    fn name(&self) -> &'static str {
        "content"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let span = node.span;

        match node.kind {
            NodeKind::Text {
                text,
                preserve_whitespace: false,
            } => Ok(normalize(&text)
                .map(|text| Node::text(span, text, false))),

            NodeKind::Object {
                ty: TypeRef::Resolved(ty),
                arguments,
                children,
                markup_extension,
            } => {
                let children = fold_content(ctx, ty, children)?;

                Ok(Some(Node::new(
                    span,
                    NodeKind::Object {
                        ty: TypeRef::Resolved(ty),
                        arguments,
                        children,
                        markup_extension,
                    },
                )))
            }

            NodeKind::PropertyValue {
                property: PropertyRef::Resolved(prop),
                values,
                from_attribute,
            } => route_values(ctx, span, prop, values, from_attribute),

            kind => Ok(Some(Node::new(span, kind))),
        }
    }
}

/// Collapse whitespace runs into a single space and trim,
///   yielding [`None`] if nothing remains.
pub fn normalize(text: &str) -> Option<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match normalized.is_empty() {
        true => None,
        false => Some(normalized),
    }
}

/// Normalize text that does not preserve whitespace,
///   dropping text left empty.
fn normalize_all(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|node| match node.kind {
            NodeKind::Text {
                text,
                preserve_whitespace: false,
            } => {
                normalize(&text).map(|text| Node::text(node.span, text, false))
            }
            kind => Some(Node::new(node.span, kind)),
        })
        .collect()
}

/// Whether `node` is a value rather than a member of its parent object.
fn is_loose(node: &Node) -> bool {
    !matches!(
        node.kind,
        NodeKind::PropertyValue { .. }
            | NodeKind::Directive { .. }
            | NodeKind::XmlDirective { .. }
    )
}

/// Gather the loose content of an object of type `ty`.
fn fold_content(
    ctx: &mut Context,
    ty: TypeId,
    children: Vec<Node>,
) -> Result<Vec<Node>, TransformError> {
    let children = normalize_all(children);

    let Some(first_loose) = children.iter().position(is_loose) else {
        return Ok(children);
    };

    let (loose, mut rest): (Vec<_>, Vec<_>) =
        children.into_iter().partition(is_loose);

    let span = loose
        .iter()
        .fold(loose[0].span, |span, node| span.merge(node.span));

    // Members preceding the first loose value keep their position.
    let at = first_loose.min(rest.len());

    if let Some(content) = ctx.ts.content_property(ty) {
        let prop = ClrProperty::Regular(content);

        let explicit = rest.iter().any(|node| {
            matches!(
                &node.kind,
                NodeKind::PropertyValue {
                    property: PropertyRef::Resolved(other),
                    ..
                } if *other == prop
            )
        });

        if explicit && !is_collection(ctx.ts, property_type(ctx.ts, &prop)) {
            let err = TransformError::MultipleValues {
                property: property_name(ctx.ts, &prop),
                span,
            };

            return ctx.fail_or(err, rest);
        }

        rest.insert(
            at,
            Node::new(
                span,
                NodeKind::PropertyValue {
                    property: PropertyRef::Resolved(prop),
                    values: loose,
                    from_attribute: false,
                },
            ),
        );

        return Ok(rest);
    }

    if is_collection(ctx.ts, ty) {
        let calls = loose
            .into_iter()
            .map(|value| add_call(ctx, ty, value))
            .collect::<Result<Vec<_>, _>>();

        return match calls {
            Ok(calls) => {
                rest.splice(at..at, calls);
                Ok(rest)
            }
            Err(e) => ctx.fail_or(e, rest),
        };
    }

    // Initialization from text is left for conversion.
    let has_members = rest
        .iter()
        .any(|node| matches!(node.kind, NodeKind::PropertyValue { .. }));

    let text_only = matches!(
        loose[..],
        [Node {
            kind: NodeKind::Text { .. },
            ..
        }]
    );

    if text_only && !has_members {
        rest.splice(at..at, loose);
        return Ok(rest);
    }

    let err = TransformError::NoContentProperty {
        ty: ctx.ts.full_name(ty).to_string(),
        span,
    };

    ctx.fail_or(err, rest)
}

/// Turn the values of a collection property into `Add` calls when they
///   cannot be assigned to the property directly.
fn route_values(
    ctx: &mut Context,
    span: Span,
    prop: ClrProperty,
    values: Vec<Node>,
    from_attribute: bool,
) -> Result<Option<Node>, TransformError> {
    let ts = ctx.ts;
    let prop_ty = property_type(ts, &prop);
    let values = normalize_all(values);

    let assignable = match &values[..] {
        [value] => {
            property_setter(ts, &prop).is_some()
                && value_assignable(ctx, value, prop_ty)
        }
        _ => false,
    };

    if values.is_empty() || assignable || !is_collection(ts, prop_ty) {
        if values.len() > 1 {
            let err = TransformError::MultipleValues {
                property: property_name(ts, &prop),
                span,
            };

            return ctx.fail_or(err, None);
        }

        return Ok(Some(Node::new(
            span,
            NodeKind::PropertyValue {
                property: PropertyRef::Resolved(prop),
                values,
                from_attribute,
            },
        )));
    }

    let calls = values
        .into_iter()
        .map(|value| add_call(ctx, prop_ty, value))
        .collect::<Result<Vec<_>, _>>();

    match calls {
        Ok(calls) => Ok(Some(Node::new(
            span,
            NodeKind::PropertyValueManipulation {
                property: prop,
                manipulation: Box::new(Node::new(
                    span,
                    NodeKind::ManipulationGroup { children: calls },
                )),
            },
        ))),
        Err(e) => ctx.fail_or(e, None),
    }
}

/// Whether `value` can be stored in a location of type `ty` without
///   going through a collection.
///
/// Only values whose type is already known are considered;
///   anything else is left for conversion to decide.
fn value_assignable(ctx: &Context, value: &Node, ty: TypeId) -> bool {
    match &value.kind {
        NodeKind::Object {
            ty: TypeRef::Resolved(value_ty),
            ..
        } => ctx.ts.is_assignable_from(ty, *value_ty),
        NodeKind::Text { .. } => {
            ctx.ts.is_assignable_from(ty, ctx.mappings.string)
        }
        _ => true,
    }
}

/// Public instance `Add` method of `ty` taking `arity` arguments.
pub fn add_method(
    ts: &dyn TypeSystem,
    ty: TypeId,
    arity: usize,
) -> Option<MethodId> {
    ts.methods(ty).into_iter().find(|id| {
        let method = ts.method(*id);

        method.name == "Add"
            && method.is_public
            && !method.is_static
            && method.params.len() == arity
    })
}

/// Whether values may be added to instances of `ty`.
pub fn is_collection(ts: &dyn TypeSystem, ty: TypeId) -> bool {
    add_method(ts, ty, 1).is_some() || add_method(ts, ty, 2).is_some()
}

/// `Add` call adding `value` to a collection of type `collection`,
///   keyed if the value carries an `x:Key`.
fn add_call(
    ctx: &Context,
    collection: TypeId,
    value: Node,
) -> Result<Node, TransformError> {
    let span = value.span;
    let (key, value) = take_key(value);

    let args = match key {
        Some(key) => vec![key, value],
        None => vec![value],
    };

    let method = add_method(ctx.ts, collection, args.len()).ok_or_else(|| {
        TransformError::NotACollection {
            ty: ctx.ts.full_name(collection).to_string(),
            keyed: args.len() == 2,
            span,
        }
    })?;

    Ok(Node::new(span, NodeKind::MethodCall { method, args }))
}

/// Remove the value of an `x:Key` directive from an object.
fn take_key(value: Node) -> (Option<Node>, Node) {
    let Node { span, kind } = value;

    let NodeKind::Object {
        ty,
        arguments,
        children,
        markup_extension,
    } = kind
    else {
        return (None, Node::new(span, kind));
    };

    let mut key = None;
    let mut rest = Vec::with_capacity(children.len());

    for child in children {
        match child.kind {
            NodeKind::Directive {
                kind: DirectiveKind::Key,
                mut values,
            } if key.is_none() && values.len() == 1 => key = values.pop(),
            _ => rest.push(child),
        }
    }

    let value = Node::new(
        span,
        NodeKind::Object {
            ty,
            arguments,
            children: rest,
            markup_extension,
        },
    );

    (key, value)
}

#[cfg(test)]
mod test;
