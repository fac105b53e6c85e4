// Object construction and value conversion pass
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

//! Lowering of objects into construction and assignment.
//!
//! An object initialized from text is converted from that text.
//! Every other object of a resolved type becomes a
//!   [`NodeKind::NewObject`]:
//!   its arguments select a public constructor of the same arity into
//!   whose parameter types they can all be converted,
//!     and its members become a group of manipulations applied to the new
//!     instance:
//!
//!   - A property value becomes a [`NodeKind::PropertyAssignment`] of its
//!       single value;
//!   - `x:Name` is assigned to the `Name` property of the type,
//!       if it has a settable one;
//!   - `Add` calls and collection manipulations are kept;
//!       and
//!   - Other directives are dropped,
//!       having already served their purpose.
//!
//! Objects whose type provides `ProvideValue(IServiceProvider)` are markup
//!   extensions and are wrapped in a [`NodeKind::ProvideValue`].
//!
//! Values nested within an object are lowered together with it,
//!   before its constructor is selected.
//! When lenient mode drops a nested value,
//!   the member,
//!     `Add` call,
//!     or object that needed it is dropped in turn,
//!   so that no node is ever left without a value it requires.
//!
//! Conversion
//! ==========
//! Values are converted to the type of the location receiving them
//!   (see [`convert`]).
//! Text is parsed into the primitive language types directly,
//!   and into any other type through a public static `Parse(String)` of
//!   that type.
//! Values of known type are boxed,
//!   unboxed,
//!   or cast as needed.

use super::{
    properties::{property_name, property_setter, resolve_property},
    Context, Pass, TransformError,
};
use crate::{
    ast::{
        CastKind, ClrProperty, Constant, DirectiveKind, Intrinsic, Node,
        NodeKind, PropertyRef, TypeRef,
    },
    span::Span,
    ts::{MethodId, TypeId, TypeSystem},
};

/// Lower objects into construction,
///   assignment,
///   and conversion.
pub struct Values;

impl Pass for Values {
    fn name(&self) -> &'static str {
        "values"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        // Everything beneath an object is lowered along with it,
        //   so only the root is ever seen here.
        if matches!(node.kind, NodeKind::Object { .. }) {
            lower_value(ctx, node)
        } else {
            Ok(Some(node))
        }
    }
}

/// Lower a value along with every value nested within it.
///
/// Yields [`None`] if lenient mode dropped the value,
///   in which case whatever contains it must be dropped as well.
fn lower_value(
    ctx: &mut Context,
    node: Node,
) -> Result<Option<Node>, TransformError> {
    let span = node.span;

    match node.kind {
        NodeKind::Object {
            ty: TypeRef::Resolved(ty),
            arguments,
            children,
            ..
        } => match new_object(ctx, span, ty, arguments, children) {
            Ok(node) => Ok(node),
            Err(e) => ctx.fail_or(e, None),
        },

        // Left unresolved by lenient mode.
        NodeKind::Object { .. } => Ok(None),

        kind => Ok(Some(Node::new(span, kind))),
    }
}

fn new_object(
    ctx: &mut Context,
    span: Span,
    ty: TypeId,
    arguments: Vec<Node>,
    children: Vec<Node>,
) -> Result<Option<Node>, TransformError> {
    if arguments.is_empty() {
        let text = children
            .iter()
            .position(|child| matches!(child.kind, NodeKind::Text { .. }));

        if let Some(i) = text {
            let mut children = children;
            return convert(ctx, children.swap_remove(i), ty).map(Some);
        }
    }

    let mut lowered = Vec::with_capacity(arguments.len());

    for arg in arguments {
        // The constructor is selected by arity.
        let Some(arg) = lower_value(ctx, arg)? else {
            return Ok(None);
        };
        lowered.push(arg);
    }

    let (ctor, args) = select_constructor(ctx, span, ty, lowered)?;

    let mut manipulations = Vec::with_capacity(children.len());

    for child in children {
        if let Some(lowered) = lower_member(ctx, ty, child)? {
            manipulations.push(lowered);
        }
    }

    let manipulation = match manipulations.is_empty() {
        true => None,
        false => Some(Box::new(Node::new(
            span,
            NodeKind::ManipulationGroup {
                children: manipulations,
            },
        ))),
    };

    let new = Node::new(
        span,
        NodeKind::NewObject {
            ty,
            ctor,
            args,
            manipulation,
        },
    );

    Ok(Some(match provide_value(ctx.ts, ty) {
        Some(method) => Node::new(
            span,
            NodeKind::ProvideValue {
                method,
                value: Box::new(new),
            },
        ),
        None => new,
    }))
}

/// First public instance constructor of `ty` accepting `args`,
///   along with the arguments converted to its parameter types.
fn select_constructor(
    ctx: &Context,
    span: Span,
    ty: TypeId,
    args: Vec<Node>,
) -> Result<(MethodId, Vec<Node>), TransformError> {
    let ts = ctx.ts;

    let candidates = ts.constructors(ty).into_iter().filter(|id| {
        let ctor = ts.method(*id);
        ctor.is_public && !ctor.is_static && ctor.params.len() == args.len()
    });

    for ctor in candidates {
        if let Ok(converted) = convert_args(ctx, ctor, args.clone()) {
            return Ok((ctor, converted));
        }
    }

    Err(TransformError::NoConstructor {
        ty: ts.full_name(ty).to_string(),
        args: args.len(),
        span,
    })
}

/// Convert `args` to the parameter types of `method`.
fn convert_args(
    ctx: &Context,
    method: MethodId,
    args: Vec<Node>,
) -> Result<Vec<Node>, TransformError> {
    let params = &ctx.ts.method(method).params;

    args.into_iter()
        .zip(params.iter().copied())
        .map(|(arg, param)| convert(ctx, arg, param))
        .collect()
}

/// Lower a member of an object of type `ty` into a manipulation of the
///   new instance,
///     or [`None`] if it has no effect on the instance.
fn lower_member(
    ctx: &mut Context,
    ty: TypeId,
    child: Node,
) -> Result<Option<Node>, TransformError> {
    let span = child.span;

    match child.kind {
        NodeKind::PropertyValue {
            property: PropertyRef::Resolved(property),
            mut values,
            ..
        } => {
            let value = match values.len() {
                0 => return Ok(None),
                1 => values.remove(0),
                _ => {
                    let err = TransformError::MultipleValues {
                        property: property_name(ctx.ts, &property),
                        span,
                    };
                    return ctx.fail_or(err, None);
                }
            };

            let Some(value) = lower_value(ctx, value)? else {
                return Ok(None);
            };

            match assignment(ctx, span, property, value) {
                Ok(node) => Ok(Some(node)),
                Err(e) => ctx.fail_or(e, None),
            }
        }

        NodeKind::Directive {
            kind: DirectiveKind::Name,
            mut values,
        } => {
            let name = match resolve_property(ctx.ts, "Name", ty, ty) {
                Some(name) if property_setter(ctx.ts, &name).is_some() => name,
                _ => return Ok(None),
            };

            let Some(value) = values.pop() else {
                return Ok(None);
            };
            let Some(value) = lower_value(ctx, value)? else {
                return Ok(None);
            };

            match assignment(ctx, span, name, value) {
                Ok(node) => Ok(Some(node)),
                Err(e) => ctx.fail_or(e, None),
            }
        }

        NodeKind::MethodCall { method, args }
            if !ctx.ts.method(method).is_static =>
        {
            lower_call(ctx, span, method, args)
        }

        kind @ NodeKind::MethodCall { .. } => Ok(Some(Node::new(span, kind))),

        NodeKind::PropertyValueManipulation {
            property,
            manipulation,
        } => {
            let Node { span: group_span, kind } = *manipulation;

            let NodeKind::ManipulationGroup { children } = kind else {
                return Ok(Some(Node::new(
                    span,
                    NodeKind::PropertyValueManipulation {
                        property,
                        manipulation: Box::new(Node::new(group_span, kind)),
                    },
                )));
            };

            let mut calls = Vec::with_capacity(children.len());

            for call in children {
                let call_span = call.span;

                let lowered = match call.kind {
                    NodeKind::MethodCall { method, args } => {
                        lower_call(ctx, call_span, method, args)?
                    }
                    kind => Some(Node::new(call_span, kind)),
                };

                calls.extend(lowered);
            }

            Ok(Some(Node::new(
                span,
                NodeKind::PropertyValueManipulation {
                    property,
                    manipulation: Box::new(Node::new(
                        group_span,
                        NodeKind::ManipulationGroup { children: calls },
                    )),
                },
            )))
        }

        // Directives,
        //   along with members that lenient mode could not resolve.
        _ => Ok(None),
    }
}

/// Call `method` on the instance with `args` converted to its parameter
///   types,
///     or [`None`] if lenient mode dropped any of them.
fn lower_call(
    ctx: &mut Context,
    span: Span,
    method: MethodId,
    args: Vec<Node>,
) -> Result<Option<Node>, TransformError> {
    let mut lowered = Vec::with_capacity(args.len());

    for arg in args {
        let Some(arg) = lower_value(ctx, arg)? else {
            return Ok(None);
        };
        lowered.push(arg);
    }

    match convert_args(ctx, method, lowered) {
        Ok(args) => Ok(Some(Node::new(
            span,
            NodeKind::MethodCall { method, args },
        ))),
        Err(e) => ctx.fail_or(e, None),
    }
}

/// Assign `value` to `property` after converting it to the property
///   type.
fn assignment(
    ctx: &Context,
    span: Span,
    property: ClrProperty,
    value: Node,
) -> Result<Node, TransformError> {
    let ts = ctx.ts;

    let Some(setter) = property_setter(ts, &property) else {
        return Err(TransformError::ReadOnlyProperty {
            property: property_name(ts, &property),
            span,
        });
    };

    // The value is the last parameter of both instance and attached
    //   setters.
    let to = ts.method(setter).params.last().copied().ok_or(
        TransformError::ReadOnlyProperty {
            property: property_name(ts, &property),
            span,
        },
    )?;

    Ok(Node::new(
        span,
        NodeKind::PropertyAssignment {
            property,
            value: Box::new(convert(ctx, value, to)?),
        },
    ))
}

/// `ProvideValue` method of a markup extension type.
pub fn provide_value(ts: &dyn TypeSystem, ty: TypeId) -> Option<MethodId> {
    ts.methods(ty).into_iter().find(|id| {
        let method = ts.method(*id);

        method.name == "ProvideValue"
            && method.is_public
            && !method.is_static
            && method.params.len() == 1
            && method.returns.is_some()
    })
}

/// Convert `node` into a value of type `to`.
pub fn convert(
    ctx: &Context,
    node: Node,
    to: TypeId,
) -> Result<Node, TransformError> {
    let ts = ctx.ts;

    match &node.kind {
        NodeKind::Text { text, .. } => {
            let text = text.clone();
            return convert_text(ctx, node, &text, to);
        }

        NodeKind::Intrinsic(Intrinsic::Null) => {
            return match ts.is_value_type(to) {
                true => Err(TransformError::NullValueType {
                    ty: ts.full_name(to).to_string(),
                    span: node.span,
                }),
                false => Ok(node),
            };
        }

        _ => (),
    }

    match value_type(ctx, &node) {
        Some(from) => cast(ts, node, from, to),
        None => Err(TransformError::InvalidConversion {
            from: node.kind.name().to_string(),
            to: ts.full_name(to).to_string(),
            span: node.span,
        }),
    }
}

/// Static type of the value produced by `node`,
///   if known.
fn value_type(ctx: &Context, node: &Node) -> Option<TypeId> {
    let ts = ctx.ts;
    let mappings = ctx.mappings;

    match &node.kind {
        NodeKind::Text { .. } => Some(mappings.string),

        NodeKind::Constant(constant) => match constant {
            Constant::I4(..) => mappings.int32,
            Constant::I8(..) => mappings.int64,
            Constant::R8(..) => mappings.double,
            Constant::Bool(..) => mappings.boolean,
        },

        NodeKind::Intrinsic(Intrinsic::TypeOf(TypeRef::Resolved(..))) => {
            mappings.ty
        }
        NodeKind::Intrinsic(Intrinsic::Static {
            getter: Some(getter),
            ..
        }) => ts.method(*getter).returns,

        NodeKind::Object {
            ty: TypeRef::Resolved(ty),
            ..
        } => match provide_value(ts, *ty) {
            Some(method) => ts.method(method).returns,
            None => Some(*ty),
        },

        NodeKind::NewObject { ty, .. } => Some(*ty),

        NodeKind::MethodCall { method, .. }
        | NodeKind::ProvideValue { method, .. } => ts.method(*method).returns,

        NodeKind::Cast {
            kind: CastKind::Box,
            ..
        } => Some(mappings.object),
        NodeKind::Cast { ty, .. } => Some(*ty),

        _ => None,
    }
}

/// Convert a value of static type `from` to `to`.
fn cast(
    ts: &dyn TypeSystem,
    node: Node,
    from: TypeId,
    to: TypeId,
) -> Result<Node, TransformError> {
    let span = node.span;
    let wrap = |kind, ty, node| {
        Node::new(
            span,
            NodeKind::Cast {
                kind,
                ty,
                value: Box::new(node),
            },
        )
    };

    let (from_value, to_value) = (ts.is_value_type(from), ts.is_value_type(to));

    if from == to {
        Ok(node)
    } else if ts.is_assignable_from(to, from) {
        match (from_value, to_value) {
            (true, false) => Ok(wrap(CastKind::Box, from, node)),
            _ => Ok(node),
        }
    } else if !from_value && ts.is_assignable_from(from, to) {
        match to_value {
            true => Ok(wrap(CastKind::UnboxAny, to, node)),
            false => Ok(wrap(CastKind::Class, to, node)),
        }
    } else {
        Err(TransformError::InvalidConversion {
            from: ts.full_name(from).to_string(),
            to: ts.full_name(to).to_string(),
            span,
        })
    }
}

/// Convert text into a value of type `to`.
fn convert_text(
    ctx: &Context,
    node: Node,
    text: &str,
    to: TypeId,
) -> Result<Node, TransformError> {
    let ts = ctx.ts;
    let mappings = ctx.mappings;
    let span = node.span;

    let invalid = || TransformError::InvalidLiteral {
        text: text.to_string(),
        ty: ts.full_name(to).to_string(),
        span,
    };

    let constant = |c| Ok(Node::new(span, NodeKind::Constant(c)));
    let literal = text.trim();

    match Some(to) {
        _ if ts.is_assignable_from(to, mappings.string) => Ok(node),

        ty if ty == mappings.int32 => literal
            .parse::<i32>()
            .map_err(|_| invalid())
            .and_then(|i| constant(Constant::I4(i))),

        ty if ty == mappings.int64 => literal
            .parse::<i64>()
            .map_err(|_| invalid())
            .and_then(|i| constant(Constant::I8(i))),

        ty if ty == mappings.double => literal
            .parse::<f64>()
            .map_err(|_| invalid())
            .and_then(|r| constant(Constant::R8(r))),

        ty if ty == mappings.boolean => {
            if literal.eq_ignore_ascii_case("true") {
                constant(Constant::Bool(true))
            } else if literal.eq_ignore_ascii_case("false") {
                constant(Constant::Bool(false))
            } else {
                Err(invalid())
            }
        }

        _ => match parse_method(ctx, to) {
            Some((parse, returns)) => cast(
                ts,
                Node::new(
                    span,
                    NodeKind::MethodCall {
                        method: parse,
                        args: vec![node],
                    },
                ),
                returns,
                to,
            ),
            None => Err(TransformError::InvalidConversion {
                from: ts.full_name(mappings.string).to_string(),
                to: ts.full_name(to).to_string(),
                span,
            }),
        },
    }
}

/// Public static `Parse(String)` of `ty` along with its return type.
fn parse_method(ctx: &Context, ty: TypeId) -> Option<(MethodId, TypeId)> {
    let ts = ctx.ts;

    ts.methods(ty).into_iter().find_map(|id| {
        let method = ts.method(id);

        match (method.name.as_str(), &method.params[..], method.returns) {
            ("Parse", [param], Some(returns))
                if method.is_static
                    && method.is_public
                    && *param == ctx.mappings.string
                    && ts.is_assignable_from(ty, returns) =>
            {
                Some((id, returns))
            }
            _ => None,
        }
    })
}

#[cfg(test)]
mod test;
