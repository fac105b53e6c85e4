// Property reference resolution pass
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

//! Resolution of property names into [`ClrProperty`]s.
//!
//! A property name `Name` declared by type `D` and set on an instance of
//!   type `T` resolves to,
//!     in order of preference:
//!
//!   1. A regular property `Name` of `D`,
//!        provided that `D` is assignable from `T` and that the property
//!        has an instance getter taking no arguments or an instance setter
//!        taking exactly one; or
//!   2. An attached property formed by the public static methods
//!        `GetName(T)` and `SetName(T, value)` of `D`,
//!          either of which may be absent.
//!
//! The value type of an attached property is the return type of its
//!   getter,
//!     or the value parameter type of its setter if it has no getter.
//!
//! Resolution is idempotent:
//!   already resolved references are left untouched.

use super::{Context, Pass, TransformError};
use crate::{
    ast::{
        AttachedProperty, ClrProperty, Intrinsic, Node, NodeKind, PropertyRef,
    },
    ts::{MethodId, TypeId, TypeSystem},
};

/// Resolve every [`PropertyRef`] and `x:Static` member.
pub struct Properties;

impl Pass for Properties {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let span = node.span;

        match node.kind {
            NodeKind::PropertyValue {
                property: PropertyRef::Name(prop),
                values,
                from_attribute,
            } => {
                let (declaring, target) =
                    match (prop.declaring.resolved(), prop.target.resolved()) {
                        (Some(declaring), Some(target)) => (declaring, target),

                        // Lenient mode already recorded the type error.
                        _ if !ctx.strict => {
                            return Ok(Some(Node::new(
                                span,
                                NodeKind::PropertyValue {
                                    property: PropertyRef::Name(prop),
                                    values,
                                    from_attribute,
                                },
                            )))
                        }
                        _ => {
                            return Err(TransformError::UnresolvedType(
                                prop.span,
                            ))
                        }
                    };

                match resolve_property(ctx.ts, &prop.name, declaring, target) {
                    Some(clr) => Ok(Some(Node::new(
                        span,
                        NodeKind::PropertyValue {
                            property: PropertyRef::Resolved(clr),
                            values,
                            from_attribute,
                        },
                    ))),

                    None => ctx.fail_or(
                        TransformError::UnresolvedProperty {
                            ty: ctx.ts.full_name(declaring).to_string(),
                            name: prop.name,
                            span: prop.span,
                        },
                        None,
                    ),
                }
            }

            NodeKind::Intrinsic(Intrinsic::Static {
                ty,
                member,
                getter: None,
            }) => {
                let Some(decl) = ty.resolved() else {
                    return Ok(Some(Node::new(
                        span,
                        NodeKind::Intrinsic(Intrinsic::Static {
                            ty,
                            member,
                            getter: None,
                        }),
                    )));
                };

                match static_getter(ctx.ts, decl, &member) {
                    Some(getter) => Ok(Some(Node::new(
                        span,
                        NodeKind::Intrinsic(Intrinsic::Static {
                            ty,
                            member,
                            getter: Some(getter),
                        }),
                    ))),

                    None => ctx.fail_or(
                        TransformError::UnresolvedProperty {
                            ty: ctx.ts.full_name(decl).to_string(),
                            name: member,
                            span,
                        },
                        None,
                    ),
                }
            }

            kind => Ok(Some(Node::new(span, kind))),
        }
    }
}

/// Resolve the property `name` declared by `declaring` for an instance of
///   `target`.
pub fn resolve_property(
    ts: &dyn TypeSystem,
    name: &str,
    declaring: TypeId,
    target: TypeId,
) -> Option<ClrProperty> {
    regular_property(ts, name, declaring, target)
        .or_else(|| attached_property(ts, name, declaring, target))
}

fn regular_property(
    ts: &dyn TypeSystem,
    name: &str,
    declaring: TypeId,
    target: TypeId,
) -> Option<ClrProperty> {
    if !ts.is_assignable_from(declaring, target) {
        return None;
    }

    let instance_accessor = |id: Option<MethodId>, arity| {
        id.map(|id| ts.method(id))
            .is_some_and(|m| !m.is_static && m.params.len() == arity)
    };

    ts.properties(declaring)
        .into_iter()
        .find(|id| {
            let prop = ts.property(*id);

            prop.name == name
                && (instance_accessor(prop.getter, 0)
                    || instance_accessor(prop.setter, 1))
        })
        .map(ClrProperty::Regular)
}

fn attached_property(
    ts: &dyn TypeSystem,
    name: &str,
    declaring: TypeId,
    target: TypeId,
) -> Option<ClrProperty> {
    let methods = ts.methods(declaring);

    let getter = methods
        .iter()
        .copied()
        .find(|id| ts.method(*id).is_attached_getter(ts, name, target));

    let setter = methods
        .iter()
        .copied()
        .find(|id| ts.method(*id).is_attached_setter(ts, name, target));

    let ty = match (getter, setter) {
        (Some(getter), _) => ts.method(getter).returns?,
        (None, Some(setter)) => ts.method(setter).params[1],
        (None, None) => return None,
    };

    Some(ClrProperty::Attached(AttachedProperty {
        name: name.to_string(),
        getter,
        setter,
        ty,
    }))
}

/// Getter of the public static property `member` of `ty`.
fn static_getter(
    ts: &dyn TypeSystem,
    ty: TypeId,
    member: &str,
) -> Option<MethodId> {
    ts.properties(ty)
        .into_iter()
        .map(|id| ts.property(id))
        .filter(|prop| prop.name == member)
        .find_map(|prop| prop.getter)
        .filter(|getter| {
            let method = ts.method(*getter);
            method.is_static && method.is_public && method.params.is_empty()
        })
}

/// Value type of a resolved property.
pub fn property_type(ts: &dyn TypeSystem, prop: &ClrProperty) -> TypeId {
    match prop {
        ClrProperty::Regular(id) => ts.property(*id).ty,
        ClrProperty::Attached(attached) => attached.ty,
    }
}

/// Setter of a resolved property,
///   if it can be assigned.
pub fn property_setter(
    ts: &dyn TypeSystem,
    prop: &ClrProperty,
) -> Option<MethodId> {
    match prop {
        ClrProperty::Regular(id) => ts.property(*id).setter,
        ClrProperty::Attached(attached) => attached.setter,
    }
}

/// Name of a resolved property for diagnostics.
pub fn property_name(ts: &dyn TypeSystem, prop: &ClrProperty) -> String {
    match prop {
        ClrProperty::Regular(id) => {
            let prop = ts.property(*id);
            format!("{}.{}", ts.full_name(prop.declaring), prop.name)
        }
        ClrProperty::Attached(attached) => attached.name.clone(),
    }
}
