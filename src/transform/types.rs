// Type reference resolution pass
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

//! Resolution of [`XmlTypeRef`]s against the type system.
//!
//! A name is looked up in each candidate type-system namespace of its XML
//!   namespace in turn:
//!
//!   - Names in the XAML language namespace denote the
//!       [language types](crate::ts::LanguageTypeMappings)
//!       (`x:String`, `x:Int32`, …);
//!   - `clr-namespace:Name;assembly=…` denotes the namespace `Name`;
//!       and
//!   - Any other namespace is mapped by the type system
//!       (see [`TypeSystem::xmlns_namespaces`](crate::ts::TypeSystem)).
//!
//! Markup extensions may omit their `Extension` suffix,
//!   which is tried first.
//! Generic type arguments are resolved before the type itself;
//!   the definition is found by appending the `` `N `` arity suffix and
//!   then instantiated with the arguments.
//!
//! Resolved types are cached in the [`TypeCache`] for the remainder of the
//!   transformation.

use super::{Context, Pass, TransformError, TypeCache, TypeKey};
use crate::{
    ast::{
        Intrinsic, NamePropertyRef, Node, NodeKind, PropertyRef, TypeRef,
        XmlTypeRef,
    },
    global::{CLR_NAMESPACE_PREFIX, XAML2006_NS},
    ts::TypeId,
};

/// Resolve every [`TypeRef`] of a node.
pub struct Types;

impl Pass for Types {
    fn name(&self) -> &'static str {
        "types"
    }

    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError> {
        let span = node.span;

        let kind = match node.kind {
            NodeKind::Object {
                ty,
                arguments,
                children,
                markup_extension,
            } => NodeKind::Object {
                ty: resolve_ref(ctx, ty)?,
                arguments,
                children,
                markup_extension,
            },

            NodeKind::PropertyValue {
                property: PropertyRef::Name(prop),
                values,
                from_attribute,
            } => NodeKind::PropertyValue {
                property: PropertyRef::Name(NamePropertyRef {
                    declaring: resolve_ref(ctx, prop.declaring)?,
                    target: resolve_ref(ctx, prop.target)?,
                    ..prop
                }),
                values,
                from_attribute,
            },

            NodeKind::Intrinsic(Intrinsic::TypeOf(ty)) => {
                NodeKind::Intrinsic(Intrinsic::TypeOf(resolve_ref(ctx, ty)?))
            }

            NodeKind::Intrinsic(Intrinsic::Static { ty, member, getter }) => {
                NodeKind::Intrinsic(Intrinsic::Static {
                    ty: resolve_ref(ctx, ty)?,
                    member,
                    getter,
                })
            }

            kind => kind,
        };

        Ok(Some(Node::new(span, kind)))
    }
}

/// Resolve `ty` if it is not already resolved.
///
/// In lenient mode an unresolvable reference is left as it was.
fn resolve_ref(
    ctx: &mut Context,
    ty: TypeRef,
) -> Result<TypeRef, TransformError> {
    match ty {
        TypeRef::Resolved(..) => Ok(ty),
        TypeRef::Xml(xml) => match resolve_type(ctx, &xml) {
            Ok(id) => Ok(TypeRef::Resolved(id)),
            Err(e) => ctx.fail_or(e, TypeRef::Xml(xml)),
        },
    }
}

/// Resolve a type named in markup,
///   including its generic arguments.
pub fn resolve_type(
    ctx: &mut Context,
    ty: &XmlTypeRef,
) -> Result<TypeId, TransformError> {
    let args = ty
        .generic_args
        .iter()
        .map(|arg| match arg {
            TypeRef::Resolved(id) => Ok(*id),
            TypeRef::Xml(xml) => resolve_type(ctx, xml),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let key = TypeKey {
        xmlns: ty.xmlns.clone(),
        name: ty.name.clone(),
        args,
        markup_extension: ty.is_markup_extension,
    };

    if let Some(id) = ctx.item::<TypeCache>().and_then(|c| c.get(&key)) {
        return Ok(id);
    }

    let found = candidate_names(ty)
        .into_iter()
        .find_map(|name| lookup(ctx, &ty.xmlns, &name, &key.args));

    match found {
        Some(id) => {
            ctx.item_mut::<TypeCache>().insert(key, id);
            Ok(id)
        }
        None => Err(TransformError::UnknownType {
            xmlns: ty.xmlns.clone(),
            name: ty.name.clone(),
            span: ty.span,
        }),
    }
}

/// Local names to try in order.
fn candidate_names(ty: &XmlTypeRef) -> Vec<String> {
    let arity = match ty.generic_args.len() {
        0 => String::new(),
        n => format!("`{n}"),
    };

    let mut names = Vec::with_capacity(2);

    if ty.is_markup_extension && !ty.name.ends_with("Extension") {
        names.push(format!("{}Extension{arity}", ty.name));
    }
    names.push(format!("{}{arity}", ty.name));

    names
}

/// Look up a local name within an XML namespace.
fn lookup(
    ctx: &Context,
    xmlns: &str,
    name: &str,
    args: &[TypeId],
) -> Option<TypeId> {
    if xmlns == XAML2006_NS {
        return match args {
            [] => ctx.mappings.language_type(name),
            _ => None,
        };
    }

    let namespaces = match xmlns.strip_prefix(CLR_NAMESPACE_PREFIX) {
        Some(clr) => vec![clr.split(';').next().unwrap_or(clr).to_string()],
        None => ctx.ts.xmlns_namespaces(xmlns),
    };

    namespaces.iter().find_map(|ns| {
        let def = ctx.ts.find_type(&format!("{ns}.{name}"))?;

        match args {
            [] => Some(def),
            _ => ctx.ts.instantiate(def, args),
        }
    })
}

#[cfg(test)]
mod test;
