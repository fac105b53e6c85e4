// XML type catalog
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

//! Load a [`MemoryTypeSystem`] from an XML type catalog.
//!
//! A catalog describes the target types that markup may reference,
//!   standing in for a reflection backend:
//!
//! ```xml
//! <catalog>
//!   <xmlns uri="urn:demo" namespace="Demo" />
//!
//!   <type name="Demo.Button" base="Demo.Control" content="Content">
//!     <constructor />
//!     <property name="Content" type="System.Object" />
//!     <property name="Count" type="System.Int32" access="get" />
//!     <method name="SetRow" static="true"
//!             params="Demo.Button, System.Int32" />
//!     <implements type="Demo.IFocusable" />
//!   </type>
//!
//!   <type name="Demo.Thickness" value-type="true" />
//!
//!   <instance of="Demo.List`1" args="System.String" />
//! </catalog>
//! ```
//!
//! Every catalog extends [`MemoryTypeSystem::with_core_types`].
//! Types may be referenced before they are declared;
//!   the catalog is processed in phases:
//!
//!   1. Type and `xmlns` declarations;
//!   2. Generic instantiations
//!        (named `Definition[Arg,…]` thereafter);
//!   3. Base types and interfaces;
//!   4. Members; and
//!   5. Content properties.

use super::{
    memory::{Accessors, MemoryTypeSystem},
    Method, TypeId, TypeSystem,
};
use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    span::Span,
    xml::{read_document, Attr, Element, XmlError},
};
use std::{error::Error, fmt::Display};

/// Load a type catalog from XML source.
pub fn load(src: &str) -> Result<MemoryTypeSystem, CatalogError> {
    let root = read_document(src)?;

    if root.name != "catalog" {
        return Err(CatalogError::UnexpectedElement(root.name, root.span));
    }

    let mut ts = MemoryTypeSystem::with_core_types();
    let mut types = Vec::new();

    for ele in root.elements() {
        match ele.name.as_str() {
            "type" => types.push((declare_type(&mut ts, ele)?, ele)),
            "xmlns" => ts.add_xmlns_definition(
                &required(ele, "uri")?.value,
                &required(ele, "namespace")?.value,
            ),
            "instance" => (),
            _ => {
                return Err(CatalogError::UnexpectedElement(
                    ele.name.clone(),
                    ele.span,
                ))
            }
        }
    }

    for ele in root.elements().filter(|ele| ele.name == "instance") {
        let def = type_ref(&ts, required(ele, "of")?)?;
        let args = type_list(&ts, required(ele, "args")?)?;

        ts.add_instance(def, args);
    }

    for (ty, ele) in &types {
        if let Some(base) = ele.attr("base") {
            let base = type_ref(&ts, base)?;
            ts.set_base(*ty, base);
        }

        for iface in ele.elements().filter(|e| e.name == "implements") {
            let iface = type_ref(&ts, required(iface, "type")?)?;
            ts.add_interface(*ty, iface);
        }
    }

    for (ty, ele) in &types {
        for member in ele.elements() {
            declare_member(&mut ts, *ty, member)?;
        }
    }

    for (ty, ele) in &types {
        if let Some(attr) = ele.attr("content") {
            let prop = ts
                .properties(*ty)
                .into_iter()
                .find(|id| ts.property(*id).name == attr.value)
                .ok_or_else(|| {
                    CatalogError::UnknownProperty(
                        attr.value.clone(),
                        attr.value_span,
                    )
                })?;

            ts.set_content_property(*ty, prop);
        }
    }

    Ok(ts)
}

fn declare_type(
    ts: &mut MemoryTypeSystem,
    ele: &Element,
) -> Result<TypeId, CatalogError> {
    let name = required(ele, "name")?;

    if ts.find_type(&name.value).is_some() {
        return Err(CatalogError::DuplicateType(
            name.value.clone(),
            name.value_span,
        ));
    }

    Ok(match flag(ele, "value-type")? {
        true => ts.add_value_type(&name.value),
        false => ts.add_type(&name.value, None),
    })
}

fn declare_member(
    ts: &mut MemoryTypeSystem,
    ty: TypeId,
    ele: &Element,
) -> Result<(), CatalogError> {
    match ele.name.as_str() {
        "implements" => (),

        "constructor" => {
            let params = match ele.attr("params") {
                Some(attr) => type_list(ts, attr)?,
                None => vec![],
            };

            ts.add_constructor(ty, params);
        }

        "property" => {
            let name = &required(ele, "name")?.value;
            let prop_ty = type_ref(ts, required(ele, "type")?)?;
            let is_static = flag(ele, "static")?;

            let (get, set) = match ele.attr("access") {
                None => (true, true),
                Some(attr) => match attr.value.as_str() {
                    "get-set" => (true, true),
                    "get" => (true, false),
                    "set" => (false, true),
                    _ => return Err(invalid_value(attr)),
                },
            };

            ts.add_property(
                ty,
                name,
                prop_ty,
                Accessors {
                    get,
                    set,
                    is_static,
                },
            );
        }

        "method" => {
            let params = match ele.attr("params") {
                Some(attr) => type_list(ts, attr)?,
                None => vec![],
            };

            let returns = ele
                .attr("returns")
                .map(|attr| type_ref(ts, attr))
                .transpose()?;

            ts.add_method(Method {
                name: required(ele, "name")?.value.clone(),
                declaring: ty,
                is_static: flag(ele, "static")?,
                is_public: !flag(ele, "private")?,
                is_constructor: false,
                params,
                returns,
            });
        }

        _ => {
            return Err(CatalogError::UnexpectedElement(
                ele.name.clone(),
                ele.span,
            ))
        }
    }

    Ok(())
}

fn required<'a>(
    ele: &'a Element,
    name: &'static str,
) -> Result<&'a Attr, CatalogError> {
    ele.attr(name)
        .ok_or(CatalogError::MissingAttr(name, ele.span))
}

fn flag(ele: &Element, name: &str) -> Result<bool, CatalogError> {
    match ele.attr(name) {
        None => Ok(false),
        Some(attr) => match attr.value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(invalid_value(attr)),
        },
    }
}

fn invalid_value(attr: &Attr) -> CatalogError {
    CatalogError::InvalidValue(
        attr.name.clone(),
        attr.value.clone(),
        attr.value_span,
    )
}

fn type_ref(
    ts: &MemoryTypeSystem,
    attr: &Attr,
) -> Result<TypeId, CatalogError> {
    let name = attr.value.trim();

    ts.find_type(name).ok_or_else(|| {
        CatalogError::UnknownType(name.to_string(), attr.value_span)
    })
}

/// Resolve a comma-separated list of type names.
///
/// Commas within the brackets of an instantiation name
///   (`Demo.Map`2[System.String,System.Int32]`)
///   do not separate items.
fn type_list(
    ts: &MemoryTypeSystem,
    attr: &Attr,
) -> Result<Vec<TypeId>, CatalogError> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    let value = attr.value.as_str();

    for (i, c) in value.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    items.push(&value[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            ts.find_type(name).ok_or_else(|| {
                CatalogError::UnknownType(name.to_string(), attr.value_span)
            })
        })
        .collect()
}

/// Error loading a type catalog.
#[derive(Debug, PartialEq)]
pub enum CatalogError {
    Xml(XmlError),

    /// An element not permitted in its position.
    UnexpectedElement(String, Span),

    /// A required attribute is missing from an element.
    MissingAttr(&'static str, Span),

    /// A referenced type is never declared.
    UnknownType(String, Span),

    /// A type is declared more than once,
    ///   or shadows a core type.
    DuplicateType(String, Span),

    /// A content property that is not a property of its type.
    UnknownProperty(String, Span),

    /// Attribute name, value and span of an unrecognized value.
    InvalidValue(String, String, Span),
}

impl From<XmlError> for CatalogError {
    fn from(e: XmlError) -> Self {
        Self::Xml(e)
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(e) => Display::fmt(e, f),
            Self::UnexpectedElement(name, _) => {
                write!(f, "unexpected element `{name}` in type catalog")
            }
            Self::MissingAttr(name, _) => {
                write!(f, "missing required attribute `{name}`")
            }
            Self::UnknownType(name, _) => write!(f, "unknown type `{name}`"),
            Self::DuplicateType(name, _) => {
                write!(f, "type `{name}` is already declared")
            }
            Self::UnknownProperty(name, _) => {
                write!(f, "unknown content property `{name}`")
            }
            Self::InvalidValue(attr, value, _) => {
                write!(f, "invalid value `{value}` for attribute `{attr}`")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for CatalogError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Xml(e) => e.describe(),

            Self::UnexpectedElement(_, span) => span
                .error("unexpected element")
                .with_help(
                    "expected `type`, `xmlns` or `instance` at the top level, \
                        or `constructor`, `property`, `method` or \
                        `implements` within a type",
                ),

            Self::MissingAttr(name, span) => {
                span.error(format!("`{name}` attribute required here")).into()
            }

            Self::UnknownType(_, span) => span
                .error("this type is not declared")
                .with_help(
                    "generic instantiations must be declared with \
                        `<instance>` and referenced as `Definition[Arg,...]`",
                ),

            Self::DuplicateType(_, span) => {
                span.error("duplicate declaration").into()
            }

            Self::UnknownProperty(_, span) | Self::InvalidValue(_, _, span) => {
                span.mark_error().into()
            }
        }
    }
}

#[cfg(test)]
mod test;
