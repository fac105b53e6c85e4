// XAMLC frontend
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

//! Frontend for the object-graph markup language.
//!
//! The frontend produces the raw [AST](crate::ast) of a document along
//!   with its [`NamespaceContext`].
//! Every name in the raw AST has already been resolved to its namespace
//!   URI,
//!     but nothing has been resolved against the
//!     [type system](crate::ts) yet;
//!       that is the job of the [transformation pipeline](crate::transform).
//!
//! Markup
//! ======
//! Elements denote objects of the type they name.
//! Attributes and child elements of an object denote one of:
//!
//!   - Namespace declarations (`xmlns`, `xmlns:p`),
//!       permitted only on the root element;
//!   - Directives,
//!       which are prefixed attributes without a `.` in their name
//!       (`x:Key="k"`);
//!   - Type arguments of the object's type (`x:TypeArguments`);
//!   - Properties,
//!       optionally qualified with their declaring type (`Grid.Row="1"`),
//!       given either as attributes or as property elements
//!       (`<Button.Content>…</Button.Content>`),
//!         which may not themselves have attributes; and
//!   - Loose content
//!       (child objects and text).
//!
//! Attribute values beginning with `{` (or `\{`) are
//!   [markup extensions](markup);
//!     a leading `{}` escapes this,
//!       denoting the literal text that follows it.
//!
//! Attributes in the `xml` namespace and other W3C namespaces are
//!   consumed by the parser
//!     (`xml:space` controls whitespace preservation of text,
//!       inherited by descendants);
//!   elements and attributes in [ignorable](NamespaceContext::is_ignorable)
//!   namespaces are dropped entirely.
//!
//! Text
//! ----
//! Whitespace-only text is dropped unless it is the sole content of its
//!   element.
//! All other text is kept in document order;
//!   whitespace normalization happens later,
//!     once it is known whether the text is preserved.

mod markup;

pub use markup::{
    parse_markup_extension, parse_type_arguments, MarkupError,
    MarkupErrorKind,
};

use crate::{
    ast::{NamePropertyRef, Node, NodeKind, PropertyRef, TypeRef, XmlTypeRef},
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    global::{MARKUP_COMPAT_NS, XAML2006_NS},
    span::Span,
    xml::{read_document, Attr, Content, Element, XmlError},
    xmlns::{
        split_qname, CompatMap, NamespaceContext, ResolvedName, XmlnsError,
    },
};
use std::{error::Error, fmt::Display};

/// A parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root object.
    pub root: Node,

    /// Namespace state established by the root element.
    pub namespaces: NamespaceContext,
}

/// Parse markup source into its raw AST.
///
/// `compat` maps declared namespaces onto the namespaces handed to the
///   type system.
pub fn parse(src: &str, compat: CompatMap) -> Result<Document, SyntaxError> {
    let root = read_document(src)?;
    let namespaces = namespaces(&root, compat)?;

    let root = Parser { ns: &namespaces }.object(&root, true, false)?;

    Ok(Document { root, namespaces })
}

/// Build the namespace context from the attributes of the root element.
fn namespaces(
    root: &Element,
    compat: CompatMap,
) -> Result<NamespaceContext, SyntaxError> {
    let mut ns = NamespaceContext::new(compat);

    for attr in &root.attrs {
        if let Some(prefix) = xmlns_prefix(&attr.name) {
            ns.declare(prefix, attr.value.as_str());
        }
    }

    // Aliases must all be known before any `Ignorable` can be processed.
    for attr in &root.attrs {
        if let Ok((prefix, "Ignorable")) = split_qname(&attr.name) {
            if ns.aliases().get(prefix).map(String::as_str)
                == Some(MARKUP_COMPAT_NS)
            {
                ns.add_ignorable(&attr.value)
                    .map_err(|e| SyntaxError::Namespace(e, attr.value_span))?;
            }
        }
    }

    Ok(ns)
}

/// The prefix declared by an `xmlns` attribute,
///   or the empty prefix for the default namespace.
fn xmlns_prefix(name: &str) -> Option<&str> {
    match name {
        "xmlns" => Some(""),
        _ => name.strip_prefix("xmlns:"),
    }
}

/// Span of the name of `ele` within its opening tag.
fn name_span(ele: &Element) -> Span {
    ele.span.subspan(1, ele.name.len())
}

/// Span of the name of `attr`.
fn attr_name_span(attr: &Attr) -> Span {
    attr.span.subspan(0, attr.name.len())
}

struct Parser<'a> {
    ns: &'a NamespaceContext,
}

impl<'a> Parser<'a> {
    fn resolve(
        &self,
        qname: &str,
        span: Span,
    ) -> Result<ResolvedName, SyntaxError> {
        self.ns
            .resolve(qname)
            .map_err(|e| SyntaxError::Namespace(e, span))
    }

    /// Whitespace preservation declared by `xml:space`,
    ///   or `inherited` if not declared
    ///     (or declared with an unrecognized value).
    fn space_mode(ele: &Element, inherited: bool) -> bool {
        match ele.attr("xml:space").map(|attr| attr.value.as_str()) {
            Some("preserve") => true,
            Some("default") => false,
            _ => inherited,
        }
    }

    fn object(
        &self,
        ele: &Element,
        is_root: bool,
        preserve: bool,
    ) -> Result<Node, SyntaxError> {
        let preserve = Self::space_mode(ele, preserve);
        let span = name_span(ele);
        let name = self.resolve(&ele.name, span)?;

        if name.local.contains('.') {
            return Err(SyntaxError::DottedTypeName(name.local, span));
        }

        let mut ty = XmlTypeRef::new(span, name.uri, name.local);
        let mut children = Vec::new();

        // Type arguments must be known before properties capture the type
        //   as their target.
        for attr in &ele.attrs {
            if xmlns_prefix(&attr.name).is_some() {
                continue;
            }

            let attr_name = self.resolve(&attr.name, attr_name_span(attr))?;

            if attr_name.uri == XAML2006_NS
                && attr_name.local == "TypeArguments"
                && !attr_name.ignorable
            {
                let (value, span) = (&attr.value, attr.value_span);
                ty.generic_args = parse_type_arguments(value, span, self.ns)?;
            }
        }

        for attr in &ele.attrs {
            if xmlns_prefix(&attr.name).is_some() {
                if !is_root {
                    return Err(SyntaxError::MisplacedXmlns(attr.span));
                }
                continue;
            }

            let attr_span = attr_name_span(attr);
            let attr_name = self.resolve(&attr.name, attr_span)?;

            if attr_name.ignorable
                || attr_name.prefix == "xml"
                || attr_name.uri.starts_with("http://www.w3.org")
                || (attr_name.uri == XAML2006_NS
                    && attr_name.local == "TypeArguments")
            {
                continue;
            }

            let value = self.attr_value(attr)?;

            if !attr_name.prefix.is_empty() && !attr_name.local.contains('.') {
                children.push(Node::new(
                    attr.span,
                    NodeKind::XmlDirective {
                        xmlns: attr_name.uri,
                        name: attr_name.local,
                        values: vec![value],
                    },
                ));
                continue;
            }

            let (declaring, prop_name) =
                match split_property_name(&attr_name.local, attr_span)? {
                    Some((type_name, prop_name)) => {
                        // Unprefixed types belong to the namespace of the
                        //   element bearing the attribute.
                        let xmlns = match attr_name.prefix.as_str() {
                            "" => ty.xmlns.as_str(),
                            _ => attr_name.uri.as_str(),
                        };

                        let declaring =
                            XmlTypeRef::new(attr_span, xmlns, type_name);
                        (declaring, prop_name)
                    }
                    None => (ty.clone(), attr_name.local.as_str()),
                };

            children.push(Node::new(
                attr.span,
                NodeKind::PropertyValue {
                    property: PropertyRef::Name(NamePropertyRef {
                        span: attr_span,
                        name: prop_name.to_string(),
                        declaring: TypeRef::Xml(declaring),
                        target: TypeRef::Xml(ty.clone()),
                    }),
                    values: vec![value],
                    from_attribute: true,
                },
            ));
        }

        let sole_content = ele.children.len() == 1;

        for child in &ele.children {
            match child {
                Content::Element(child) => {
                    let node = self.child_element(child, &ty, preserve)?;
                    children.extend(node);
                }

                Content::Text(text, span) => {
                    if sole_content || !text.trim().is_empty() {
                        let node = Node::text(*span, text.as_str(), preserve);
                        children.push(node);
                    }
                }
            }
        }

        Ok(Node::new(
            ele.span,
            NodeKind::Object {
                ty: TypeRef::Xml(ty),
                arguments: vec![],
                children,
                markup_extension: false,
            },
        ))
    }

    /// A child element of an object,
    ///   which is either a property element or an object.
    ///
    /// Elements in ignorable namespaces yield [`None`].
    fn child_element(
        &self,
        ele: &Element,
        target: &XmlTypeRef,
        preserve: bool,
    ) -> Result<Option<Node>, SyntaxError> {
        let span = name_span(ele);
        let name = self.resolve(&ele.name, span)?;

        if name.ignorable {
            return Ok(None);
        }

        let (type_name, prop_name) =
            match split_property_name(&name.local, span)? {
                Some(parts) => parts,
                None => return self.object(ele, false, preserve).map(Some),
            };

        if let Some(attr) = ele.attrs.first() {
            return Err(SyntaxError::PropertyElementAttrs(attr.span));
        }

        let preserve = Self::space_mode(ele, preserve);
        let sole_content = ele.children.len() == 1;
        let mut values = Vec::new();

        for child in &ele.children {
            match child {
                Content::Element(child) => {
                    let child_name =
                        self.resolve(&child.name, name_span(child))?;

                    if !child_name.ignorable {
                        values.push(self.object(child, false, preserve)?);
                    }
                }

                Content::Text(text, span) => {
                    if sole_content || !text.trim().is_empty() {
                        values.push(Node::text(*span, text.as_str(), preserve));
                    }
                }
            }
        }

        Ok(Some(Node::new(
            ele.span,
            NodeKind::PropertyValue {
                property: PropertyRef::Name(NamePropertyRef {
                    span,
                    name: prop_name.to_string(),
                    declaring: TypeRef::Xml(XmlTypeRef::new(
                        span,
                        name.uri.as_str(),
                        type_name,
                    )),
                    target: TypeRef::Xml(target.clone()),
                }),
                values,
                from_attribute: false,
            },
        )))
    }

    /// Value of an attribute,
    ///   which is either text or a markup extension.
    fn attr_value(&self, attr: &Attr) -> Result<Node, SyntaxError> {
        let value = attr.value.as_str();
        let span = attr.value_span;

        if let Some(literal) = value.strip_prefix("{}") {
            let span = span.subspan(2, literal.len());
            return Ok(Node::text(span, literal, true));
        }

        if value.starts_with('{') {
            return Ok(parse_markup_extension(value, span, self.ns)?);
        }

        let escaped = value.strip_prefix('\\').filter(|v| v.starts_with('{'));
        if let Some(ext) = escaped {
            return Ok(parse_markup_extension(
                ext,
                span.subspan(1, ext.len()),
                self.ns,
            )?);
        }

        Ok(Node::text(span, value, true))
    }
}

/// Split a `Type.Property` name at its first dot,
///   or yield [`None`] if the name is not qualified.
fn split_property_name(
    name: &str,
    span: Span,
) -> Result<Option<(&str, &str)>, SyntaxError> {
    match name.split_once('.') {
        Some((_, prop)) if prop.contains('.') => {
            Err(SyntaxError::NestedPropertyName(name.to_string(), span))
        }
        Some((ty, prop)) if ty.is_empty() || prop.is_empty() => {
            Err(SyntaxError::NestedPropertyName(name.to_string(), span))
        }
        other => Ok(other),
    }
}

/// Malformed markup.
///
/// Syntax errors are always fatal.
#[derive(Debug, PartialEq)]
pub enum SyntaxError {
    /// The document is not well-formed XML.
    Xml(XmlError),

    /// A name could not be resolved to a namespace.
    Namespace(XmlnsError, Span),

    /// Element names denoting types may not contain dots.
    DottedTypeName(String, Span),

    /// Property names may be qualified by at most one type name.
    NestedPropertyName(String, Span),

    /// Namespace declaration on an element other than the root.
    MisplacedXmlns(Span),

    /// Attribute on a property element.
    PropertyElementAttrs(Span),

    /// Malformed markup extension or type argument list.
    Markup(MarkupError),
}

impl From<XmlError> for SyntaxError {
    fn from(e: XmlError) -> Self {
        Self::Xml(e)
    }
}

impl From<MarkupError> for SyntaxError {
    fn from(e: MarkupError) -> Self {
        Self::Markup(e)
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(e) => Display::fmt(e, f),
            Self::Namespace(e, _) => Display::fmt(e, f),
            Self::DottedTypeName(name, _) => {
                write!(f, "dots are not permitted in type name `{name}`")
            }
            Self::NestedPropertyName(name, _) => {
                write!(f, "invalid property name `{name}`")
            }
            Self::MisplacedXmlns(_) => write!(
                f,
                "namespace declarations are only permitted on the root element"
            ),
            Self::PropertyElementAttrs(_) => {
                write!(f, "attributes are not permitted on property elements")
            }
            Self::Markup(e) => Display::fmt(e, f),
        }
    }
}

impl Error for SyntaxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(e) => Some(e),
            Self::Namespace(e, _) => Some(e),
            Self::Markup(e) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for SyntaxError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Xml(e) => e.describe(),

            Self::Namespace(XmlnsError::UnknownPrefix(prefix), span) => span
                .error(format!("undeclared prefix `{prefix}`"))
                .with_help(format!(
                    "declare it on the root element with \
                        `xmlns:{prefix}=\"...\"`"
                )),

            Self::Namespace(_, span) => span.mark_error().into(),

            Self::DottedTypeName(_, span) => span
                .error("expected a type name")
                .with_help("property elements must be children of an object"),

            Self::NestedPropertyName(_, span) => span
                .error("expected `Property` or `Type.Property`")
                .into(),

            Self::MisplacedXmlns(span) => span
                .error("namespace declared here")
                .with_help("move this declaration to the root element"),

            Self::PropertyElementAttrs(span) => span
                .error("unexpected attribute")
                .with_help(
                    "set properties of the value on the value's own element",
                ),

            Self::Markup(e) => e.span().mark_error().into(),
        }
    }
}
