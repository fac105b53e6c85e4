// Markup extension and type argument parsing
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

//! Parsers for the small languages embedded in attribute values.
//!
//! Markup extensions have the form
//!
//! ```text
//!   {prefix:Name positional, positional, key=value, key={Nested ...}}
//! ```
//!
//! where values are either nested extensions,
//!   quoted strings (`"…"` or `'…'`),
//!   or bare text running up to the next unescaped `,` or `}`.
//! A backslash escapes the character that follows it.
//!
//! Type arguments (`x:TypeArguments`) are comma-separated type names,
//!   each optionally followed by a parenthesised list of its own type
//!   arguments:
//!
//! ```text
//!   x:String, local:Pair(x:Int32, local:List(x:String))
//! ```
//!
//! Offsets within the parsed text are mapped onto the span of the
//!   attribute value,
//!     which is exact unless the value contained XML character
//!     references.

use crate::{
    ast::{NamePropertyRef, Node, NodeKind, PropertyRef, TypeRef, XmlTypeRef},
    global::XAML2006_NS,
    span::Span,
    xmlns::{split_qname, NamespaceContext, XmlnsError},
};
use std::{error::Error, fmt::Display};

/// Parse a markup extension.
///
/// The entire `src` must be consumed by the extension,
///   save for trailing whitespace.
pub fn parse_markup_extension(
    src: &str,
    span: Span,
    ns: &NamespaceContext,
) -> Result<Node, MarkupError> {
    let mut cursor = Cursor::new(src, span, ns);

    cursor.skip_ws();
    let node = cursor.extension()?;
    cursor.expect_end()?;

    Ok(node)
}

/// Parse a list of type arguments.
pub fn parse_type_arguments(
    src: &str,
    span: Span,
    ns: &NamespaceContext,
) -> Result<Vec<TypeRef>, MarkupError> {
    let mut cursor = Cursor::new(src, span, ns);

    let args = cursor.type_args()?;
    cursor.expect_end()?;

    Ok(args)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    span: Span,
    ns: &'a NamespaceContext,
}

/// A parsed argument whose node cannot be built until every argument
///   of the extension is known.
enum Arg {
    Positional(Node),
    Named(String, Span, Node),
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, span: Span, ns: &'a NamespaceContext) -> Self {
        Self {
            src,
            pos: 0,
            span,
            ns,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn span_from(&self, start: usize) -> Span {
        self.span.subspan(start, self.pos - start)
    }

    fn fail(&self, kind: MarkupErrorKind) -> MarkupError {
        let at = self.pos.min(self.src.len());
        let len = self.src[at..].chars().next().map_or(0, char::len_utf8);

        MarkupError(kind, self.span.subspan(at, len))
    }

    fn expect(&mut self, expected: u8) -> Result<(), MarkupError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => {
                Err(self.fail(MarkupErrorKind::Expected(expected as char)))
            }
            None => Err(self.fail(MarkupErrorKind::UnexpectedEnd)),
        }
    }

    fn expect_end(&mut self) -> Result<(), MarkupError> {
        self.skip_ws();

        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.fail(MarkupErrorKind::TrailingInput)),
        }
    }

    /// Read bare text up to (but excluding) any unescaped byte in
    ///   `stop`,
    ///   processing escapes and trimming trailing whitespace.
    fn bare(&mut self, stop: &[u8]) -> Result<String, MarkupError> {
        let mut text = String::new();
        let mut run_start = self.pos;

        while let Some(c) = self.peek() {
            if stop.contains(&c) {
                break;
            }

            if c == b'\\' {
                text.push_str(&self.src[run_start..self.pos]);
                self.pos += 1;

                let escaped = self.src[self.pos..]
                    .chars()
                    .next()
                    .ok_or_else(|| self.fail(MarkupErrorKind::UnexpectedEnd))?;

                text.push(escaped);
                self.pos += escaped.len_utf8();
                run_start = self.pos;
            } else {
                self.pos += 1;
            }
        }

        text.push_str(&self.src[run_start..self.pos]);

        Ok(text.trim_end().to_string())
    }

    /// Read a quoted string starting at the opening quote.
    fn quoted(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        let quote = self.peek().unwrap_or(b'"');
        self.pos += 1;

        let mut text = String::new();
        let mut run_start = self.pos;

        loop {
            match self.peek() {
                None => {
                    self.pos = start;
                    return Err(self.fail(MarkupErrorKind::UnterminatedString));
                }
                Some(c) if c == quote => {
                    text.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(text);
                }
                Some(b'\\') => {
                    text.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;

                    if let Some(escaped) = self.src[self.pos..].chars().next() {
                        text.push(escaped);
                        self.pos += escaped.len_utf8();
                    }

                    run_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn extension(&mut self) -> Result<Node, MarkupError> {
        let start = self.pos;
        self.expect(b'{')?;
        self.skip_ws();

        let name_start = self.pos;
        let name = self.bare(b" \t\r\n,}")?;
        let name_span = self.span_from(name_start);

        if name.is_empty() {
            return Err(self.fail(MarkupErrorKind::MissingTypeName));
        }

        let mut ty = self.type_name(&name, name_span)?;
        ty.is_markup_extension = true;

        let mut args = Vec::new();
        self.skip_ws();

        if self.peek() != Some(b'}') {
            loop {
                self.skip_ws();
                args.push(self.argument()?);
                self.skip_ws();

                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b'}') => break,
                    Some(_) => {
                        return Err(self.fail(MarkupErrorKind::Expected('}')))
                    }
                    None => {
                        return Err(self.fail(MarkupErrorKind::UnexpectedEnd))
                    }
                }
            }
        }

        self.expect(b'}')?;
        let span = self.span_from(start);

        let mut positional = Vec::new();
        let mut named = Vec::new();

        // Type arguments must be known before any named argument captures
        //   the extension type as its target.
        for arg in args {
            match arg {
                Arg::Positional(node) => positional.push(node),
                Arg::Named(key, key_span, value) => {
                    match self.type_arguments_key(&key, key_span)? {
                        true => {
                            let text = match &value.kind {
                                NodeKind::Text { text, .. } => text,
                                _ => {
                                    return Err(MarkupError(
                                        MarkupErrorKind::TypeArgumentsNotText,
                                        value.span,
                                    ))
                                }
                            };

                            ty.generic_args.extend(parse_type_arguments(
                                text, value.span, self.ns,
                            )?);
                        }
                        false => named.push((key, key_span, value)),
                    }
                }
            }
        }

        let named = named
            .into_iter()
            .map(|(key, key_span, value)| self.named(&ty, key, key_span, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::new(
            span,
            NodeKind::MarkupExtension {
                ty: TypeRef::Xml(ty),
                positional,
                named,
            },
        ))
    }

    fn argument(&mut self) -> Result<Arg, MarkupError> {
        let start = self.pos;

        match self.peek() {
            Some(b'{') | Some(b'"') | Some(b'\'') => {
                return self.value().map(Arg::Positional)
            }
            _ => (),
        }

        let token = self.bare(b",}=")?;
        let token_span = self.span_from(start);

        if self.peek() == Some(b'=') {
            if token.is_empty() {
                return Err(self.fail(MarkupErrorKind::MissingArgumentName));
            }

            self.pos += 1;
            self.skip_ws();

            let value = self.value()?;
            Ok(Arg::Named(token, token_span, value))
        } else {
            Ok(Arg::Positional(Node::text(token_span, token, true)))
        }
    }

    fn value(&mut self) -> Result<Node, MarkupError> {
        let start = self.pos;

        let text = match self.peek() {
            Some(b'{') => return self.extension(),
            Some(b'"') | Some(b'\'') => self.quoted()?,
            _ => self.bare(b",}")?,
        };

        Ok(Node::text(self.span_from(start), text, true))
    }

    /// Whether `key` names the `x:TypeArguments` directive.
    fn type_arguments_key(
        &self,
        key: &str,
        span: Span,
    ) -> Result<bool, MarkupError> {
        let (prefix, local) =
            split_qname(key).map_err(|e| MarkupError::ns(e, span))?;

        Ok(!prefix.is_empty()
            && local == "TypeArguments"
            && self.resolve_prefix(prefix, span)? == XAML2006_NS)
    }

    /// Build the node for a named argument of an extension of type `ty`.
    ///
    /// Prefixed keys without a type qualifier are directives;
    ///   everything else is a property of the extension,
    ///     or an attached property when qualified (`Type.Property`).
    fn named(
        &self,
        ty: &XmlTypeRef,
        key: String,
        span: Span,
        value: Node,
    ) -> Result<Node, MarkupError> {
        let (prefix, local) =
            split_qname(&key).map_err(|e| MarkupError::ns(e, span))?;

        if !prefix.is_empty() && !local.contains('.') {
            return Ok(Node::new(
                span,
                NodeKind::XmlDirective {
                    xmlns: self.resolve_prefix(prefix, span)?.to_string(),
                    name: local.to_string(),
                    values: vec![value],
                },
            ));
        }

        let (declaring, name) = match local.split_once('.') {
            Some((_, name)) if name.contains('.') => {
                return Err(MarkupError(
                    MarkupErrorKind::NestedPropertyName(key.clone()),
                    span,
                ))
            }
            Some((type_name, name)) => {
                let xmlns = self.resolve_prefix(prefix, span)?;
                let declaring = XmlTypeRef::new(span, xmlns, type_name);

                (declaring, name)
            }
            None => (ty.clone(), local),
        };

        Ok(Node::new(
            span.merge(value.span),
            NodeKind::PropertyValue {
                property: PropertyRef::Name(NamePropertyRef {
                    span,
                    name: name.to_string(),
                    declaring: TypeRef::Xml(declaring),
                    target: TypeRef::Xml(ty.clone()),
                }),
                values: vec![value],
                from_attribute: true,
            },
        ))
    }

    fn resolve_prefix(
        &self,
        prefix: &str,
        span: Span,
    ) -> Result<&'a str, MarkupError> {
        let ns: &'a NamespaceContext = self.ns;

        match prefix {
            "" => Ok(ns.default_namespace().unwrap_or("")),
            _ => ns
                .resolve_prefix(prefix)
                .map_err(|e| MarkupError::ns(e, span)),
        }
    }

    /// Resolve `[prefix:]Name` to an unresolved type reference.
    fn type_name(
        &self,
        name: &str,
        span: Span,
    ) -> Result<XmlTypeRef, MarkupError> {
        let (prefix, local) =
            split_qname(name).map_err(|e| MarkupError::ns(e, span))?;

        Ok(XmlTypeRef::new(span, self.resolve_prefix(prefix, span)?, local))
    }

    fn type_args(&mut self) -> Result<Vec<TypeRef>, MarkupError> {
        let mut args = Vec::new();

        loop {
            self.skip_ws();

            let start = self.pos;
            let name = self.bare(b",()")?;
            let span = self.span_from(start);

            if name.is_empty() {
                return Err(self.fail(MarkupErrorKind::MissingTypeName));
            }

            let mut ty = self.type_name(&name, span)?;
            self.skip_ws();

            if self.peek() == Some(b'(') {
                self.pos += 1;
                ty.generic_args = self.type_args()?;
                self.skip_ws();
                self.expect(b')')?;
                self.skip_ws();
            }

            args.push(TypeRef::Xml(ty));

            match self.peek() {
                Some(b',') => self.pos += 1,
                _ => return Ok(args),
            }
        }
    }
}

/// Error parsing a markup extension or type argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError(pub MarkupErrorKind, pub Span);

impl MarkupError {
    fn ns(e: XmlnsError, span: Span) -> Self {
        Self(MarkupErrorKind::Namespace(e), span)
    }

    pub fn span(&self) -> Span {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupErrorKind {
    UnexpectedEnd,
    Expected(char),
    TrailingInput,
    UnterminatedString,
    MissingTypeName,
    MissingArgumentName,
    TypeArgumentsNotText,
    NestedPropertyName(String),
    Namespace(XmlnsError),
}

impl Display for MarkupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use MarkupErrorKind::*;

        match &self.0 {
            UnexpectedEnd => write!(f, "unexpected end of markup extension"),
            Expected(c) => write!(f, "expected `{c}`"),
            TrailingInput => {
                write!(f, "unexpected input after markup extension")
            }
            UnterminatedString => write!(f, "unterminated string"),
            MissingTypeName => write!(f, "missing type name"),
            MissingArgumentName => {
                write!(f, "missing argument name before `=`")
            }
            TypeArgumentsNotText => {
                write!(f, "type arguments must be given as text")
            }
            NestedPropertyName(name) => write!(
                f,
                "property name `{name}` has more than one type qualifier"
            ),
            Namespace(e) => Display::fmt(e, f),
        }
    }
}

impl Error for MarkupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.0 {
            MarkupErrorKind::Namespace(e) => Some(e),
            _ => None,
        }
    }
}
