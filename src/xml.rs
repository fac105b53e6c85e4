// XML element tree reader
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

//! Parse XML source into a tree of [`Element`]s.
//!
//! This uses [`quick_xml`] as the parser.
//! Names are kept exactly as written (`prefix:local`);
//!   namespace resolution is left to the caller,
//!     since both the markup front end and the type catalog have their
//!     own rules for it.
//!
//! Every element,
//!   attribute,
//!   and text node carries the [`Span`] of its source text.

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    span::Span,
    tpwrap::quick_xml::Error as QuickXmlError,
};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::{error::Error, fmt::Display};

/// An element and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written.
    pub name: String,

    /// Span of the opening (or empty) tag.
    pub span: Span,

    pub attrs: Vec<Attr>,
    pub children: Vec<Content>,
}

impl Element {
    /// Value of the attribute named `name` exactly as written.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    /// Child elements,
    ///   skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(ele) => Some(ele),
            Content::Text(..) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,

    /// Unescaped value.
    pub value: String,

    /// Span of the entire attribute.
    pub span: Span,

    /// Span of the raw value between the quotes.
    pub value_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Element),

    /// Unescaped character data,
    ///   including CDATA sections.
    Text(String, Span),
}

/// Read the single root element of `src`.
///
/// Comments,
///   processing instructions,
///   the XML declaration,
///   and whitespace outside of the root element are discarded.
pub fn read_document(src: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(src);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let prev_pos = reader.buffer_position() as usize;

        let event = reader.read_event().map_err(|e| {
            let at = Span::from_byte_interval((prev_pos, prev_pos));
            XmlError::Xml(e.into(), at)
        })?;

        let end = reader.buffer_position() as usize;
        let span = Span::from_byte_interval((prev_pos, end));

        let done = match event {
            Event::Start(ele) => {
                stack.push(open_element(src, &ele, span)?);
                None
            }

            Event::Empty(ele) => Some(open_element(src, &ele, span)?),

            Event::End(..) => Some(
                stack.pop().ok_or(XmlError::UnexpectedClose(span))?,
            ),

            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| XmlError::Xml(e.into(), span))?;

                match stack.last_mut() {
                    Some(parent) => parent
                        .children
                        .push(Content::Text(value.into_owned(), span)),
                    None if value.trim().is_empty() => (),
                    None => return Err(XmlError::TextOutsideRoot(span)),
                }

                None
            }

            Event::CData(data) => {
                let value = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|_| XmlError::InvalidUtf8(span))?;

                stack
                    .last_mut()
                    .ok_or(XmlError::TextOutsideRoot(span))?
                    .children
                    .push(Content::Text(value, span));

                None
            }

            Event::Eof => break,

            // Declarations, comments, processing instructions, doctypes.
            _ => None,
        };

        if let Some(ele) = done {
            match (stack.last_mut(), &root) {
                (Some(parent), _) => {
                    parent.children.push(Content::Element(ele))
                }
                (None, None) => root = Some(ele),
                (None, Some(_)) => {
                    return Err(XmlError::MultipleRoots(ele.span))
                }
            }
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(XmlError::UnclosedElement(unclosed.name, unclosed.span));
    }

    root.ok_or(XmlError::NoRoot)
}

fn open_element(
    src: &str,
    ele: &BytesStart,
    span: Span,
) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(ele.name().as_ref())
        .map_err(|_| XmlError::InvalidUtf8(span))?
        .to_string();

    // Attribute positions are not reported by the parser,
    //   so they are located by scanning the raw tag in order.
    let start = span.offset() as usize;
    let tag = src.get(start..start + span.len() as usize).unwrap_or("");
    let mut cursor = 1 + name.len();

    let mut attrs = Vec::new();

    for attr in ele.attributes() {
        let attr = attr.map_err(|e| XmlError::Xml(e.into(), span))?;

        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| XmlError::InvalidUtf8(span))?
            .to_string();

        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Xml(e.into(), span))?
            .into_owned();

        let (attr_span, value_span, next) =
            locate_attr(tag, cursor, &key, span);
        cursor = next;

        attrs.push(Attr {
            name: key,
            value,
            span: attr_span,
            value_span,
        });
    }

    Ok(Element {
        name,
        span,
        attrs,
        children: vec![],
    })
}

/// Locate the attribute `key` within the raw `tag` text beginning at
///   `cursor`.
///
/// Yields the attribute span,
///   its value span,
///   and the position from which to locate the next attribute.
/// If the attribute cannot be located the tag span is used for both.
fn locate_attr(
    tag: &str,
    cursor: usize,
    key: &str,
    tag_span: Span,
) -> (Span, Span, usize) {
    let rest = tag.get(cursor..).unwrap_or("");

    let located = rest.find(key).and_then(|key_at| {
        let after_key = key_at + key.len();
        let quote_at = after_key + rest[after_key..].find(['"', '\''])?;
        let quote = rest[quote_at..].chars().next()?;
        let close_at = quote_at + 1 + rest[quote_at + 1..].find(quote)?;

        Some((key_at, quote_at + 1, close_at))
    });

    match located {
        Some((key_at, value_at, close_at)) => {
            let base = cursor;
            (
                tag_span.subspan(base + key_at, close_at + 1 - key_at),
                tag_span.subspan(base + value_at, close_at - value_at),
                base + close_at + 1,
            )
        }
        None => (tag_span, tag_span, cursor),
    }
}

/// Error reading XML source.
#[derive(Debug, PartialEq)]
pub enum XmlError {
    /// The underlying parser rejected the document.
    Xml(QuickXmlError, Span),

    /// Names and character data must be valid UTF-8.
    InvalidUtf8(Span),

    /// A closing tag with no corresponding opening tag.
    UnexpectedClose(Span),

    /// End of input was reached before the element was closed.
    UnclosedElement(String, Span),

    /// More than one top-level element.
    MultipleRoots(Span),

    /// Non-whitespace text outside of the root element.
    TextOutsideRoot(Span),

    /// The document contains no element at all.
    NoRoot,
}

impl Display for XmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(e, _) => write!(f, "malformed XML: {e}"),
            Self::InvalidUtf8(_) => write!(f, "invalid UTF-8 in XML source"),
            Self::UnexpectedClose(_) => {
                write!(f, "closing tag without matching opening tag")
            }
            Self::UnclosedElement(name, _) => {
                write!(f, "element `{name}` is never closed")
            }
            Self::MultipleRoots(_) => {
                write!(f, "document has more than one root element")
            }
            Self::TextOutsideRoot(_) => {
                write!(f, "text is not permitted outside of the root element")
            }
            Self::NoRoot => write!(f, "document has no root element"),
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(e, _) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for XmlError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Xml(_, span)
            | Self::InvalidUtf8(span)
            | Self::UnexpectedClose(span)
            | Self::TextOutsideRoot(span) => span.mark_error().into(),

            Self::UnclosedElement(_, span) => {
                span.error("element opened here").into()
            }

            Self::MultipleRoots(span) => span
                .error("second root element")
                .with_help("a document must have exactly one root element"),

            Self::NoRoot => vec![],
        }
    }
}
