// Transformation pipeline errors
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

//! Errors raised while transforming the AST.
//!
//! Most of these are resolution errors:
//!   the document is well-formed but refers to something that the
//!   [type system](crate::ts) does not provide,
//!   or uses it in a way that it does not support.
//! In lenient mode resolution errors are recorded on the
//!   [`Context`](super::Context) rather than returned,
//!     and the offending node is skipped.
//!
//! The remaining errors are internal errors indicating a defect in a
//!   pass.

use crate::{
    ast::RequiredChildRemoved,
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    span::Span,
    ts::mappings::MissingLanguageType,
    xmlns::XmlnsError,
};
use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// No type with the given name exists in the given namespace.
    UnknownType {
        xmlns: String,
        name: String,
        span: Span,
    },

    /// The type that a property or member belongs to was never resolved.
    UnresolvedType(Span),

    /// No regular or attached property `name` exists on `ty`.
    UnresolvedProperty {
        name: String,
        ty: String,
        span: Span,
    },

    /// A directive that the language does not define.
    UnknownDirective {
        xmlns: String,
        name: String,
        span: Span,
    },

    /// A directive value must be a single literal.
    InvalidDirectiveValue { name: &'static str, span: Span },

    /// An `x:Name` that was already used within the document.
    DuplicateName {
        name: String,
        span: Span,
        first: Span,
    },

    /// An intrinsic is missing a required argument.
    MissingIntrinsicArgument {
        intrinsic: &'static str,
        arg: &'static str,
        span: Span,
    },

    /// An `x:Static` member is not of the form `Type.Member`.
    InvalidStaticMember(String, Span),

    /// A name within an intrinsic argument could not be resolved.
    Namespace(XmlnsError, Span),

    /// Loose content was given for a type without a content property.
    NoContentProperty { ty: String, span: Span },

    /// Values were added to a type without a suitable `Add` method.
    NotACollection {
        ty: String,
        keyed: bool,
        span: Span,
    },

    /// More than one value was given for a property that is not a
    ///   collection.
    MultipleValues { property: String, span: Span },

    /// A property without a setter was assigned a value.
    ReadOnlyProperty { property: String, span: Span },

    /// No public constructor of `ty` accepts the given arguments.
    NoConstructor {
        ty: String,
        args: usize,
        span: Span,
    },

    /// Text could not be parsed as a literal of type `ty`.
    InvalidLiteral {
        text: String,
        ty: String,
        span: Span,
    },

    /// A value of type `from` cannot be stored in a location of type
    ///   `to`.
    InvalidConversion { from: String, to: String, span: Span },

    /// `x:Null` was given for a value type.
    NullValueType { ty: String, span: Span },

    /// A language type required by a conversion is not provided by the
    ///   type system.
    MissingLanguageType(MissingLanguageType, Span),

    /// A pass removed a child that its parent requires.
    RequiredChildRemoved(Span),

    /// A pass removed the root of the document.
    RootRemoved(Span),
}

/// Span field of any [`TransformError`],
///   borrowed the same way as the error itself.
macro_rules! span_of {
    ($err:expr) => {{
        use TransformError::*;

        match $err {
            UnknownType { span, .. }
            | UnresolvedType(span)
            | UnresolvedProperty { span, .. }
            | UnknownDirective { span, .. }
            | InvalidDirectiveValue { span, .. }
            | DuplicateName { span, .. }
            | MissingIntrinsicArgument { span, .. }
            | InvalidStaticMember(_, span)
            | Namespace(_, span)
            | NoContentProperty { span, .. }
            | NotACollection { span, .. }
            | MultipleValues { span, .. }
            | ReadOnlyProperty { span, .. }
            | NoConstructor { span, .. }
            | InvalidLiteral { span, .. }
            | InvalidConversion { span, .. }
            | NullValueType { span, .. }
            | MissingLanguageType(_, span)
            | RequiredChildRemoved(span)
            | RootRemoved(span) => span,
        }
    }};
}

impl TransformError {
    /// Span of the source of the error.
    pub fn span(&self) -> Span {
        *span_of!(self)
    }

    /// Replace an unknown span with `fallback`,
    ///   which is usually the span of the nearest ancestor with a known
    ///   position.
    pub fn or_span(mut self, fallback: Span) -> Self {
        let span = span_of!(&mut self);
        *span = span.or(fallback);
        self
    }

    /// Whether this error indicates a defect in a pass rather than a
    ///   problem with the document.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::RequiredChildRemoved(..) | Self::RootRemoved(..))
    }
}

impl From<RequiredChildRemoved> for TransformError {
    fn from(RequiredChildRemoved(span): RequiredChildRemoved) -> Self {
        Self::RequiredChildRemoved(span)
    }
}

impl Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TransformError::*;

        match self {
            UnknownType { xmlns, name, .. } => {
                write!(f, "unknown type `{name}` in namespace `{xmlns}`")
            }
            UnresolvedType(_) => write!(f, "unresolved type"),
            UnresolvedProperty { name, ty, .. } => {
                write!(f, "type `{ty}` has no property `{name}`")
            }
            UnknownDirective { xmlns, name, .. } => {
                write!(f, "unknown directive `{name}` in namespace `{xmlns}`")
            }
            InvalidDirectiveValue { name, .. } => {
                write!(f, "value of directive `{name}` must be text")
            }
            DuplicateName { name, .. } => {
                write!(f, "name `{name}` is already defined")
            }
            MissingIntrinsicArgument { intrinsic, arg, .. } => {
                write!(f, "`{intrinsic}` requires argument `{arg}`")
            }
            InvalidStaticMember(member, _) => {
                write!(f, "invalid static member reference `{member}`")
            }
            Namespace(e, _) => Display::fmt(e, f),
            NoContentProperty { ty, .. } => {
                write!(f, "type `{ty}` has no content property")
            }
            NotACollection {
                ty, keyed: false, ..
            } => {
                write!(f, "type `{ty}` is not a collection")
            }
            NotACollection { ty, keyed: true, .. } => {
                write!(f, "type `{ty}` is not a keyed collection")
            }
            MultipleValues { property, .. } => {
                write!(f, "property `{property}` accepts only one value")
            }
            ReadOnlyProperty { property, .. } => {
                write!(f, "property `{property}` is read-only")
            }
            NoConstructor { ty, args, .. } => {
                write!(
                    f,
                    "type `{ty}` has no public constructor accepting \
                        {args} argument(s)"
                )
            }
            InvalidLiteral { text, ty, .. } => {
                write!(f, "`{text}` is not a valid `{ty}`")
            }
            InvalidConversion { from, to, .. } => {
                write!(f, "cannot convert `{from}` to `{to}`")
            }
            NullValueType { ty, .. } => {
                write!(f, "value type `{ty}` cannot be null")
            }
            MissingLanguageType(e, _) => Display::fmt(e, f),
            RequiredChildRemoved(_) => {
                write!(f, "transformation removed a required node")
            }
            RootRemoved(_) => {
                write!(f, "transformation removed the document root")
            }
        }
    }
}

impl Error for TransformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Namespace(e, _) => Some(e),
            Self::MissingLanguageType(e, _) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for TransformError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        use TransformError::*;

        match self {
            UnknownType { span, .. } => span
                .error("type not found")
                .with_help("check the namespace declaration of this name"),

            UnresolvedProperty { span, ty, .. } => span
                .error(format!("not a property of `{ty}`"))
                .with_help(
                    "attached properties require a public static \
                        `Get` or `Set` method on the declaring type",
                ),

            DuplicateName { span, first, .. } => vec![
                first.note("first defined here"),
                span.error("name defined again here"),
            ],

            MissingIntrinsicArgument { span, arg, .. } => {
                span.error(format!("missing `{arg}`")).into()
            }

            InvalidStaticMember(_, span) => span
                .mark_error()
                .with_help("expected `prefix:Type.Member`"),

            NoContentProperty { span, .. } => span
                .error("loose content is not permitted here")
                .with_help("assign this value to a property element instead"),

            NoConstructor { span, .. } => {
                span.error("cannot construct this object").into()
            }

            InvalidLiteral { span, ty, .. } => {
                span.error(format!("expected a `{ty}` literal")).into()
            }

            RequiredChildRemoved(span) | RootRemoved(span) => vec![
                span.internal_error("while transforming this node"),
                span.help(
                    "this is a bug in the compiler and not a problem \
                        with your document",
                ),
            ],

            UnresolvedType(span)
            | UnknownDirective { span, .. }
            | InvalidDirectiveValue { span, .. }
            | Namespace(_, span)
            | NotACollection { span, .. }
            | MultipleValues { span, .. }
            | ReadOnlyProperty { span, .. }
            | InvalidConversion { span, .. }
            | NullValueType { span, .. }
            | MissingLanguageType(_, span) => span.mark_error().into(),
        }
    }
}
