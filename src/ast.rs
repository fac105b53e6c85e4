// Markup abstract syntax tree
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

//! Abstract syntax tree of a markup document.
//!
//! The [front end](crate::frontend) produces a tree of unresolved nodes
//!   that mirror the markup:
//!     objects,
//!     property values,
//!     directives,
//!     text,
//!     and markup extensions.
//! The [transformation pipeline](crate::transform) then replaces nodes,
//!   one at a time,
//!   with progressively more refined ones until only the shapes that the
//!   [emitters](crate::emit) understand remain:
//!
//! ```text
//!   Object ──────────▶ NewObject { ctor, args, ManipulationGroup }
//!   PropertyValue ───▶ PropertyAssignment
//!                    ╰▶ PropertyValueManipulation { MethodCall Add }
//!   Text ────────────▶ Text | Constant | MethodCall Parse
//!   MarkupExtension ─▶ Object ─▶ NewObject | ProvideValue
//! ```
//!
//! Nodes own their children exclusively and are never shared,
//!   so a pass replacing a node never has to reconcile other references
//!   to it.
//! References into the type system are copyable handles
//!   (see [`crate::ts`]).
//!
//! Resolution is monotonic:
//!   once a [`TypeRef`] or [`PropertyRef`] is resolved no pass ever
//!   reverts it to its unresolved form.

use crate::{
    span::Span,
    ts::{MethodId, PropertyId, TypeId},
};
use std::fmt::Display;

/// A node and the span of the source text it was derived from.
///
/// Nodes synthesized by the pipeline may carry
///   [`UNKNOWN_SPAN`](crate::span::UNKNOWN_SPAN).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    /// Text node.
    pub fn text<S: Into<String>>(
        span: Span,
        text: S,
        preserve_whitespace: bool,
    ) -> Self {
        Self::new(
            span,
            NodeKind::Text {
                text: text.into(),
                preserve_whitespace,
            },
        )
    }

    /// Direct children of this node in source order.
    pub fn children(&self) -> Vec<&Node> {
        use NodeKind::*;

        match &self.kind {
            Object {
                arguments,
                children,
                ..
            } => arguments.iter().chain(children.iter()).collect(),

            PropertyValue { values, .. }
            | XmlDirective { values, .. }
            | Directive { values, .. } => values.iter().collect(),

            MarkupExtension {
                positional, named, ..
            } => positional.iter().chain(named.iter()).collect(),

            NewObject {
                args, manipulation, ..
            } => args.iter().chain(manipulation.as_deref()).collect(),

            PropertyAssignment { value, .. }
            | ProvideValue { value, .. }
            | Cast { value, .. } => vec![value],

            PropertyValueManipulation { manipulation, .. } => {
                vec![manipulation]
            }

            MethodCall { args, .. } => args.iter().collect(),
            ManipulationGroup { children } => children.iter().collect(),

            Text { .. } | Intrinsic(..) | Constant(..) => vec![],
        }
    }

    /// Number of nodes in this tree,
    ///   including this one.
    pub fn count(&self) -> usize {
        1 + self.children().into_iter().map(Node::count).sum::<usize>()
    }

    /// Replace each child of this node with the result of `f`,
    ///   preserving order.
    ///
    /// Children of lists may be removed by returning [`None`];
    ///   removing a child that the node cannot do without
    ///   (such as the value of a [`NodeKind::PropertyAssignment`])
    ///   is an error.
    ///
    /// This node itself is not passed to `f`.
    pub fn try_map_children<E: From<RequiredChildRemoved>>(
        self,
        f: &mut ChildMap<E>,
    ) -> Result<Node, E> {
        use NodeKind::*;

        let Node { span, kind } = self;

        let kind = match kind {
            Object {
                ty,
                arguments,
                children,
                markup_extension,
            } => Object {
                ty,
                arguments: map_vec(arguments, f)?,
                children: map_vec(children, f)?,
                markup_extension,
            },

            PropertyValue {
                property,
                values,
                from_attribute,
            } => PropertyValue {
                property,
                values: map_vec(values, f)?,
                from_attribute,
            },

            XmlDirective {
                xmlns,
                name,
                values,
            } => XmlDirective {
                xmlns,
                name,
                values: map_vec(values, f)?,
            },

            Directive { kind, values } => Directive {
                kind,
                values: map_vec(values, f)?,
            },

            MarkupExtension {
                ty,
                positional,
                named,
            } => MarkupExtension {
                ty,
                positional: map_vec(positional, f)?,
                named: map_vec(named, f)?,
            },

            NewObject {
                ty,
                ctor,
                args,
                manipulation,
            } => NewObject {
                ty,
                ctor,
                args: map_vec(args, f)?,
                manipulation: match manipulation {
                    Some(node) => f(*node)?.map(Box::new),
                    None => None,
                },
            },

            PropertyAssignment { property, value } => PropertyAssignment {
                property,
                value: map_box(value, span, f)?,
            },

            PropertyValueManipulation {
                property,
                manipulation,
            } => PropertyValueManipulation {
                property,
                manipulation: map_box(manipulation, span, f)?,
            },

            MethodCall { method, args } => MethodCall {
                method,
                args: map_vec(args, f)?,
            },

            ManipulationGroup { children } => ManipulationGroup {
                children: map_vec(children, f)?,
            },

            ProvideValue { method, value } => ProvideValue {
                method,
                value: map_box(value, span, f)?,
            },

            Cast { kind, ty, value } => Cast {
                kind,
                ty,
                value: map_box(value, span, f)?,
            },

            leaf @ (Text { .. } | Intrinsic(..) | Constant(..)) => leaf,
        };

        Ok(Node { span, kind })
    }
}

/// Function replacing a child node,
///   or removing it by returning [`None`].
pub type ChildMap<'a, E> = dyn FnMut(Node) -> Result<Option<Node>, E> + 'a;

fn map_vec<E>(nodes: Vec<Node>, f: &mut ChildMap<E>) -> Result<Vec<Node>, E> {
    let mut mapped = Vec::with_capacity(nodes.len());

    for node in nodes {
        if let Some(new) = f(node)? {
            mapped.push(new);
        }
    }

    Ok(mapped)
}

fn map_box<E: From<RequiredChildRemoved>>(
    node: Box<Node>,
    parent_span: Span,
    f: &mut ChildMap<E>,
) -> Result<Box<Node>, E> {
    let child_span = node.span.or(parent_span);

    f(*node)?
        .map(Box::new)
        .ok_or_else(|| RequiredChildRemoved(child_span).into())
}

/// A child that its parent requires was removed by a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredChildRemoved(pub Span);

/// Kinds of nodes.
///
/// The first group of variants is produced by the front end;
///   the second group is produced by the transformation pipeline and
///   consumed by emission.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Construction of an instance of `ty`.
    ///
    /// `arguments` are constructor arguments
    ///   (from `x:Arguments` or the positional arguments of a markup
    ///     extension);
    ///   `children` are property values,
    ///     directives,
    ///     and loose content values.
    Object {
        ty: TypeRef,
        arguments: Vec<Node>,
        children: Vec<Node>,
        markup_extension: bool,
    },

    /// Literal text.
    Text {
        text: String,
        preserve_whitespace: bool,
    },

    /// Values assigned to a property.
    ///
    /// `from_attribute` marks values originating from an attribute,
    ///   which are never subject to whitespace normalization.
    PropertyValue {
        property: PropertyRef,
        values: Vec<Node>,
        from_attribute: bool,
    },

    /// A namespace-qualified directive as written.
    XmlDirective {
        xmlns: String,
        name: String,
        values: Vec<Node>,
    },

    /// A recognized directive.
    Directive {
        kind: DirectiveKind,
        values: Vec<Node>,
    },

    /// A `{Name positional, name=value}` markup extension.
    ///
    /// `named` holds [`NodeKind::PropertyValue`] and
    ///   [`NodeKind::XmlDirective`] nodes.
    MarkupExtension {
        ty: TypeRef,
        positional: Vec<Node>,
        named: Vec<Node>,
    },

    Intrinsic(Intrinsic),

    /// A literal converted to a primitive type.
    Constant(Constant),

    /// Construct an instance with `ctor`,
    ///   then apply `manipulation` to it.
    NewObject {
        ty: TypeId,
        ctor: MethodId,
        args: Vec<Node>,
        manipulation: Option<Box<Node>>,
    },

    /// Assign `value` to `property` of the instance on the stack.
    PropertyAssignment {
        property: ClrProperty,
        value: Box<Node>,
    },

    /// Read `property` of the instance on the stack and apply
    ///   `manipulation` to the value read.
    PropertyValueManipulation {
        property: ClrProperty,
        manipulation: Box<Node>,
    },

    /// Invoke `method` with `args`.
    ///
    /// Static methods produce a value.
    /// Instance methods are manipulations:
    ///   they are invoked on the instance on the stack,
    ///   and any result is discarded.
    MethodCall {
        method: MethodId,
        args: Vec<Node>,
    },

    /// Apply each manipulation to the same instance in order.
    ManipulationGroup { children: Vec<Node> },

    /// `value.ProvideValue(null)` for a markup extension.
    ProvideValue { method: MethodId, value: Box<Node> },

    /// Convert `value` to `ty`.
    Cast {
        kind: CastKind,
        ty: TypeId,
        value: Box<Node>,
    },
}

impl NodeKind {
    /// Human-readable name of this kind of node,
    ///   for diagnostics.
    pub fn name(&self) -> &'static str {
        use NodeKind::*;

        match self {
            Object { .. } => "object",
            Text { .. } => "text",
            PropertyValue { .. } => "property value",
            XmlDirective { .. } => "XML directive",
            Directive { .. } => "directive",
            MarkupExtension { .. } => "markup extension",
            Intrinsic(..) => "intrinsic",
            Constant(..) => "constant",
            NewObject { .. } => "new object",
            PropertyAssignment { .. } => "property assignment",
            PropertyValueManipulation { .. } => "property value manipulation",
            MethodCall { .. } => "method call",
            ManipulationGroup { .. } => "manipulation group",
            ProvideValue { .. } => "provide value",
            Cast { .. } => "cast",
        }
    }
}

/// A reference to a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Xml(XmlTypeRef),
    Resolved(TypeId),
}

impl TypeRef {
    pub fn resolved(&self) -> Option<TypeId> {
        match self {
            Self::Resolved(ty) => Some(*ty),
            Self::Xml(..) => None,
        }
    }
}

/// A type as named in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTypeRef {
    pub span: Span,

    /// Namespace URI after compatibility remapping.
    pub xmlns: String,

    pub name: String,
    pub generic_args: Vec<TypeRef>,

    /// Whether the name denotes a markup extension,
    ///   which may omit its `Extension` suffix.
    pub is_markup_extension: bool,
}

impl XmlTypeRef {
    pub fn new<U: Into<String>, N: Into<String>>(
        span: Span,
        xmlns: U,
        name: N,
    ) -> Self {
        Self {
            span,
            xmlns: xmlns.into(),
            name: name.into(),
            generic_args: vec![],
            is_markup_extension: false,
        }
    }
}

impl Display for XmlTypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}{}", self.xmlns, self.name)
    }
}

/// A reference to a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRef {
    Name(NamePropertyRef),
    Resolved(ClrProperty),
}

/// A property as named in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePropertyRef {
    pub span: Span,
    pub name: String,

    /// Type declaring the property,
    ///   which is the target type unless qualified (`Type.Property`).
    pub declaring: TypeRef,

    /// Type of the object the property is set on.
    pub target: TypeRef,
}

/// A resolved property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClrProperty {
    Regular(PropertyId),
    Attached(AttachedProperty),
}

/// A property provided through static `Get<Name>`/`Set<Name>` methods.
///
/// Two attached properties are the same property when their names and
///   accessors are the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedProperty {
    pub name: String,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,

    /// Return type of the getter,
    ///   or the value parameter type of the setter if there is no
    ///   getter.
    pub ty: TypeId,
}

/// Directives recognized in the XAML language namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Key,
    Name,
    Uid,
    Shared,
    DeferLoadStrategy,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Key" => Some(Self::Key),
            "Name" => Some(Self::Name),
            "Uid" => Some(Self::Uid),
            "Shared" => Some(Self::Shared),
            "DeferLoadStrategy" => Some(Self::DeferLoadStrategy),
            _ => None,
        }
    }
}

/// Built-in values of the XAML language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intrinsic {
    /// `x:Null`.
    Null,

    /// `x:Type`.
    TypeOf(TypeRef),

    /// `x:Static`,
    ///   a static property read through its `getter` once resolved.
    Static {
        ty: TypeRef,
        member: String,
        getter: Option<MethodId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    I4(i32),
    I8(i64),
    R8(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// Value type to reference type.
    Box,

    /// Reference type to value type.
    UnboxAny,

    /// Reference type to a more derived reference type.
    Class,
}

#[cfg(test)]
mod test;
