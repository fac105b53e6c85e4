// Markup AST transformation pipeline
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

//! Transformation of the raw markup AST into emittable nodes.
//!
//! A [`Transformer`] applies an ordered list of [`Pass`]es to the tree.
//! Each pass is applied to the _entire_ tree before the next pass begins,
//!   so that a pass may rely on every earlier pass having finished:
//!
//!   1. [`Directives`] recognizes directives of the XAML language
//!        namespace and registers `x:Name`s;
//!   2. [`Intrinsics`] replaces `x:Null`,
//!        `x:Type`,
//!        and `x:Static`;
//!   3. [`Arguments`] turns markup extensions into objects and gathers
//!        `x:Arguments`;
//!   4. [`Types`] resolves type references;
//!   5. [`Properties`] resolves property references;
//!   6. [`Content`] normalizes text,
//!        folds loose content into content properties,
//!        and routes collection values into `Add` calls; and
//!   7. [`Values`] produces object construction,
//!        property assignment,
//!        and value conversion nodes.
//!
//! The tree is walked in pre-order:
//!   a node is handed to the pass,
//!   and then the children of whatever the pass returned are visited.
//! A pass may therefore replace a node with one whose children still need
//!   transforming,
//!     but will never see the node that it returned.
//!
//! Strict and Lenient Modes
//! ========================
//! When the document refers to something that the type system does not
//!   provide,
//!     strict mode fails with a [`TransformError`].
//! Lenient mode instead records the error on the [`Context`]
//!   (see [`Context::suppressed`])
//!   and skips the offending node so that tooling can still make sense of
//!   the remainder of the document.
//! Internal errors are always fatal.

mod error;
pub mod trace;

mod arguments;
mod content;
mod directives;
mod intrinsics;
mod properties;
mod types;
mod values;

pub use arguments::Arguments;
pub use content::Content;
pub use directives::Directives;
pub use error::TransformError;
pub use intrinsics::Intrinsics;
pub use properties::{resolve_property, Properties};
pub use types::Types;
pub use values::Values;

use crate::{
    ast::Node,
    span::{Span, UNKNOWN_SPAN},
    ts::{LanguageTypeMappings, TypeId, TypeSystem},
    xmlns::NamespaceContext,
};
use fxhash::FxHashMap;
use trace::PassTrace;

#[cfg(not(any(test, feature = "pipeline-trace-stderr")))]
type DefaultTrace = trace::VoidTrace;
#[cfg(any(test, feature = "pipeline-trace-stderr"))]
type DefaultTrace = trace::HumanReadableTrace;

/// Kinds of state shared between nodes during a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Names declared by `x:Name` (see [`NameScope`]).
    NameScope,

    /// Previously resolved type references (see [`TypeCache`]).
    TypeCache,
}

/// Storage for the item of each [`ItemKind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextItems {
    name_scope: Option<NameScope>,
    type_cache: Option<TypeCache>,
}

impl ContextItems {
    /// Kinds of the items that have been stored.
    pub fn kinds(&self) -> Vec<ItemKind> {
        let Self {
            name_scope,
            type_cache,
        } = self;

        [
            name_scope.as_ref().map(|_| NameScope::KIND),
            type_cache.as_ref().map(|_| TypeCache::KIND),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// State stored on a [`Context`] under a fixed [`ItemKind`].
pub trait Item: Default {
    const KIND: ItemKind;

    fn slot(items: &ContextItems) -> &Option<Self>;
    fn slot_mut(items: &mut ContextItems) -> &mut Option<Self>;
}

macro_rules! context_item {
    ($ty:ident, $field:ident) => {
        impl Item for $ty {
            const KIND: ItemKind = ItemKind::$ty;

            fn slot(items: &ContextItems) -> &Option<Self> {
                &items.$field
            }

            fn slot_mut(items: &mut ContextItems) -> &mut Option<Self> {
                &mut items.$field
            }
        }
    };
}

/// Names declared within a document by `x:Name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameScope {
    names: Vec<(String, Span)>,
    index: FxHashMap<String, usize>,
}

impl NameScope {
    /// Declare `name`,
    ///   or yield the span of its earlier declaration if it has already
    ///   been declared.
    pub fn register(&mut self, name: &str, span: Span) -> Result<(), Span> {
        match self.index.get(name) {
            Some(i) => Err(self.names[*i].1),
            None => {
                self.index.insert(name.to_string(), self.names.len());
                self.names.push((name.to_string(), span));
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Span> {
        self.index.get(name).map(|i| self.names[*i].1)
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }
}

/// Key identifying a type reference independently of where it appears.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub xmlns: String,
    pub name: String,
    pub args: Vec<TypeId>,
    pub markup_extension: bool,
}

/// Cache of resolved type references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeCache(FxHashMap<TypeKey, TypeId>);

impl TypeCache {
    pub fn get(&self, key: &TypeKey) -> Option<TypeId> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: TypeKey, ty: TypeId) {
        self.0.insert(key, ty);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

context_item!(NameScope, name_scope);
context_item!(TypeCache, type_cache);

/// State of a single transformation of a document.
///
/// A context is owned by a single compilation and never shared.
pub struct Context<'a> {
    pub ts: &'a dyn TypeSystem,
    pub mappings: &'a LanguageTypeMappings,
    pub namespaces: &'a NamespaceContext,

    /// Whether resolution errors are fatal.
    pub strict: bool,

    items: ContextItems,
    suppressed: Vec<TransformError>,

    /// Span of the nearest node with a known position,
    ///   used for errors raised on synthesized nodes.
    anchor: Span,
}

impl<'a> Context<'a> {
    pub fn new(
        ts: &'a dyn TypeSystem,
        mappings: &'a LanguageTypeMappings,
        namespaces: &'a NamespaceContext,
        strict: bool,
    ) -> Self {
        Self {
            ts,
            mappings,
            namespaces,
            strict,
            items: ContextItems::default(),
            suppressed: vec![],
            anchor: UNKNOWN_SPAN,
        }
    }

    /// The item of type `T`,
    ///   if one has been stored.
    pub fn item<T: Item>(&self) -> Option<&T> {
        T::slot(&self.items).as_ref()
    }

    /// The item of type `T`,
    ///   storing its default if none has been stored yet.
    pub fn item_mut<T: Item>(&mut self) -> &mut T {
        T::slot_mut(&mut self.items).get_or_insert_with(T::default)
    }

    pub fn items(&self) -> &ContextItems {
        &self.items
    }

    /// Resolution errors recorded in lenient mode,
    ///   in the order they were encountered.
    pub fn suppressed(&self) -> &[TransformError] {
        &self.suppressed
    }

    pub fn take_suppressed(&mut self) -> Vec<TransformError> {
        std::mem::take(&mut self.suppressed)
    }

    /// Fail with `err` in strict mode,
    ///   otherwise record it and continue with `fallback`.
    pub fn fail_or<T>(
        &mut self,
        err: TransformError,
        fallback: T,
    ) -> Result<T, TransformError> {
        let err = err.or_span(self.anchor);

        if self.strict {
            Err(err)
        } else {
            self.suppressed.push(err);
            Ok(fallback)
        }
    }

    /// Span of the nearest node with a known position.
    pub fn anchor(&self) -> Span {
        self.anchor
    }
}

/// A transformation applied to every node of a tree.
///
/// Passes are shared between compilations and must not hold per-document
///   state;
///     such state belongs on the [`Context`].
pub trait Pass: Send + Sync {
    /// Short name of the pass for traces.
    fn name(&self) -> &'static str;

    /// Transform a single node,
    ///   or remove it by returning [`None`].
    ///
    /// The children of the returned node are transformed afterward.
    /// Nodes that the pass does not recognize must be returned
    ///   unchanged.
    fn transform(
        &self,
        ctx: &mut Context,
        node: Node,
    ) -> Result<Option<Node>, TransformError>;
}

/// Ordered list of [`Pass`]es.
pub struct Transformer {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for Transformer {
    /// The standard passes in their required order.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Directives),
            Box::new(Intrinsics),
            Box::new(Arguments),
            Box::new(Types),
            Box::new(Properties),
            Box::new(Content),
            Box::new(Values),
        ])
    }
}

impl Transformer {
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    pub fn passes(&self) -> impl Iterator<Item = &dyn Pass> {
        self.passes.iter().map(|pass| pass.as_ref())
    }

    /// Apply each pass to the entire tree in order.
    pub fn run(
        &self,
        ctx: &mut Context,
        root: Node,
    ) -> Result<Node, TransformError> {
        self.run_traced(ctx, root, &mut DefaultTrace::default())
    }

    pub fn run_traced<T: PassTrace>(
        &self,
        ctx: &mut Context,
        mut root: Node,
        trace: &mut T,
    ) -> Result<Node, TransformError> {
        for pass in self.passes() {
            let before = root.count();
            let suppressed_before = ctx.suppressed.len();
            let root_span = root.span;

            root = match apply(pass, ctx, root, UNKNOWN_SPAN)? {
                Some(node) => node,
                None => return Err(TransformError::RootRemoved(root_span)),
            };

            trace.trace_pass(
                pass.name(),
                before,
                root.count(),
                &ctx.suppressed[suppressed_before..],
            );
        }

        Ok(root)
    }
}

/// Apply `pass` to `node` and then to the children of its replacement.
fn apply(
    pass: &dyn Pass,
    ctx: &mut Context,
    node: Node,
    anchor: Span,
) -> Result<Option<Node>, TransformError> {
    let anchor = node.span.or(anchor);
    ctx.anchor = anchor;

    let new = match pass.transform(ctx, node) {
        Ok(Some(new)) => new,
        Ok(None) => return Ok(None),
        Err(e) => return Err(e.or_span(anchor)),
    };

    let anchor = new.span.or(anchor);

    new.try_map_children(&mut |child| apply(pass, ctx, child, anchor))
        .map(Some)
        .map_err(|e: TransformError| e.or_span(anchor))
}
