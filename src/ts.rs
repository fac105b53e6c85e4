// Type system port
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

//! Interface to the target type system.
//!
//! The compiler never inspects types directly;
//!   every question about types,
//!     properties,
//!     and methods goes through [`TypeSystem`].
//! Entities are referred to by small copyable handles
//!   ([`TypeId`], [`MethodId`], [`PropertyId`])
//!   that are only meaningful to the type system that issued them.
//!
//! [`memory::MemoryTypeSystem`] is a static implementation populated
//!   programmatically or from a [type catalog](catalog).

use crate::global;
use std::fmt::Display;

pub mod catalog;
pub mod mappings;
pub mod memory;

pub use mappings::LanguageTypeMappings;

macro_rules! ts_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(global::TsHandleSize);

        impl $name {
            pub const fn new(index: global::TsHandleSize) -> Self {
                Self(index)
            }

            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

ts_handle!(
    /// Handle to a type.
    TypeId
);

ts_handle!(
    /// Handle to a method or constructor.
    MethodId
);

ts_handle!(
    /// Handle to a property.
    PropertyId
);

/// A method or constructor signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub declaring: TypeId,
    pub is_static: bool,
    pub is_public: bool,
    pub is_constructor: bool,
    pub params: Vec<TypeId>,

    /// Return type,
    ///   or [`None`] for methods returning nothing.
    pub returns: Option<TypeId>,
}

impl Method {
    /// Whether this method may serve as the getter of an attached property
    ///   `name` for an instance of `target`.
    pub fn is_attached_getter(
        &self,
        ts: &dyn TypeSystem,
        name: &str,
        target: TypeId,
    ) -> bool {
        self.is_static
            && self.is_public
            && self.params.len() == 1
            && self.returns.is_some()
            && self.name.strip_prefix("Get") == Some(name)
            && ts.is_assignable_from(self.params[0], target)
    }

    /// Whether this method may serve as the setter of an attached property
    ///   `name` for an instance of `target`.
    pub fn is_attached_setter(
        &self,
        ts: &dyn TypeSystem,
        name: &str,
        target: TypeId,
    ) -> bool {
        self.is_static
            && self.is_public
            && self.params.len() == 2
            && self.name.strip_prefix("Set") == Some(name)
            && ts.is_assignable_from(self.params[0], target)
    }
}

/// A property and its accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub declaring: TypeId,
    pub ty: TypeId,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
}

/// Queries against a target type system.
///
/// Implementations must be deterministic and free of side effects
///   observable by the compiler.
/// A type system may be shared between concurrent compilations,
///   hence the [`Sync`] bound.
pub trait TypeSystem: Send + Sync {
    /// Look up a type by its full name
    ///   (`Namespace.Name`,
    ///     with a `` `N `` arity suffix for generic definitions).
    fn find_type(&self, full_name: &str) -> Option<TypeId>;

    /// Instantiate a generic type definition with the given arguments.
    fn instantiate(&self, definition: TypeId, args: &[TypeId])
        -> Option<TypeId>;

    fn full_name(&self, ty: TypeId) -> &str;

    fn is_value_type(&self, ty: TypeId) -> bool;

    /// Whether a value of type `from` may be stored in a location of type
    ///   `ty`.
    fn is_assignable_from(&self, ty: TypeId, from: TypeId) -> bool;

    /// Properties of `ty`,
    ///   including inherited ones,
    ///   most derived first.
    fn properties(&self, ty: TypeId) -> Vec<PropertyId>;

    fn property(&self, id: PropertyId) -> &Property;

    /// Methods of `ty`,
    ///   including inherited ones,
    ///   most derived first.
    ///
    /// Constructors are not included.
    fn methods(&self, ty: TypeId) -> Vec<MethodId>;

    fn constructors(&self, ty: TypeId) -> Vec<MethodId>;

    fn method(&self, id: MethodId) -> &Method;

    /// The designated content property of `ty`,
    ///   which receives child values that are not explicitly assigned to
    ///   a property.
    fn content_property(&self, ty: TypeId) -> Option<PropertyId>;

    /// Type-system namespaces mapped onto the XML namespace `xmlns`.
    fn xmlns_namespaces(&self, xmlns: &str) -> Vec<String>;
}

/// Render a method as `Declaring::Name(Param, …)`.
pub struct MethodDisplay<'a>(pub &'a dyn TypeSystem, pub MethodId);

impl<'a> Display for MethodDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(ts, id) = *self;
        let method = ts.method(id);

        write!(f, "{}::{}(", ts.full_name(method.declaring), method.name)?;

        for (i, param) in method.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ts.full_name(*param))?;
        }

        write!(f, ")")
    }
}
