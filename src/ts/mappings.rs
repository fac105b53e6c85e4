// Language type mappings
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

//! Well-known types that the markup language itself relies upon.
//!
//! Text values are converted into these types without going through a
//!   `Parse` method,
//!     and the `x:` language namespace exposes them under short names
//!     (`x:String`, `x:Int32`, …).

use super::{MethodId, TypeId, TypeSystem};
use crate::ts::memory::core_types;
use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTypeMappings {
    pub object: TypeId,
    pub string: TypeId,
    pub int32: Option<TypeId>,
    pub int64: Option<TypeId>,
    pub double: Option<TypeId>,
    pub boolean: Option<TypeId>,
    pub ty: Option<TypeId>,
    pub service_provider: Option<TypeId>,

    /// `static Type GetTypeFromHandle(RuntimeTypeHandle)`,
    ///   used to load `x:Type` values.
    pub get_type_from_handle: Option<MethodId>,
}

impl LanguageTypeMappings {
    /// Look up the language types in `ts`.
    ///
    /// Only `System.Object` and `System.String` are required;
    ///   every other mapping is optional and features relying on a
    ///   missing mapping fail when they are used.
    pub fn resolve(ts: &dyn TypeSystem) -> Result<Self, MissingLanguageType> {
        let require = |name: &'static str| {
            ts.find_type(name).ok_or(MissingLanguageType(name))
        };

        let ty = ts.find_type(core_types::TYPE);

        let get_type_from_handle = ty.and_then(|ty| {
            ts.methods(ty).into_iter().find(|id| {
                let method = ts.method(*id);
                method.name == "GetTypeFromHandle"
                    && method.is_static
                    && method.params.len() == 1
            })
        });

        Ok(Self {
            object: require(core_types::OBJECT)?,
            string: require(core_types::STRING)?,
            int32: ts.find_type(core_types::INT32),
            int64: ts.find_type(core_types::INT64),
            double: ts.find_type(core_types::DOUBLE),
            boolean: ts.find_type(core_types::BOOLEAN),
            ty,
            service_provider: ts.find_type(core_types::SERVICE_PROVIDER),
            get_type_from_handle,
        })
    }

    /// Type denoted by a name in the XAML language namespace,
    ///   such as `String` for `x:String`.
    pub fn language_type(&self, name: &str) -> Option<TypeId> {
        match name {
            "Object" => Some(self.object),
            "String" => Some(self.string),
            "Int32" => self.int32,
            "Int64" => self.int64,
            "Double" => self.double,
            "Boolean" => self.boolean,
            "Type" => self.ty,
            _ => None,
        }
    }
}

/// A required language type is not provided by the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLanguageType(pub &'static str);

impl Display for MissingLanguageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type system does not provide required type `{}`", self.0)
    }
}

impl Error for MissingLanguageType {}
