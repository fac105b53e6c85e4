// Static in-memory type system
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

//! A [`TypeSystem`] whose types are all declared up front.
//!
//! Generic instantiations must be declared as well
//!   (see [`MemoryTypeSystem::add_instance`]);
//!     [`TypeSystem::instantiate`] only looks them up.
//! An instantiation shares everything but its name with its definition,
//!   including members declared after the instantiation;
//!     generic parameters are not substituted in member signatures.
//! This keeps every query a pure read so that the type system can be
//!   shared freely between compilations.

use super::{Method, MethodId, Property, PropertyId, TypeId, TypeSystem};
use crate::global::TsHandleSize;
use fxhash::FxHashMap;

/// Names of the types declared by [`MemoryTypeSystem::with_core_types`].
pub mod core_types {
    pub const OBJECT: &str = "System.Object";
    pub const VALUE_TYPE: &str = "System.ValueType";
    pub const STRING: &str = "System.String";
    pub const INT32: &str = "System.Int32";
    pub const INT64: &str = "System.Int64";
    pub const DOUBLE: &str = "System.Double";
    pub const BOOLEAN: &str = "System.Boolean";
    pub const TYPE: &str = "System.Type";
    pub const RUNTIME_TYPE_HANDLE: &str = "System.RuntimeTypeHandle";
    pub const SERVICE_PROVIDER: &str = "System.IServiceProvider";
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeDef {
    name: String,
    base: Option<TypeId>,
    interfaces: Vec<TypeId>,
    value_type: bool,
    content: Option<PropertyId>,
    properties: Vec<PropertyId>,
    methods: Vec<MethodId>,
    ctors: Vec<MethodId>,

    /// Generic definition of an instantiation.
    definition: Option<TypeId>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryTypeSystem {
    types: Vec<TypeDef>,
    by_name: FxHashMap<String, TypeId>,
    methods: Vec<Method>,
    properties: Vec<Property>,
    xmlns: FxHashMap<String, Vec<String>>,
    instances: FxHashMap<(TypeId, Vec<TypeId>), TypeId>,
}

fn handle(len: usize) -> TsHandleSize {
    len.try_into().unwrap_or(TsHandleSize::MAX)
}

impl MemoryTypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A type system declaring the core language types
    ///   (see [`core_types`]),
    ///   including `System.Type.GetTypeFromHandle`.
    pub fn with_core_types() -> Self {
        use core_types::*;

        let mut ts = Self::new();

        let object = ts.add_type(OBJECT, None);
        ts.add_type(VALUE_TYPE, Some(object));
        ts.add_type(STRING, Some(object));

        for name in [INT32, INT64, DOUBLE, BOOLEAN] {
            ts.add_value_type(name);
        }

        let rth = ts.add_value_type(RUNTIME_TYPE_HANDLE);
        ts.add_type(SERVICE_PROVIDER, Some(object));

        let ty = ts.add_type(TYPE, Some(object));
        ts.add_public_method(
            ty,
            "GetTypeFromHandle",
            true,
            vec![rth],
            Some(ty),
        );

        ts
    }

    /// Declare a reference type.
    ///
    /// When `base` is [`None`] the type derives from `System.Object`,
    ///   if it has been declared.
    pub fn add_type(&mut self, name: &str, base: Option<TypeId>) -> TypeId {
        let base = base.or_else(|| self.find_type(core_types::OBJECT));
        self.push_type(name, base, false)
    }

    /// Declare a value type deriving from `System.ValueType`,
    ///   if it has been declared.
    pub fn add_value_type(&mut self, name: &str) -> TypeId {
        let base = self.find_type(core_types::VALUE_TYPE);
        self.push_type(name, base, true)
    }

    fn push_type(
        &mut self,
        name: &str,
        base: Option<TypeId>,
        value_type: bool,
    ) -> TypeId {
        let id = TypeId::new(handle(self.types.len()));

        self.types.push(TypeDef {
            name: name.to_string(),
            base,
            interfaces: vec![],
            value_type,
            content: None,
            properties: vec![],
            methods: vec![],
            ctors: vec![],
            definition: None,
        });
        self.by_name.insert(name.to_string(), id);

        id
    }

    /// Replace the base type of `ty`.
    ///
    /// Catalogs may reference base types declared after the types deriving
    ///   from them.
    pub fn set_base(&mut self, ty: TypeId, base: TypeId) {
        self.def_mut(ty).base = Some(base);
    }

    pub fn add_interface(&mut self, ty: TypeId, iface: TypeId) {
        self.def_mut(ty).interfaces.push(iface);
    }

    /// Declare a method or constructor on `method.declaring`.
    pub fn add_method(&mut self, method: Method) -> MethodId {
        let id = MethodId::new(handle(self.methods.len()));
        let def = self.def_mut(method.declaring);

        if method.is_constructor {
            def.ctors.push(id);
        } else {
            def.methods.push(id);
        }

        self.methods.push(method);
        id
    }

    /// Declare a public instance constructor.
    pub fn add_constructor(
        &mut self,
        ty: TypeId,
        params: Vec<TypeId>,
    ) -> MethodId {
        self.add_method(Method {
            name: ".ctor".into(),
            declaring: ty,
            is_static: false,
            is_public: true,
            is_constructor: true,
            params,
            returns: None,
        })
    }

    /// Declare a public method.
    pub fn add_public_method(
        &mut self,
        declaring: TypeId,
        name: &str,
        is_static: bool,
        params: Vec<TypeId>,
        returns: Option<TypeId>,
    ) -> MethodId {
        self.add_method(Method {
            name: name.into(),
            declaring,
            is_static,
            is_public: true,
            is_constructor: false,
            params,
            returns,
        })
    }

    /// Declare a property along with its `get_`/`set_` accessors.
    ///
    /// Static properties have static accessors.
    pub fn add_property(
        &mut self,
        declaring: TypeId,
        name: &str,
        ty: TypeId,
        accessors: Accessors,
    ) -> PropertyId {
        let is_static = accessors.is_static;

        let getter = accessors.get.then(|| {
            self.add_public_method(
                declaring,
                &format!("get_{name}"),
                is_static,
                vec![],
                Some(ty),
            )
        });

        let setter = accessors.set.then(|| {
            self.add_public_method(
                declaring,
                &format!("set_{name}"),
                is_static,
                vec![ty],
                None,
            )
        });

        let id = PropertyId::new(handle(self.properties.len()));
        self.properties.push(Property {
            name: name.into(),
            declaring,
            ty,
            getter,
            setter,
        });
        self.def_mut(declaring).properties.push(id);

        id
    }

    pub fn set_content_property(&mut self, ty: TypeId, prop: PropertyId) {
        self.def_mut(ty).content = Some(prop);
    }

    /// Map the XML namespace `xmlns` onto the type-system namespace
    ///   `namespace`.
    ///
    /// An XML namespace may map onto any number of namespaces,
    ///   searched in declaration order.
    pub fn add_xmlns_definition(&mut self, xmlns: &str, namespace: &str) {
        self.xmlns
            .entry(xmlns.to_string())
            .or_default()
            .push(namespace.to_string());
    }

    /// Declare the instantiation of the generic definition `def` with
    ///   `args`.
    ///
    /// The instantiation shares the members of its definition.
    pub fn add_instance(&mut self, def: TypeId, args: Vec<TypeId>) -> TypeId {
        let def = self.types[def.index()].definition.unwrap_or(def);

        if let Some(id) = self.instances.get(&(def, args.clone())) {
            return *id;
        }

        let name = format!(
            "{}[{}]",
            self.types[def.index()].name,
            args.iter()
                .map(|arg| self.types[arg.index()].name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );

        let id = TypeId::new(handle(self.types.len()));
        self.types.push(TypeDef {
            name: name.clone(),
            base: None,
            interfaces: vec![],
            value_type: false,
            content: None,
            properties: vec![],
            methods: vec![],
            ctors: vec![],
            definition: Some(def),
        });
        self.by_name.insert(name, id);
        self.instances.insert((def, args), id);

        id
    }

    /// Definition holding the members of `ty`,
    ///   which is its generic definition for instantiations.
    fn def(&self, ty: TypeId) -> &TypeDef {
        let own = &self.types[ty.index()];

        match own.definition {
            Some(def) => &self.types[def.index()],
            None => own,
        }
    }

    fn def_mut(&mut self, ty: TypeId) -> &mut TypeDef {
        let index = self.types[ty.index()].definition.unwrap_or(ty).index();
        &mut self.types[index]
    }

    /// Base type chain starting with `ty` itself.
    fn lineage(
        &self,
        ty: TypeId,
    ) -> impl Iterator<Item = (TypeId, &TypeDef)> + '_ {
        std::iter::successors(Some(ty), |id| self.def(*id).base)
            .map(|id| (id, self.def(id)))
    }
}

/// Accessors declared by [`MemoryTypeSystem::add_property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessors {
    pub get: bool,
    pub set: bool,
    pub is_static: bool,
}

impl Accessors {
    pub const GET_SET: Self = Self {
        get: true,
        set: true,
        is_static: false,
    };

    pub const GET: Self = Self {
        get: true,
        set: false,
        is_static: false,
    };

    pub const STATIC_GET: Self = Self {
        get: true,
        set: false,
        is_static: true,
    };
}

impl TypeSystem for MemoryTypeSystem {
    fn find_type(&self, full_name: &str) -> Option<TypeId> {
        self.by_name.get(full_name).copied()
    }

    fn instantiate(
        &self,
        definition: TypeId,
        args: &[TypeId],
    ) -> Option<TypeId> {
        self.instances.get(&(definition, args.to_vec())).copied()
    }

    fn full_name(&self, ty: TypeId) -> &str {
        &self.types[ty.index()].name
    }

    fn is_value_type(&self, ty: TypeId) -> bool {
        self.def(ty).value_type
    }

    fn is_assignable_from(&self, ty: TypeId, from: TypeId) -> bool {
        self.lineage(from)
            .any(|(id, def)| id == ty || def.interfaces.contains(&ty))
    }

    fn properties(&self, ty: TypeId) -> Vec<PropertyId> {
        self.lineage(ty)
            .flat_map(|(_, def)| def.properties.iter().copied())
            .collect()
    }

    fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.index()]
    }

    fn methods(&self, ty: TypeId) -> Vec<MethodId> {
        self.lineage(ty)
            .flat_map(|(_, def)| def.methods.iter().copied())
            .collect()
    }

    fn constructors(&self, ty: TypeId) -> Vec<MethodId> {
        self.def(ty).ctors.clone()
    }

    fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    fn content_property(&self, ty: TypeId) -> Option<PropertyId> {
        self.lineage(ty).find_map(|(_, def)| def.content)
    }

    fn xmlns_namespaces(&self, xmlns: &str) -> Vec<String> {
        self.xmlns.get(xmlns).cloned().unwrap_or_default()
    }
}
