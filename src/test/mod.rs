// Fixtures for testing
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

//! Fixtures shared by tests throughout the crate.
//!
//! The [demo type system](demo_ts) stands in for a small UI toolkit and is
//!   mapped onto the XML namespaces [`UI`] and `ns`.

use crate::{
    ast::Node,
    frontend::{parse, Document},
    transform::{Context, Pass, TransformError, Transformer},
    ts::{
        memory::{core_types::*, Accessors, MemoryTypeSystem},
        LanguageTypeMappings, MethodId, PropertyId, TypeId, TypeSystem,
    },
    xmlns::CompatMap,
};

/// XML namespace of the demo types.
pub const UI: &str = "urn:ui";

/// Opening of a root `Button` element declaring the demo and language
///   namespaces.
///
/// ```xml
/// <Button xmlns="urn:ui" xmlns:x="…"
/// ```
pub const BUTTON_ROOT: &str = r#"<Button xmlns="urn:ui" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml""#;

/// A type system describing a small UI toolkit.
pub fn demo_ts() -> MemoryTypeSystem {
    let mut ts = MemoryTypeSystem::with_core_types();

    let find = |ts: &MemoryTypeSystem, name| ts.find_type(name).unwrap();
    let object = find(&ts, OBJECT);
    let string = find(&ts, STRING);
    let int32 = find(&ts, INT32);
    let int64 = find(&ts, INT64);
    let double = find(&ts, DOUBLE);
    let boolean = find(&ts, BOOLEAN);
    let provider = find(&ts, SERVICE_PROVIDER);

    ts.add_xmlns_definition(UI, "Demo");
    ts.add_xmlns_definition("ns", "Demo");

    let element = ts.add_type("Demo.UIElement", None);
    ts.add_constructor(element, vec![]);
    ts.add_property(element, "Name", string, Accessors::GET_SET);
    ts.add_property(element, "Tag", object, Accessors::GET_SET);

    let side = ts.add_value_type("Demo.Side");
    ts.add_public_method(side, "Parse", true, vec![string], Some(side));

    let thickness = ts.add_value_type("Demo.Thickness");
    ts.add_constructor(thickness, vec![double]);
    ts.add_constructor(thickness, vec![double, double]);
    ts.add_public_method(
        thickness,
        "Parse",
        true,
        vec![string],
        Some(thickness),
    );

    let button = ts.add_type("Demo.Button", Some(element));
    ts.add_constructor(button, vec![]);
    let content =
        ts.add_property(button, "Content", object, Accessors::GET_SET);
    ts.set_content_property(button, content);
    ts.add_property(button, "Title", string, Accessors::GET_SET);
    ts.add_property(button, "Width", double, Accessors::GET_SET);
    ts.add_property(button, "Count", int32, Accessors::GET_SET);
    ts.add_property(button, "Ticks", int64, Accessors::GET_SET);
    ts.add_property(button, "IsEnabled", boolean, Accessors::GET_SET);
    ts.add_property(button, "Margin", thickness, Accessors::GET_SET);
    ts.add_property(button, "Sibling", button, Accessors::GET_SET);
    ts.add_property(button, "Version", int32, Accessors::GET);

    let label = ts.add_type("Demo.Label", Some(element));
    ts.add_constructor(label, vec![]);
    let text = ts.add_property(label, "Text", string, Accessors::GET_SET);
    ts.set_content_property(label, text);

    let grid = ts.add_type("Demo.Grid", Some(element));
    ts.add_constructor(grid, vec![]);
    ts.add_public_method(grid, "GetRow", true, vec![element], Some(int32));
    ts.add_public_method(grid, "SetRow", true, vec![element, int32], None);

    let dock = ts.add_type("Demo.Dock", None);
    ts.add_public_method(dock, "SetSide", true, vec![element, side], None);

    let cell = ts.add_type("Demo.Cell", Some(element));
    ts.add_constructor(cell, vec![]);
    ts.add_property(cell, "Row", int32, Accessors::GET_SET);
    ts.add_public_method(cell, "GetRow", true, vec![cell], Some(int32));
    ts.add_public_method(cell, "SetRow", true, vec![cell, int32], None);

    let collection = ts.add_type("Demo.UIElementCollection", None);
    ts.add_constructor(collection, vec![]);
    ts.add_public_method(collection, "Add", false, vec![element], None);
    ts.add_property(collection, "Count", int32, Accessors::GET);

    let dict = ts.add_type("Demo.ResourceDictionary", None);
    ts.add_constructor(dict, vec![]);
    ts.add_public_method(dict, "Add", false, vec![object, object], None);

    let panel = ts.add_type("Demo.StackPanel", Some(element));
    ts.add_constructor(panel, vec![]);
    let children =
        ts.add_property(panel, "Children", collection, Accessors::GET);
    ts.set_content_property(panel, children);
    ts.add_property(panel, "Resources", dict, Accessors::GET);

    let point = ts.add_type("Demo.Point", None);
    ts.add_constructor(point, vec![int32, int32]);
    ts.add_property(point, "X", int32, Accessors::GET);

    let binding = ts.add_type("Demo.BindingExtension", None);
    ts.add_constructor(binding, vec![]);
    ts.add_constructor(binding, vec![string]);
    ts.add_property(binding, "Path", string, Accessors::GET_SET);
    ts.add_public_method(
        binding,
        "ProvideValue",
        false,
        vec![provider],
        Some(object),
    );

    let res = ts.add_type("Demo.Res", None);
    ts.add_property(res, "Greeting", string, Accessors::STATIC_GET);

    let list = ts.add_type("Demo.List`1", None);
    ts.add_constructor(list, vec![]);
    ts.add_public_method(list, "Add", false, vec![object], None);
    ts.add_instance(list, vec![string]);

    ts
}

/// Language type mappings of [`demo_ts`].
pub fn demo_mappings(ts: &dyn TypeSystem) -> LanguageTypeMappings {
    LanguageTypeMappings::resolve(ts).unwrap()
}

/// Look up a type by its full name.
pub fn ty(ts: &dyn TypeSystem, name: &str) -> TypeId {
    ts.find_type(name)
        .unwrap_or_else(|| panic!("unknown type `{name}`"))
}

/// Look up a property of `ty` by name.
pub fn prop(ts: &dyn TypeSystem, ty: TypeId, name: &str) -> PropertyId {
    ts.properties(ty)
        .into_iter()
        .find(|id| ts.property(*id).name == name)
        .unwrap_or_else(|| panic!("unknown property `{name}`"))
}

/// Look up the first method of `ty` by name.
pub fn method(ts: &dyn TypeSystem, ty: TypeId, name: &str) -> MethodId {
    ts.methods(ty)
        .into_iter()
        .find(|id| ts.method(*id).name == name)
        .unwrap_or_else(|| panic!("unknown method `{name}`"))
}

/// Look up the constructor of `ty` taking `arity` arguments.
pub fn ctor(ts: &dyn TypeSystem, ty: TypeId, arity: usize) -> MethodId {
    ts.constructors(ty)
        .into_iter()
        .find(|id| ts.method(*id).params.len() == arity)
        .unwrap_or_else(|| panic!("no constructor of arity {arity}"))
}

/// Parse `src`,
///   panicking with the error if it is malformed.
pub fn parse_doc(src: &str) -> Document {
    parse(src, CompatMap::default())
        .unwrap_or_else(|e| panic!("unexpected syntax error: {e}"))
}

/// Result of [`run_passes`]:
///   the transformed root along with any suppressed diagnostics.
pub type PassResult = Result<(Node, Vec<TransformError>), TransformError>;

/// Parse `src` and apply `passes` using [`demo_ts`].
pub fn run_passes(
    src: &str,
    passes: Vec<Box<dyn Pass>>,
    strict: bool,
) -> PassResult {
    run_transformer(src, &Transformer::new(passes), strict)
}

/// Parse `src` and apply the standard passes using [`demo_ts`].
pub fn run_all(src: &str, strict: bool) -> PassResult {
    run_transformer(src, &Transformer::default(), strict)
}

fn run_transformer(
    src: &str,
    transformer: &Transformer,
    strict: bool,
) -> PassResult {
    let ts = demo_ts();
    let mappings = demo_mappings(&ts);
    let doc = parse_doc(src);

    let mut ctx = Context::new(&ts, &mappings, &doc.namespaces, strict);
    let root = transformer.run(&mut ctx, doc.root)?;

    Ok((root, ctx.take_suppressed()))
}

/// Ensures that tests will hit debug assertions.
///
/// Debug assertions are used to enforce invariants that would certainly be
///   hit by tests if violated,
///     and so have no need to be included in release builds.
///
/// If this test fails,
///   then optimization settings are inhibiting debug assertions.
/// See the documentation for [`debug_assert!`] for more information.
#[test]
#[should_panic]
fn uses_debug_assertions() {
    debug_assert!(false, "should panic");
}
