// Tests for the XML type catalog
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

use super::*;

const CATALOG: &str = r#"
<catalog>
  <xmlns uri="urn:demo" namespace="Demo" />

  <type name="Demo.Button" base="Demo.Control" content="Content">
    <constructor />
    <constructor params="System.String" />
    <property name="Content" type="System.Object" />
  </type>

  <type name="Demo.Control">
    <property name="Tag" type="System.String" access="get" />
    <implements type="Demo.IFocusable" />
  </type>

  <type name="Demo.IFocusable" />

  <type name="Demo.Grid">
    <method name="SetRow" static="true" params="Demo.Control, System.Int32" />
    <method name="GetRow" static="true" params="Demo.Control"
            returns="System.Int32" />
  </type>

  <type name="Demo.Thickness" value-type="true" />

  <type name="Demo.List`1">
    <method name="Add" params="System.Object" />
  </type>

  <instance of="Demo.List`1" args="System.String" />

  <type name="Demo.Map`2" />
  <instance of="Demo.Map`2" args="System.String, Demo.List`1[System.String]" />
</catalog>
"#;

#[test]
fn loads_types_members_and_bases() {
    let ts = load(CATALOG).unwrap();

    let button = ts.find_type("Demo.Button").unwrap();
    let control = ts.find_type("Demo.Control").unwrap();
    let focusable = ts.find_type("Demo.IFocusable").unwrap();

    assert!(ts.is_assignable_from(control, button));
    assert!(ts.is_assignable_from(focusable, button));

    assert_eq!(2, ts.constructors(button).len());

    let names = ts
        .properties(button)
        .into_iter()
        .map(|id| ts.property(id).name.clone())
        .collect::<Vec<_>>();
    assert_eq!(vec!["Content", "Tag"], names);

    let content = ts.content_property(button).unwrap();
    assert_eq!("Content", ts.property(content).name);

    let tag = ts.properties(control)[0];
    assert_eq!(None, ts.property(tag).setter);

    assert!(ts.is_value_type(ts.find_type("Demo.Thickness").unwrap()));
    assert_eq!(vec!["Demo".to_string()], ts.xmlns_namespaces("urn:demo"));
}

#[test]
fn static_methods_with_params() {
    let ts = load(CATALOG).unwrap();
    let grid = ts.find_type("Demo.Grid").unwrap();
    let control = ts.find_type("Demo.Control").unwrap();
    let int32 = ts.find_type("System.Int32").unwrap();

    let set_row = ts
        .methods(grid)
        .into_iter()
        .map(|id| ts.method(id))
        .find(|m| m.name == "SetRow")
        .unwrap();

    assert!(set_row.is_static);
    assert_eq!(vec![control, int32], set_row.params);
    assert_eq!(None, set_row.returns);
}

#[test]
fn instances_share_definition_members() {
    let ts = load(CATALOG).unwrap();
    let def = ts.find_type("Demo.List`1").unwrap();
    let string = ts.find_type("System.String").unwrap();

    let inst = ts.instantiate(def, &[string]).unwrap();

    assert_eq!("Demo.List`1[System.String]", ts.full_name(inst));
    assert_eq!(ts.methods(def), ts.methods(inst));

    // Nested instantiation names are split on top-level commas only.
    let map = ts.find_type("Demo.Map`2").unwrap();
    assert!(ts.instantiate(map, &[string, inst]).is_some());
}

#[test]
fn unknown_type_reference_fails() {
    let src = r#"<catalog><type name="A" base="Nope" /></catalog>"#;

    assert!(matches!(
        load(src),
        Err(CatalogError::UnknownType(name, _)) if name == "Nope",
    ));
}

#[test]
fn duplicate_type_fails() {
    let src = r#"<catalog><type name="System.String" /></catalog>"#;

    assert!(matches!(load(src), Err(CatalogError::DuplicateType(..))));
}

#[test]
fn missing_attr_fails() {
    let src =
        r#"<catalog><type><property type="System.String"/></type></catalog>"#;

    assert_eq!(
        Err(CatalogError::MissingAttr("name", Span::new(9, 6))),
        load(src).map(|_| ()),
    );
}

#[test]
fn invalid_access_fails() {
    let src = r#"<catalog><type name="A">
        <property name="P" type="System.String" access="rw" />
    </type></catalog>"#;

    assert!(matches!(
        load(src),
        Err(CatalogError::InvalidValue(attr, value, _))
            if attr == "access" && value == "rw",
    ));
}

#[test]
fn unknown_content_property_fails() {
    let src = r#"<catalog><type name="A" content="Nope" /></catalog>"#;

    assert!(matches!(load(src), Err(CatalogError::UnknownProperty(..))));
}

#[test]
fn wrong_root_fails() {
    assert!(matches!(
        load("<types/>"),
        Err(CatalogError::UnexpectedElement(name, _)) if name == "types",
    ));
}
