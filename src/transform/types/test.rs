// Tests for type reference resolution
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
use crate::{
    test::{demo_mappings, demo_ts, parse_doc, run_passes, ty, UI},
    transform::{Arguments, Intrinsics},
    ts::TypeSystem,
};

fn run(src: &str, strict: bool) -> crate::test::PassResult {
    run_passes(
        src,
        vec![Box::new(Intrinsics), Box::new(Arguments), Box::new(Types)],
        strict,
    )
}

fn object_type(node: &Node) -> &TypeRef {
    match &node.kind {
        NodeKind::Object { ty, .. } => ty,
        other => panic!("expected object, found {other:?}"),
    }
}

fn first_value(root: &Node) -> &Node {
    match &root.children()[0].kind {
        NodeKind::PropertyValue { values, .. } => &values[0],
        other => panic!("expected property value, found {other:?}"),
    }
}

#[test]
fn resolves_through_xmlns_definitions() {
    let ts = demo_ts();
    let (root, _) = run(r#"<Button xmlns="urn:ui" />"#, true).unwrap();

    assert_eq!(
        &TypeRef::Resolved(ty(&ts, "Demo.Button")),
        object_type(&root)
    );
}

#[test]
fn resolves_clr_namespace() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<l:Label xmlns:l="clr-namespace:Demo;assembly=Demo" />"#,
        true,
    )
    .unwrap();

    assert_eq!(&TypeRef::Resolved(ty(&ts, "Demo.Label")), object_type(&root));
}

#[test]
fn resolves_language_types() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<Button xmlns="urn:ui"
                   xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
             <Button.Tag><x:Int32>5</x:Int32></Button.Tag>
           </Button>"#,
        true,
    )
    .unwrap();

    assert_eq!(
        &TypeRef::Resolved(ty(&ts, "System.Int32")),
        object_type(first_value(&root)),
    );
}

#[test]
fn markup_extension_prefers_extension_suffix() {
    let ts = demo_ts();
    let (root, _) =
        run(r#"<Button xmlns="urn:ui" Tag="{Binding}" />"#, true).unwrap();

    assert_eq!(
        &TypeRef::Resolved(ty(&ts, "Demo.BindingExtension")),
        object_type(first_value(&root)),
    );

    // Element form names the type exactly.
    assert!(matches!(
        run(r#"<Binding xmlns="urn:ui" />"#, true),
        Err(TransformError::UnknownType { name, .. }) if name == "Binding"
    ));
}

#[test]
fn generic_arguments_are_instantiated() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<List xmlns="urn:ui"
                 xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
                 x:TypeArguments="x:String" />"#,
        true,
    )
    .unwrap();

    let list = ty(&ts, "Demo.List`1");
    let expected = ts.instantiate(list, &[ty(&ts, "System.String")]);

    assert_eq!(
        expected.map(TypeRef::Resolved).as_ref(),
        Some(object_type(&root))
    );
}

#[test]
fn property_references_are_resolved() {
    let ts = demo_ts();
    let (root, _) =
        run(r#"<Button xmlns="urn:ui" Grid.Row="1" />"#, true).unwrap();

    match &root.children()[0].kind {
        NodeKind::PropertyValue {
            property: PropertyRef::Name(prop),
            ..
        } => {
            assert_eq!(TypeRef::Resolved(ty(&ts, "Demo.Grid")), prop.declaring);
            assert_eq!(TypeRef::Resolved(ty(&ts, "Demo.Button")), prop.target);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn intrinsic_types_are_resolved() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<Button xmlns="urn:ui"
                   xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
                   Tag="{x:Type Label}" Title="{x:Static Res.Greeting}" />"#,
        true,
    )
    .unwrap();

    let values = root
        .children()
        .into_iter()
        .map(|pv| match &pv.kind {
            NodeKind::PropertyValue { values, .. } => values[0].kind.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect::<Vec<_>>();

    assert_eq!(
        NodeKind::Intrinsic(Intrinsic::TypeOf(TypeRef::Resolved(ty(
            &ts,
            "Demo.Label"
        )))),
        values[0],
    );

    assert!(matches!(
        &values[1],
        NodeKind::Intrinsic(Intrinsic::Static {
            ty: TypeRef::Resolved(res),
            ..
        }) if *res == ty(&ts, "Demo.Res")
    ));
}

#[test]
fn unknown_type_strict_and_lenient() {
    let src = r#"<Button xmlns="urn:ui"><Nope /></Button>"#;

    assert!(matches!(
        run(src, true),
        Err(TransformError::UnknownType { xmlns, name, .. })
            if xmlns == UI && name == "Nope"
    ));

    let (root, suppressed) = run(src, false).unwrap();
    assert_eq!(1, suppressed.len());

    // The reference is left unresolved.
    assert!(matches!(
        object_type(root.children()[0]),
        TypeRef::Xml(xml) if xml.name == "Nope"
    ));
}

#[test]
fn resolved_types_are_cached() {
    let ts = demo_ts();
    let mappings = demo_mappings(&ts);
    let doc = parse_doc(r#"<Button xmlns="urn:ui"><Button /></Button>"#);

    let mut ctx = Context::new(&ts, &mappings, &doc.namespaces, true);
    let xml = XmlTypeRef::new(doc.root.span, UI, "Button");

    let first = resolve_type(&mut ctx, &xml).unwrap();
    assert_eq!(Some(1), ctx.item::<TypeCache>().map(TypeCache::len));

    assert_eq!(first, resolve_type(&mut ctx, &xml).unwrap());
    assert_eq!(Some(1), ctx.item::<TypeCache>().map(TypeCache::len));
}
