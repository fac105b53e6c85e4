// Tests for the content and collection pass
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
    test::{demo_ts, method, prop, run_passes, ty, PassResult, BUTTON_ROOT},
    transform::{Arguments, Directives, Intrinsics, Properties, Types},
};

fn run(src: &str, strict: bool) -> PassResult {
    run_passes(
        src,
        vec![
            Box::new(Directives),
            Box::new(Intrinsics),
            Box::new(Arguments),
            Box::new(Types),
            Box::new(Properties),
            Box::new(Content),
        ],
        strict,
    )
}

/// Values of the property value `node`.
fn values(node: &Node) -> &Vec<Node> {
    match &node.kind {
        NodeKind::PropertyValue { values, .. } => values,
        other => panic!("expected property value, found {other:?}"),
    }
}

/// `Add` calls of the property value manipulation `node`.
fn calls(node: &Node) -> Vec<&Node> {
    match &node.kind {
        NodeKind::PropertyValueManipulation { manipulation, .. } => {
            manipulation.children()
        }
        other => panic!("expected manipulation, found {other:?}"),
    }
}

fn text(node: &Node) -> &str {
    match &node.kind {
        NodeKind::Text { text, .. } => text,
        other => panic!("expected text, found {other:?}"),
    }
}

#[test]
fn normalize_collapses_and_trims() {
    assert_eq!(Some("a b c".to_string()), normalize("  a \n\t b  c "));
    assert_eq!(None, normalize(" \n "));
    assert_eq!(None, normalize(""));
}

#[test]
fn loose_content_assigned_to_content_property() {
    let ts = demo_ts();
    let (root, _) = run(r#"<Button xmlns="urn:ui">Hi</Button>"#, true).unwrap();

    let button = ty(&ts, "Demo.Button");

    assert_eq!(
        vec![&Node::new(
            root.children()[0].span,
            NodeKind::PropertyValue {
                property: PropertyRef::Resolved(ClrProperty::Regular(prop(
                    &ts, button, "Content"
                ))),
                values: vec![Node::text(
                    values(root.children()[0])[0].span,
                    "Hi",
                    false
                )],
                from_attribute: false,
            },
        )],
        root.children(),
    );
}

#[test]
fn text_is_normalized_unless_preserved() {
    let (root, _) =
        run(r#"<Label xmlns="urn:ui">  a   b  </Label>"#, true).unwrap();
    assert_eq!("a b", text(&values(root.children()[0])[0]));

    let (root, _) = run(
        r#"<Label xmlns="urn:ui" xml:space="preserve">  a   b  </Label>"#,
        true,
    )
    .unwrap();
    assert_eq!("  a   b  ", text(&values(root.children()[0])[0]));
}

#[test]
fn whitespace_between_members_is_not_content() {
    let (root, _) = run(
        r#"<Button xmlns="urn:ui">
             <Button.Title>t</Button.Title>
           </Button>"#,
        true,
    )
    .unwrap();

    // Only `Title` remains;
    //   `Content` would not be assigned at all.
    assert_eq!(1, root.children().len());
    assert_eq!("t", text(&values(root.children()[0])[0]));
}

#[test]
fn collection_property_receives_add_calls() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<StackPanel xmlns="urn:ui"><Label /><Label /></StackPanel>"#,
        true,
    )
    .unwrap();

    let panel = ty(&ts, "Demo.StackPanel");
    let add = method(&ts, ty(&ts, "Demo.UIElementCollection"), "Add");

    match &root.children()[0].kind {
        NodeKind::PropertyValueManipulation { property, .. } => assert_eq!(
            &ClrProperty::Regular(prop(&ts, panel, "Children")),
            property,
        ),
        other => panic!("unexpected {other:?}"),
    }

    let calls = calls(root.children()[0]);
    assert_eq!(2, calls.len());

    for call in calls {
        assert!(matches!(
            &call.kind,
            NodeKind::MethodCall { method, args }
                if *method == add && args.len() == 1
        ));
    }
}

#[test]
fn single_value_for_read_only_collection_is_added() {
    let (root, _) = run(
        r#"<StackPanel xmlns="urn:ui">
             <StackPanel.Children><Label /></StackPanel.Children>
           </StackPanel>"#,
        true,
    )
    .unwrap();

    assert_eq!(1, calls(root.children()[0]).len());
}

#[test]
fn members_keep_their_position() {
    let (root, _) = run(
        r#"<StackPanel xmlns="urn:ui" Tag="t"><Label /></StackPanel>"#,
        true,
    )
    .unwrap();

    assert!(matches!(
        &root.children()[..],
        [
            Node { kind: NodeKind::PropertyValue { .. }, .. },
            Node { kind: NodeKind::PropertyValueManipulation { .. }, .. },
        ]
    ));
}

#[test]
fn keyed_value_uses_two_argument_add() {
    let ts = demo_ts();
    let src = r#"<StackPanel xmlns="urn:ui"
                             xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
                   <StackPanel.Resources>
                     <Label x:Key="greeting" Text="hi" />
                   </StackPanel.Resources>
                 </StackPanel>"#;

    let (root, _) = run(src, true).unwrap();
    let add = method(&ts, ty(&ts, "Demo.ResourceDictionary"), "Add");

    match &calls(root.children()[0])[..] {
        [Node {
            kind: NodeKind::MethodCall { method, args },
            ..
        }] => {
            assert_eq!(add, *method);
            assert_eq!("greeting", text(&args[0]));

            // The key is no longer a member of the value.
            assert_eq!(1, args[1].children().len());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn keyed_value_requires_keyed_add() {
    let src = r#"<StackPanel xmlns="urn:ui"
                             xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
                   <Label x:Key="a" />
                 </StackPanel>"#;

    assert!(matches!(
        run(src, true),
        Err(TransformError::NotACollection { ty, keyed: true, .. })
            if ty == "Demo.UIElementCollection"
    ));
}

#[test]
fn collection_object_receives_loose_content() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<UIElementCollection xmlns="urn:ui"><Label /></UIElementCollection>"#,
        true,
    )
    .unwrap();

    let add = method(&ts, ty(&ts, "Demo.UIElementCollection"), "Add");

    assert!(matches!(
        &root.children()[..],
        [Node { kind: NodeKind::MethodCall { method, .. }, .. }]
            if *method == add
    ));
}

#[test]
fn no_content_property_strict_and_lenient() {
    let src = r#"<Grid xmlns="urn:ui"><Label /></Grid>"#;

    assert!(matches!(
        run(src, true),
        Err(TransformError::NoContentProperty { ty, .. }) if ty == "Demo.Grid"
    ));

    let (root, suppressed) = run(src, false).unwrap();
    assert_eq!(1, suppressed.len());
    assert!(root.children().is_empty());
}

#[test]
fn multiple_values_for_single_valued_property() {
    assert!(matches!(
        run(r#"<Button xmlns="urn:ui"><Label /><Label /></Button>"#, true),
        Err(TransformError::MultipleValues { property, .. })
            if property == "Demo.Button.Content"
    ));

    // Explicitly assigned content property.
    assert!(matches!(
        run(r#"<Button xmlns="urn:ui" Content="a"><Label /></Button>"#, true),
        Err(TransformError::MultipleValues { .. })
    ));
}

#[test]
fn single_value_for_plain_property_is_kept() {
    // `Tag` is not a collection.
    let (root, _) = run(
        &format!(
            "{BUTTON_ROOT}><Button.Tag><StackPanel /></Button.Tag></Button>"
        ),
        true,
    )
    .unwrap();

    assert!(matches!(
        root.children()[0].kind,
        NodeKind::PropertyValue { .. }
    ));
}
