// Tests for object construction and value conversion
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
    span::dummy::S1,
    test::{
        ctor, demo_mappings, demo_ts, method, parse_doc, prop, run_all, ty,
        PassResult, BUTTON_ROOT,
    },
};

fn run(src: &str, strict: bool) -> PassResult {
    run_all(src, strict)
}

/// Manipulations applied to the root object.
fn manipulations(root: &Node) -> Vec<&Node> {
    match &root.kind {
        NodeKind::NewObject {
            manipulation: Some(group),
            ..
        } => group.children(),
        NodeKind::NewObject { .. } => vec![],
        other => panic!("expected new object, found {other:?}"),
    }
}

/// Value assigned by the property assignment `node`.
fn assigned(node: &Node) -> &NodeKind {
    match &node.kind {
        NodeKind::PropertyAssignment { value, .. } => &value.kind,
        other => panic!("expected assignment, found {other:?}"),
    }
}

fn button(attrs: &str) -> String {
    format!("{BUTTON_ROOT} {attrs} />")
}

#[test]
fn object_becomes_new_object_with_assignments() {
    let ts = demo_ts();
    let (root, _) = run(r#"<Button xmlns="urn:ui" Content="Hi" />"#, true)
        .unwrap();

    let button = ty(&ts, "Demo.Button");

    assert_eq!(
        Node::new(
            root.span,
            NodeKind::NewObject {
                ty: button,
                ctor: ctor(&ts, button, 0),
                args: vec![],
                manipulation: Some(Box::new(Node::new(
                    root.span,
                    NodeKind::ManipulationGroup {
                        children: vec![Node::new(
                            manipulations(&root)[0].span,
                            NodeKind::PropertyAssignment {
                                property: ClrProperty::Regular(prop(
                                    &ts, button, "Content"
                                )),
                                value: Box::new(Node::text(
                                    manipulations(&root)[0].children()[0].span,
                                    "Hi",
                                    true,
                                )),
                            },
                        )],
                    },
                ))),
            },
        ),
        root,
    );
}

#[test]
fn object_without_members_has_no_manipulation() {
    let (root, _) = run(r#"<Button xmlns="urn:ui" />"#, true).unwrap();

    assert!(matches!(
        root.kind,
        NodeKind::NewObject {
            manipulation: None,
            ..
        }
    ));
}

#[test]
fn text_converts_to_primitive_constants() {
    let (root, _) = run(
        &button(
            r#"Count=" 42 " Ticks="9000000000" Width="1.5"
               IsEnabled="True""#,
        ),
        true,
    )
    .unwrap();

    let given = manipulations(&root)
        .into_iter()
        .map(assigned)
        .cloned()
        .collect::<Vec<_>>();

    assert_eq!(
        vec![
            NodeKind::Constant(Constant::I4(42)),
            NodeKind::Constant(Constant::I8(9_000_000_000)),
            NodeKind::Constant(Constant::R8(1.5)),
            NodeKind::Constant(Constant::Bool(true)),
        ],
        given,
    );
}

#[test]
fn invalid_literal_strict_and_lenient() {
    let src = button(r#"Count="many" Title="t""#);

    assert!(matches!(
        run(&src, true),
        Err(TransformError::InvalidLiteral { text, ty, .. })
            if text == "many" && ty == "System.Int32"
    ));

    let (root, suppressed) = run(&src, false).unwrap();
    assert_eq!(1, suppressed.len());

    // Only `Title` is assigned.
    assert_eq!(1, manipulations(&root).len());
}

#[test]
fn text_converts_through_parse() {
    let ts = demo_ts();
    let (root, _) = run(&button(r#"Margin="1,2""#), true).unwrap();

    let parse = method(&ts, ty(&ts, "Demo.Thickness"), "Parse");

    match assigned(manipulations(&root)[0]) {
        NodeKind::MethodCall { method, args } => {
            assert_eq!(parse, *method);
            assert!(matches!(args[0].kind, NodeKind::Text { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn text_without_conversion_fails() {
    assert!(matches!(
        run(&button(r#"Sibling="other""#), true),
        Err(TransformError::InvalidConversion { from, to, .. })
            if from == "System.String" && to == "Demo.Button"
    ));
}

#[test]
fn attached_property_assignment_converts_to_setter_parameter() {
    let ts = demo_ts();
    let (root, _) = run(&button(r#"Grid.Row="1" Dock.Side="Left""#), true)
        .unwrap();

    let parse = method(&ts, ty(&ts, "Demo.Side"), "Parse");

    let values = manipulations(&root)
        .into_iter()
        .map(assigned)
        .collect::<Vec<_>>();

    assert_eq!(&NodeKind::Constant(Constant::I4(1)), values[0]);
    assert!(matches!(
        values[1],
        NodeKind::MethodCall { method, .. } if *method == parse
    ));
}

#[test]
fn read_only_property_assignment_fails() {
    assert!(matches!(
        run(&button(r#"Version="2""#), true),
        Err(TransformError::ReadOnlyProperty { property, .. })
            if property == "Demo.Button.Version"
    ));
}

#[test]
fn value_type_is_boxed_for_object_property() {
    let ts = demo_ts();
    let (root, _) = run(
        &format!(
            "{BUTTON_ROOT}>
               <Button.Tag><x:Int32>5</x:Int32></Button.Tag>
             </Button>"
        ),
        true,
    )
    .unwrap();

    let int32 = ty(&ts, "System.Int32");

    match assigned(manipulations(&root)[0]) {
        NodeKind::Cast {
            kind: CastKind::Box,
            ty,
            value,
        } => {
            assert_eq!(int32, *ty);

            // Initialized from its text.
            assert_eq!(NodeKind::Constant(Constant::I4(5)), value.kind);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn null_into_reference_and_value_types() {
    let (root, _) = run(&button(r#"Tag="{x:Null}""#), true).unwrap();
    assert_eq!(
        &NodeKind::Intrinsic(Intrinsic::Null),
        assigned(manipulations(&root)[0])
    );

    assert!(matches!(
        run(&button(r#"Count="{x:Null}""#), true),
        Err(TransformError::NullValueType { ty, .. }) if ty == "System.Int32"
    ));
}

#[test]
fn markup_extension_is_provided() {
    let ts = demo_ts();
    let (root, _) = run(&button(r#"Tag="{Binding Path=Name}""#), true).unwrap();

    let binding = ty(&ts, "Demo.BindingExtension");
    let provide = method(&ts, binding, "ProvideValue");

    match assigned(manipulations(&root)[0]) {
        NodeKind::ProvideValue { method, value } => {
            assert_eq!(provide, *method);
            assert!(matches!(
                &value.kind,
                NodeKind::NewObject { ty, args, manipulation: Some(_), .. }
                    if *ty == binding && args.is_empty()
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn provided_value_is_cast_to_property_type() {
    let ts = demo_ts();
    let (root, _) = run(&button(r#"Title="{Binding Name}""#), true).unwrap();

    let string = ty(&ts, "System.String");
    let by_path = ctor(&ts, ty(&ts, "Demo.BindingExtension"), 1);

    match assigned(manipulations(&root)[0]) {
        NodeKind::Cast {
            kind: CastKind::Class,
            ty,
            value,
        } => {
            assert_eq!(string, *ty);

            // The positional argument selects the one-argument constructor.
            assert!(matches!(
                &value.kind,
                NodeKind::ProvideValue { value, .. }
                    if matches!(
                        &value.kind,
                        NodeKind::NewObject { ctor: c, .. } if *c == by_path
                    )
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn arguments_select_constructor() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<Point xmlns="urn:ui"
                  xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
             <x:Arguments>
               <x:Int32>1</x:Int32>
               <x:Int32>2</x:Int32>
             </x:Arguments>
           </Point>"#,
        true,
    )
    .unwrap();

    let point = ty(&ts, "Demo.Point");

    match &root.kind {
        NodeKind::NewObject { ctor: c, args, .. } => {
            assert_eq!(ctor(&ts, point, 2), *c);
            assert_eq!(2, args.len());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn no_matching_constructor() {
    let src = r#"<Point xmlns="urn:ui" />"#;

    assert!(matches!(
        run(src, true),
        Err(TransformError::NoConstructor { ty, args: 0, .. })
            if ty == "Demo.Point"
    ));

    // The root cannot be dropped.
    assert!(matches!(
        run(src, false),
        Err(TransformError::RootRemoved(..))
    ));
}

#[test]
fn name_directive_assigns_name_property() {
    let ts = demo_ts();
    let (root, _) = run(&button(r#"x:Name="ok""#), true).unwrap();

    let element = ty(&ts, "Demo.UIElement");

    assert!(matches!(
        &manipulations(&root)[..],
        [Node {
            kind: NodeKind::PropertyAssignment { property, value },
            ..
        }] if *property == ClrProperty::Regular(prop(&ts, element, "Name"))
            && matches!(
                &value.kind,
                NodeKind::Text { text, .. } if text == "ok"
            )
    ));
}

#[test]
fn other_directives_are_dropped() {
    let (root, _) = run(&button(r#"x:Uid="u" x:Shared="false""#), true)
        .unwrap();

    assert!(manipulations(&root).is_empty());
}

#[test]
fn add_arguments_are_converted() {
    let ts = demo_ts();
    let (root, _) = run(
        r#"<StackPanel xmlns="urn:ui"
                       xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
             <StackPanel.Resources>
               <x:Int32 x:Key="answer">42</x:Int32>
             </StackPanel.Resources>
           </StackPanel>"#,
        true,
    )
    .unwrap();

    let int32 = ty(&ts, "System.Int32");

    let NodeKind::PropertyValueManipulation { manipulation, .. } =
        &manipulations(&root)[0].kind
    else {
        panic!("expected manipulation");
    };

    match &manipulation.children()[0].kind {
        NodeKind::MethodCall { args, .. } => {
            assert!(matches!(
                &args[0].kind,
                NodeKind::Text { text, .. } if text == "answer"
            ));
            assert!(matches!(
                &args[1].kind,
                NodeKind::Cast { kind: CastKind::Box, ty, .. } if *ty == int32
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn lenient_drops_unresolved_objects() {
    let (root, suppressed) = run(
        r#"<StackPanel xmlns="urn:ui"><Nope /><Label /></StackPanel>"#,
        false,
    )
    .unwrap();

    assert!(!suppressed.is_empty());

    let NodeKind::PropertyValueManipulation { manipulation, .. } =
        &manipulations(&root)[0].kind
    else {
        panic!("expected manipulation");
    };

    // Only the `Label` is added.
    assert_eq!(1, manipulation.children().len());
}

#[test]
fn convert_static_member_value() {
    let ts = demo_ts();
    let mappings = demo_mappings(&ts);
    let doc = parse_doc(r#"<Button xmlns="urn:ui" />"#);
    let ctx = Context::new(&ts, &mappings, &doc.namespaces, true);

    let res = ty(&ts, "Demo.Res");
    let node = Node::new(
        S1,
        NodeKind::Intrinsic(Intrinsic::Static {
            ty: TypeRef::Resolved(res),
            member: "Greeting".into(),
            getter: Some(method(&ts, res, "get_Greeting")),
        }),
    );

    // String into object needs no conversion.
    assert_eq!(Ok(node.clone()), convert(&ctx, node.clone(), mappings.object));

    // Nor does it into a string.
    assert_eq!(Ok(node.clone()), convert(&ctx, node.clone(), mappings.string));

    assert!(matches!(
        convert(&ctx, node, ty(&ts, "Demo.Thickness")),
        Err(TransformError::InvalidConversion { .. })
    ));
}
