// Tests for intrinsic recognition
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
use crate::test::{run_passes, PassResult, BUTTON_ROOT, UI};

fn run(body: &str, strict: bool) -> PassResult {
    run_passes(
        &format!("{BUTTON_ROOT} {body}"),
        vec![Box::new(Intrinsics)],
        strict,
    )
}

/// The single value of the first property of the root.
fn first_value(root: &Node) -> &NodeKind {
    match &root.children()[0].kind {
        NodeKind::PropertyValue { values, .. } => &values[0].kind,
        other => panic!("expected property value, found {other:?}"),
    }
}

#[test]
fn null_in_both_forms() {
    for body in [
        r#"Tag="{x:Null}" />"#,
        r#"Tag="{x:NullExtension}" />"#,
        r#"><Button.Tag><x:Null /></Button.Tag></Button>"#,
    ] {
        let (root, _) = run(body, true).unwrap();

        assert_eq!(
            &NodeKind::Intrinsic(Intrinsic::Null),
            first_value(&root),
            "{body}"
        );
    }
}

#[test]
fn type_from_positional_or_named_argument() {
    for body in [
        r#"Tag="{x:Type Label}" />"#,
        r#"Tag="{x:TypeExtension TypeName=Label}" />"#,
        r#"><Button.Tag><x:Type TypeName="Label" /></Button.Tag></Button>"#,
    ] {
        let (root, _) = run(body, true).unwrap();

        assert!(
            matches!(
                first_value(&root),
                NodeKind::Intrinsic(Intrinsic::TypeOf(TypeRef::Xml(ty)))
                    if ty.xmlns == UI && ty.name == "Label"
            ),
            "{body}"
        );
    }
}

#[test]
fn static_member() {
    let (root, _) = run(r#"Tag="{x:Static Res.Greeting}" />"#, true).unwrap();

    assert!(matches!(
        first_value(&root),
        NodeKind::Intrinsic(Intrinsic::Static {
            ty: TypeRef::Xml(ty),
            member,
            getter: None,
        }) if ty.name == "Res" && ty.xmlns == UI && member == "Greeting"
    ));
}

#[test]
fn static_member_requires_type() {
    assert!(matches!(
        run(r#"Tag="{x:Static Greeting}" />"#, true),
        Err(TransformError::InvalidStaticMember(member, _))
            if member == "Greeting"
    ));
}

#[test]
fn missing_argument() {
    assert!(matches!(
        run(r#"Tag="{x:Type}" />"#, true),
        Err(TransformError::MissingIntrinsicArgument {
            arg: "TypeName",
            ..
        })
    ));

    // Lenient mode drops the value.
    let (root, suppressed) = run(r#"Tag="{x:Type}" />"#, false).unwrap();
    assert_eq!(1, suppressed.len());

    assert!(matches!(
        &root.children()[0].kind,
        NodeKind::PropertyValue { values, .. } if values.is_empty()
    ));
}

#[test]
fn undeclared_prefix_in_argument() {
    assert!(matches!(
        run(r#"Tag="{x:Type q:Label}" />"#, true),
        Err(TransformError::Namespace(..))
    ));
}

#[test]
fn other_extensions_are_untouched() {
    let (root, _) = run(r#"Tag="{Binding Path}" />"#, true).unwrap();

    assert!(matches!(first_value(&root), NodeKind::MarkupExtension { .. }));
}
