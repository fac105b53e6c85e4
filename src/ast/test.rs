// Tests for the markup abstract syntax tree
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
use crate::span::{dummy::*, UNKNOWN_SPAN};

fn object(span: Span, children: Vec<Node>) -> Node {
    Node::new(
        span,
        NodeKind::Object {
            ty: TypeRef::Resolved(TypeId::new(0)),
            arguments: vec![Node::text(S6, "arg", false)],
            children,
            markup_extension: false,
        },
    )
}

#[test]
fn children_in_source_order() {
    let sut = object(
        S1,
        vec![Node::text(S2, "a", false), Node::text(S3, "b", false)],
    );

    assert_eq!(
        vec![S6, S2, S3],
        sut.children().iter().map(|n| n.span).collect::<Vec<_>>(),
    );
    assert_eq!(4, sut.count());
}

#[test]
fn map_children_replaces_and_removes() {
    let sut = object(
        S1,
        vec![Node::text(S2, "a", false), Node::text(S3, "b", false)],
    );

    let given = sut
        .try_map_children::<RequiredChildRemoved>(&mut |node| {
            Ok(match node.kind {
                NodeKind::Text { text, .. } if text == "a" => None,
                NodeKind::Text { text, .. } => {
                    Some(Node::text(node.span, text.to_uppercase(), true))
                }
                kind => Some(Node::new(node.span, kind)),
            })
        })
        .unwrap();

    match given.kind {
        NodeKind::Object {
            arguments,
            children,
            ..
        } => {
            assert_eq!(vec![Node::text(S6, "ARG", true)], arguments);
            assert_eq!(vec![Node::text(S3, "B", true)], children);
        }
        _ => panic!("expected object"),
    }
}

#[test]
fn map_children_does_not_visit_self() {
    let sut = Node::text(S1, "leaf", false);
    let mut visited = 0;

    let given = sut
        .clone()
        .try_map_children::<RequiredChildRemoved>(&mut |node| {
            visited += 1;
            Ok(Some(node))
        })
        .unwrap();

    assert_eq!(sut, given);
    assert_eq!(0, visited);
}

#[test]
fn removing_required_child_fails_with_nearest_span() {
    let assign = |value_span| {
        Node::new(
            S1,
            NodeKind::PropertyAssignment {
                property: ClrProperty::Regular(PropertyId::new(0)),
                value: Box::new(Node::text(value_span, "v", false)),
            },
        )
    };

    assert_eq!(
        Err(RequiredChildRemoved(S2)),
        assign(S2).try_map_children::<RequiredChildRemoved>(&mut |_| Ok(None)),
    );

    // Synthesized children fall back to the parent span.
    assert_eq!(
        Err(RequiredChildRemoved(S1)),
        assign(UNKNOWN_SPAN)
            .try_map_children::<RequiredChildRemoved>(&mut |_| Ok(None)),
    );
}

#[test]
fn new_object_manipulation_may_be_removed() {
    let sut = Node::new(
        S1,
        NodeKind::NewObject {
            ty: TypeId::new(1),
            ctor: MethodId::new(2),
            args: vec![],
            manipulation: Some(Box::new(Node::new(
                S2,
                NodeKind::ManipulationGroup { children: vec![] },
            ))),
        },
    );

    let given = sut
        .try_map_children::<RequiredChildRemoved>(&mut |_| Ok(None))
        .unwrap();

    assert!(matches!(
        given.kind,
        NodeKind::NewObject {
            manipulation: None,
            ..
        }
    ));
}

#[test]
fn attached_property_equality_is_structural() {
    let a = AttachedProperty {
        name: "Row".into(),
        getter: Some(MethodId::new(1)),
        setter: Some(MethodId::new(2)),
        ty: TypeId::new(3),
    };

    assert_eq!(a.clone(), a);
    assert_ne!(
        AttachedProperty {
            setter: None,
            ..a.clone()
        },
        a
    );
}

#[test]
fn directive_names() {
    assert_eq!(Some(DirectiveKind::Key), DirectiveKind::from_name("Key"));
    assert_eq!(
        Some(DirectiveKind::DeferLoadStrategy),
        DirectiveKind::from_name("DeferLoadStrategy")
    );
    assert_eq!(None, DirectiveKind::from_name("Class"));
}
