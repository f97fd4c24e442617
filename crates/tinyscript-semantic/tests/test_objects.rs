//! Object literals, classes and inheritance.

mod common;

use common::{analyze, error_kind, should_pass, type_of};
use tinyscript_ast::{AstBuilder, Declaration, Operator};
use tinyscript_core::Error;

fn point(b: &AstBuilder) -> Declaration {
    b.type_alias(
        "Point",
        b.params(vec![("x", b.type_name("Int")), ("y", b.type_name("Int"))]),
    )
}

#[test]
fn test_object_literal_type() {
    let analysis = analyze(|b| {
        vec![
            b.value("object", b.record(vec![("a", b.int(1)), ("b", b.int(2))])),
            b.value("tuple", b.arguments(vec![b.int(1), b.string("x")])),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "object"), "[a: Int[1, 1], b: Int[2, 2]]");
    assert_eq!(type_of(&analysis, "tuple"), "[0: Int[1, 1], 1: String]");
}

#[test]
fn test_structural_width_subtyping() {
    assert!(should_pass(|b| {
        vec![b.typed_value(
            "object",
            b.params(vec![("a", b.type_name("Int")), ("b", b.type_name("Int"))]),
            b.record(vec![("a", b.int(1)), ("b", b.int(2)), ("c", b.int(3))]),
        )]
    }));
    assert_eq!(
        error_kind(|b| {
            vec![b.typed_value(
                "object",
                b.params(vec![("a", b.type_name("Int")), ("b", b.type_name("Int"))]),
                b.record(vec![("a", b.int(1))]),
            )]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_field_access() {
    let analysis = analyze(|b| {
        vec![
            b.value("myObject", b.record(vec![("a", b.int(1))])),
            b.value("a", b.member(b.name("myObject"), "a")),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "a"), "Int[1, 1]");
}

#[test]
fn test_unknown_field() {
    let result = analyze(|b| {
        vec![
            b.value("myObject", b.record(vec![("a", b.int(1))])),
            b.value("x", b.member(b.name("myObject"), "foo")),
        ]
    });
    assert!(matches!(
        result,
        Err(Error::ObjectFieldNotFound { ref field, .. }) if field == "foo"
    ));
}

#[test]
fn test_forward_reference_inside_literal() {
    let analysis = analyze(|b| {
        vec![b.value(
            "object",
            b.record(vec![("b", b.name("a")), ("a", b.int(1))]),
        )]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "object"), "[b: Int[1, 1], a: Int[1, 1]]");
}

#[test]
fn test_this_member_inside_literal() {
    let analysis = analyze(|b| {
        vec![b.value(
            "object",
            b.record(vec![
                ("a", b.int(1)),
                ("b", b.member(b.this(), "a")),
            ]),
        )]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "object"), "[a: Int[1, 1], b: Int[1, 1]]");
}

#[test]
fn test_bare_this_inside_own_field_is_a_cycle() {
    assert_eq!(
        error_kind(|b| vec![b.value("object", b.record(vec![("me", b.this())]))]),
        "cycle"
    );
}

#[test]
fn test_abstract_declaration_in_literal() {
    assert_eq!(
        error_kind(|b| {
            vec![b.value(
                "object",
                b.object(vec![b.abstract_field("x", b.type_name("Int"))]),
            )]
        }),
        "invalid_declaration"
    );
}

#[test]
fn test_private_members_are_not_fields() {
    let analysis = analyze(|b| {
        vec![b.value(
            "object",
            b.object(vec![
                b.concrete(b.head("secret").private(), None, b.int(2)),
                b.value("shown", b.name("secret")),
            ]),
        )]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "object"), "[shown: Int[2, 2]]");
}

#[test]
fn test_class_instantiation() {
    let analysis = analyze(|b| {
        vec![
            point(b),
            b.typed_value(
                "origin",
                b.type_name("Point"),
                b.record(vec![("x", b.int(0)), ("y", b.int(0))]),
            ),
            b.value("x", b.member(b.name("origin"), "x")),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "origin"), "Point");
    assert_eq!(type_of(&analysis, "x"), "Int");
}

#[test]
fn test_class_instance_must_supply_abstract_fields() {
    assert_eq!(
        error_kind(|b| {
            vec![
                point(b),
                b.typed_value("half", b.type_name("Point"), b.record(vec![("x", b.int(0))])),
            ]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_class_defaults_may_be_omitted() {
    assert!(should_pass(|b| {
        vec![
            b.type_alias(
                "Settings",
                b.object_type(vec![
                    b.typed_value("verbose", b.type_name("Bool"), b.name("false")),
                    b.abstract_field("level", b.type_name("Int")),
                ]),
            ),
            b.typed_value(
                "settings",
                b.type_name("Settings"),
                b.record(vec![("level", b.int(3))]),
            ),
        ]
    }));
}

#[test]
fn test_classes_are_nominal() {
    assert_eq!(
        error_kind(|b| {
            vec![
                b.type_alias("Meters", b.params(vec![("value", b.type_name("Int"))])),
                b.type_alias("Seconds", b.params(vec![("value", b.type_name("Int"))])),
                b.typed_value(
                    "distance",
                    b.type_name("Meters"),
                    b.record(vec![("value", b.int(1))]),
                ),
                b.typed_value("time", b.type_name("Seconds"), b.name("distance")),
            ]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_class_members_use_this() {
    let analysis = analyze(|b| {
        vec![
            b.type_alias(
                "Counter",
                b.object_type(vec![
                    b.abstract_field("count", b.type_name("Int")),
                    b.value(
                        "next",
                        b.binary(Operator::Add, b.member(b.this(), "count"), b.int(1)),
                    ),
                ]),
            ),
            b.typed_value(
                "counter",
                b.type_name("Counter"),
                b.record(vec![("count", b.int(1))]),
            ),
            b.value("next", b.member(b.name("counter"), "next")),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "next"), "Int");
}

#[test]
fn test_self_referential_class() {
    let analysis = analyze(|b| {
        vec![
            b.type_alias(
                "Node",
                b.params(vec![
                    ("value", b.type_name("Int")),
                    ("next", b.nullable_type(b.type_name("Node"))),
                ]),
            ),
            b.function(
                "valueOf",
                vec![("node", b.type_name("Node"))],
                b.member(b.name("node"), "value"),
            ),
            b.function(
                "successor",
                vec![("node", b.type_name("Node"))],
                b.member(b.name("node"), "next"),
            ),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "valueOf"), "Int");
    assert_eq!(type_of(&analysis, "successor"), "Node?");
}

#[test]
fn test_class_mutability_must_match() {
    assert_eq!(
        error_kind(|b| {
            vec![
                b.native_type("Cell", true),
                b.type_alias("Box", b.params(vec![("content", b.mutable_type_name("Cell"))])),
            ]
        }),
        "type_mutable"
    );
    assert!(should_pass(|b| {
        vec![
            b.native_type("Cell", true),
            b.mutable_type_alias("Box", b.params(vec![("content", b.mutable_type_name("Cell"))])),
        ]
    }));
}

fn shapes(b: &AstBuilder) -> Vec<Declaration> {
    vec![
        b.type_alias("Shape", b.params(vec![("area", b.type_name("Int"))])),
        b.type_alias(
            "Square",
            b.object_type(vec![
                b.inherit(b.name("Shape")),
                b.abstract_field("side", b.type_name("Int")),
                b.value(
                    "area",
                    b.binary(
                        Operator::Multiply,
                        b.member(b.this(), "side"),
                        b.member(b.this(), "side"),
                    ),
                ),
            ]),
        ),
    ]
}

#[test]
fn test_subclass_is_accepted_by_base() {
    let analysis = analyze(|b| {
        let mut file = shapes(b);
        file.push(b.typed_value(
            "square",
            b.type_name("Square"),
            b.record(vec![("side", b.int(2))]),
        ));
        file.push(b.typed_value("shape", b.type_name("Shape"), b.name("square")));
        file.push(b.value("area", b.member(b.name("shape"), "area")));
        file
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "shape"), "Shape");
    assert_eq!(type_of(&analysis, "area"), "Int");
}

#[test]
fn test_base_is_not_accepted_by_subclass() {
    assert_eq!(
        error_kind(|b| {
            let mut file = shapes(b);
            file.push(b.typed_value(
                "shape",
                b.type_name("Shape"),
                b.record(vec![("area", b.int(4))]),
            ));
            file.push(b.typed_value("square", b.type_name("Square"), b.name("shape")));
            file
        }),
        "type_mismatch"
    );
}

#[test]
fn test_literal_inheriting_abstract_fields() {
    assert_eq!(
        error_kind(|b| {
            vec![
                b.type_alias(
                    "Pair",
                    b.params(vec![("first", b.type_name("Any")), ("second", b.type_name("Any"))]),
                ),
                b.value(
                    "pair",
                    b.object(vec![b.inherit(b.name("Pair")), b.value("first", b.int(1))]),
                ),
            ]
        }),
        "abstract_field"
    );
}

#[test]
fn test_literal_implementing_class_is_an_instance() {
    assert!(should_pass(|b| {
        vec![
            b.type_alias(
                "Pair",
                b.params(vec![("first", b.type_name("Any")), ("second", b.type_name("Any"))]),
            ),
            b.value(
                "pair",
                b.object(vec![
                    b.inherit(b.name("Pair")),
                    b.value("first", b.int(1)),
                    b.value("second", b.string("two")),
                ]),
            ),
            b.typed_value("typed", b.type_name("Pair"), b.name("pair")),
        ]
    }));
}

#[test]
fn test_inheriting_object_values() {
    let analysis = analyze(|b| {
        vec![
            b.value("base", b.record(vec![("a", b.int(1))])),
            b.value(
                "derived",
                b.object(vec![b.inherit(b.name("base")), b.value("b", b.name("a"))]),
            ),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "derived"), "[a: Int[1, 1], b: Int[1, 1]]");
}

#[test]
fn test_inheriting_a_non_object() {
    assert_eq!(
        error_kind(|b| vec![b.value("x", b.object(vec![b.inherit(b.int(1))]))]),
        "invalid_inheritance"
    );
}

fn base(b: &AstBuilder) -> Declaration {
    b.type_alias(
        "Base",
        b.object_type(vec![b.typed_value("x", b.type_name("Int"), b.int(1))]),
    )
}

#[test]
fn test_override_requires_marker() {
    assert_eq!(
        error_kind(|b| {
            vec![
                base(b),
                b.type_alias(
                    "Derived",
                    b.object_type(vec![b.inherit(b.name("Base")), b.value("x", b.int(2))]),
                ),
            ]
        }),
        "override"
    );
    assert!(should_pass(|b| {
        vec![
            base(b),
            b.type_alias(
                "Derived",
                b.object_type(vec![
                    b.inherit(b.name("Base")),
                    b.concrete(b.head("x").overriding(), None, b.int(2)),
                ]),
            ),
        ]
    }));
}

#[test]
fn test_override_with_incompatible_type() {
    assert_eq!(
        error_kind(|b| {
            vec![
                base(b),
                b.type_alias(
                    "Derived",
                    b.object_type(vec![
                        b.inherit(b.name("Base")),
                        b.concrete(b.head("x").overriding(), None, b.string("two")),
                    ]),
                ),
            ]
        }),
        "override"
    );
}

#[test]
fn test_override_of_nothing() {
    assert_eq!(
        error_kind(|b| {
            vec![b.type_alias(
                "Lonely",
                b.object_type(vec![b.concrete(b.head("x").overriding(), None, b.int(2))]),
            )]
        }),
        "override"
    );
}

#[test]
fn test_multiple_inheritance() {
    let analysis = analyze(|b| {
        vec![
            b.type_alias("Named", b.params(vec![("name", b.type_name("String"))])),
            b.type_alias("Aged", b.params(vec![("age", b.type_name("Int"))])),
            b.type_alias(
                "Person",
                b.object_type(vec![b.inherit(b.name("Named")), b.inherit(b.name("Aged"))]),
            ),
            b.typed_value(
                "person",
                b.type_name("Person"),
                b.record(vec![("name", b.string("Ada")), ("age", b.int(36))]),
            ),
            b.typed_value("named", b.type_name("Named"), b.name("person")),
            b.typed_value("aged", b.type_name("Aged"), b.name("person")),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "named"), "Named");
    assert_eq!(type_of(&analysis, "aged"), "Aged");
}
