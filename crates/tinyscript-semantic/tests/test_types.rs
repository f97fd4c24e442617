//! Type annotations, aliases, operators and conditionals.

mod common;

use common::{analyze, error_kind, should_pass, type_of};
use tinyscript_ast::Operator;
use tinyscript_semantic::DeclarationCategory;

#[test]
fn test_annotation_mismatch() {
    assert_eq!(
        error_kind(|b| vec![b.typed_value("myString", b.type_name("Int"), b.string("foo"))]),
        "type_mismatch"
    );
    assert!(should_pass(|b| {
        vec![b.typed_value("myString", b.type_name("String"), b.string("foo"))]
    }));
}

#[test]
fn test_annotation_is_the_declared_type() {
    let analysis =
        analyze(|b| vec![b.typed_value("count", b.type_name("Int"), b.int(3))]).unwrap();
    assert_eq!(type_of(&analysis, "count"), "Int");
}

#[test]
fn test_range_must_fit_annotation() {
    assert!(should_pass(|b| {
        vec![
            b.value("three", b.int(3)),
            b.typed_value("alias", b.type_of(b.name("three")), b.int(3)),
        ]
    }));
    assert_eq!(
        error_kind(|b| {
            vec![
                b.value("three", b.int(3)),
                b.typed_value("alias", b.type_of(b.name("three")), b.int(4)),
            ]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_typeof_rejects_impure_operand() {
    assert_eq!(
        error_kind(|b| {
            vec![b.typed_value(
                "x",
                b.type_of(b.impure_call("println", vec![b.int(1)])),
                b.record(vec![]),
            )]
        }),
        "pure_scope"
    );
}

#[test]
fn test_function_type_contravariance() {
    assert!(should_pass(|b| {
        vec![b.typed_value(
            "f",
            b.function_type(
                false,
                Some(b.params(vec![("x", b.type_name("Int"))])),
                b.type_name("Any"),
            ),
            b.lambda(
                false,
                Some(b.params(vec![("x", b.type_name("Any"))])),
                None,
                b.int(1),
            ),
        )]
    }));
    assert_eq!(
        error_kind(|b| {
            vec![b.typed_value(
                "g",
                b.function_type(
                    false,
                    Some(b.params(vec![("x", b.type_name("Any"))])),
                    b.type_name("Any"),
                ),
                b.lambda(
                    false,
                    Some(b.params(vec![("x", b.type_name("Int"))])),
                    None,
                    b.name("x"),
                ),
            )]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_conditional_joins_branches() {
    let analysis = analyze(|b| {
        vec![
            b.value("range", b.if_else(b.name("true"), b.int(1), Some(b.int(5)))),
            b.value("mixed", b.if_else(b.name("false"), b.int(1), Some(b.string("s")))),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "range"), "Int[1, 5]");
    assert_eq!(type_of(&analysis, "mixed"), "Any");
}

#[test]
fn test_condition_must_be_bool() {
    assert_eq!(
        error_kind(|b| vec![b.value("x", b.if_else(b.int(1), b.int(2), Some(b.int(3))))]),
        "type_mismatch"
    );
}

#[test]
fn test_if_without_else_is_nullable() {
    let analysis = analyze(|b| {
        vec![
            b.value("maybe", b.if_else(b.name("true"), b.int(1), None)),
            b.value("sure", b.elvis(b.name("maybe"), b.int(0))),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "maybe"), "Int[1, 1]?");
    assert_eq!(type_of(&analysis, "sure"), "Int[0, 1]");
}

#[test]
fn test_nullable_annotation_accepts_plain_value() {
    assert!(should_pass(|b| {
        vec![b.typed_value("x", b.nullable_type(b.type_name("Int")), b.int(1))]
    }));
    assert_eq!(
        error_kind(|b| {
            vec![
                b.value("maybe", b.if_else(b.name("true"), b.int(1), None)),
                b.typed_value("x", b.type_name("Int"), b.name("maybe")),
            ]
        }),
        "type_mismatch"
    );
}

#[test]
fn test_builtin_operators() {
    let analysis = analyze(|b| {
        vec![
            b.value("text", b.binary(Operator::Add, b.string("a"), b.string("b"))),
            b.value("ratio", b.binary(Operator::Divide, b.float(3.0), b.float(2.0))),
            b.value("less", b.binary(Operator::Less, b.int(1), b.int(2))),
            b.value("same", b.binary(Operator::Equal, b.string("a"), b.int(2))),
            b.value("negative", b.unary(Operator::Subtract, b.int(4))),
            b.value("not", b.unary(Operator::Not, b.name("true"))),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "text"), "String");
    assert_eq!(type_of(&analysis, "ratio"), "Float");
    assert_eq!(type_of(&analysis, "less"), "Bool");
    assert_eq!(type_of(&analysis, "same"), "Bool");
    assert_eq!(type_of(&analysis, "negative"), "Int[-4, -4]");
    assert_eq!(type_of(&analysis, "not"), "Bool");
}

#[test]
fn test_operator_without_overload() {
    assert_eq!(
        error_kind(|b| vec![b.value("x", b.binary(Operator::Add, b.int(1), b.string("b")))]),
        "unresolved_reference"
    );
}

#[test]
fn test_declared_operator() {
    let analysis = analyze(|b| {
        vec![
            b.operator(
                b.type_name("String"),
                Operator::Multiply,
                ("times", b.type_name("Int")),
                b.this(),
            ),
            b.value("repeated", b.binary(Operator::Multiply, b.string("ab"), b.int(3))),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "repeated"), "String");
}

#[test]
fn test_operator_needs_receiver() {
    assert_eq!(
        error_kind(|b| {
            vec![b.concrete(
                tinyscript_ast::DeclarationHead::new(tinyscript_ast::DeclarationName::Operator(
                    Operator::Add,
                )),
                None,
                b.int(1),
            )]
        }),
        "invalid_declaration"
    );
}

#[test]
fn test_calling_a_function_value() {
    let analysis = analyze(|b| {
        vec![
            b.value(
                "increment",
                b.lambda(
                    false,
                    Some(b.params(vec![("x", b.type_name("Int"))])),
                    Some(b.type_name("Int")),
                    b.binary(Operator::Add, b.name("x"), b.int(1)),
                ),
            ),
            b.value("two", b.call("increment", vec![b.int(1)])),
            b.value(
                "direct",
                b.apply(
                    b.lambda(false, None, None, b.string("done")),
                    false,
                    vec![],
                ),
            ),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "two"), "Int");
    assert_eq!(type_of(&analysis, "direct"), "String");
}

#[test]
fn test_calling_a_non_function() {
    assert_eq!(
        error_kind(|b| vec![b.value("one", b.int(1)), b.value("x", b.call("one", vec![b.int(2)]))]),
        "invalid_anonymous_function_call"
    );
}

#[test]
fn test_function_reference_without_arguments() {
    let analysis = analyze(|b| {
        vec![
            b.function("square", vec![("x", b.type_name("Int"))], b.name("x")),
            b.value("f", b.name("square")),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "f"), "fn[x: Int] -> Int");
}

#[test]
fn test_type_alias() {
    let analysis = analyze(|b| {
        vec![
            b.type_alias("Meters", b.type_name("Int")),
            b.typed_value("distance", b.type_name("Meters"), b.int(5)),
        ]
    })
    .unwrap();
    assert_eq!(type_of(&analysis, "distance"), "Int");
    let alias = analysis.declaration("Meters").unwrap();
    assert_eq!(alias.category, DeclarationCategory::TypeAlias);
}

#[test]
fn test_alias_mutability_must_match() {
    assert_eq!(
        error_kind(|b| vec![b.mutable_type_alias("Wrong", b.type_name("Int"))]),
        "type_mutable"
    );
    assert_eq!(
        error_kind(|b| {
            vec![
                b.native_type("Cell", true),
                b.type_alias("Handle", b.mutable_type_name("Cell")),
            ]
        }),
        "type_mutable"
    );
    assert!(should_pass(|b| {
        vec![
            b.native_type("Cell", true),
            b.mutable_type_alias("Handle", b.mutable_type_name("Cell")),
        ]
    }));
}

#[test]
fn test_native_types_are_distinct() {
    assert_eq!(
        error_kind(|b| {
            vec![
                b.native_type("Path", false),
                b.native(b.head("root"), b.type_name("Path")),
                b.typed_value("name", b.type_name("String"), b.name("root")),
            ]
        }),
        "type_mismatch"
    );
}
