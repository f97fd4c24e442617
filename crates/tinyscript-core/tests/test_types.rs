//! Tests for the type lattice and its acceptance rules.

use std::rc::Rc;
use tinyscript_core::types::{
    AtomicType, ClassBody, ClassType, IntRange, ObjectType, Type, TypeIdentity,
};

fn string_type() -> Type {
    Type::Atomic(Rc::new(AtomicType::new(TypeIdentity::new(1), "String", false)))
}

fn params(fields: Vec<(&str, Type)>) -> ObjectType {
    ObjectType::new(
        fields
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect(),
    )
}

fn shape(fields: Vec<(&str, Type)>) -> ClassBody {
    ClassBody {
        object: Rc::new(params(fields)),
        abstract_fields: Vec::new(),
    }
}

fn sample_types() -> Vec<Type> {
    vec![
        Type::Any,
        Type::int(),
        Type::int_literal(3),
        Type::float_literal(1.5),
        string_type(),
        Type::nullable(Type::int()),
        Type::object(vec![("a".to_string(), Type::int())]),
        Type::function(false, Some(params(vec![("x", Type::int())])), Type::int()),
        Type::function(true, None, Type::empty_object()),
    ]
}

#[test]
fn test_accepts_is_reflexive() {
    for ty in sample_types() {
        assert!(ty.accepts(&ty), "{ty} should accept itself");
    }
}

#[test]
fn test_any_is_top() {
    for ty in sample_types() {
        assert!(Type::Any.accepts(&ty));
        if !matches!(ty, Type::Any) {
            assert!(!ty.accepts(&Type::Any), "{ty} must not accept Any");
        }
    }
}

#[test]
fn test_function_parameters_are_contravariant() {
    let f = Type::function(false, Some(params(vec![("x", Type::int())])), Type::int());
    let g = Type::function(false, Some(params(vec![("x", Type::Any)])), Type::int());

    assert!(f.accepts(&g));
    assert!(!g.accepts(&f));
}

#[test]
fn test_function_return_is_covariant() {
    let wide = Type::function(false, None, Type::int());
    let narrow = Type::function(false, None, Type::int_literal(1));

    assert!(wide.accepts(&narrow));
    assert!(!narrow.accepts(&wide));
}

#[test]
fn test_pure_function_slot_rejects_impure_function() {
    let pure = Type::function(false, None, Type::int());
    let impure = Type::function(true, None, Type::int());

    assert!(impure.accepts(&pure));
    assert!(!pure.accepts(&impure));
    assert!(impure.is_mutable());
    assert!(!pure.is_mutable());
}

#[test]
fn test_int_range_inclusion() {
    let small = Type::Int(IntRange::new(0, 10));
    assert!(Type::int().accepts(&small));
    assert!(small.accepts(&Type::int_literal(10)));
    assert!(!small.accepts(&Type::int_literal(11)));
    assert!(!small.accepts(&Type::int()));
    assert!(!Type::float().accepts(&Type::int()));
}

#[test]
fn test_object_width_subtyping() {
    let expected = Type::object(vec![("a".to_string(), Type::int())]);
    let found = Type::object(vec![
        ("a".to_string(), Type::int_literal(1)),
        ("b".to_string(), Type::int_literal(2)),
    ]);

    assert!(expected.accepts(&found));
    assert!(!found.accepts(&expected));
}

#[test]
fn test_nullable_accepts_inner_but_not_reverse() {
    let nullable = Type::nullable(Type::int());
    assert!(nullable.accepts(&Type::int_literal(4)));
    assert!(!Type::int().accepts(&nullable));
    assert!(nullable.accepts(&Type::nullable(Type::int_literal(4))));
}

#[test]
fn test_atomic_identity() {
    let other_string = Type::Atomic(Rc::new(AtomicType::new(
        TypeIdentity::new(2),
        "String",
        false,
    )));
    assert!(!string_type().accepts(&other_string));
}

#[test]
fn test_object_mutability_is_derived() {
    let buffer = Type::Atomic(Rc::new(AtomicType::new(TypeIdentity::new(9), "Buffer", true)));
    let object = Type::object(vec![
        ("size".to_string(), Type::int()),
        ("data".to_string(), buffer),
    ]);
    assert!(object.is_mutable());
    assert!(!Type::object(vec![("size".to_string(), Type::int())]).is_mutable());
}

#[test]
fn test_class_identity_subtyping() {
    let base = Rc::new(ClassType::with_body(
        TypeIdentity::new(10),
        "Meters",
        [],
        shape(vec![("value", Type::float())]),
    ));
    let unrelated = Rc::new(ClassType::with_body(
        TypeIdentity::new(11),
        "Seconds",
        [],
        shape(vec![("value", Type::float())]),
    ));
    let derived = Rc::new(ClassType::with_body(
        TypeIdentity::new(12),
        "Kilometers",
        [TypeIdentity::new(10)],
        shape(vec![("value", Type::float())]),
    ));

    let base = Type::Class(base);
    assert!(base.accepts(&Type::Class(derived)));
    assert!(!base.accepts(&Type::Class(unrelated)));

    let literal = Type::object(vec![("value".to_string(), Type::float_literal(1.0))]);
    assert!(base.accepts(&literal));
    assert!(!literal.accepts(&base));
}

#[test]
fn test_unresolved_class_body_accepts_nothing_structural() {
    let pending = Type::Class(Rc::new(ClassType::new(TypeIdentity::new(20), "Node", false, [])));
    let literal = Type::object(vec![]);
    assert!(!pending.accepts(&literal));
    assert!(pending.accepts(&pending.clone()));
}

#[test]
fn test_argument_matching() {
    let declared = params(vec![("a", Type::int()), ("b", Type::nullable(Type::int()))]);

    let positional = params(vec![("0", Type::int_literal(1))]);
    assert!(declared.accepts_arguments(&positional));

    let named = params(vec![("b", Type::int_literal(2)), ("a", Type::int_literal(1))]);
    assert!(declared.accepts_arguments(&named));

    let extra = params(vec![("a", Type::int_literal(1)), ("c", Type::int_literal(2))]);
    assert!(!declared.accepts_arguments(&extra));

    assert!(!declared.accepts_arguments(&ObjectType::empty()));
}

#[test]
fn test_join() {
    let joined = Type::int_literal(1).join(&Type::int_literal(5));
    assert!(matches!(joined, Type::Int(range) if range == IntRange::new(1, 5)));
    assert!(matches!(string_type().join(&Type::int()), Type::Any));
    assert!(matches!(
        Type::nullable(Type::int_literal(1)).join(&Type::int_literal(2)),
        Type::Nullable(_)
    ));
}

#[test]
fn test_widen_drops_numeric_ranges() {
    assert_eq!(Type::int_literal(1).widen().to_string(), "Int");
    assert_eq!(Type::float_literal(0.5).widen().to_string(), "Float");
    assert_eq!(Type::nullable(Type::int_literal(3)).widen().to_string(), "Int?");
    assert_eq!(string_type().widen().to_string(), "String");
}

#[test]
fn test_display() {
    insta::assert_snapshot!(Type::int_literal(1).to_string(), @"Int[1, 1]");
    insta::assert_snapshot!(Type::int().to_string(), @"Int");
    insta::assert_snapshot!(
        Type::object(vec![("a".to_string(), Type::int()), ("b".to_string(), string_type())]).to_string(),
        @"[a: Int, b: String]"
    );
    insta::assert_snapshot!(
        Type::function(true, Some(params(vec![("x", Type::int())])), Type::nullable(Type::int())).to_string(),
        @"fn![x: Int] -> Int?"
    );
}

#[test]
fn test_class_instance_may_omit_concrete_fields() {
    let area = Type::function(false, Some(ObjectType::empty()), Type::float());
    let rect = Type::Class(Rc::new(ClassType::with_body(
        TypeIdentity::new(30),
        "Rect",
        [],
        ClassBody {
            object: Rc::new(params(vec![("w", Type::float()), ("area", area)])),
            abstract_fields: vec!["w".to_string()],
        },
    )));

    let with_width = Type::object(vec![("w".to_string(), Type::float_literal(2.0))]);
    assert!(rect.accepts(&with_width));
    assert!(!rect.accepts(&Type::empty_object()));

    let wrong_area = Type::object(vec![
        ("w".to_string(), Type::float_literal(2.0)),
        ("area".to_string(), Type::int()),
    ]);
    assert!(!rect.accepts(&wrong_area));
}
