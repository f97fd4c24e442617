//! The result map and diagnostics handed to later stages.

mod common;

use miette::Diagnostic;
use tinyscript_ast::{AstBuilder, Operator};
use tinyscript_semantic::{Access, Analyzer, DeclarationCategory};
use tinyscript_utils::AnalysisConfig;

fn analyzer<'a>() -> Analyzer<'a> {
    Analyzer::new(AnalysisConfig::default().without_prelude()).unwrap()
}

#[test]
fn test_local_and_intrinsic_access() {
    let b = AstBuilder::new();
    let local = b.name("a");
    let intrinsic = b.name("true");
    let (local_id, intrinsic_id) = (local.id, intrinsic.id);
    let file = vec![
        b.value("a", b.int(1)),
        b.value("b", local),
        b.value("c", intrinsic),
    ];

    let analyzer = analyzer();
    let analysis = analyzer.analyze_file(&file).unwrap();

    let info = analyzer.expression_info(local_id).unwrap();
    assert_eq!(info.access, Some(Access::Local));
    assert_eq!(info.scope, analysis.scope);
    assert_eq!(info.ty.to_string(), "Int[1, 1]");
    assert!(!info.impure);

    let info = analyzer.expression_info(intrinsic_id).unwrap();
    assert_eq!(info.access, Some(Access::Intrinsic));
    assert_eq!(info.ty.to_string(), "Bool");
}

#[test]
fn test_parameter_access() {
    let b = AstBuilder::new();
    let parameter = b.name("x");
    let id = parameter.id;
    let file = vec![b.function("identity", vec![("x", b.type_name("Int"))], parameter)];

    let analyzer = analyzer();
    analyzer.analyze_file(&file).unwrap();
    let info = analyzer.expression_info(id).unwrap();
    assert_eq!(info.access, Some(Access::Parameter));
}

#[test]
fn test_object_field_access() {
    let b = AstBuilder::new();
    let sibling = b.name("a");
    let target = b.name("object");
    let sibling_id = sibling.id;
    let member = b.member(target, "a");
    let member_id = member.id;
    let file = vec![
        b.value("object", b.record(vec![("a", b.int(1)), ("b", sibling)])),
        b.value("a", member),
    ];

    let analyzer = analyzer();
    analyzer.analyze_file(&file).unwrap();
    assert_eq!(
        analyzer.expression_info(sibling_id).unwrap().access,
        Some(Access::ThisField)
    );
    assert_eq!(
        analyzer.expression_info(member_id).unwrap().access,
        Some(Access::Member)
    );
}

#[test]
fn test_receiver_access() {
    let b = AstBuilder::new();
    let this = b.this();
    let this_id = this.id;
    let inner = b.name("twice");
    let inner_id = inner.id;
    let call = b.member(b.int(3), "twice");
    let call_id = call.id;
    let file = vec![
        b.method(
            b.type_name("Int"),
            "twice",
            b.binary(Operator::Multiply, this, b.int(2)),
        ),
        b.method(b.type_name("Int"), "quad", b.member(inner, "twice")),
        b.value("six", call),
    ];

    let analyzer = analyzer();
    let analysis = analyzer.analyze_file(&file).unwrap();
    assert_eq!(
        analyzer.expression_info(this_id).unwrap().access,
        Some(Access::This)
    );
    assert_eq!(
        analyzer.expression_info(inner_id).unwrap().access,
        Some(Access::ThisMethod)
    );
    assert_eq!(
        analyzer.expression_info(call_id).unwrap().access,
        Some(Access::Method)
    );
    let twice = analysis.declaration("twice").unwrap();
    assert_eq!(twice.category, DeclarationCategory::Function);
    assert_eq!(twice.signature.as_ref().unwrap().to_string(), "Int.twice");
}

#[test]
fn test_statements_are_recorded() {
    let b = AstBuilder::new();
    let file = vec![
        b.value("a", b.int(1)),
        b.statement(b.impure_call("println", vec![b.name("a")])),
    ];

    let analyzer = analyzer();
    let analysis = analyzer.analyze_file(&file).unwrap();
    let statement = analysis.declaration("1").unwrap();
    assert_eq!(statement.category, DeclarationCategory::Statement);
    assert!(statement.impure);
}

#[test]
fn test_diagnostic_codes() {
    let b = AstBuilder::new();
    let file = vec![b.value("x", b.name("x"))];
    let error = analyzer().analyze_file(&file).unwrap_err();
    assert_eq!(error.code().unwrap().to_string(), "tinyscript::cycle");
    assert!(error.help().is_some());

    let file = vec![b.typed_value("myString", b.type_name("Int"), b.string("foo"))];
    let error = analyzer().analyze_file(&file).unwrap_err();
    assert_eq!(error.code().unwrap().to_string(), "tinyscript::type_mismatch");
    insta::assert_snapshot!(
        error.to_string(),
        @"value of `myString`: expected `Int`, found `String`"
    );
}

#[test]
fn test_unresolved_message() {
    let error = common::analyze(|b| vec![b.value("x", b.call("missing", vec![b.int(1)]))])
        .unwrap_err();
    insta::assert_snapshot!(error.to_string(), @"cannot resolve `missing`");
}

#[test]
fn test_analysis_carries_expression_results() {
    let b = AstBuilder::new();
    let reference = b.name("a");
    let id = reference.id;
    let file = vec![b.value("a", b.int(1)), b.value("b", reference)];

    let analysis = tinyscript_semantic::analyze_file(&file, AnalysisConfig::default()).unwrap();
    let info = analysis.expression(id).unwrap();
    assert_eq!(info.access, Some(Access::Local));
    assert_eq!(info.ty.to_string(), "Int[1, 1]");
    assert_eq!(info.scope, analysis.scope);
    assert_eq!(analysis.expressions.len(), 2);
}

#[test]
fn test_expression_results_are_per_file() {
    let b = AstBuilder::new();
    let first_literal = b.int(1);
    let first_id = first_literal.id;
    let first = vec![b.value("a", first_literal)];
    let second = vec![b.value("b", b.string("two"))];

    let analyzer = analyzer();
    let one = analyzer.analyze_file(&first).unwrap();
    let two = analyzer.analyze_file(&second).unwrap();
    assert!(one.expression(first_id).is_some());
    assert!(two.expression(first_id).is_none());
    assert_eq!(two.expressions.len(), 1);
}
