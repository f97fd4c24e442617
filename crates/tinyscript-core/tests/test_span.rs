//! Tests for source spans and their diagnostic labels.

use miette::{Diagnostic, SourceSpan};
use tinyscript_core::{Error, Span};

#[test]
fn test_span_converts_to_source_span() {
    let source: SourceSpan = Span::new(3, 7).into();
    assert_eq!(source.offset(), 3);
    assert_eq!(source.len(), 4);
}

#[test]
fn test_inverted_span_is_empty() {
    let source: SourceSpan = Span::new(9, 4).into();
    assert_eq!(source.offset(), 9);
    assert!(source.is_empty());
}

#[test]
fn test_error_label_points_at_span() {
    let error = Error::UnresolvedReference {
        what: "`missing`".to_string(),
        span: Span::new(10, 17),
    };
    let labels: Vec<_> = error.labels().unwrap().collect();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].offset(), 10);
    assert_eq!(labels[0].len(), 7);
}

#[test]
fn test_default_span_is_empty() {
    let span = Span::default();
    assert_eq!(span.start, span.end);
}
