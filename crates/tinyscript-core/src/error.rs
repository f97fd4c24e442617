//! Error types and result aliases for the TinyScript analyzer.

use crate::Span;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Every failure the analyzer can report.
///
/// All errors are fatal to the analysis call that produced them.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("cannot resolve {what}")]
    #[diagnostic(code(tinyscript::unresolved_reference))]
    UnresolvedReference {
        what: String,
        #[label("not found in any enclosing scope")]
        span: Span,
    },

    #[error("{signature} is ambiguous: {candidates} declarations accept it")]
    #[diagnostic(code(tinyscript::ambiguous_signature))]
    AmbiguousSignature {
        signature: String,
        candidates: usize,
        #[label("ambiguous reference")]
        span: Span,
    },

    #[error("`{name}` is defined in terms of itself")]
    #[diagnostic(
        code(tinyscript::cycle),
        help("add a non-recursive branch or an explicit type annotation")
    )]
    Cycle {
        name: String,
        /// Set when the re-entered cell is a function body, which a branching
        /// expression with a non-recursive alternative can recover from.
        recoverable: bool,
        #[label("re-entered while still resolving")]
        span: Span,
    },

    #[error("`{name}` failed to resolve earlier and cannot be used")]
    #[diagnostic(code(tinyscript::poisoned))]
    Poisoned {
        name: String,
        #[label("previously failed here")]
        span: Span,
    },

    #[error("type `{name}` is declared {declared} but expands to {found} type `{expansion}`")]
    #[diagnostic(code(tinyscript::type_mutable))]
    TypeMutable {
        name: String,
        declared: &'static str,
        found: &'static str,
        expansion: String,
        #[label("mutability marker disagrees with the definition")]
        span: Span,
    },

    #[error("`{name}` {problem}")]
    #[diagnostic(code(tinyscript::function_impure))]
    FunctionImpure {
        name: String,
        problem: &'static str,
        #[label("impurity marker mismatch")]
        span: Span,
    },

    #[error("anonymous function {problem}")]
    #[diagnostic(code(tinyscript::anonymous_function_impure))]
    AnonymousFunctionImpure {
        problem: &'static str,
        #[label("impurity marker mismatch")]
        span: Span,
    },

    #[error("impure value `{name}` cannot be used in a pure context")]
    #[diagnostic(
        code(tinyscript::pure_scope),
        help("reference it with a `!` marker from an impure declaration")
    )]
    PureScope {
        name: String,
        #[label("impurity would leak here")]
        span: Span,
    },

    #[error("`{name}` is pure and cannot be referenced with `!`")]
    #[diagnostic(code(tinyscript::unexpected_impurity_marker))]
    UnexpectedImpurityMarker {
        name: String,
        #[label("remove the `!`")]
        span: Span,
    },

    #[error("impure statements are not allowed here")]
    #[diagnostic(
        code(tinyscript::disallowed_impure_statement),
        help("order-sensitive statements may only appear in impure bodies")
    )]
    DisallowedImpureStatement {
        #[label("impure statement")]
        span: Span,
    },

    #[error("cannot forward-reference an order-sensitive declaration `{name}`")]
    #[diagnostic(code(tinyscript::order_sensitive_forward_reference))]
    OrderSensitiveForwardReference {
        name: String,
        #[label("referenced before it runs")]
        span: Span,
    },

    #[error("cannot call a value of type `{found}`")]
    #[diagnostic(code(tinyscript::invalid_anonymous_function_call))]
    InvalidAnonymousFunctionCall {
        found: String,
        #[label("not callable with these arguments")]
        span: Span,
    },

    #[error("`{object}` has no field `{field}`")]
    #[diagnostic(code(tinyscript::object_field_not_found))]
    ObjectFieldNotFound {
        field: String,
        object: String,
        #[label("unknown field")]
        span: Span,
    },

    #[error("{context}: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(tinyscript::type_mismatch))]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
        #[label("type mismatch")]
        span: Span,
    },

    #[error("`{name}` is already declared in this scope")]
    #[diagnostic(code(tinyscript::duplicate_declaration))]
    DuplicateDeclaration {
        name: String,
        #[label("overlaps an earlier declaration")]
        span: Span,
    },

    #[error("abstract field `{field}` of `{object}` is never given a value")]
    #[diagnostic(code(tinyscript::abstract_field))]
    AbstractField {
        field: String,
        object: String,
        #[label("cannot be instantiated")]
        span: Span,
    },

    #[error("field `{field}` {reason}")]
    #[diagnostic(code(tinyscript::invalid_override))]
    Override {
        field: String,
        reason: String,
        #[label("invalid override")]
        span: Span,
    },

    #[error("cannot inherit from `{found}`")]
    #[diagnostic(code(tinyscript::invalid_inheritance))]
    InvalidInheritance {
        found: String,
        #[label("inherit target must be a class or an object")]
        span: Span,
    },

    #[error("{0}")]
    #[diagnostic(code(tinyscript::invalid_declaration))]
    InvalidDeclaration(String, #[label("here")] Span),

    #[error("resolution nested deeper than {limit} declarations")]
    #[diagnostic(
        code(tinyscript::resolution_depth),
        help("raise `analysis.max_resolution_depth` in tinyscript.toml")
    )]
    ResolutionDepth {
        limit: usize,
        #[label("while resolving this")]
        span: Span,
    },
}

impl Error {
    /// Returns true for a cycle through a function body, which an enclosing
    /// `if` may recover from by typing the other branch first.
    #[must_use]
    pub fn is_recoverable_cycle(&self) -> bool {
        matches!(
            self,
            Error::Cycle {
                recoverable: true,
                ..
            }
        )
    }

    /// Short kind name, stable across message wording changes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnresolvedReference { .. } => "unresolved_reference",
            Error::AmbiguousSignature { .. } => "ambiguous_signature",
            Error::Cycle { .. } => "cycle",
            Error::Poisoned { .. } => "poisoned",
            Error::TypeMutable { .. } => "type_mutable",
            Error::FunctionImpure { .. } => "function_impure",
            Error::AnonymousFunctionImpure { .. } => "anonymous_function_impure",
            Error::PureScope { .. } => "pure_scope",
            Error::UnexpectedImpurityMarker { .. } => "unexpected_impurity_marker",
            Error::DisallowedImpureStatement { .. } => "disallowed_impure_statement",
            Error::OrderSensitiveForwardReference { .. } => "order_sensitive_forward_reference",
            Error::InvalidAnonymousFunctionCall { .. } => "invalid_anonymous_function_call",
            Error::ObjectFieldNotFound { .. } => "object_field_not_found",
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::DuplicateDeclaration { .. } => "duplicate_declaration",
            Error::AbstractField { .. } => "abstract_field",
            Error::Override { .. } => "override",
            Error::InvalidInheritance { .. } => "invalid_inheritance",
            Error::InvalidDeclaration(..) => "invalid_declaration",
            Error::ResolutionDepth { .. } => "resolution_depth",
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::from((span.start, span.end.saturating_sub(span.start)))
    }
}

/// Result type alias using the TinyScript Error type.
pub type Result<T> = std::result::Result<T, Error>;
