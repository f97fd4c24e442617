//! Semantic analysis for TinyScript programs.
//!
//! This crate resolves names, infers and checks types, and verifies purity
//! markers for syntax trees produced by the parser. Declarations may appear
//! in any order: each one is resolved on demand through a deferred cell, so
//! forward references and mutual recursion work without a separate
//! dependency pass.

pub mod checker;
pub mod deferred;
pub mod intrinsics;
pub mod prelude;
pub mod results;
pub mod scope;
pub mod signature;

pub use checker::{Analyzer, Lazy};
pub use results::{
    Access, Analysis, DeclarationCategory, ExpressionInfo, ResolvedDeclaration, Typed,
};
pub use scope::ScopeId;

use tinyscript_ast::Declaration;
use tinyscript_core::Result;
use tinyscript_utils::AnalysisConfig;

/// Analyzes one file with a fresh analyzer.
///
/// The file is analyzed under the prelude unless `config` disables it. The
/// analyzer is dropped on return; the returned [`Analysis`] carries the
/// per-expression results.
///
/// # Errors
/// Returns the first semantic error found, such as:
/// - Unresolved or ambiguous references
/// - Type mismatches
/// - Missing or needless impurity markers
/// - Unrecoverable declaration cycles
///
/// # Examples
/// ```
/// use tinyscript_ast::AstBuilder;
/// use tinyscript_semantic::analyze_file;
/// use tinyscript_utils::AnalysisConfig;
///
/// let b = AstBuilder::new();
/// let file = vec![b.value("answer", b.int(42))];
/// let analysis = analyze_file(&file, AnalysisConfig::default()).unwrap();
/// assert_eq!(analysis.type_of("answer").unwrap().to_string(), "Int[42, 42]");
/// assert_eq!(analysis.expressions.len(), 1);
/// ```
pub fn analyze_file(declarations: &[Declaration], config: AnalysisConfig) -> Result<Analysis> {
    let analyzer = Analyzer::new(config)?;
    analyzer.analyze_file(declarations)
}
