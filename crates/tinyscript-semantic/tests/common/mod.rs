//! Common test utilities for semantic analysis tests.

#![allow(dead_code)]

use tinyscript_ast::{AstBuilder, Declaration};
use tinyscript_core::Result;
use tinyscript_semantic::{Analysis, analyze_file};
use tinyscript_utils::AnalysisConfig;

/// Builds a file with `build` and analyzes it without the prelude.
pub fn analyze(build: impl FnOnce(&AstBuilder) -> Vec<Declaration>) -> Result<Analysis> {
    analyze_with(AnalysisConfig::default().without_prelude(), build)
}

/// Builds a file with `build` and analyzes it under the prelude.
pub fn analyze_with_prelude(
    build: impl FnOnce(&AstBuilder) -> Vec<Declaration>,
) -> Result<Analysis> {
    analyze_with(AnalysisConfig::default(), build)
}

pub fn analyze_with(
    config: AnalysisConfig,
    build: impl FnOnce(&AstBuilder) -> Vec<Declaration>,
) -> Result<Analysis> {
    let b = AstBuilder::new();
    let file = build(&b);
    analyze_file(&file, config)
}

/// The error kind a file fails with.
///
/// # Panics
/// Panics if the file analyzes successfully.
pub fn error_kind(build: impl FnOnce(&AstBuilder) -> Vec<Declaration>) -> &'static str {
    match analyze(build) {
        Ok(analysis) => panic!("expected an error, got {:?}", analysis.declarations),
        Err(error) => error.kind(),
    }
}

/// The displayed type of a resolved declaration.
pub fn type_of(analysis: &Analysis, name: &str) -> String {
    analysis
        .type_of(name)
        .unwrap_or_else(|| panic!("`{name}` was not resolved"))
        .to_string()
}

/// Helper function to check if a file passes semantic analysis.
pub fn should_pass(build: impl FnOnce(&AstBuilder) -> Vec<Declaration>) -> bool {
    analyze(build).is_ok()
}
