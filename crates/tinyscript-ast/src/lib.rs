//! Syntax tree for TinyScript.
//!
//! Trees are produced by an external parser and consumed by the semantic
//! analyzer. [`AstBuilder`] constructs them programmatically.

pub mod ast;
pub mod builder;

pub use ast::*;
pub use builder::AstBuilder;
