//! Core types and utilities for the TinyScript analyzer.
//!
//! This crate provides source spans, the error taxonomy shared by every
//! analysis stage, and the type lattice with its subtyping predicate.

pub mod error;
pub mod span;
pub mod types;

pub use error::{Error, Result};
pub use span::Span;
pub use types::Type;
