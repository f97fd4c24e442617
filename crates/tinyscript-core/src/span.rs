//! Source spans carried through from the parser for error reporting.

use serde::{Deserialize, Serialize};

/// A byte range in the source file.
///
/// The analyzer never reads source text; spans only travel from syntax
/// nodes into diagnostic labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
