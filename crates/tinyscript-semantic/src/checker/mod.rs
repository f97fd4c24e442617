//! Analyzer implementation modules.

mod core;
mod declarations;
mod expressions;
mod helpers;
mod objects;
mod purity;
mod references;
mod type_expressions;

pub use core::Analyzer;

use crate::deferred::Deferred;
use std::rc::Rc;

/// A shared deferred cell forced through the analyzer.
pub type Lazy<'a, T> = Rc<Deferred<'a, Analyzer<'a>, T>>;
