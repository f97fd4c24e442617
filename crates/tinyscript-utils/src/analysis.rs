//! Knobs consumed by the semantic analyzer.

use serde::{Deserialize, Serialize};

/// Settings for one analyzer instance.
///
/// Read from the `[analysis]` table of `tinyscript.toml`; every key is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum nesting of deferred forcing before analysis gives up with a
    /// resolution-depth error instead of overflowing the stack.
    pub max_resolution_depth: usize,
    /// Analyze files under the standard-library prelude.
    pub load_prelude: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 128,
            load_prelude: true,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn without_prelude(mut self) -> Self {
        self.load_prelude = false;
        self
    }

    #[must_use]
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }
}
