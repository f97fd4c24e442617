//! Project configuration for TinyScript.

pub mod analysis;
pub mod config;

pub use analysis::AnalysisConfig;
pub use config::{CONFIG_FILE_NAME, Config, Package};
