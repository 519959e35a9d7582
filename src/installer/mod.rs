//! Turns configured or remote rule files into editor destination files.

pub mod remote;
pub mod rules;

pub use remote::RemoteInstaller;
pub use rules::{RuleInstaller, combine_rule_files};

use crate::editor::Mode;
use crate::error::Result;
use std::path::PathBuf;

/// What the rule installer needs from the config store.
pub trait RuleSource {
    fn ensure_config_dir(&self) -> Result<PathBuf>;

    /// Absolute paths for a triple, in concatenation order.
    fn rule_file_paths(&self, editor: &str, mode: Mode, key: &str) -> Result<Vec<PathBuf>>;
}
