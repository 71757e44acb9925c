//! Command implementations for the CLI.

mod execution;
mod info;

use std::path::PathBuf;

use anyhow::{Context, Result};
use venvkit_core::WorkspaceConfig;

pub use execution::cmd_run;
pub use info::{cmd_clean, cmd_status};

/// Loads the explicit config file, or discovers one from `root` (defaulting
/// to the current directory).
pub fn load_workspace(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<WorkspaceConfig> {
    if let Some(config_path) = config {
        return Ok(WorkspaceConfig::load(&config_path)?);
    }

    let start = match root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    Ok(WorkspaceConfig::discover(&start)?)
}
