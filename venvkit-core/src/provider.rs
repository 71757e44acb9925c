//! Environment providers: the external tools that create environments and
//! install packages into them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::manifest::EnvironmentSpec;
use crate::path_utils;

/// File the rendered manifest is written to inside the environment.
pub const RENDERED_REQUIREMENTS: &str = "venvkit-requirements.txt";

/// Creates environments and installs manifests into them.
///
/// Providers do the actual installation work; the environment manager only
/// decides when it is needed.
pub trait EnvironmentProvider {
    /// Whether `env_dir` already holds a usable environment.
    fn is_created(&self, env_dir: &Path) -> bool {
        env_dir.is_dir()
    }

    /// Identifies the interpreter environments are created with. A change
    /// means existing environments must be recreated.
    fn interpreter(&self) -> Option<String> {
        None
    }

    fn create(&self, env_dir: &Path) -> Result<()>;

    fn install(&self, env_dir: &Path, spec: &EnvironmentSpec) -> Result<()>;
}

/// Provider backed by `python -m venv` and `pip`.
#[derive(Debug, Clone)]
pub struct PipProvider {
    python: String,
}

impl Default for PipProvider {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
        }
    }
}

impl PipProvider {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &str {
        &self.python
    }
}

impl EnvironmentProvider for PipProvider {
    fn interpreter(&self) -> Option<String> {
        Some(self.python.clone())
    }

    fn is_created(&self, env_dir: &Path) -> bool {
        env_dir.join("pyvenv.cfg").is_file() && path_utils::interpreter(env_dir).is_file()
    }

    fn create(&self, env_dir: &Path) -> Result<()> {
        info!(env = %env_dir.display(), python = %self.python, "Creating environment");
        let mut command = Command::new(&self.python);
        command.arg("-m").arg("venv").arg(env_dir);
        run_step(env_dir, "Creating environment", &mut command)
    }

    fn install(&self, env_dir: &Path, spec: &EnvironmentSpec) -> Result<()> {
        let manifest_path: PathBuf = env_dir.join(RENDERED_REQUIREMENTS);
        fs::write(&manifest_path, spec.render_requirements()).map_err(|e| {
            Error::Provisioning {
                env: env_dir.to_path_buf(),
                message: format!(
                    "Failed to write manifest {}: {}",
                    manifest_path.display(),
                    e
                ),
            }
        })?;

        info!(
            env = %env_dir.display(),
            requirements = spec.requirements.len(),
            local = spec.local.len(),
            "Installing manifest"
        );
        let mut command = Command::new(path_utils::interpreter(env_dir));
        command
            .arg("-m")
            .arg("pip")
            .arg("install")
            .arg("--disable-pip-version-check")
            .arg("--upgrade")
            .arg("-r")
            .arg(&manifest_path);
        run_step(env_dir, "Installing packages", &mut command)
    }
}

/// Runs one provisioning command with captured output behind a spinner.
fn run_step(env_dir: &Path, message: &str, command: &mut Command) -> Result<()> {
    debug!(?command, "Running provisioning step");
    let spinner = create_spinner(message);
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();
    spinner.finish_and_clear();

    let output = output.map_err(|e| Error::Provisioning {
        env: env_dir.to_path_buf(),
        message: format!("{}: failed to start {:?}: {}", message, command.get_program(), e),
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Provisioning {
            env: env_dir.to_path_buf(),
            message: format!("{} exited with {}:\n{}", message, output.status, tail(&output)),
        })
    }
}

const TAIL_LINES: usize = 20;

fn tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    lines[start..].join("\n")
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
