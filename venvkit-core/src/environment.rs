//! The named, isolated environment a workspace runs in.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dispatch::DispatchTarget;
use crate::error::{Error, Result};
use crate::manifest::EnvironmentSpec;
use crate::path_utils;
use crate::provider::{EnvironmentProvider, PipProvider};
use crate::signals::{self, ChildGuard};

/// Records which manifest the environment was last provisioned with.
///
/// Written only after a successful install and removed before an install
/// starts, so its presence means the environment matches it.
pub const STAMP_FILE: &str = "venvkit-manifest.json";

pub const DEFAULT_ENV_NAME: &str = ".venvkit";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stamp {
    fingerprint: String,
    #[serde(default)]
    interpreter: Option<String>,
    spec: EnvironmentSpec,
}

/// What `ensure` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The environment was created and the manifest installed.
    Created,
    /// The manifest changed and was reinstalled.
    Installed,
    /// Nothing to do.
    UpToDate,
}

impl EnsureOutcome {
    pub fn performed_install(&self) -> bool {
        !matches!(self, EnsureOutcome::UpToDate)
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub fingerprint: Option<String>,
    /// Interpreter the environment was provisioned with.
    pub interpreter: Option<String>,
}

/// Owns one named environment under the workspace root.
pub struct EnvironmentManager<P: EnvironmentProvider = PipProvider> {
    workspace_root: PathBuf,
    name: String,
    provider: P,
}

impl EnvironmentManager<PipProvider> {
    pub fn with_pip(workspace_root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::new(workspace_root, name, PipProvider::default())
    }
}

impl<P: EnvironmentProvider> EnvironmentManager<P> {
    pub fn new(workspace_root: impl Into<PathBuf>, name: impl Into<String>, provider: P) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            name: name.into(),
            provider,
        }
    }

    #[inline]
    pub fn env_dir(&self) -> PathBuf {
        self.workspace_root.join(&self.name)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn status(&self) -> Result<EnvironmentStatus> {
        let env_dir = self.env_dir();
        let stamp = self.read_stamp(&env_dir)?;
        Ok(EnvironmentStatus {
            exists: self.provider.is_created(&env_dir),
            fingerprint: stamp.as_ref().map(|stamp| stamp.fingerprint.clone()),
            interpreter: stamp.and_then(|stamp| stamp.interpreter),
            path: env_dir,
        })
    }

    /// Deletes the environment. Returns whether there was one.
    pub fn remove(&self) -> Result<bool> {
        let env_dir = self.env_dir();
        if !env_dir.exists() {
            return Ok(false);
        }
        info!(env = %env_dir.display(), "Removing environment");
        fs::remove_dir_all(&env_dir)?;
        Ok(true)
    }

    /// Brings the environment in line with `spec`.
    ///
    /// Installs only when the recorded manifest differs, and recreates the
    /// environment when it was built with another interpreter.
    ///
    /// The returned handle carries the variables the dispatched process runs
    /// with; they are never applied to this process.
    pub fn ensure(&self, spec: &EnvironmentSpec) -> Result<Provisioned<'_>> {
        let env_dir = self.env_dir();
        let fingerprint = spec.fingerprint();
        let created = self.provider.is_created(&env_dir);
        let stamp = if created {
            self.read_stamp(&env_dir)?
        } else {
            None
        };
        let interpreter = self.provider.interpreter();

        let outcome = match stamp {
            Some(stamp) if stamp.interpreter != interpreter => {
                info!(
                    env = %env_dir.display(),
                    previous = ?stamp.interpreter,
                    current = ?interpreter,
                    "Interpreter changed, recreating environment"
                );
                fs::remove_dir_all(&env_dir).map_err(|e| Error::Provisioning {
                    env: env_dir.clone(),
                    message: format!("Failed to remove previous environment: {}", e),
                })?;
                self.provision(&env_dir, spec, &fingerprint, false)?
            }
            Some(stamp) if stamp.fingerprint == fingerprint => {
                debug!(env = %env_dir.display(), %fingerprint, "Environment is up to date");
                EnsureOutcome::UpToDate
            }
            _ => self.provision(&env_dir, spec, &fingerprint, created)?,
        };

        Ok(Provisioned {
            workspace_root: &self.workspace_root,
            env: run_env(&env_dir, spec),
            env_dir,
            outcome,
        })
    }

    fn provision(
        &self,
        env_dir: &Path,
        spec: &EnvironmentSpec,
        fingerprint: &str,
        created: bool,
    ) -> Result<EnsureOutcome> {
        self.clear_stamp(env_dir)?;

        let outcome = if created {
            EnsureOutcome::Installed
        } else {
            let existed = env_dir.exists();
            if let Err(e) = self.provider.create(env_dir) {
                if !existed && env_dir.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(env_dir) {
                        warn!(
                            env = %env_dir.display(),
                            "Failed to remove partially created environment: {}",
                            cleanup
                        );
                    }
                }
                return Err(e);
            }
            EnsureOutcome::Created
        };

        self.provider.install(env_dir, spec)?;
        self.write_stamp(env_dir, spec, fingerprint)?;
        info!(env = %env_dir.display(), %fingerprint, "Environment provisioned");
        Ok(outcome)
    }

    fn stamp_path(env_dir: &Path) -> PathBuf {
        env_dir.join(STAMP_FILE)
    }

    fn read_stamp(&self, env_dir: &Path) -> Result<Option<Stamp>> {
        let path = Self::stamp_path(env_dir);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(stamp) => Ok(Some(stamp)),
            Err(e) => {
                warn!(path = %path.display(), "Ignoring unreadable manifest stamp: {}", e);
                Ok(None)
            }
        }
    }

    fn clear_stamp(&self, env_dir: &Path) -> Result<()> {
        let path = Self::stamp_path(env_dir);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::Provisioning {
                env: env_dir.to_path_buf(),
                message: format!("Failed to clear manifest stamp {}: {}", path.display(), e),
            })?;
        }
        Ok(())
    }

    fn write_stamp(&self, env_dir: &Path, spec: &EnvironmentSpec, fingerprint: &str) -> Result<()> {
        let stamp = Stamp {
            fingerprint: fingerprint.to_string(),
            interpreter: self.provider.interpreter(),
            spec: spec.clone(),
        };
        let path = Self::stamp_path(env_dir);
        let tmp = env_dir.join(format!("{}.tmp", STAMP_FILE));
        fs::write(&tmp, serde_json::to_string_pretty(&stamp)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn run_env(env_dir: &Path, spec: &EnvironmentSpec) -> BTreeMap<String, OsString> {
    let mut env: BTreeMap<String, OsString> = spec
        .env
        .iter()
        .map(|(key, value)| (key.clone(), OsString::from(value)))
        .collect();

    env.insert("VIRTUAL_ENV".to_string(), env_dir.as_os_str().to_os_string());

    let bin_dir = path_utils::bin_dir(env_dir);
    let mut paths = vec![bin_dir.clone()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    let path = std::env::join_paths(paths).unwrap_or_else(|_| bin_dir.into_os_string());
    env.insert("PATH".to_string(), path);
    env
}

/// A provisioned environment, ready to run a dispatch target.
#[derive(Debug)]
pub struct Provisioned<'a> {
    workspace_root: &'a Path,
    env_dir: PathBuf,
    env: BTreeMap<String, OsString>,
    outcome: EnsureOutcome,
}

impl Provisioned<'_> {
    pub fn outcome(&self) -> EnsureOutcome {
        self.outcome
    }

    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    /// Variables the dispatched process receives on top of the inherited ones.
    pub fn env_vars(&self) -> &BTreeMap<String, OsString> {
        &self.env
    }

    /// Resolves the target's executable and checks it can be run.
    ///
    /// The task runner is a path from the workspace root. The primary
    /// executable is a command installed into the environment.
    pub fn resolve(&self, target: &DispatchTarget) -> Result<PathBuf> {
        let executable = match target {
            DispatchTarget::TaskRunner { executable, .. } => {
                path_utils::resolve_path(executable, self.workspace_root)
            }
            DispatchTarget::PrimaryExecutable { executable, .. } => path_utils::resolve_command(
                Path::new(executable),
                &self.env_dir,
                self.workspace_root,
            ),
        };

        if !executable.exists() {
            return Err(Error::Dispatch {
                executable,
                message: format!("{} not found", target.kind()),
            });
        }
        if !path_utils::is_executable(&executable) {
            return Err(Error::Dispatch {
                executable,
                message: format!("{} is not executable", target.kind()),
            });
        }
        Ok(executable)
    }

    /// Runs the target with its arguments and inherited stdio, blocking until
    /// it exits. Returns the code to exit with.
    pub fn run(&self, target: &DispatchTarget) -> Result<i32> {
        let executable = self.resolve(target)?;
        info!(
            target = target.kind(),
            executable = %executable.display(),
            args = ?target.args(),
            "Dispatching"
        );

        let mut command = Command::new(&executable);
        command.args(target.args()).envs(&self.env);

        signals::install_forwarder();
        let mut child = command.spawn().map_err(|e| Error::Dispatch {
            executable: executable.clone(),
            message: format!("failed to spawn: {}", e),
        })?;

        let guard = ChildGuard::register(child.id());
        let status = child.wait().map_err(|e| Error::Dispatch {
            executable: executable.clone(),
            message: format!("failed to wait for process: {}", e),
        })?;

        let code = signals::exit_code(status, guard.interrupted());
        debug!(code, "Dispatched process exited");
        Ok(code)
    }
}
