//! TOML configuration for a workspace, read from `venvkit.toml`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::{Dispatcher, DEFAULT_SUBCOMMANDS};
use crate::environment::DEFAULT_ENV_NAME;
use crate::error::{Error, Result};
use crate::package::{LocalDependency, LocalDependencySet, PackageRoot};
use crate::requirements::RequirementsFile;

pub const CONFIG_FILE: &str = "venvkit.toml";

fn default_env_name() -> String {
    DEFAULT_ENV_NAME.to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_subcommands() -> Vec<String> {
    DEFAULT_SUBCOMMANDS.iter().map(|s| s.to_string()).collect()
}

/// The `[environment]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Directory name of the environment under the workspace root.
    #[serde(default = "default_env_name")]
    pub name: String,
    /// Interpreter used to create the environment.
    #[serde(default = "default_python")]
    pub python: String,
    /// Pinned requirements file, relative to the workspace root.
    pub requirements: Option<String>,
    /// The workspace's primary executable.
    pub main: String,
    /// Extra variables for the dispatched process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// The `[tasks]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub runner: String,
    #[serde(default = "default_subcommands")]
    pub subcommands: Vec<String>,
}

/// One `[[local]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    pub path: String,
    pub version_file: String,
    /// Requirement for the package, e.g. `my-pkg=={version}`.
    pub constraint: String,
    /// Overrides the name parsed from `constraint`.
    pub name: Option<String>,
    #[serde(default)]
    pub with_tests: bool,
    pub resolver: Option<String>,
    pub version_symbol: Option<String>,
}

/// Workspace-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub environment: EnvironmentConfig,
    pub tasks: Option<TasksConfig>,
    #[serde(default)]
    pub local: Vec<LocalConfig>,
    /// Directory containing the config file; relative paths resolve here.
    #[serde(skip)]
    pub root: PathBuf,
}

impl WorkspaceConfig {
    /// Finds `venvkit.toml` in `start` or its ancestors, stopping at the
    /// repository root.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let mut current_dir = start;

        loop {
            let candidate = current_dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate);
            }

            if current_dir.join(".git").exists() {
                break;
            }

            match current_dir.parent() {
                Some(parent) if parent != current_dir => current_dir = parent,
                _ => break,
            }
        }

        Err(Error::ConfigNotFound(start.to_path_buf()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&content, root).map_err(|e| match e {
            Error::Toml { error, .. } => Error::Toml {
                error,
                context: path.display().to_string(),
            },
            other => other,
        })
    }

    pub fn parse(content: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut config: WorkspaceConfig = toml::from_str(content)?;
        config.root = root.into();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.environment.main.trim().is_empty() {
            return Err(Error::Config(
                "environment.main must name the primary executable".to_string(),
            ));
        }

        let name = Path::new(&self.environment.name);
        let mut components = name.components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::Config(format!(
                "environment.name '{}' must be a single directory name",
                self.environment.name
            )));
        }

        if let Some(tasks) = &self.tasks {
            if tasks.runner.trim().is_empty() {
                return Err(Error::Config("tasks.runner cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn requirements_file(&self) -> Result<RequirementsFile> {
        match &self.environment.requirements {
            Some(path) => RequirementsFile::read(self.root.join(path)),
            None => Ok(RequirementsFile::empty()),
        }
    }

    pub fn local_dependencies(&self) -> Result<LocalDependencySet> {
        let deps = self
            .local
            .iter()
            .map(|local| -> Result<LocalDependency> {
                let root = PackageRoot::new(self.root.join(&local.path), &local.version_file);
                let mut dep =
                    LocalDependency::new(root, &local.constraint)?.with_tests(local.with_tests);
                if let Some(name) = &local.name {
                    dep.declared_name = name.clone();
                }
                if let Some(resolver) = &local.resolver {
                    dep = dep.with_resolver(resolver);
                }
                if let Some(symbol) = &local.version_symbol {
                    dep = dep.with_version_symbol(symbol);
                }
                Ok(dep)
            })
            .collect::<Result<Vec<_>>>()?;
        LocalDependencySet::try_from(deps)
    }

    /// Without a `[tasks]` table every invocation goes to the primary executable.
    pub fn dispatcher(&self) -> Dispatcher {
        match &self.tasks {
            Some(tasks) => Dispatcher::new(&tasks.runner, &self.environment.main)
                .with_subcommands(tasks.subcommands.iter().cloned()),
            None => Dispatcher::new(PathBuf::new(), &self.environment.main)
                .with_subcommands(Vec::<String>::new()),
        }
    }
}
