//! Error types and result aliases.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Wrapped sources are not repeated in the message; print with `{:#}` or walk
/// `source()` for the cause.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Config file not found: no 'venvkit.toml' in {0} or any parent directory.")]
    ConfigNotFound(PathBuf),

    #[error("Failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read requirements file {path}")]
    Requirements {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Version not found for package at {package}: {message}")]
    VersionNotFound { package: PathBuf, message: String },

    #[error("Cannot parse version file {file} of package at {package}: {message}")]
    Parse {
        package: PathBuf,
        file: PathBuf,
        message: String,
    },

    #[error("No version resolver '{name}' for package at {package}. Available resolvers: {available}")]
    ResolverNotFound {
        name: String,
        package: PathBuf,
        available: String,
    },

    #[error("Provisioning of environment {env} failed: {message}")]
    Provisioning { env: PathBuf, message: String },

    #[error("Cannot dispatch to {executable}: {message}")]
    Dispatch { executable: PathBuf, message: String },
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "venvkit.toml".to_string(),
        }
    }
}

/// The pipeline stage an error aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    VersionResolution,
    ManifestBuild,
    Provisioning,
    Dispatch,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configuration => "configuration",
            Stage::VersionResolution => "version resolution",
            Stage::ManifestBuild => "manifest build",
            Stage::Provisioning => "provisioning",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the stage this error belongs to, for diagnostics.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Toml { .. }
            | Error::ConfigNotFound(_)
            | Error::ConfigRead { .. }
            | Error::Config(_) => Stage::Configuration,
            Error::VersionNotFound { .. } | Error::Parse { .. } | Error::ResolverNotFound { .. } => {
                Stage::VersionResolution
            }
            Error::Requirements { .. } => Stage::ManifestBuild,
            Error::Provisioning { .. } | Error::Io(_) | Error::Json(_) => Stage::Provisioning,
            Error::Dispatch { .. } => Stage::Dispatch,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
