//! Core library for composing a linked development environment and
//! dispatching into it.

pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod path_utils;
pub mod provider;
pub mod requirements;
pub mod resolver;
pub mod resolver_registry;
pub mod signals;

pub use config::{WorkspaceConfig, CONFIG_FILE};
pub use dispatch::{DispatchTarget, Dispatcher};
pub use environment::{EnsureOutcome, EnvironmentManager, EnvironmentStatus, Provisioned};
pub use error::{Error, Result, Stage};
pub use manifest::{EnvironmentSpec, ManifestBuilder};
pub use orchestrator::{Orchestrator, Prepared};
pub use package::{LocalDependency, LocalDependencySet, PackageRoot, ResolvedLocal};
pub use provider::{EnvironmentProvider, PipProvider};
pub use requirements::RequirementsFile;
pub use resolver::VersionResolver;
pub use resolver_registry::ResolverRegistry;
