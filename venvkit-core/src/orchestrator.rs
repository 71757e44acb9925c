//! The invocation pipeline: dispatch decision, manifest assembly,
//! provisioning, then handing control to the target.

use tracing::{debug, info};

use crate::config::WorkspaceConfig;
use crate::dispatch::DispatchTarget;
use crate::environment::{EnvironmentManager, Provisioned};
use crate::error::Result;
use crate::manifest::{EnvironmentSpec, ManifestBuilder};
use crate::provider::{EnvironmentProvider, PipProvider};
use crate::resolver_registry::ResolverRegistry;

/// Everything decided before the target runs.
#[derive(Debug)]
pub struct Prepared<'a> {
    pub target: DispatchTarget,
    pub spec: EnvironmentSpec,
    pub provisioned: Provisioned<'a>,
}

impl Prepared<'_> {
    pub fn run(&self) -> Result<i32> {
        self.provisioned.run(&self.target)
    }
}

/// Runs invocations against one workspace. Steps run strictly in sequence.
pub struct Orchestrator<'a, P: EnvironmentProvider = PipProvider> {
    config: &'a WorkspaceConfig,
    registry: &'a ResolverRegistry,
    manager: EnvironmentManager<P>,
}

impl<'a> Orchestrator<'a, PipProvider> {
    /// Uses the interpreter named in the config to create the environment.
    pub fn with_pip(config: &'a WorkspaceConfig, registry: &'a ResolverRegistry) -> Self {
        let provider = PipProvider::new(&config.environment.python);
        Self::new(config, registry, provider)
    }
}

impl<'a, P: EnvironmentProvider> Orchestrator<'a, P> {
    pub fn new(config: &'a WorkspaceConfig, registry: &'a ResolverRegistry, provider: P) -> Self {
        let manager = EnvironmentManager::new(&config.root, &config.environment.name, provider);
        Self {
            config,
            registry,
            manager,
        }
    }

    pub fn manager(&self) -> &EnvironmentManager<P> {
        &self.manager
    }

    /// Rebuilds the manifest from disk. Nothing is cached across calls since
    /// local versions may change between invocations.
    pub fn build_spec(&self) -> Result<EnvironmentSpec> {
        let requirements = self.config.requirements_file()?;
        let local = self.config.local_dependencies()?;
        ManifestBuilder::new(self.registry)
            .with_envs(self.config.environment.env.clone())
            .build(&requirements, &local)
    }

    /// Selects the target and provisions the environment for it.
    pub fn prepare(&self, argv: &[String]) -> Result<Prepared<'_>> {
        let target = self.config.dispatcher().select(argv);
        debug!(target = target.kind(), args = ?target.args(), "Selected dispatch target");

        let spec = self.build_spec()?;
        let provisioned = self.manager.ensure(&spec)?;
        if provisioned.outcome().performed_install() {
            info!(outcome = ?provisioned.outcome(), "Environment updated");
        }

        Ok(Prepared {
            target,
            spec,
            provisioned,
        })
    }

    pub fn run(&self, argv: &[String]) -> Result<i32> {
        self.prepare(argv)?.run()
    }
}
