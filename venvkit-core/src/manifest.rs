//! Assembly of the environment specification from pinned requirements and
//! local packages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::package::{LocalDependencySet, ResolvedLocal};
use crate::requirements::{requirement_name, RequirementsFile};
use crate::resolver_registry::ResolverRegistry;

/// Compatibility flag every dispatched process receives.
pub const COMPAT_FLAG: &str = "NOSE_OF_YETI_BLACK_COMPAT";
pub const COMPAT_FLAG_VALUE: &str = "false";

/// Everything that should be installed into an environment, plus the
/// variables the dispatched process runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Pinned remote requirements that no local package shadows.
    pub requirements: Vec<String>,
    pub local: Vec<ResolvedLocal>,
    pub env: BTreeMap<String, String>,
}

impl EnvironmentSpec {
    /// All requirement specifiers: remote pins first, then local packages.
    pub fn specifiers(&self) -> Vec<&str> {
        self.requirements
            .iter()
            .map(String::as_str)
            .chain(self.local.iter().map(|l| l.specifier.as_str()))
            .collect()
    }

    /// Renders the manifest in pip requirements format.
    pub fn render_requirements(&self) -> String {
        let mut out = String::new();
        for requirement in &self.requirements {
            out.push_str(requirement);
            out.push('\n');
        }
        for local in &self.local {
            out.push_str(&local.install_line());
            out.push('\n');
        }
        out
    }

    /// Hex SHA-256 over everything that affects installed contents.
    ///
    /// Environment variables only apply at run time and are left out.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for requirement in &self.requirements {
            hasher.update(b"requirement\0");
            hasher.update(requirement.as_bytes());
            hasher.update(b"\0");
        }
        for local in &self.local {
            hasher.update(b"local\0");
            hasher.update(local.specifier.as_bytes());
            hasher.update(b"\0");
            hasher.update(local.path.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(if local.include_test_extras { b"1" } else { b"0" });
            hasher.update(b"\0");
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Merges pinned requirements with local packages into an `EnvironmentSpec`.
pub struct ManifestBuilder<'a> {
    registry: &'a ResolverRegistry,
    env: BTreeMap<String, String>,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(registry: &'a ResolverRegistry) -> Self {
        let mut env = BTreeMap::new();
        env.insert(COMPAT_FLAG.to_string(), COMPAT_FLAG_VALUE.to_string());
        Self { registry, env }
    }

    /// Adds an extra variable for the dispatched process.
    ///
    /// The compatibility flag keeps its fixed value.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key == COMPAT_FLAG {
            warn!("Ignoring configured {}: the value is fixed", COMPAT_FLAG);
            return self;
        }
        self.env.insert(key, value.into());
        self
    }

    pub fn with_envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        vars.into_iter()
            .fold(self, |builder, (key, value)| builder.with_env(key, value))
    }

    /// Resolves every local package and merges it over the pinned
    /// requirements. A local package always replaces a pinned requirement of
    /// the same name.
    pub fn build(
        &self,
        requirements: &RequirementsFile,
        local_deps: &LocalDependencySet,
    ) -> Result<EnvironmentSpec> {
        let mut local = Vec::with_capacity(local_deps.len());
        for dep in local_deps.iter() {
            let resolver = self.registry.for_dependency(dep)?;
            let version = resolver.resolve(&dep.root, dep.version_symbol.as_deref())?;
            debug!(
                package = %dep.declared_name,
                resolver = resolver.name(),
                version = %version,
                "Resolved local package version"
            );

            local.push(ResolvedLocal {
                declared_name: dep.declared_name.clone(),
                specifier: dep.specifier(&version),
                version,
                path: dep.root.path.clone(),
                include_test_extras: dep.include_test_extras,
            });
        }

        let requirements = requirements
            .contents
            .iter()
            .filter(|requirement| match requirement_name(requirement) {
                Some(name) if local_deps.contains(name) => {
                    debug!(
                        requirement = %requirement,
                        "Dropping pinned requirement shadowed by a local package"
                    );
                    false
                }
                _ => true,
            })
            .cloned()
            .collect();

        Ok(EnvironmentSpec {
            requirements,
            local,
            env: self.env.clone(),
        })
    }
}
