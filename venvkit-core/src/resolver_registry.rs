//! Registry of version resolvers, looked up by name or by version file.

use std::path::Path;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::package::LocalDependency;
use crate::resolver::VersionResolver;

type ResolverFactory = Box<dyn Fn() -> Box<dyn VersionResolver> + Send + Sync>;

/// Registry for version resolvers.
///
/// Auto-detection asks resolvers in registration order, so more specific
/// resolvers should be registered first.
pub struct ResolverRegistry {
    resolvers: Mutex<IndexMap<String, ResolverFactory>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            resolvers: Mutex::new(IndexMap::new()),
        }
    }

    /// Registers a resolver factory under `name`.
    ///
    /// Registering an existing name replaces the factory but keeps its
    /// detection position.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn VersionResolver> + Send + Sync + 'static,
    {
        if let Ok(mut resolvers) = self.resolvers.lock() {
            resolvers.insert(name.to_string(), Box::new(factory));
        }
    }

    pub fn get(&self, name: &str) -> Option<Box<dyn VersionResolver>> {
        self.resolvers
            .lock()
            .ok()
            .and_then(|resolvers| resolvers.get(name).map(|factory| factory()))
    }

    /// Returns the first resolver that recognizes `version_file`.
    pub fn detect(&self, version_file: &Path) -> Option<Box<dyn VersionResolver>> {
        let resolvers = self.resolvers.lock().ok()?;
        resolvers
            .values()
            .map(|factory| factory())
            .find(|resolver| resolver.detect(version_file))
    }

    /// Picks the resolver for a dependency: the named one, else auto-detected.
    pub fn for_dependency(&self, dep: &LocalDependency) -> Result<Box<dyn VersionResolver>> {
        let found = match dep.resolver.as_deref() {
            Some(name) => self.get(name),
            None => self.detect(&dep.root.version_file),
        };

        found.ok_or_else(|| Error::ResolverNotFound {
            name: dep
                .resolver
                .clone()
                .unwrap_or_else(|| format!("<auto: {}>", dep.root.version_file.display())),
            package: dep.root.path.clone(),
            available: self.registered_names().join(", "),
        })
    }

    /// Lists registered resolver names in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.resolvers
            .lock()
            .ok()
            .map(|resolvers| resolvers.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
