pub mod python;
pub mod rust;
pub mod source;

pub use python::PyprojectResolver;
pub use rust::CargoResolver;
pub use source::AssignmentResolver;

use std::fs;

use venvkit_core::error::{Error, Result};
use venvkit_core::package::PackageRoot;
use venvkit_core::resolver_registry::ResolverRegistry;

/// Registry with every built-in resolver. TOML manifests are detected before
/// the source assignment fallback.
pub fn default_registry() -> ResolverRegistry {
    let registry = ResolverRegistry::new();
    registry.register("pyproject", || Box::new(PyprojectResolver));
    registry.register("cargo", || Box::new(CargoResolver));
    registry.register("assignment", || Box::new(AssignmentResolver::default()));
    registry
}

/// Reads a package's version file; a missing file means no version.
pub(crate) fn read_version_file(root: &PackageRoot) -> Result<String> {
    let path = root.version_file_path();
    fs::read_to_string(&path).map_err(|e| Error::VersionNotFound {
        package: root.path.clone(),
        message: format!("cannot read version file {}: {}", path.display(), e),
    })
}
