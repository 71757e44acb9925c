//! Version resolver trait for reading a package's declared version.

use std::path::Path;

use crate::error::Result;
use crate::package::PackageRoot;

/// Reads the version a package declares in its version file.
///
/// Resolvers only read; they never evaluate the file or write to it.
pub trait VersionResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this resolver understands the given version file.
    fn detect(&self, version_file: &Path) -> bool;

    /// Returns the literal version string bound in the version file.
    ///
    /// `symbol` overrides the identifier the version is bound to, for
    /// resolvers that look for one.
    fn resolve(&self, root: &PackageRoot, symbol: Option<&str>) -> Result<String>;
}
