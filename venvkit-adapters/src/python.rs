//! Resolver for Python packages that declare their version in pyproject.toml.
//!
//! Supports both PEP 621 format (project.version) and Poetry format
//! (tool.poetry.version).

use std::path::Path;

use toml::Value;
use venvkit_core::error::{Error, Result};
use venvkit_core::package::PackageRoot;
use venvkit_core::resolver::VersionResolver;

use crate::read_version_file;

/// Resolver for `pyproject.toml` version files.
pub struct PyprojectResolver;

impl VersionResolver for PyprojectResolver {
    fn name(&self) -> &'static str {
        "pyproject"
    }

    fn detect(&self, version_file: &Path) -> bool {
        version_file.file_name().and_then(|n| n.to_str()) == Some("pyproject.toml")
    }

    fn resolve(&self, root: &PackageRoot, _symbol: Option<&str>) -> Result<String> {
        let content = read_version_file(root)?;
        let pyproject_path = root.version_file_path();

        let toml: Value = content.parse().map_err(|e| Error::Parse {
            package: root.path.clone(),
            file: pyproject_path.clone(),
            message: format!("{}. File may be malformed.", e),
        })?;

        let version = toml
            .get("project")
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                toml.get("tool")
                    .and_then(|t| t.get("poetry"))
                    .and_then(|p| p.get("version"))
                    .and_then(|v| v.as_str())
            });

        if let Some(version) = version {
            return Ok(version.to_string());
        }

        let is_dynamic = toml
            .get("project")
            .and_then(|p| p.get("dynamic"))
            .and_then(|d| d.as_array())
            .is_some_and(|fields| fields.iter().any(|f| f.as_str() == Some("version")));

        Err(Error::VersionNotFound {
            package: root.path.clone(),
            message: if is_dynamic {
                format!(
                    "{} declares a dynamic version; point version_file at the file that assigns it",
                    pyproject_path.display()
                )
            } else {
                format!(
                    "could not find 'project.version' or 'tool.poetry.version' in {}",
                    pyproject_path.display()
                )
            },
        })
    }
}
