use std::path::Path;

use toml::Value;
use venvkit_core::error::{Error, Result};
use venvkit_core::package::PackageRoot;
use venvkit_core::resolver::VersionResolver;

use crate::read_version_file;

pub struct CargoResolver;

impl VersionResolver for CargoResolver {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn detect(&self, version_file: &Path) -> bool {
        version_file.file_name().and_then(|n| n.to_str()) == Some("Cargo.toml")
    }

    fn resolve(&self, root: &PackageRoot, _symbol: Option<&str>) -> Result<String> {
        let content = read_version_file(root)?;
        let cargo_toml_path = root.version_file_path();

        let toml: Value = content.parse().map_err(|e| Error::Parse {
            package: root.path.clone(),
            file: cargo_toml_path.clone(),
            message: format!("{}. File may be malformed.", e),
        })?;

        let version = toml.get("package").and_then(|p| p.get("version"));
        let version = match version {
            Some(Value::String(version)) => version,
            Some(Value::Table(_)) => {
                return Err(Error::VersionNotFound {
                    package: root.path.clone(),
                    message: format!(
                        "{} inherits its version from the workspace; point version_file at the workspace Cargo.toml",
                        cargo_toml_path.display()
                    ),
                });
            }
            _ => {
                return Err(Error::VersionNotFound {
                    package: root.path.clone(),
                    message: format!(
                        "could not find 'package.version' in {}",
                        cargo_toml_path.display()
                    ),
                });
            }
        };

        semver::Version::parse(version).map_err(|e| Error::Parse {
            package: root.path.clone(),
            file: cargo_toml_path.clone(),
            message: format!(
                "invalid version format '{}': {}. Expected semver format (e.g., 1.2.3)",
                version, e
            ),
        })?;

        Ok(version.clone())
    }
}
