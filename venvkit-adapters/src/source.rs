//! Resolver for versions bound by a simple assignment in a source file.
//!
//! Recognizes unindented lines such as
//!
//! ```text
//! VERSION = "1.2.0"
//! __version__: str = '0.3.1'  # comment
//! ```
//!
//! The file is never evaluated. Binding the symbol to anything other than a
//! plain string literal is a parse error, so a version computed at import time
//! cannot silently resolve to the wrong value.

use std::path::Path;

use regex::Regex;
use venvkit_core::error::{Error, Result};
use venvkit_core::package::PackageRoot;
use venvkit_core::resolver::VersionResolver;

use crate::read_version_file;

pub const DEFAULT_SYMBOLS: &[&str] = &["VERSION", "__version__"];

const LITERAL_PATTERN: &str = r#"^\s*(?:"([^"\\\r\n]*)"|'([^'\\\r\n]*)')\s*(?:#.*)?$"#;

/// Reads `SYMBOL = "literal"` assignments.
pub struct AssignmentResolver {
    symbols: Vec<String>,
}

impl Default for AssignmentResolver {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AssignmentResolver {
    fn assignment_regex(symbols: &[&str], root: &PackageRoot) -> Result<Regex> {
        let alternatives = symbols
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"^(?:{})\s*(?::[^=]*)?=(.*)$", alternatives);
        Regex::new(&pattern).map_err(|e| Error::Parse {
            package: root.path.clone(),
            file: root.version_file_path(),
            message: format!("invalid version symbol: {}", e),
        })
    }

    /// Extracts the version from file contents. The last assignment wins, as
    /// it would when the module is executed.
    pub fn parse_version(&self, root: &PackageRoot, symbol: Option<&str>, content: &str) -> Result<String> {
        let symbols: Vec<&str> = match symbol {
            Some(symbol) => vec![symbol],
            None => self.symbols.iter().map(String::as_str).collect(),
        };
        let assignment = Self::assignment_regex(&symbols, root)?;
        let literal = Regex::new(LITERAL_PATTERN).map_err(|e| Error::Parse {
            package: root.path.clone(),
            file: root.version_file_path(),
            message: format!("failed to create regex: {}", e),
        })?;

        let mut version = None;
        for (idx, line) in content.lines().enumerate() {
            let Some(captures) = assignment.captures(line) else {
                continue;
            };
            let value = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            if value.starts_with('=') {
                // A comparison, not an assignment.
                continue;
            }

            let parsed = literal
                .captures(value)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().trim().to_string());

            match parsed {
                Some(v) if !v.is_empty() => version = Some(v),
                Some(_) => {
                    return Err(Error::Parse {
                        package: root.path.clone(),
                        file: root.version_file_path(),
                        message: format!("line {}: version is an empty string", idx + 1),
                    });
                }
                None => {
                    return Err(Error::Parse {
                        package: root.path.clone(),
                        file: root.version_file_path(),
                        message: format!(
                            "line {}: only plain string literals are supported, found '{}'",
                            idx + 1,
                            value.trim()
                        ),
                    });
                }
            }
        }

        version.ok_or_else(|| Error::VersionNotFound {
            package: root.path.clone(),
            message: format!(
                "{} does not assign {}",
                root.version_file_path().display(),
                symbols.join(" or ")
            ),
        })
    }
}

impl VersionResolver for AssignmentResolver {
    fn name(&self) -> &'static str {
        "assignment"
    }

    fn detect(&self, version_file: &Path) -> bool {
        version_file
            .extension()
            .map_or(true, |ext| ext != "toml" && ext != "json")
    }

    fn resolve(&self, root: &PackageRoot, symbol: Option<&str>) -> Result<String> {
        let content = read_version_file(root)?;
        self.parse_version(root, symbol, &content)
    }
}
