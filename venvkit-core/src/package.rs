//! Local package declarations.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::requirements::{normalize_name, requirement_name};

/// Placeholder substituted with the resolved version in a constraint.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// A local package directory and the file that declares its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRoot {
    pub path: PathBuf,
    /// Relative to `path`.
    pub version_file: PathBuf,
}

impl PackageRoot {
    pub fn new(path: impl Into<PathBuf>, version_file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version_file: version_file.into(),
        }
    }

    #[inline]
    pub fn version_file_path(&self) -> PathBuf {
        self.path.join(&self.version_file)
    }
}

/// A workspace package installed by filesystem reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDependency {
    pub root: PackageRoot,
    pub declared_name: String,
    /// Either a verbatim requirement or one containing `{version}`.
    pub version_constraint: String,
    pub include_test_extras: bool,
    /// Registry name of the resolver to use. Auto-detected when `None`.
    pub resolver: Option<String>,
    /// Symbol holding the version, for resolvers that read source files.
    pub version_symbol: Option<String>,
}

impl LocalDependency {
    /// Creates a dependency whose declared name is taken from the constraint.
    pub fn new(root: PackageRoot, version_constraint: impl Into<String>) -> Result<Self> {
        let version_constraint = version_constraint.into();
        let declared_name = requirement_name(&version_constraint)
            .ok_or_else(|| {
                Error::Config(format!(
                    "Local dependency at {} has constraint '{}' without a package name",
                    root.path.display(),
                    version_constraint
                ))
            })?
            .to_string();

        Ok(Self {
            root,
            declared_name,
            version_constraint,
            include_test_extras: false,
            resolver: None,
            version_symbol: None,
        })
    }

    pub fn with_tests(mut self, include: bool) -> Self {
        self.include_test_extras = include;
        self
    }

    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.resolver = Some(resolver.into());
        self
    }

    pub fn with_version_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.version_symbol = Some(symbol.into());
        self
    }

    #[inline]
    pub fn has_placeholder(&self) -> bool {
        self.version_constraint.contains(VERSION_PLACEHOLDER)
    }

    /// Produces the requirement specifier for a resolved version.
    pub fn specifier(&self, version: &str) -> String {
        if self.has_placeholder() {
            self.version_constraint.replace(VERSION_PLACEHOLDER, version)
        } else {
            self.version_constraint.clone()
        }
    }
}

/// Ordered set of local dependencies, unique by normalized name.
#[derive(Debug, Clone, Default)]
pub struct LocalDependencySet {
    deps: IndexMap<String, LocalDependency>,
}

impl LocalDependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dep: LocalDependency) -> Result<()> {
        let key = normalize_name(&dep.declared_name);
        if let Some(existing) = self.deps.get(&key) {
            return Err(Error::Config(format!(
                "Local dependency '{}' is declared twice ({} and {})",
                dep.declared_name,
                existing.root.path.display(),
                dep.root.path.display()
            )));
        }
        self.deps.insert(key, dep);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalDependency> {
        self.deps.values()
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.deps.contains_key(&normalize_name(name))
    }
}

impl TryFrom<Vec<LocalDependency>> for LocalDependencySet {
    type Error = Error;

    fn try_from(deps: Vec<LocalDependency>) -> Result<Self> {
        let mut set = Self::new();
        for dep in deps {
            set.add(dep)?;
        }
        Ok(set)
    }
}

/// A local dependency after its version has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocal {
    pub declared_name: String,
    pub specifier: String,
    pub version: String,
    pub path: PathBuf,
    pub include_test_extras: bool,
}

impl ResolvedLocal {
    /// Editable install line for this package.
    ///
    /// pip splits option lines like a POSIX shell, so the target is always
    /// double-quoted.
    pub fn install_line(&self) -> String {
        let mut target = self.path.to_string_lossy().into_owned();
        if self.include_test_extras {
            target.push_str("[tests]");
        }
        format!("-e {}", shell_quote(&target))
    }
}

fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
