//! Pinned requirement declarations and distribution name handling.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A requirements declaration read from disk.
///
/// Blank lines and comments are dropped when reading; every other line is
/// kept in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsFile {
    pub path: PathBuf,
    pub contents: Vec<String>,
}

impl RequirementsFile {
    /// Reads and parses a newline-delimited requirements file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| Error::Requirements {
            path: path.clone(),
            source,
        })?;
        Ok(Self::parse(path, &content))
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let contents = content
            .lines()
            .filter_map(strip_comment)
            .map(|line| line.to_string())
            .collect();
        Self {
            path: path.into(),
            contents,
        }
    }

    /// An empty declaration, used when the workspace pins nothing remotely.
    pub fn empty() -> Self {
        Self {
            path: PathBuf::new(),
            contents: Vec::new(),
        }
    }
}

fn strip_comment(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = match line.find(" #") {
        Some(idx) => line[..idx].trim_end(),
        None => line,
    };
    Some(line)
}

/// Returns the distribution name a requirement line refers to.
///
/// Option lines such as `-r other.txt` or `--index-url` carry no name.
pub fn requirement_name(requirement: &str) -> Option<&str> {
    let requirement = requirement.trim_start();
    if requirement.starts_with('-') {
        return None;
    }

    let end = requirement
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .map(|(idx, _)| idx)
        .unwrap_or(requirement.len());

    let name = requirement[..end].trim_end_matches(&['-', '_', '.'][..]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Normalizes a distribution name so that `Foo_Bar`, `foo-bar` and
/// `foo.bar` compare equal.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            last_was_separator = false;
        }
    }
    normalized
}
