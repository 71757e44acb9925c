//! Shared path utilities for locating things inside an environment.

use std::path::{Path, PathBuf};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &[""];

/// Directory holding the environment's own executables.
pub fn bin_dir(env_dir: &Path) -> PathBuf {
    env_dir.join(BIN_DIR)
}

/// The environment's interpreter.
pub fn interpreter(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        bin_dir(env_dir).join("python.exe")
    } else {
        bin_dir(env_dir).join("python")
    }
}

/// Maps a command name to a concrete path.
///
/// Absolute paths are used as-is. References containing a path separator are
/// relative to the workspace root. Bare names are looked up in the
/// environment's bin directory, never on the caller's `PATH`.
pub fn resolve_command(executable: &Path, env_dir: &Path, workspace_root: &Path) -> PathBuf {
    if executable.components().count() > 1 || executable.is_absolute() {
        resolve_path(executable, workspace_root)
    } else {
        with_suffix(bin_dir(env_dir).join(executable))
    }
}

/// Maps a file path to a concrete path. Relative paths, bare file names
/// included, are taken from the workspace root.
pub fn resolve_path(executable: &Path, workspace_root: &Path) -> PathBuf {
    if executable.is_absolute() {
        executable.to_path_buf()
    } else {
        with_suffix(workspace_root.join(executable))
    }
}

fn with_suffix(candidate: PathBuf) -> PathBuf {
    EXECUTABLE_SUFFIXES
        .iter()
        .map(|suffix| {
            let mut name = candidate.clone().into_os_string();
            name.push(suffix);
            PathBuf::from(name)
        })
        .find(|path| path.is_file())
        .unwrap_or(candidate)
}

/// Whether `path` is a regular file the current user may execute.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
