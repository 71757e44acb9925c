use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use venvkit_core::error::Result;
use venvkit_core::manifest::EnvironmentSpec;
use venvkit_core::path_utils;
use venvkit_core::provider::EnvironmentProvider;
use venvkit_core::{Orchestrator, ResolverRegistry, WorkspaceConfig};

fn create_workspace(dir: &Path, version_line: &str) {
    fs::create_dir_all(dir.join(".git")).unwrap();
    fs::write(
        dir.join("venvkit.toml"),
        r#"
[environment]
name = ".venv"
main = "lifx"

[[local]]
path = "a"
version_file = "package_a/__init__.py"
constraint = "package-a=={version}"
"#,
    )
    .unwrap();

    let pkg_dir = dir.join("a").join("package_a");
    fs::create_dir_all(&pkg_dir).unwrap();
    fs::write(pkg_dir.join("__init__.py"), format!("{}\n", version_line)).unwrap();
}

fn venvkit(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_venvkit"))
        .arg("--venvkit-root")
        .arg(root)
        .args(args)
        .env_remove("VENVKIT_ROOT")
        .env_remove("VENVKIT_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute venvkit")
}

#[test]
fn test_missing_config_reports_configuration_stage() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".git")).unwrap();

    let output = venvkit(temp_dir.path(), &["lint"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("venvkit: configuration failed"), "{}", stderr);
}

#[test]
fn test_status_shows_resolved_local_versions() {
    let temp_dir = TempDir::new().unwrap();
    create_workspace(temp_dir.path(), "VERSION = \"1.2.0\"");

    let output = venvkit(temp_dir.path(), &["--venvkit-status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("package-a==1.2.0"), "{}", stdout);
    assert!(!temp_dir.path().join(".venv").exists());
}

#[test]
fn test_unresolvable_version_reports_resolution_stage() {
    let temp_dir = TempDir::new().unwrap();
    create_workspace(temp_dir.path(), "VERSION = compute()");

    let output = venvkit(temp_dir.path(), &["tests", "-x"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("venvkit: version resolution failed"), "{}", stderr);
    assert!(!temp_dir.path().join(".venv").exists());
}

#[test]
fn test_clean_removes_environment() {
    let temp_dir = TempDir::new().unwrap();
    create_workspace(temp_dir.path(), "VERSION = \"1.2.0\"");
    fs::create_dir_all(temp_dir.path().join(".venv").join("bin")).unwrap();

    let output = venvkit(temp_dir.path(), &["--venvkit-clean"]);
    assert!(output.status.success());
    assert!(!temp_dir.path().join(".venv").exists());

    let output = venvkit(temp_dir.path(), &["--venvkit-clean", "--venvkit-quiet"]);
    assert!(output.status.success());
}

#[test]
fn test_missing_explicit_config_names_path_once() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_venvkit"))
        .arg("--venvkit-config")
        .arg(&config)
        .arg("lint")
        .env_remove("VENVKIT_ROOT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute venvkit");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("venvkit: configuration failed"), "{}", stderr);
    assert!(stderr.contains(&config.display().to_string()), "{}", stderr);
    #[cfg(target_os = "linux")]
    assert_eq!(stderr.matches("(os error 2)").count(), 1, "{}", stderr);
}

#[test]
fn test_provisioning_failure_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
    fs::write(
        temp_dir.path().join("venvkit.toml"),
        "[environment]\nmain = \"lifx\"\npython = \"/nonexistent/python3\"\n",
    )
    .unwrap();

    let output = venvkit(temp_dir.path(), &["lint"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("venvkit: provisioning failed"), "{}", stderr);
    assert!(!temp_dir.path().join(".venvkit").exists());
}

/// Lays out an environment the pip provider accepts as created, with the
/// primary executable linked to the system shell.
#[cfg(unix)]
struct SeededEnvironment;

#[cfg(unix)]
impl EnvironmentProvider for SeededEnvironment {
    fn interpreter(&self) -> Option<String> {
        Some("python3".to_string())
    }

    fn create(&self, env_dir: &Path) -> Result<()> {
        let bin_dir = path_utils::bin_dir(env_dir);
        fs::create_dir_all(&bin_dir)?;
        fs::write(env_dir.join("pyvenv.cfg"), "home = /usr/bin\n")?;
        fs::write(path_utils::interpreter(env_dir), "")?;
        std::os::unix::fs::symlink("/bin/sh", bin_dir.join("lifx"))?;
        Ok(())
    }

    fn install(&self, _env_dir: &Path, _spec: &EnvironmentSpec) -> Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
fn seeded_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
    fs::write(
        temp_dir.path().join("venvkit.toml"),
        "[environment]\nmain = \"lifx\"\n",
    )
    .unwrap();

    let config = WorkspaceConfig::discover(temp_dir.path()).unwrap();
    let registry = ResolverRegistry::new();
    Orchestrator::new(&config, &registry, SeededEnvironment)
        .prepare(&[])
        .unwrap();
    temp_dir
}

#[cfg(unix)]
#[test]
fn test_hyphenated_arguments_and_exit_code_reach_child() {
    let workspace = seeded_workspace();

    let output = venvkit(
        workspace.path(),
        &["-c", "printf '%s\\n' \"$@\"; exit 5", "sh", "--help", "-x"],
    );

    assert_eq!(output.status.code(), Some(5));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "--help\n-x\n");
}

#[cfg(unix)]
#[test]
fn test_double_dash_ends_orchestrator_flags() {
    let workspace = seeded_workspace();

    let output = venvkit(
        workspace.path(),
        &[
            "--venvkit-quiet",
            "--",
            "-c",
            "printf '%s\\n' \"$@\"",
            "sh",
            "--venvkit-status",
        ],
    );

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "--venvkit-status\n");
}

#[cfg(unix)]
#[test]
fn test_child_environment_is_prepared() {
    let workspace = seeded_workspace();

    let output = venvkit(
        workspace.path(),
        &["-c", "printf '%s|%s' \"$NOSE_OF_YETI_BLACK_COMPAT\" \"$VIRTUAL_ENV\""],
    );

    assert!(output.status.success());
    let env_dir = workspace.path().join(".venvkit");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("false|{}", env_dir.display())
    );
}
