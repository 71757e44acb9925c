use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;

use venvkit_adapters::{default_registry, AssignmentResolver};
use venvkit_core::config::{WorkspaceConfig, CONFIG_FILE};
use venvkit_core::dispatch::DispatchTarget;
use venvkit_core::environment::EnsureOutcome;
use venvkit_core::error::{Error, Result};
use venvkit_core::manifest::{EnvironmentSpec, COMPAT_FLAG};
use venvkit_core::orchestrator::Orchestrator;
use venvkit_core::package::PackageRoot;
use venvkit_core::path_utils;
use venvkit_core::provider::EnvironmentProvider;
use venvkit_core::resolver::VersionResolver;
use venvkit_core::Stage;

/// Records installed manifests instead of running pip.
#[derive(Default)]
struct FakeProvider {
    installed: RefCell<Vec<EnvironmentSpec>>,
}

impl EnvironmentProvider for FakeProvider {
    fn is_created(&self, env_dir: &Path) -> bool {
        path_utils::bin_dir(env_dir).is_dir()
    }

    fn create(&self, env_dir: &Path) -> Result<()> {
        fs::create_dir_all(path_utils::bin_dir(env_dir))?;
        Ok(())
    }

    fn install(&self, _env_dir: &Path, spec: &EnvironmentSpec) -> Result<()> {
        self.installed.borrow_mut().push(spec.clone());
        Ok(())
    }
}

fn create_workspace(config: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join(CONFIG_FILE), config).unwrap();
    fs::write(root.join("requirements.txt"), "pytest==7.3.0\npackage-a==0.1.0\n").unwrap();

    fs::create_dir_all(root.join("a/package_a")).unwrap();
    fs::write(
        root.join("a/package_a/__init__.py"),
        "import os\n\nVERSION = \"1.2.0\"\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(
        root.join("b/pyproject.toml"),
        "[project]\nname = \"package-b\"\nversion = \"0.4.1\"\n",
    )
    .unwrap();

    temp_dir
}

const WORKSPACE: &str = r#"
[environment]
name = ".venv"
requirements = "requirements.txt"
main = "lifx"

[tasks]
runner = "run.sh"
subcommands = ["run_photons_core_tests", "lint"]

[[local]]
path = "a"
version_file = "package_a/__init__.py"
constraint = "package-a=={version}"
with_tests = true

[[local]]
path = "b"
version_file = "pyproject.toml"
constraint = "package-b"
"#;

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_prepare_installs_local_versions_and_routes_to_runner() {
    let workspace = create_workspace(WORKSPACE);
    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let prepared = orchestrator
        .prepare(&argv(&["run_photons_core_tests", "-k", "transport"]))
        .unwrap();

    assert_eq!(
        prepared.target,
        DispatchTarget::TaskRunner {
            executable: PathBuf::from("run.sh"),
            args: argv(&["run_photons_core_tests", "-k", "transport"]),
        }
    );
    assert_eq!(prepared.provisioned.outcome(), EnsureOutcome::Created);
    assert_eq!(
        prepared.spec.specifiers(),
        vec!["pytest==7.3.0", "package-a==1.2.0", "package-b"]
    );
    assert_eq!(prepared.spec.local[1].version, "0.4.1");
    assert_eq!(
        prepared.spec.env.get(COMPAT_FLAG).map(String::as_str),
        Some("false")
    );

    let installed = orchestrator.manager().provider().installed.borrow();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0], prepared.spec);
}

#[cfg(unix)]
#[test]
fn test_runner_at_workspace_root_receives_argv() {
    use std::os::unix::fs::PermissionsExt;

    let workspace = create_workspace(WORKSPACE);
    let runner = workspace.path().join("run.sh");
    fs::write(
        &runner,
        "#!/bin/sh\n[ \"$1\" = lint ] && [ \"$2\" = -x ] && exit 6\nexit 1\n",
    )
    .unwrap();
    fs::set_permissions(&runner, fs::Permissions::from_mode(0o755)).unwrap();

    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let code = orchestrator.run(&argv(&["lint", "-x"])).unwrap();
    assert_eq!(code, 6);
}

#[test]
fn test_version_bump_triggers_reinstall() {
    let workspace = create_workspace(WORKSPACE);
    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let first = orchestrator.prepare(&argv(&["lint"])).unwrap();
    assert_eq!(first.provisioned.outcome(), EnsureOutcome::Created);
    drop(first);

    let unchanged = orchestrator.prepare(&argv(&["lint"])).unwrap();
    assert_eq!(unchanged.provisioned.outcome(), EnsureOutcome::UpToDate);
    drop(unchanged);

    fs::write(
        workspace.path().join("a/package_a/__init__.py"),
        "VERSION = \"1.3.0\"\n",
    )
    .unwrap();
    let bumped = orchestrator.prepare(&argv(&["foo"])).unwrap();
    assert_eq!(bumped.provisioned.outcome(), EnsureOutcome::Installed);
    assert!(matches!(bumped.target, DispatchTarget::PrimaryExecutable { .. }));
    assert!(bumped.spec.specifiers().contains(&"package-a==1.3.0"));

    assert_eq!(orchestrator.manager().provider().installed.borrow().len(), 2);
}

#[test]
fn test_missing_symbol_aborts_before_provisioning() {
    let workspace = create_workspace(WORKSPACE);
    fs::write(
        workspace.path().join("a/package_a/__init__.py"),
        "NAME = \"package-a\"\n",
    )
    .unwrap();

    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let err = orchestrator.prepare(&argv(&["lint"])).unwrap_err();
    match &err {
        Error::VersionNotFound { package, .. } => {
            assert_eq!(package, &workspace.path().join("a"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.stage(), Stage::VersionResolution);
    assert!(!workspace.path().join(".venv").exists());
    assert!(orchestrator.manager().provider().installed.borrow().is_empty());
}

#[test]
fn test_missing_requirements_file_is_manifest_error() {
    let workspace = create_workspace(WORKSPACE);
    fs::remove_file(workspace.path().join("requirements.txt")).unwrap();

    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let err = orchestrator.build_spec().unwrap_err();
    assert_eq!(err.stage(), Stage::ManifestBuild);
}

#[test]
fn test_named_symbol_from_config() {
    let config = r#"
[environment]
main = "lifx"

[[local]]
path = "a"
version_file = "package_a/__init__.py"
constraint = "package-a=={version}"
version_symbol = "RELEASE"
"#;
    let workspace = create_workspace(config);
    fs::write(
        workspace.path().join("a/package_a/__init__.py"),
        "VERSION = \"1.0\"\nRELEASE = \"2.0.0\"\n",
    )
    .unwrap();

    let config = WorkspaceConfig::discover(workspace.path()).unwrap();
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&config, &registry, FakeProvider::default());

    let spec = orchestrator.build_spec().unwrap();
    assert!(spec.requirements.is_empty());
    assert_eq!(spec.specifiers(), vec!["package-a==2.0.0"]);
}

#[test]
fn test_default_registry_detection() {
    let registry = default_registry();
    assert_eq!(
        registry.registered_names(),
        vec!["pyproject", "cargo", "assignment"]
    );
    let detect = |file: &str| registry.detect(Path::new(file)).map(|r| r.name());
    assert_eq!(detect("pyproject.toml"), Some("pyproject"));
    assert_eq!(detect("Cargo.toml"), Some("cargo"));
    assert_eq!(detect("photons_app/__init__.py"), Some("assignment"));
    assert_eq!(detect("VERSION"), Some("assignment"));
    assert_eq!(detect("package.json"), None);
}

proptest! {
    #[test]
    fn test_assignment_returns_exact_literal(
        version in "[0-9A-Za-z][0-9A-Za-z.+_-]{0,15}",
        double in any::<bool>(),
        comment in any::<bool>(),
    ) {
        let quoted = if double {
            format!("\"{}\"", version)
        } else {
            format!("'{}'", version)
        };
        let content = format!(
            "import sys\n\nVERSION = {}{}\n",
            quoted,
            if comment { "  # release" } else { "" }
        );

        let root = PackageRoot::new("/ws/pkg", "pkg/__init__.py");
        let resolved = AssignmentResolver::default()
            .parse_version(&root, None, &content)
            .unwrap();
        prop_assert_eq!(resolved, version);
    }
}

#[test]
fn test_assignment_resolver_is_registered_by_name() {
    let registry = default_registry();
    let resolver: Box<dyn VersionResolver> = registry.get("assignment").unwrap();
    assert_eq!(resolver.name(), "assignment");
}
