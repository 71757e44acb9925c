//! Environment inspection and cleanup commands.

use anyhow::Result;
use owo_colors::OwoColorize;
use venvkit_adapters::default_registry;
use venvkit_core::{Orchestrator, WorkspaceConfig};

use crate::formatting::{
    print_key_value, print_section_header, print_success, print_warning, SectionStyle,
};

pub fn cmd_status(workspace: &WorkspaceConfig) -> Result<()> {
    let registry = default_registry();
    let orchestrator = Orchestrator::with_pip(workspace, &registry);
    let status = orchestrator.manager().status()?;
    let spec = orchestrator.build_spec()?;
    let wanted = spec.fingerprint();

    print_section_header("Environment", SectionStyle::Primary);
    print_key_value("Path", &status.path.display().to_string());
    print_key_value("Exists", if status.exists { "yes" } else { "no" });
    print_key_value(
        "Installed",
        status.fingerprint.as_deref().unwrap_or("never"),
    );
    print_key_value("Manifest", &wanted);
    print_key_value(
        "Python",
        status.interpreter.as_deref().unwrap_or("unknown"),
    );
    println!();

    print_section_header("Local packages", SectionStyle::Secondary);
    if spec.local.is_empty() {
        println!("  {}", "none".bright_black());
    }
    for local in &spec.local {
        println!(
            "  {} {}",
            local.specifier.bold().white(),
            format!("({})", local.path.display()).bright_black()
        );
    }
    println!();

    if status.fingerprint.as_deref() == Some(wanted.as_str()) {
        print_success("Up to date");
    } else {
        print_warning("Out of date, the next run will install");
    }
    Ok(())
}

pub fn cmd_clean(workspace: &WorkspaceConfig, quiet: bool) -> Result<()> {
    let registry = default_registry();
    let orchestrator = Orchestrator::with_pip(workspace, &registry);
    let env_dir = orchestrator.manager().env_dir();
    let removed = orchestrator.manager().remove()?;

    if !quiet {
        if removed {
            print_success(&format!("Removed {}", env_dir.display()));
        } else {
            print_warning(&format!("No environment at {}", env_dir.display()));
        }
    }
    Ok(())
}
