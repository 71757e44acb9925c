//! Provision-then-dispatch, the default command.

use std::time::Instant;

use anyhow::Result;
use venvkit_adapters::default_registry;
use venvkit_core::{EnsureOutcome, Orchestrator, WorkspaceConfig};

use crate::formatting::{format_duration, print_success};

pub fn cmd_run(workspace: &WorkspaceConfig, args: &[String], quiet: bool) -> Result<i32> {
    let registry = default_registry();
    let orchestrator = Orchestrator::with_pip(workspace, &registry);

    let start = Instant::now();
    let prepared = orchestrator.prepare(args)?;

    if !quiet {
        let elapsed = format_duration(start.elapsed().as_secs_f64());
        match prepared.provisioned.outcome() {
            EnsureOutcome::Created => print_success(&format!(
                "Created {} with {} local packages ({})",
                prepared.provisioned.env_dir().display(),
                prepared.spec.local.len(),
                elapsed
            )),
            EnsureOutcome::Installed => print_success(&format!(
                "Updated {} ({})",
                prepared.provisioned.env_dir().display(),
                elapsed
            )),
            EnsureOutcome::UpToDate => {}
        }
    }

    Ok(prepared.run()?)
}
