mod commands;
mod formatting;

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::formatting::print_failure;

/// Orchestrator flags are prefixed so they never shadow arguments meant for
/// the dispatched command. The first argument that is not one of them, and
/// everything after it, is forwarded untouched.
#[derive(Parser)]
#[command(name = "venvkit")]
#[command(about = "Provision a linked monorepo development environment and dispatch into it")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Workspace directory to search for venvkit.toml from.
    #[arg(long = "venvkit-root", env = "VENVKIT_ROOT")]
    root: Option<PathBuf>,

    /// Explicit config file, skipping discovery.
    #[arg(long = "venvkit-config", env = "VENVKIT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long = "venvkit-verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long = "venvkit-quiet", action)]
    quiet: bool,

    /// Show the environment state instead of dispatching.
    #[arg(long = "venvkit-status", action, conflicts_with = "clean")]
    status: bool,

    /// Delete the environment instead of dispatching.
    #[arg(long = "venvkit-clean", action)]
    clean: bool,

    #[arg(long = "venvkit-help", action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Forwarded to the task runner or the primary executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = commands::load_workspace(cli.root.clone(), cli.config.clone()).and_then(
        |workspace| {
            if cli.status {
                commands::cmd_status(&workspace).map(|_| 0)
            } else if cli.clean {
                commands::cmd_clean(&workspace, cli.quiet).map(|_| 0)
            } else {
                commands::cmd_run(&workspace, &cli.args, cli.quiet)
            }
        },
    );

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            print_failure(&e);
            1
        }
    };
    std::process::exit(code);
}
