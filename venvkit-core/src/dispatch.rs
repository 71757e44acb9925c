//! Routing of an invocation to the task runner or the primary executable.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Subcommands routed to the task runner when none are configured.
pub const DEFAULT_SUBCOMMANDS: &[&str] = &["tests", "lint", "format", "docs", "types"];

/// The process that receives control after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    TaskRunner { executable: PathBuf, args: Vec<String> },
    PrimaryExecutable { executable: String, args: Vec<String> },
}

impl DispatchTarget {
    pub fn args(&self) -> &[String] {
        match self {
            DispatchTarget::TaskRunner { args, .. }
            | DispatchTarget::PrimaryExecutable { args, .. } => args,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchTarget::TaskRunner { .. } => "task runner",
            DispatchTarget::PrimaryExecutable { .. } => "primary executable",
        }
    }
}

/// Chooses the dispatch target from the invocation arguments.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    task_runner: PathBuf,
    primary: String,
    subcommands: BTreeSet<String>,
}

impl Dispatcher {
    pub fn new(task_runner: impl Into<PathBuf>, primary: impl Into<String>) -> Self {
        Self {
            task_runner: task_runner.into(),
            primary: primary.into(),
            subcommands: DEFAULT_SUBCOMMANDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the set of subcommands routed to the task runner.
    pub fn with_subcommands<I, S>(mut self, subcommands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcommands = subcommands.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_task_subcommand(&self, arg: &str) -> bool {
        self.subcommands.contains(arg)
    }

    /// Every argv has a target; an empty one runs the primary executable's
    /// default behavior. Arguments are forwarded unchanged either way.
    pub fn select(&self, argv: &[String]) -> DispatchTarget {
        match argv.first() {
            Some(first) if self.is_task_subcommand(first) => DispatchTarget::TaskRunner {
                executable: self.task_runner.clone(),
                args: argv.to_vec(),
            },
            _ => DispatchTarget::PrimaryExecutable {
                executable: self.primary.clone(),
                args: argv.to_vec(),
            },
        }
    }
}
