//! Interrupt forwarding to the dispatched child process.

use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use once_cell::sync::OnceCell;
use tracing::warn;

/// Exit code reported when an interrupt arrived but the child exited cleanly.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static ACTIVE_CHILD: AtomicU32 = AtomicU32::new(0);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HANDLER: OnceCell<bool> = OnceCell::new();

/// Installs the process-wide handler once. Returns whether it is active.
///
/// Another handler already owning the signal is not fatal: the child still
/// receives terminal interrupts through its process group.
pub fn install_forwarder() -> bool {
    *HANDLER.get_or_init(|| match ctrlc::set_handler(on_signal) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to set signal handler, interrupts will not be forwarded: {}", e);
            false
        }
    })
}

fn on_signal() {
    INTERRUPTED.store(true, Ordering::SeqCst);
    let pid = ACTIVE_CHILD.load(Ordering::SeqCst);
    if pid != 0 {
        forward(pid);
    }
}

#[cfg(unix)]
fn forward(pid: u32) {
    // Runs on the handler thread, not in signal context.
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn forward(_pid: u32) {}

/// Marks a child as the receiver of forwarded interrupts while alive.
pub struct ChildGuard {
    _private: (),
}

impl ChildGuard {
    pub fn register(pid: u32) -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);
        ACTIVE_CHILD.store(pid, Ordering::SeqCst);
        Self { _private: () }
    }

    pub fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        ACTIVE_CHILD.store(0, Ordering::SeqCst);
    }
}

/// Maps a child's exit status to the code the orchestrator exits with.
///
/// Death by signal becomes `128 + signal`; an interrupt never yields 0.
pub fn exit_code(status: ExitStatus, interrupted: bool) -> i32 {
    match status.code() {
        Some(0) if interrupted => INTERRUPTED_EXIT_CODE,
        Some(code) => code,
        None => signal_code(status),
    }
}

#[cfg(unix)]
fn signal_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|signal| 128 + signal).unwrap_or(1)
}

#[cfg(not(unix))]
fn signal_code(_status: ExitStatus) -> i32 {
    1
}
