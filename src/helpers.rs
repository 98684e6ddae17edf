// Helper utilities for hibernate-agent
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;
use std::process::{Command, Stdio};

use libsystemd::daemon::{self, NotifyState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not running as root")]
    NotRoot,
}

pub type Result<T> = std::result::Result<T, HelperError>;

/// Check if running as root
pub fn am_i_root() -> Result<()> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(HelperError::NotRoot)
    }
}

/// Run a shell command line and return whether it exited successfully.
/// Output is discarded; callers log the command themselves.
pub fn run_shell(cmdline: &str) -> Result<bool> {
    let status = Command::new("sh")
        .args(["-c", cmdline])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.success())
}

/// Tell systemd the service is ready (no-op outside systemd)
pub fn notify_ready() {
    let _ = daemon::notify(false, &[NotifyState::Ready]);
}

/// Tell systemd the service is stopping (no-op outside systemd)
pub fn notify_stopping() {
    let _ = daemon::notify(false, &[NotifyState::Stopping]);
}
