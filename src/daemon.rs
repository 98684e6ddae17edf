// Process daemonization - double fork, PID file, fd redirection
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::{self, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process;

use nix::unistd::{chdir, dup2, fork, getpid, setsid, ForkResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("syscall failed: {0}")]
    Sys(#[from] nix::Error),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

/// Detach from the controlling terminal and run in the background.
///
/// Classic double fork: the first child calls setsid to drop the terminal,
/// the second can never reacquire one. Must run before any thread is
/// spawned, since fork only carries the calling thread into the child.
pub fn daemonize(pid_file: &Path) -> Result<()> {
    // Safe: single-threaded at this point, nothing between fork and exec
    // relies on duplicated state
    if let ForkResult::Parent { .. } = unsafe { fork() }? {
        process::exit(0);
    }
    setsid()?;
    if let ForkResult::Parent { .. } = unsafe { fork() }? {
        process::exit(0);
    }

    chdir("/")?;

    let devnull = OpenOptions::new().read(true).write(true).open("/dev/null")?;
    for fd in 0..=2 {
        dup2(devnull.as_raw_fd(), fd)?;
    }

    fs::write(pid_file, format!("{}\n", getpid()))?;
    Ok(())
}
