// hibernate-agent - Swap preparation and stop-notification handling for cloud hosts
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod activator;
pub mod allocator;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod helpers;
pub mod init;
pub mod logging;
pub mod meminfo;
pub mod sizing;
pub mod snapdev;
pub mod swaps;
pub mod warmer;
pub mod watcher;

use std::sync::atomic::{AtomicBool, Ordering};

/// Global shutdown flag for signal handling
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Check if shutdown was requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Acquire)
}

/// Request shutdown
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::Release);
}
