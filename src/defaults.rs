// Centralised default values for all configuration keys.
// SPDX-License-Identifier: GPL-3.0-or-later
//
// Every key in the config schema has its fallback here, so the resolver,
// the CLI help text, and the shipped example config cannot drift apart.

// ── Paths ────────────────────────────────────────────────────────────────────

pub const CONFIG_PATH: &str = "/etc/hibernate-agent.conf";
pub const CONFIG_FRAGMENT_DIR: &str = "/etc/hibernate-agent.conf.d";
pub const SWAPFILE_PATH: &str = "/swap";
pub const PID_FILE: &str = "/var/run/hibernate-agent.pid";

// ── Sizing ───────────────────────────────────────────────────────────────────

pub const TARGET_SIZE_MB: u64 = 4000;
pub const PERCENTAGE_OF_RAM: u64 = 100;

// ── Commands ─────────────────────────────────────────────────────────────────

pub const MKSWAP_COMMAND: &str = "mkswap {swapfile}";
pub const SWAPON_COMMAND: &str = "swapon {swapfile}";
pub const HIBERNATE_COMMAND: &str = "systemctl hibernate";

// ── Termination watch ────────────────────────────────────────────────────────

pub const MONITORED_URL: &str = "http://169.254.169.254/latest/meta-data/spot/instance-action";
pub const POLL_INTERVAL_SECS: u64 = 1;
pub const POST_TRIGGER_DELAY_SECS: u64 = 2;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ── Behaviour toggles ────────────────────────────────────────────────────────

pub const LOCK_IN_RAM: bool = true;
pub const LOG_TO_SYSLOG: bool = true;
pub const LOG_TO_STDERR: bool = true;
