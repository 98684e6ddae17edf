// Memory information parser for /proc/meminfo
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemInfoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MemTotal missing from /proc/meminfo")]
    MissingMemTotal,
}

pub type Result<T> = std::result::Result<T, MemInfoError>;

/// Get total RAM in bytes
pub fn get_ram_size() -> Result<u64> {
    let content = fs::read_to_string("/proc/meminfo")?;
    parse_mem_total(&content).ok_or(MemInfoError::MissingMemTotal)
}

/// Parse the "MemTotal:   NNN kB" line into bytes
fn parse_mem_total(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kb: u64 = rest.trim().split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

/// Get page size from system
pub fn get_page_size() -> u64 {
    nix::unistd::sysconf(nix::unistd::SysconfVar::PAGE_SIZE)
        .ok()
        .flatten()
        .unwrap_or(4096) as u64
}
