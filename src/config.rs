// Configuration resolution for hibernate-agent
// SPDX-License-Identifier: GPL-3.0-or-later
//
// Precedence per key: explicit CLI flag > config file (and conf.d fragments,
// merged in basename order) > built-in default.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use log::debug;
use thiserror::Error;

use crate::defaults;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {0}: {1}")]
    Io(String, std::io::Error),
    #[error("invalid value for {0}: {1}")]
    Parse(String, String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Values a caller (the CLI) may force over the file and defaults
#[derive(Debug, Default)]
pub struct Overrides {
    pub swapfile: Option<PathBuf>,
    pub target_size_mb: Option<u64>,
    pub percentage_of_ram: Option<u64>,
    pub monitored_url: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub lock_in_ram: bool,
    pub log_to_syslog: bool,
    pub log_to_stderr: bool,
    pub percentage_of_ram: u64,
    pub target_size_mb: u64,
    pub swapfile: PathBuf,
    pub mkswap: String,
    pub swapon: String,
    pub hibernate: String,
    pub monitored_url: String,
    pub pid_file: PathBuf,
    pub poll_interval_secs: u64,
    pub post_trigger_delay_secs: u64,
}

impl Settings {
    /// Resolve settings from an optional config file path plus CLI
    /// overrides. A missing explicitly-given file is an error; the absence
    /// of the default file is not.
    pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut values = HashMap::new();

        match config_path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
                values.extend(parse_config(&content));
            }
            None => {
                if let Ok(content) = fs::read_to_string(defaults::CONFIG_PATH) {
                    values.extend(parse_config(&content));
                }
            }
        }

        // conf.d fragments override the main file, later basenames win
        let pattern = format!("{}/*.conf", defaults::CONFIG_FRAGMENT_DIR);
        if let Ok(entries) = glob(&pattern) {
            let mut fragments: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
            fragments.sort();
            for fragment in fragments {
                debug!("loading config fragment {}", fragment.display());
                if let Ok(content) = fs::read_to_string(&fragment) {
                    values.extend(parse_config(&content));
                }
            }
        }

        Self::from_values(&values, overrides)
    }

    fn from_values(values: &HashMap<String, String>, overrides: &Overrides) -> Result<Self> {
        // accepted for compatibility with older configs, never consumed
        if values.contains_key("check-ephemeral-volumes") {
            debug!("check-ephemeral-volumes is accepted but has no effect");
        }

        let settings = Settings {
            lock_in_ram: get_bool(values, "lock-in-ram", defaults::LOCK_IN_RAM),
            log_to_syslog: get_bool(values, "log-to-syslog", defaults::LOG_TO_SYSLOG),
            log_to_stderr: get_bool(values, "log-to-stderr", defaults::LOG_TO_STDERR),
            percentage_of_ram: overrides
                .percentage_of_ram
                .map(Ok)
                .unwrap_or_else(|| get_u64(values, "percentage-of-ram", defaults::PERCENTAGE_OF_RAM))?,
            target_size_mb: overrides
                .target_size_mb
                .map(Ok)
                .unwrap_or_else(|| get_u64(values, "target-size-mb", defaults::TARGET_SIZE_MB))?,
            swapfile: overrides.swapfile.clone().unwrap_or_else(|| {
                PathBuf::from(get_str(values, "swapfile", defaults::SWAPFILE_PATH))
            }),
            mkswap: get_str(values, "mkswap", defaults::MKSWAP_COMMAND),
            swapon: get_str(values, "swapon", defaults::SWAPON_COMMAND),
            hibernate: get_str(values, "hibernate", defaults::HIBERNATE_COMMAND),
            monitored_url: overrides
                .monitored_url
                .clone()
                .unwrap_or_else(|| get_str(values, "monitored-url", defaults::MONITORED_URL)),
            pid_file: PathBuf::from(get_str(values, "pid-file", defaults::PID_FILE)),
            poll_interval_secs: get_u64(values, "poll-interval-sec", defaults::POLL_INTERVAL_SECS)?,
            post_trigger_delay_secs: get_u64(
                values,
                "post-trigger-delay-sec",
                defaults::POST_TRIGGER_DELAY_SECS,
            )?,
        };
        Ok(settings)
    }
}

/// Parse `key = value` lines, `#` comments, blank lines ignored
fn parse_config(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    values
}

fn get_str(values: &HashMap<String, String>, key: &str, default: &str) -> String {
    values.get(key).cloned().unwrap_or_else(|| default.to_string())
}

fn get_bool(values: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match values.get(key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "yes" | "y" | "1" | "true"),
        None => default,
    }
}

fn get_u64(values: &HashMap<String, String>, key: &str, default: u64) -> Result<u64> {
    match values.get(key) {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::Parse(key.to_string(), v.clone())),
        None => Ok(default),
    }
}
