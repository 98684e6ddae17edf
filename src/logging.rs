// Logging sinks - stderr and/or syslog behind the log facade
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use syslog::{Facility, Formatter3164};

type Syslogger = syslog::Logger<syslog::LoggerBackend, Formatter3164>;

struct AgentLogger {
    to_stderr: bool,
    syslog: Option<Mutex<Syslogger>>,
}

impl Log for AgentLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}", record.args());
        if self.to_stderr {
            eprintln!("{:<5} {}", record.level(), message);
        }
        if let Some(sink) = &self.syslog {
            if let Ok(mut logger) = sink.lock() {
                let _ = match record.level() {
                    Level::Error => logger.err(&message),
                    Level::Warn => logger.warning(&message),
                    Level::Info => logger.info(&message),
                    Level::Debug | Level::Trace => logger.debug(&message),
                };
            }
        }
    }

    fn flush(&self) {}
}

/// Install the global logger according to the resolved config toggles.
/// When syslog is requested but unreachable the agent keeps running with
/// whatever sinks remain.
pub fn init(to_syslog: bool, to_stderr: bool, verbose: u8) -> Result<(), log::SetLoggerError> {
    let syslog = if to_syslog {
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: "hibernate-agent".into(),
            pid: std::process::id(),
        };
        match syslog::unix(formatter) {
            Ok(logger) => Some(Mutex::new(logger)),
            Err(e) => {
                eprintln!("WARN  syslog unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    log::set_boxed_logger(Box::new(AgentLogger { to_stderr, syslog }))?;
    log::set_max_level(level);
    Ok(())
}
