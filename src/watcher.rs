// Termination watcher - polls the notification endpoint and triggers hibernation
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::activator::render_template;
use crate::config::Settings;
use crate::defaults;
use crate::helpers::run_shell;
use crate::init::{InitCoordinator, InitError};
use crate::is_shutdown;

/// Response bodies containing this substring count as a positive signal
const SIGNAL_TOKEN: &str = "hibernate";

/// Polls the monitored URL on a fixed cadence while any pending swap
/// initialization runs in the background. On a positive signal the pending
/// initialization is force-completed first so hibernation is never gated on
/// a long warm-up.
pub struct TerminationWatcher {
    url: String,
    hibernate_template: String,
    swapfile: PathBuf,
    poll_interval: Duration,
    post_trigger_delay: Duration,
    agent: ureq::Agent,
    coordinator: Option<InitCoordinator>,
}

impl TerminationWatcher {
    pub fn new(settings: &Settings, coordinator: Option<InitCoordinator>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
            .build();
        Self {
            url: settings.monitored_url.clone(),
            hibernate_template: settings.hibernate.clone(),
            swapfile: settings.swapfile.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            post_trigger_delay: Duration::from_secs(settings.post_trigger_delay_secs),
            agent,
            coordinator,
        }
    }

    /// Poll until the process is stopped. Initialization errors deferred
    /// from the background worker propagate out of here; everything
    /// network-related is swallowed.
    pub fn run(&mut self) -> Result<(), InitError> {
        info!("watching {} for stop notifications", self.url);
        loop {
            if is_shutdown() {
                info!("shutdown requested, stopping watcher");
                if let Some(mut c) = self.coordinator.take() {
                    c.force_complete()?;
                }
                return Ok(());
            }

            if let Some(c) = self.coordinator.as_mut() {
                if c.poll_completion()? {
                    info!("background swap initialization complete");
                    self.coordinator = None;
                }
            }

            if check_signal(&self.agent, &self.url) {
                info!("stop notification received, triggering hibernation");
                if let Some(mut c) = self.coordinator.take() {
                    c.force_complete()?;
                }
                self.trigger_hibernate();
                // the instance may not suspend immediately; back off so a
                // still-present signal does not fire again within the delay
                thread::sleep(self.post_trigger_delay);
            }

            thread::sleep(self.poll_interval);
        }
    }

    fn trigger_hibernate(&self) {
        let cmdline = render_template(&self.hibernate_template, &self.swapfile);
        info!("hibernate: {}", cmdline);
        match run_shell(&cmdline) {
            Ok(true) => {}
            Ok(false) => warn!("hibernate command failed: {}", cmdline),
            Err(e) => warn!("hibernate command could not run: {}", e),
        }
    }
}

/// One poll of the notification endpoint. Any transport error, non-2xx
/// status, or unreadable body is treated as "no signal"; the watcher must
/// never crash on transient network trouble.
pub(crate) fn check_signal(agent: &ureq::Agent, url: &str) -> bool {
    match agent.get(url).call() {
        Ok(response) => match response.into_string() {
            Ok(body) => body.contains(SIGNAL_TOKEN),
            Err(e) => {
                debug!("notification body unreadable: {}", e);
                false
            }
        },
        Err(e) => {
            debug!("notification poll failed: {}", e);
            false
        }
    }
}
