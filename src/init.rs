// Background swap initialization coordinator
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};
use thiserror::Error;

use crate::activator;
use crate::allocator::{self, AllocationError};
use crate::snapdev::{self, RegistrationError};
use crate::warmer::{self, WarmupError};

#[derive(Error, Debug)]
pub enum InitError {
    #[error("swap allocation failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("swap warm-up failed: {0}")]
    Warmup(#[from] WarmupError),
    #[error("offset registration failed: {0}")]
    Registration(#[from] RegistrationError),
    #[error("initialization worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, InitError>;

/// Everything the background pipeline needs, resolved up front
#[derive(Debug, Clone)]
pub struct InitPlan {
    pub swapfile: PathBuf,
    pub target_bytes: u64,
    pub mkswap: String,
    pub swapon: String,
}

/// Runs allocate → warm → activate → register on one background worker.
///
/// The cancellation flag is written once by the owning thread and polled by
/// the worker between warm-up chunks; the deferred error is written once by
/// the worker and handed over through the join, so no further locking is
/// needed.
pub struct InitCoordinator {
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl InitCoordinator {
    /// Start the pipeline on a background thread
    pub fn start(plan: InitPlan) -> Self {
        Self::spawn(move |cancel| run_pipeline(&plan, cancel))
    }

    pub(crate) fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(&AtomicBool) -> Result<()> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let worker = thread::spawn(move || work(&flag));
        Self {
            cancel,
            worker: Some(worker),
        }
    }

    /// Non-blocking completion check. The first call that observes the
    /// worker finished consumes it and surfaces any error it captured; from
    /// then on the coordinator reports completed with no error.
    pub fn poll_completion(&mut self) -> Result<bool> {
        match self.worker.take() {
            None => Ok(true),
            Some(handle) if handle.is_finished() => {
                consume(handle)?;
                Ok(true)
            }
            Some(handle) => {
                self.worker = Some(handle);
                Ok(false)
            }
        }
    }

    /// Signal cancellation and block until the worker stops, then surface
    /// any captured error. The wait is bounded only by the remaining direct
    /// I/O. No-op when completion was already observed.
    pub fn force_complete(&mut self) -> Result<()> {
        self.cancel.store(true, Ordering::Release);
        match self.worker.take() {
            None => Ok(()),
            Some(handle) => consume(handle),
        }
    }
}

fn consume(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle.join().map_err(|_| InitError::WorkerPanicked)?
}

fn run_pipeline(plan: &InitPlan, cancel: &AtomicBool) -> Result<()> {
    allocator::ensure_sized(&plan.swapfile, plan.target_bytes)?;

    let written = warmer::warm(&plan.swapfile, plan.target_bytes, cancel)?;
    if written < plan.target_bytes {
        warn!(
            "warm-up stopped early at {} of {} bytes, activating anyway",
            written, plan.target_bytes
        );
    }

    activator::activate(&plan.swapfile, &plan.mkswap, &plan.swapon);
    snapdev::register_offset()?;
    info!("swap initialization pipeline finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapdev::RegistrationError;
    use std::time::Duration;

    fn wait_for_completion(c: &mut InitCoordinator) -> Result<bool> {
        for _ in 0..500 {
            match c.poll_completion() {
                Ok(false) => thread::sleep(Duration::from_millis(10)),
                done => return done,
            }
        }
        panic!("worker never finished");
    }

    #[test]
    fn poll_reports_running_then_done() {
        let mut c = InitCoordinator::spawn(|_| {
            thread::sleep(Duration::from_millis(50));
            Ok(())
        });
        assert!(!c.poll_completion().unwrap());
        assert!(wait_for_completion(&mut c).unwrap());
        // already consumed: stays done
        assert!(c.poll_completion().unwrap());
    }

    #[test]
    fn force_complete_stops_a_cooperative_worker() {
        let mut c = InitCoordinator::spawn(|cancel| {
            while !cancel.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        });
        c.force_complete().unwrap();
        // idempotent after the worker is consumed
        c.force_complete().unwrap();
        assert!(c.poll_completion().unwrap());
    }

    #[test]
    fn deferred_error_surfaces_exactly_once() {
        let mut c =
            InitCoordinator::spawn(|_| Err(InitError::Registration(RegistrationError::NoActiveSwap)));
        let err = wait_for_completion(&mut c).unwrap_err();
        assert!(matches!(
            err,
            InitError::Registration(RegistrationError::NoActiveSwap)
        ));
        // consumed: no error on later calls
        assert!(c.poll_completion().unwrap());
        c.force_complete().unwrap();
    }

    #[test]
    fn force_complete_surfaces_the_error_too() {
        let mut c = InitCoordinator::spawn(|cancel| {
            while !cancel.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
            Err(InitError::Registration(RegistrationError::NoActiveSwap))
        });
        assert!(c.force_complete().is_err());
        assert!(c.poll_completion().unwrap());
    }

    #[test]
    fn panicking_worker_is_reported_not_lost() {
        let mut c = InitCoordinator::spawn(|_| panic!("boom"));
        let err = wait_for_completion(&mut c).unwrap_err();
        assert!(matches!(err, InitError::WorkerPanicked));
    }
}
