// hibernate-agent - Swap preparation and stop-notification handling for cloud hosts
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};

use hibernate_agent::config::{Overrides, Settings};
use hibernate_agent::helpers::{am_i_root, notify_ready, notify_stopping};
use hibernate_agent::init::{InitCoordinator, InitPlan};
use hibernate_agent::watcher::TerminationWatcher;
use hibernate_agent::{allocator, daemon, logging, meminfo, request_shutdown, sizing, snapdev, swaps};

#[derive(Parser)]
#[command(name = "hibernate-agent")]
#[command(about = "Prepare swap for suspend-to-disk and react to stop notifications")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stay in the foreground instead of daemonizing
    #[arg(short, long)]
    foreground: bool,

    /// Swap file path (overrides config)
    #[arg(long)]
    swapfile: Option<PathBuf>,

    /// Minimum swap size in megabytes (overrides config)
    #[arg(long)]
    target_size_mb: Option<u64>,

    /// Swap size as a percentage of RAM (overrides config)
    #[arg(long)]
    percentage_of_ram: Option<u64>,

    /// Notification URL to poll for the stop signal (overrides config)
    #[arg(long)]
    monitored_url: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    am_i_root()?;

    let overrides = Overrides {
        swapfile: cli.swapfile.clone(),
        target_size_mb: cli.target_size_mb,
        percentage_of_ram: cli.percentage_of_ram,
        monitored_url: cli.monitored_url.clone(),
    };
    let settings = Settings::resolve(cli.config.as_deref(), &overrides)?;

    // in the foreground stderr stays useful regardless of the config toggle
    logging::init(
        settings.log_to_syslog,
        settings.log_to_stderr || cli.foreground,
        cli.verbose,
    )?;

    let ram_bytes = meminfo::get_ram_size()?;
    let target_bytes = sizing::swap_target_bytes(
        settings.target_size_mb,
        settings.percentage_of_ram,
        ram_bytes,
    );
    info!(
        "RAM {} bytes, swap target {} bytes (floor {} MB, {}% of RAM)",
        ram_bytes, target_bytes, settings.target_size_mb, settings.percentage_of_ram
    );

    // Startup decision: skip, fail, or build. Made once, synchronously,
    // before the process detaches.
    let build = match swaps::active_swap_extent()? {
        Some(extent) if extent.size_bytes >= target_bytes => {
            info!(
                "active swap {} ({} bytes) is already sufficient",
                extent.path.display(),
                extent.size_bytes
            );
            // existing swap never went through the pipeline; registration is
            // idempotent, so just (re)register it here, fatally on error
            snapdev::register_offset()?;
            false
        }
        Some(extent) => {
            return Err(format!(
                "active swap {} is {} bytes, smaller than the {} byte target; \
                 refusing to manage it",
                extent.path.display(),
                extent.size_bytes,
                target_bytes
            )
            .into());
        }
        None => {
            if !allocator::has_room_for(&settings.swapfile, target_bytes)? {
                return Err(format!(
                    "not enough free space for a {} byte swap file at {}",
                    target_bytes,
                    settings.swapfile.display()
                )
                .into());
            }
            true
        }
    };

    if !cli.foreground {
        daemon::daemonize(&settings.pid_file)?;
    }

    // after daemonize: the fork would have stranded the handler thread
    ctrlc::set_handler(request_shutdown)?;

    if settings.lock_in_ram {
        use nix::sys::mman::{mlockall, MlockAllFlags};
        if let Err(e) = mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
            warn!("mlockall failed ({}), the agent itself may get swapped out", e);
        }
    }

    let coordinator = build.then(|| {
        info!(
            "building swap at {} in the background",
            settings.swapfile.display()
        );
        InitCoordinator::start(InitPlan {
            swapfile: settings.swapfile.clone(),
            target_bytes,
            mkswap: settings.mkswap.clone(),
            swapon: settings.swapon.clone(),
        })
    });

    notify_ready();
    let mut watcher = TerminationWatcher::new(&settings, coordinator);
    let result = watcher.run();
    notify_stopping();
    Ok(result?)
}
