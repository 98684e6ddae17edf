// Kernel hibernation offset registration via /dev/snapshot
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::{self, File};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use log::info;
use nix::ioctl_write_ptr;
use thiserror::Error;

use crate::swaps::{active_swap_extent, ProbeError, PROC_SWAPS};

const SNAPSHOT_PATH: &str = "/dev/snapshot";

// FIBMAP is _IO(0x00, 1); takes the logical block in and returns the
// physical block through the same int
const FIBMAP: libc::c_ulong = 1;

const SNAPSHOT_IOC_MAGIC: u8 = b'3';

/// Layout mandated by the SNAPSHOT_SET_SWAP_AREA ioctl
/// (struct resume_swap_area in the kernel uapi, which is packed)
#[repr(C, packed)]
struct ResumeSwapArea {
    offset: u64,
    dev: u32,
}

ioctl_write_ptr!(
    snapshot_set_swap_area,
    SNAPSHOT_IOC_MAGIC,
    13,
    ResumeSwapArea
);

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("no active swap extent in {PROC_SWAPS}")]
    NoActiveSwap,
    #[error("{0}")]
    Probe(#[from] ProbeError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("FIBMAP ioctl failed on {0}: {1}")]
    Fibmap(PathBuf, io::Error),
    #[error("SNAPSHOT_SET_SWAP_AREA ioctl failed: {0}")]
    SetSwapArea(nix::Error),
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Tell the kernel where the hibernation image should be written: the device
/// holding the active swap file and the file's first physical block on it.
///
/// Re-reads the swap table rather than trusting any cached path, so it works
/// both for freshly activated swap and for swap that was already adequate at
/// startup. Safe to call repeatedly; the kernel just overwrites the area.
pub fn register_offset() -> Result<()> {
    let extent = active_swap_extent()?.ok_or(RegistrationError::NoActiveSwap)?;
    let device_id = fs::metadata(&extent.path)?.dev() as u32;

    let swapfile = File::open(&extent.path)?;
    let offset = first_physical_block(&swapfile)
        .map_err(|e| RegistrationError::Fibmap(extent.path.clone(), e))?;

    let area = ResumeSwapArea {
        offset,
        dev: device_id,
    };
    let snapshot = File::open(SNAPSHOT_PATH)?;
    unsafe { snapshot_set_swap_area(snapshot.as_raw_fd(), &area) }
        .map_err(RegistrationError::SetSwapArea)?;

    info!(
        "registered swap area for {}: block {} on device {:#x}",
        extent.path.display(),
        offset,
        device_id
    );
    Ok(())
}

/// Resolve the first physical block of a regular file through FIBMAP
fn first_physical_block(file: &File) -> io::Result<u64> {
    let mut block: libc::c_int = 0;
    // Safe: FIBMAP reads and writes a single int we own
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), FIBMAP, &mut block as *mut libc::c_int) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(block as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_swap_area_matches_kernel_layout() {
        // packed u64 + u32, no padding
        assert_eq!(std::mem::size_of::<ResumeSwapArea>(), 12);
    }

    #[test]
    fn no_swap_entry_reports_no_active_swap() {
        // Only meaningful on hosts without swap; on others register_offset
        // would need /dev/snapshot, so just exercise the error formatting.
        let err = RegistrationError::NoActiveSwap;
        assert!(err.to_string().contains("/proc/swaps"));
    }
}
