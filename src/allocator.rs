// Swap file allocation - preallocate or sparse-extend to the target size
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::{self, OpenOptions, Permissions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use log::{info, warn};
use nix::fcntl::{fallocate, FallocateFlags};
use thiserror::Error;

use crate::sizing::MIB;

/// Free space headroom required beyond the target size before building
const FREE_SPACE_HEADROOM: u64 = 10 * MIB;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preallocation failed ({fast}) and sparse fallback failed ({fallback})")]
    BothPathsFailed {
        fast: nix::Error,
        fallback: std::io::Error,
    },
    #[error("statvfs failed for {0}: {1}")]
    Statvfs(String, nix::Error),
}

pub type Result<T> = std::result::Result<T, AllocationError>;

/// Check whether the filesystem holding `path` has room for a swap file of
/// `target_bytes` plus headroom. Consulted once at startup, before any file
/// is created.
pub fn has_room_for(path: &Path, target_bytes: u64) -> Result<bool> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("/"));
    let stat = nix::sys::statvfs::statvfs(parent)
        .map_err(|e| AllocationError::Statvfs(parent.display().to_string(), e))?;
    // f_bavail counts fragments, not blocks
    let free_bytes = stat.blocks_available() * stat.fragment_size();
    Ok(free_bytes >= target_bytes + FREE_SPACE_HEADROOM)
}

/// Make sure the file at `path` is at least `target_bytes` long.
///
/// A pre-existing file of sufficient length is trusted as-is; length alone is
/// taken as proof of adequate allocation, without checking physical backing
/// or swap-table membership. Otherwise the file is grown with fallocate(2),
/// or, when the filesystem refuses, by seeking to the last byte and writing
/// it (which leaves the file sparse until warm-up fills it in).
///
/// Swap may end up holding process memory, so the file is always owner-only.
pub fn ensure_sized(path: &Path, target_bytes: u64) -> Result<()> {
    if target_bytes == 0 {
        return Ok(());
    }

    if let Ok(meta) = fs::metadata(path) {
        if meta.len() >= target_bytes {
            info!(
                "swap file {} already {} bytes, leaving it alone",
                path.display(),
                meta.len()
            );
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; clamp pre-existing files too
    fs::set_permissions(path, Permissions::from_mode(0o600))?;

    match fallocate(
        file.as_raw_fd(),
        FallocateFlags::empty(),
        0,
        target_bytes as libc::off_t,
    ) {
        Ok(()) => {
            info!(
                "preallocated {} to {} bytes",
                path.display(),
                target_bytes
            );
            Ok(())
        }
        Err(fast) => {
            warn!(
                "fallocate on {} failed ({}), falling back to sparse extend",
                path.display(),
                fast
            );
            let sparse = file
                .seek(SeekFrom::Start(target_bytes - 1))
                .and_then(|_| file.write_all(&[0]));
            match sparse {
                Ok(()) => Ok(()),
                Err(fallback) => Err(AllocationError::BothPathsFailed { fast, fallback }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hibernate-agent-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn grows_file_to_target() {
        let path = temp_path("grow");
        let _ = fs::remove_file(&path);
        ensure_sized(&path, MIB).unwrap();
        assert!(fs::metadata(&path).unwrap().len() >= MIB);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_is_owner_only() {
        let path = temp_path("perms");
        let _ = fs::remove_file(&path);
        ensure_sized(&path, 4096).unwrap();
        let mode = fs::metadata(&path).unwrap().mode();
        assert_eq!(mode & 0o777, 0o600);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn large_enough_file_is_untouched() {
        let path = temp_path("untouched");
        let _ = fs::remove_file(&path);
        ensure_sized(&path, 2 * MIB).unwrap();
        let before = fs::metadata(&path).unwrap().len();
        ensure_sized(&path, MIB).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), before);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn zero_target_is_a_noop() {
        let path = temp_path("zero");
        let _ = fs::remove_file(&path);
        ensure_sized(&path, 0).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn temp_dir_has_room_for_a_page() {
        assert!(has_room_for(&temp_path("room"), 4096).unwrap());
    }
}
