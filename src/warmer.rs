// Swap warm-up - force physical allocation of every block with direct I/O
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use thiserror::Error;

use crate::meminfo::get_page_size;

/// Write granularity; cancellation is only observed between chunks
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Non-zero fill so storage layers cannot dedupe or hole-punch the blocks,
/// which would leave them unallocated despite the write
const FILL_BYTE: u8 = 0xa5;

#[derive(Error, Debug)]
pub enum WarmupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("write returned 0 after {written} bytes")]
    ShortWrite { written: u64 },
}

pub type Result<T> = std::result::Result<T, WarmupError>;

/// Number of whole chunks needed to cover `target_bytes`
pub fn chunks_needed(target_bytes: u64) -> u64 {
    target_bytes.div_ceil(CHUNK_SIZE as u64)
}

/// Write every byte of the swap file with uncached synchronous I/O so the
/// backing store physically materialises each block. Whole chunks only: an
/// uncancelled run writes `chunks_needed(target) * CHUNK_SIZE` bytes, so the
/// file ends at least `target_bytes` long.
///
/// `cancel` is checked between chunks; on cancellation the file is left at
/// whatever length was reached and the caller proceeds to activation anyway
/// (a partially warmed swap beats missing the hibernation deadline).
///
/// Returns the number of bytes written.
pub fn warm(path: &Path, target_bytes: u64, cancel: &AtomicBool) -> Result<u64> {
    let mut file = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_DIRECT | libc::O_SYNC)
        .open(path)?;

    // O_DIRECT requires a block-aligned buffer; over-allocate and slice at
    // the first page boundary
    let align = get_page_size() as usize;
    let backing = vec![FILL_BYTE; CHUNK_SIZE + align];
    let offset = backing.as_ptr().align_offset(align);
    let chunk = &backing[offset..offset + CHUNK_SIZE];

    let total_chunks = chunks_needed(target_bytes);
    let mut written: u64 = 0;
    while written < target_bytes {
        if cancel.load(Ordering::Relaxed) {
            info!(
                "warm-up cancelled at {} of {} chunks",
                written / CHUNK_SIZE as u64,
                total_chunks
            );
            break;
        }
        let mut done = 0usize;
        while done < CHUNK_SIZE {
            let n = file.write(&chunk[done..])?;
            if n == 0 {
                return Err(WarmupError::ShortWrite { written });
            }
            done += n;
        }
        written += CHUNK_SIZE as u64;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunks_needed(0), 0);
        assert_eq!(chunks_needed(1), 1);
        assert_eq!(chunks_needed(CHUNK_SIZE as u64), 1);
        assert_eq!(chunks_needed(CHUNK_SIZE as u64 + 1), 2);
        // 8 GiB is exactly 8192 chunks
        assert_eq!(chunks_needed(8_589_934_592), 8192);
    }

    #[test]
    fn fill_byte_defeats_zero_dedup() {
        assert_ne!(FILL_BYTE, 0);
    }

    #[test]
    fn aligned_slice_is_page_aligned() {
        let align = get_page_size() as usize;
        let backing = vec![FILL_BYTE; CHUNK_SIZE + align];
        let offset = backing.as_ptr().align_offset(align);
        let chunk = &backing[offset..offset + CHUNK_SIZE];
        assert_eq!(chunk.as_ptr() as usize % align, 0);
        assert_eq!(chunk.len(), CHUNK_SIZE);
    }
}
