// Active swap probe for /proc/swaps
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

pub const PROC_SWAPS: &str = "/proc/swaps";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("cannot read {PROC_SWAPS}: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// The first entry of the kernel swap table. Only one swap extent matters
/// for hibernation; additional entries are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExtent {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Read the first active swap extent, or None when no swap is enabled.
pub fn active_swap_extent() -> Result<Option<SwapExtent>> {
    let content = fs::read_to_string(PROC_SWAPS)?;
    Ok(parse_first_extent(&content))
}

/// Parse /proc/swaps content:
///   Filename    Type        Size      Used   Priority
///   /swap       file        4095996   0      -2
/// Size is reported in kibibytes.
fn parse_first_extent(table: &str) -> Option<SwapExtent> {
    for line in table.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            continue;
        }
        // a garbled size must not masquerade as a 0-byte extent
        let Ok(size_kb) = fields[2].parse::<u64>() else {
            continue;
        };
        return Some(SwapExtent {
            path: PathBuf::from(fields[0]),
            size_bytes: size_kb * 1024,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn first_entry_is_parsed() {
        let table = "Filename\tType\tSize\t\tUsed\tPriority\n\
                     /swap                                  file\t\t4095996\t0\t-2\n\
                     /dev/sda3                              partition\t1048572\t0\t-3\n";
        let extent = parse_first_extent(table).unwrap();
        assert_eq!(extent.path, Path::new("/swap"));
        assert_eq!(extent.size_bytes, 4_095_996 * 1024);
    }

    #[test]
    fn header_only_means_no_swap() {
        assert_eq!(parse_first_extent("Filename\tType\tSize\tUsed\tPriority\n"), None);
    }

    #[test]
    fn unparseable_size_is_skipped_not_zeroed() {
        let table = "Filename Type Size Used Priority\n\
                     /bad file ??? 0 -2\n\
                     /swap file 2048 0 -3\n";
        let extent = parse_first_extent(table).unwrap();
        assert_eq!(extent.path, Path::new("/swap"));
        assert_eq!(extent.size_bytes, 2048 * 1024);

        let only_bad = "Filename Type Size Used Priority\n/bad file ??? 0 -2\n";
        assert_eq!(parse_first_extent(only_bad), None);
    }

    #[test]
    fn short_lines_are_skipped() {
        let table = "Filename Type Size Used Priority\ngarbage\n/swap file 1024 0 -2\n";
        let extent = parse_first_extent(table).unwrap();
        assert_eq!(extent.size_bytes, 1024 * 1024);
    }
}
