// Swap target sizing policy
// SPDX-License-Identifier: GPL-3.0-or-later

pub const MIB: u64 = 1024 * 1024;

/// Compute the swap target in bytes: the larger of an absolute floor in
/// megabytes and a percentage of total RAM. The percentage may exceed 100
/// (machines that hibernate with compressed images sometimes oversize swap).
pub fn swap_target_bytes(floor_mb: u64, percentage_of_ram: u64, ram_bytes: u64) -> u64 {
    let floor = floor_mb.saturating_mul(MIB);
    // u128 so ram * percentage cannot overflow before the division
    let from_ram = (ram_bytes as u128 * percentage_of_ram as u128 / 100) as u64;
    floor.max(from_ram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_term_wins_on_large_ram() {
        // 8 GiB RAM at 100% beats a 4000 MB floor
        let target = swap_target_bytes(4000, 100, 8_589_934_592);
        assert_eq!(target, 8_589_934_592);
    }

    #[test]
    fn floor_wins_on_small_ram() {
        // 4 GiB RAM at 50% is 2 GiB; the 4000 MB floor is larger
        let target = swap_target_bytes(4000, 50, 4_294_967_296);
        assert_eq!(target, 4_194_304_000);
    }

    #[test]
    fn percentage_division_rounds_down() {
        assert_eq!(swap_target_bytes(0, 33, 100), 33);
        assert_eq!(swap_target_bytes(0, 1, 199), 1);
    }

    #[test]
    fn percentage_over_100_is_allowed() {
        assert_eq!(swap_target_bytes(0, 150, 1000), 1500);
    }

    #[test]
    fn zero_everything_is_zero() {
        assert_eq!(swap_target_bytes(0, 0, 0), 0);
    }
}
