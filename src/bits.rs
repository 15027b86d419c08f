//! Population count and the bitmap addressing helpers built on it.
//!
//! A table stores only its occupied logical slots, packed in ascending logical
//! order. The physical position of logical slot `i` is the number of occupied
//! slots below it: `popcount(bitmap & ((1 << i) - 1))`.

use cfg_if::cfg_if;

const HEXI_FIVES: u64 = 0x5555_5555_5555_5555;
const HEXI_THREES: u64 = 0x3333_3333_3333_3333;
const HEXI_ONES: u64 = 0x0101_0101_0101_0101;
const HEXI_FS: u64 = 0x0f0f_0f0f_0f0f_0f0f;

const OCTO_FIVES: u32 = 0x5555_5555;
const OCTO_THREES: u32 = 0x3333_3333;
const OCTO_ONES: u32 = 0x0101_0101;
const OCTO_FS: u32 = 0x0f0f_0f0f;

/// Portable SWAR bit count of a 64-bit word.
#[inline]
pub const fn swar_popcount64(mut n: u64) -> usize {
    n = n - ((n >> 1) & HEXI_FIVES);
    n = (n & HEXI_THREES) + ((n >> 2) & HEXI_THREES);
    ((((n + (n >> 4)) & HEXI_FS).wrapping_mul(HEXI_ONES)) >> 56) as usize
}

/// Portable SWAR bit count of a 32-bit word.
#[inline]
pub const fn swar_popcount32(mut n: u32) -> usize {
    n = n - ((n >> 1) & OCTO_FIVES);
    n = (n & OCTO_THREES) + ((n >> 2) & OCTO_THREES);
    ((((n + (n >> 4)) & OCTO_FS).wrapping_mul(OCTO_ONES)) >> 24) as usize
}

cfg_if! {
    if #[cfg(any(
        all(target_arch = "x86_64", target_feature = "popcnt"),
        target_arch = "aarch64"
    ))] {
        /// Number of set bits in `n`.
        #[inline(always)]
        pub fn popcount(n: u64) -> usize {
            n.count_ones() as usize
        }
    } else {
        /// Number of set bits in `n`.
        #[inline(always)]
        pub fn popcount(n: u64) -> usize {
            swar_popcount64(n)
        }
    }
}

/// Mask selecting the low `bits` bits of a hash.
///
/// `bits` must be below 64.
#[inline(always)]
pub const fn level_mask(bits: usize) -> u64 {
    debug_assert!(bits < 64);
    (1u64 << bits) - 1
}

/// Bitmap flag for logical slot `ndx`.
#[inline(always)]
pub const fn flag(ndx: usize) -> u64 {
    debug_assert!(ndx < 64);
    1u64 << ndx
}

/// Physical position in the packed slot array for the logical slot whose
/// bitmap flag is `flag`.
#[inline(always)]
pub fn physical_index(bitmap: u64, flag: u64) -> usize {
    popcount(bitmap & (flag - 1))
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn slow_bit_count64(mut n: u64) -> usize {
        let mut count = 0;
        for _ in 0..64 {
            count += (n & 1) as usize;
            n >>= 1;
        }
        count
    }

    fn slow_bit_count32(mut n: u32) -> usize {
        let mut count = 0;
        for _ in 0..32 {
            count += (n & 1) as usize;
            n >>= 1;
        }
        count
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(OsRng.try_next_u64().unwrap_or(0x5eed))
    }

    #[test]
    fn swar64_matches_naive_count() {
        let mut rng = rng();
        for _ in 0..256 {
            let n: u64 = rng.random();
            assert_eq!(swar_popcount64(n), slow_bit_count64(n), "{n:#018x}");
            assert_eq!(popcount(n), slow_bit_count64(n), "{n:#018x}");
        }
    }

    #[test]
    fn swar32_matches_naive_count() {
        let mut rng = rng();
        for _ in 0..256 {
            let n: u32 = rng.random();
            assert_eq!(swar_popcount32(n), slow_bit_count32(n), "{n:#010x}");
            assert_eq!(swar_popcount32(n), n.count_ones() as usize);
        }
    }

    #[test]
    fn popcount_extremes() {
        assert_eq!(swar_popcount64(0), 0);
        assert_eq!(swar_popcount64(u64::MAX), 64);
        assert_eq!(swar_popcount32(u32::MAX), 32);
        assert_eq!(popcount(1 << 63), 1);
    }

    #[test]
    fn physical_index_counts_lower_bits() {
        let bitmap = 0b1011_0010u64;
        assert_eq!(physical_index(bitmap, flag(1)), 0);
        assert_eq!(physical_index(bitmap, flag(4)), 1);
        assert_eq!(physical_index(bitmap, flag(5)), 2);
        assert_eq!(physical_index(bitmap, flag(7)), 3);
        // an unset logical slot maps to the position it would be spliced into
        assert_eq!(physical_index(bitmap, flag(6)), 3);
        assert_eq!(physical_index(bitmap, flag(63)), 4);
    }

    #[test]
    fn masks() {
        assert_eq!(level_mask(1), 0b1);
        assert_eq!(level_mask(5), 0x1f);
        assert_eq!(level_mask(6), 0x3f);
        assert_eq!(level_mask(16), 0xffff);
    }
}
