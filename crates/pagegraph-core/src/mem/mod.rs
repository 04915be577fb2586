//! # Memory Accounting
//!
//! Byte-size arithmetic shared by every array and topology type.
//!
//! Estimates are pure functions of sizes and page geometry, so callers can
//! predict a footprint before anything is allocated. Instances report the
//! same numbers through `size_of()` once allocated.

use serde::Serialize;
use std::fmt;
use std::ops::Add;

/// Bytes of a `Vec<T>` header plus `len` elements.
#[must_use]
pub const fn size_of_vec<T>(len: u64) -> u64 {
    std::mem::size_of::<Vec<T>>() as u64 + len * std::mem::size_of::<T>() as u64
}

/// Bytes of `len` elements of `T`, without any header.
#[must_use]
pub const fn size_of_elements<T>(len: u64) -> u64 {
    len * std::mem::size_of::<T>() as u64
}

/// Bytes of the struct `T` itself.
#[must_use]
pub const fn size_of_instance<T>() -> u64 {
    std::mem::size_of::<T>() as u64
}

/// Number of pages needed to hold `size` elements with `page_shift`.
#[must_use]
pub const fn num_pages(size: u64, page_shift: u32) -> usize {
    let page_size = 1u64 << page_shift;
    size.div_ceil(page_size) as usize
}

/// Element page shift for a page of `page_size_in_bytes` holding `element_size`-byte values.
#[must_use]
pub const fn page_shift_for(page_size_in_bytes: usize, element_size: usize) -> u32 {
    page_size_in_bytes.trailing_zeros() - element_size.trailing_zeros()
}

const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a byte count with binary units, e.g. `1536` -> `1.50 KiB`.
#[must_use]
pub fn human_readable(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} {}", bytes, UNITS[0]);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

// =============================================================================
// MEMORY RANGE
// =============================================================================

/// An inclusive range of byte sizes, for estimates that depend on data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryRange {
    pub min: u64,
    pub max: u64,
}

impl MemoryRange {
    #[must_use]
    pub const fn of(bytes: u64) -> Self {
        Self {
            min: bytes,
            max: bytes,
        }
    }

    #[must_use]
    pub const fn between(min: u64, max: u64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::of(0)
    }

    #[must_use]
    pub const fn times(self, count: u64) -> Self {
        Self {
            min: self.min.saturating_mul(count),
            max: self.max.saturating_mul(count),
        }
    }

    /// Smallest range covering both.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        let min = if self.min < other.min { self.min } else { other.min };
        let max = if self.max > other.max { self.max } else { other.max };
        Self { min, max }
    }

    #[must_use]
    pub const fn is_exact(self) -> bool {
        self.min == self.max
    }
}

impl Add for MemoryRange {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            min: self.min.saturating_add(rhs.min),
            max: self.max.saturating_add(rhs.max),
        }
    }
}

impl std::iter::Sum for MemoryRange {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::empty(), |acc, r| acc + r)
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "{}", human_readable(self.min))
        } else {
            write!(
                f,
                "[{} ... {}]",
                human_readable(self.min),
                human_readable(self.max)
            )
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_accounting_includes_header() {
        assert_eq!(size_of_vec::<u64>(0), 24);
        assert_eq!(size_of_vec::<u64>(10), 24 + 80);
        assert_eq!(size_of_vec::<u8>(3), 27);
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(num_pages(0, 12), 0);
        assert_eq!(num_pages(1, 12), 1);
        assert_eq!(num_pages(4096, 12), 1);
        assert_eq!(num_pages(4097, 12), 2);
    }

    #[test]
    fn page_shift_per_element_size() {
        assert_eq!(page_shift_for(1 << 15, 8), 12);
        assert_eq!(page_shift_for(1 << 15, 4), 13);
        assert_eq!(page_shift_for(1 << 15, 1), 15);
    }

    #[test]
    fn human_readable_units() {
        assert_eq!(human_readable(512), "512 B");
        assert_eq!(human_readable(1536), "1.50 KiB");
        assert_eq!(human_readable(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn range_arithmetic() {
        let a = MemoryRange::between(10, 20);
        let b = MemoryRange::of(5);
        assert_eq!(a + b, MemoryRange::between(15, 25));
        assert_eq!(a.times(3), MemoryRange::between(30, 60));
        assert_eq!(a.union(MemoryRange::between(2, 12)), MemoryRange::between(2, 20));
        assert_eq!(
            [a, b].into_iter().sum::<MemoryRange>(),
            MemoryRange::between(15, 25)
        );
    }

    #[test]
    fn between_normalizes_order() {
        assert_eq!(MemoryRange::between(9, 3), MemoryRange::between(3, 9));
    }
}
