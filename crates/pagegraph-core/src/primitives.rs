//! # Storage Primitives
//!
//! Fixed constants of the pagegraph storage format.
//!
//! These values are compiled into the binary. Changing any of them changes
//! the memory layout or the compressed byte format, so they are not tunable
//! at runtime.
//!
//! ## Primitives
//!
//! 1. **Paging Primitive**: Page size and the single-allocation limit of huge arrays.
//! 2. **Block Primitive**: Number of ids per compressed adjacency block.
//! 3. **Sentinel Primitive**: The value cursors return when they run off the end.

/// Size of one huge-array page in bytes.
///
/// - Element pages hold `PAGE_SIZE_IN_BYTES / size_of::<T>()` elements.
/// - The element page shift is derived from this once per element type.
pub const PAGE_SIZE_IN_BYTES: usize = 1 << PAGE_SHIFT_IN_BYTES;

/// `log2(PAGE_SIZE_IN_BYTES)`.
pub const PAGE_SHIFT_IN_BYTES: u32 = 15;

/// Largest element count a huge array keeps in a single allocation.
///
/// Arrays with `size <= MAX_ARRAY_LENGTH` use the single-page representation,
/// larger ones are split into pages.
pub const MAX_ARRAY_LENGTH: u64 = 1 << 28;

/// Number of target ids per compressed adjacency block.
///
/// Every block carries a header with the delta sum of its ids and its payload
/// length, so a reader can skip a block whose maximum is known to be too small.
/// Only the last block of a list may hold fewer ids.
pub const BLOCK_SIZE: usize = 64;

/// Shift of the byte pages holding compressed adjacency lists (256 KiB).
///
/// Lists longer than one page get a dedicated oversized page.
pub const ADJACENCY_PAGE_SHIFT: u32 = 18;

/// Size of a compressed adjacency byte page.
pub const ADJACENCY_PAGE_SIZE: usize = 1 << ADJACENCY_PAGE_SHIFT;

/// Returned by cursor operations that run off the end of an adjacency list.
///
/// Running off the end is an expected traversal outcome, not an error.
pub const NOT_FOUND: u64 = u64::MAX;

/// Default relationship property value: absent.
pub const NO_PROPERTY_VALUE: f64 = f64::NAN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_matches_shift() {
        assert_eq!(PAGE_SIZE_IN_BYTES, 32 * 1024);
        assert_eq!(ADJACENCY_PAGE_SIZE, 256 * 1024);
    }

    #[test]
    fn block_size_is_power_of_two() {
        assert!(BLOCK_SIZE.is_power_of_two());
    }

    #[test]
    fn not_found_is_never_a_valid_id() {
        assert!(NOT_FOUND > MAX_ARRAY_LENGTH * MAX_ARRAY_LENGTH);
    }
}
