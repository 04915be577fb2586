//! # Huge Long-Long Map
//!
//! An open-addressing hash map from `u64` keys to `i64` values, held in two
//! parallel [`HugeArray`]s so it can outgrow a single allocation.
//!
//! Keys are stored shifted by one so that `0` marks a free slot; this
//! reserves [`NOT_FOUND`] as a key. A collision moves on to the next slot,
//! wrapping around at the end of the table. The table doubles once three
//! quarters of its slots are taken.

use super::huge_array::HugeArray;
use crate::mem;
use crate::primitives::NOT_FOUND;
use crate::types::GraphError;

const MIN_CAPACITY: u64 = 4;
const DEFAULT_EXPECTED_ELEMENTS: u64 = 4;
const PHI: u64 = 0x9E37_79B9_7F4A_7C15;

#[inline]
fn mix(key: u64) -> u64 {
    let h = key.wrapping_mul(PHI);
    h ^ (h >> 32)
}

/// Smallest power-of-two table holding `elements` below the load factor.
fn min_capacity(elements: u64) -> u64 {
    let mut length = elements.saturating_mul(4).div_ceil(3);
    if length == elements {
        length += 1;
    }
    length.next_power_of_two().max(MIN_CAPACITY)
}

/// Number of entries at which a table of `capacity` slots grows.
fn grow_at(capacity: u64) -> u64 {
    capacity - capacity / 4
}

enum Slot {
    Occupied(u64),
    Free(u64),
}

#[derive(Debug, Clone)]
pub struct HugeLongLongMap {
    keys: HugeArray<u64>,
    values: HugeArray<i64>,
    assigned: u64,
    mask: u64,
    resize_at: u64,
}

impl Default for HugeLongLongMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HugeLongLongMap {
    pub fn new() -> Self {
        Self::with_expected_elements(DEFAULT_EXPECTED_ELEMENTS)
    }

    /// A map sized to take `expected` entries without growing.
    pub fn with_expected_elements(expected: u64) -> Self {
        Self::with_capacity(min_capacity(expected))
    }

    fn with_capacity(capacity: u64) -> Self {
        Self {
            keys: HugeArray::new(capacity),
            values: HugeArray::new(capacity),
            assigned: 0,
            mask: capacity - 1,
            resize_at: grow_at(capacity),
        }
    }

    /// Bytes of a map sized for `expected` entries.
    #[must_use]
    pub fn memory_estimation(expected: u64) -> u64 {
        let capacity = min_capacity(expected);
        mem::size_of_instance::<Self>()
            + HugeArray::<u64>::memory_estimation(capacity)
            + HugeArray::<i64>::memory_estimation(capacity)
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.keys.size_of() + self.values.size_of()
    }

    /// Number of entries.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.assigned
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    fn stored_key(key: u64) -> Result<u64, GraphError> {
        if key == NOT_FOUND {
            return Err(GraphError::ReservedKey(key));
        }
        Ok(key + 1)
    }

    fn find_slot(&self, stored: u64) -> Slot {
        let mut slot = mix(stored) & self.mask;
        loop {
            let existing = self.keys.get(slot);
            if existing == stored {
                return Slot::Occupied(slot);
            }
            if existing == 0 {
                return Slot::Free(slot);
            }
            slot = (slot + 1) & self.mask;
        }
    }

    pub fn put(&mut self, key: u64, value: i64) -> Result<(), GraphError> {
        let stored = Self::stored_key(key)?;
        match self.find_slot(stored) {
            Slot::Occupied(slot) => self.values.set(slot, value),
            Slot::Free(slot) => self.insert(slot, stored, value),
        }
        Ok(())
    }

    /// Add `delta` to the value of `key`, inserting `delta` when absent.
    pub fn add_to(&mut self, key: u64, delta: i64) -> Result<(), GraphError> {
        let stored = Self::stored_key(key)?;
        match self.find_slot(stored) {
            Slot::Occupied(slot) => self.values.add_to(slot, delta),
            Slot::Free(slot) => self.insert(slot, stored, delta),
        }
        Ok(())
    }

    fn insert(&mut self, mut slot: u64, stored: u64, value: i64) {
        if self.assigned == self.resize_at {
            self.grow();
            slot = match self.find_slot(stored) {
                Slot::Occupied(slot) | Slot::Free(slot) => slot,
            };
        }
        self.keys.set(slot, stored);
        self.values.set(slot, value);
        self.assigned += 1;
    }

    fn grow(&mut self) {
        let capacity = (self.mask + 1) << 1;
        let old = std::mem::replace(self, Self::with_capacity(capacity));
        for (stored, value) in old.keys.iter().zip(old.values.iter()) {
            if stored == 0 {
                continue;
            }
            if let Slot::Free(slot) = self.find_slot(stored) {
                self.keys.set(slot, stored);
                self.values.set(slot, value);
            }
        }
        self.assigned = old.assigned;
        tracing::trace!(capacity, entries = self.assigned, "grew long-long map");
    }

    #[must_use]
    pub fn get(&self, key: u64) -> Option<i64> {
        let stored = Self::stored_key(key).ok()?;
        match self.find_slot(stored) {
            Slot::Occupied(slot) => Some(self.values.get(slot)),
            Slot::Free(_) => None,
        }
    }

    #[must_use]
    pub fn get_or_default(&self, key: u64, default: i64) -> i64 {
        self.get(key).unwrap_or(default)
    }

    #[must_use]
    pub fn contains_key(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// Remove every entry, keeping the table size.
    pub fn clear(&mut self) {
        self.keys.set_all(0);
        self.values.set_all(0);
        self.assigned = 0;
    }

    /// Drop every entry and shrink to the minimum table; returns the bytes
    /// the previous table held.
    pub fn release(&mut self) -> u64 {
        let freed = self.size_of();
        *self = Self::with_capacity(MIN_CAPACITY);
        freed
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.keys
            .iter()
            .zip(self.values.iter())
            .filter(|&(stored, _)| stored != 0)
            .map(|(stored, value)| (stored - 1, value))
    }
}
