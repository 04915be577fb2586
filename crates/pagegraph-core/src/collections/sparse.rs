//! # Sparse Long Array
//!
//! A rank/select id map over a bit set. The member ids in `[0, capacity)`
//! are numbered densely in ascending order.
//!
//! ```text
//! words          one bit per id, 64 ids per word
//! block_offsets  mapped id of the first member of each block of 64 words
//! ```
//!
//! Mapping an id counts bits inside one block. Mapping back binary-searches
//! the block offsets, then selects the bit inside that block.

use super::huge_array::HugeArray;
use crate::mem;
use crate::primitives::NOT_FOUND;
use crate::types::GraphError;

const WORD_SHIFT: u32 = 6;
const WORD_MASK: u64 = 63;
const BLOCK_SHIFT: u32 = 6;
const BLOCK_WORDS: u64 = 1 << BLOCK_SHIFT;

/// Dense renumbering of a subset of `[0, capacity)`.
#[derive(Debug, Clone)]
pub struct SparseLongArray {
    words: HugeArray<u64>,
    block_offsets: HugeArray<u64>,
    capacity: u64,
    id_count: u64,
}

impl SparseLongArray {
    /// Members are the ids in `[0, capacity)` for which `predicate` holds.
    pub fn from_predicate(capacity: u64, predicate: impl Fn(u64) -> bool) -> Self {
        let mut builder = SparseLongArrayBuilder::new(capacity);
        for id in (0..capacity).filter(|&id| predicate(id)) {
            builder.insert(id);
        }
        builder.build()
    }

    fn from_words(words: HugeArray<u64>, capacity: u64) -> Self {
        let block_count = words.size().div_ceil(BLOCK_WORDS);
        let mut block_offsets = HugeArray::new(block_count);
        let mut id_count = 0u64;
        for block in 0..block_count {
            block_offsets.set(block, id_count);
            id_count += Self::count_words(&words, block << BLOCK_SHIFT, Self::block_end(&words, block));
        }
        Self {
            words,
            block_offsets,
            capacity,
            id_count,
        }
    }

    fn block_end(words: &HugeArray<u64>, block: u64) -> u64 {
        ((block + 1) << BLOCK_SHIFT).min(words.size())
    }

    fn count_words(words: &HugeArray<u64>, start: u64, end: u64) -> u64 {
        (start..end).map(|word| u64::from(words.get(word).count_ones())).sum()
    }

    /// Bytes of an array over `capacity` ids.
    #[must_use]
    pub fn memory_estimation(capacity: u64) -> u64 {
        let words = capacity.div_ceil(64);
        mem::size_of_instance::<Self>()
            + HugeArray::<u64>::memory_estimation(words)
            + HugeArray::<u64>::memory_estimation(words.div_ceil(BLOCK_WORDS))
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.words.size_of() + self.block_offsets.size_of()
    }

    /// Upper bound (exclusive) of the member ids.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of members.
    #[must_use]
    pub fn id_count(&self) -> u64 {
        self.id_count
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        id < self.capacity && self.words.get(id >> WORD_SHIFT) & (1 << (id & WORD_MASK)) != 0
    }

    /// Rank of `id` among the members, or [`NOT_FOUND`] when it is not one.
    #[must_use]
    pub fn to_mapped_node_id(&self, id: u64) -> u64 {
        if !self.contains(id) {
            return NOT_FOUND;
        }
        let word_index = id >> WORD_SHIFT;
        let block = word_index >> BLOCK_SHIFT;
        let before_word = Self::count_words(&self.words, block << BLOCK_SHIFT, word_index);
        let below = self.words.get(word_index) & ((1 << (id & WORD_MASK)) - 1);
        self.block_offsets.get(block) + before_word + u64::from(below.count_ones())
    }

    /// The member with rank `mapped`, or [`NOT_FOUND`] past the last member.
    #[must_use]
    pub fn to_original_node_id(&self, mapped: u64) -> u64 {
        if mapped >= self.id_count {
            return NOT_FOUND;
        }
        // last block whose offset is <= mapped
        let (mut low, mut high) = (0u64, self.block_offsets.size());
        while low < high {
            let mid = low + (high - low) / 2;
            if self.block_offsets.get(mid) <= mapped {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        let block = low - 1;

        let mut rank = mapped - self.block_offsets.get(block);
        for word_index in (block << BLOCK_SHIFT)..Self::block_end(&self.words, block) {
            let mut word = self.words.get(word_index);
            let ones = u64::from(word.count_ones());
            if rank < ones {
                for _ in 0..rank {
                    word &= word - 1;
                }
                return (word_index << WORD_SHIFT) + u64::from(word.trailing_zeros());
            }
            rank -= ones;
        }
        NOT_FOUND
    }

    /// Member ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.words.iter().enumerate().flat_map(|(index, word)| {
            let base = (index as u64) << WORD_SHIFT;
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros();
                bits &= bits - 1;
                Some(base + u64::from(bit))
            })
        })
    }
}

/// Collects member ids in any order.
#[derive(Debug)]
pub struct SparseLongArrayBuilder {
    words: HugeArray<u64>,
    capacity: u64,
}

impl SparseLongArrayBuilder {
    pub fn new(capacity: u64) -> Self {
        Self {
            words: HugeArray::new(capacity.div_ceil(64)),
            capacity,
        }
    }

    /// Add `id`; adding it again is a no-op.
    pub fn set(&mut self, id: u64) -> Result<(), GraphError> {
        if id >= self.capacity {
            return Err(GraphError::NodeOutOfRange {
                node: id,
                node_count: self.capacity,
            });
        }
        self.insert(id);
        Ok(())
    }

    fn insert(&mut self, id: u64) {
        self.words.or(id >> WORD_SHIFT, 1 << (id & WORD_MASK));
    }

    pub fn build(self) -> SparseLongArray {
        SparseLongArray::from_words(self.words, self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_members_densely() {
        let array = SparseLongArray::from_predicate(10, |id| id % 3 == 0);
        assert_eq!(array.id_count(), 4);
        assert_eq!(array.capacity(), 10);
        assert_eq!(array.to_mapped_node_id(0), 0);
        assert_eq!(array.to_mapped_node_id(9), 3);
        assert_eq!(array.to_mapped_node_id(4), NOT_FOUND);
        assert_eq!(array.to_mapped_node_id(12), NOT_FOUND);
        assert_eq!(array.to_original_node_id(2), 6);
        assert_eq!(array.to_original_node_id(4), NOT_FOUND);
        assert_eq!(array.iter().collect::<Vec<_>>(), vec![0, 3, 6, 9]);
    }

    #[test]
    fn blocks_with_gaps_round_trip() {
        // members in the first and third block, none in the second
        let ids = [1u64, 63, 64, 4095, 8192, 8193, 12_000];
        let mut builder = SparseLongArrayBuilder::new(12_001);
        for &id in ids.iter().rev() {
            builder.set(id).expect("in range");
        }
        builder.set(64).expect("repeat");
        let array = builder.build();
        assert_eq!(array.id_count(), ids.len() as u64);
        for (rank, &id) in ids.iter().enumerate() {
            assert_eq!(array.to_mapped_node_id(id), rank as u64);
            assert_eq!(array.to_original_node_id(rank as u64), id);
        }
        assert!(!array.contains(4096));
        assert_eq!(array.iter().collect::<Vec<_>>(), ids.to_vec());
    }

    #[test]
    fn builder_rejects_ids_past_capacity() {
        let mut builder = SparseLongArrayBuilder::new(100);
        assert_eq!(
            builder.set(100),
            Err(GraphError::NodeOutOfRange {
                node: 100,
                node_count: 100
            })
        );
        assert_eq!(builder.build().id_count(), 0);
    }

    #[test]
    fn empty_array_maps_nothing() {
        let array = SparseLongArray::from_predicate(0, |_| true);
        assert_eq!(array.id_count(), 0);
        assert_eq!(array.to_original_node_id(0), NOT_FOUND);
        assert_eq!(array.to_mapped_node_id(0), NOT_FOUND);
    }

    #[test]
    fn memory_estimation_matches_instance() {
        let capacity = 1_000_000;
        let array = SparseLongArray::from_predicate(capacity, |id| id % 7 == 0);
        assert_eq!(
            SparseLongArray::memory_estimation(capacity),
            mem::size_of_instance::<SparseLongArray>()
                + 2 * mem::size_of_instance::<HugeArray<u64>>()
                + array.size_of()
        );
    }
}
