//! Fixed-size bit set over 64-bit huge-array words.

use super::huge_array::HugeArray;
use crate::mem;

const WORD_SHIFT: u32 = 6;
const WORD_MASK: u64 = 63;

/// A bit set addressing up to `size` bits by 64-bit index.
#[derive(Debug, Clone)]
pub struct HugeBitSet {
    words: HugeArray<u64>,
    size: u64,
}

impl HugeBitSet {
    pub fn new(size: u64) -> Self {
        Self {
            words: HugeArray::new(size.div_ceil(64)),
            size,
        }
    }

    #[must_use]
    pub fn memory_estimation(size: u64) -> u64 {
        mem::size_of_instance::<Self>() + HugeArray::<u64>::memory_estimation(size.div_ceil(64))
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.words.size_of()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> bool {
        self.words.get(index >> WORD_SHIFT) & (1 << (index & WORD_MASK)) != 0
    }

    #[inline]
    pub fn set(&mut self, index: u64) {
        self.words.or(index >> WORD_SHIFT, 1 << (index & WORD_MASK));
    }

    #[inline]
    pub fn clear(&mut self, index: u64) {
        self.words.and(index >> WORD_SHIFT, !(1 << (index & WORD_MASK)));
    }

    /// Number of set bits.
    #[must_use]
    pub fn cardinality(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// First set bit at or after `from`.
    #[must_use]
    pub fn next_set_bit(&self, from: u64) -> Option<u64> {
        if from >= self.size {
            return None;
        }
        let mut word_index = from >> WORD_SHIFT;
        let mut word = self.words.get(word_index) & (u64::MAX << (from & WORD_MASK));
        loop {
            if word != 0 {
                let bit = (word_index << WORD_SHIFT) + u64::from(word.trailing_zeros());
                return (bit < self.size).then_some(bit);
            }
            word_index += 1;
            if word_index >= self.words.size() {
                return None;
            }
            word = self.words.get(word_index);
        }
    }

    /// Iterate set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        std::iter::successors(self.next_set_bit(0), move |&bit| self.next_set_bit(bit + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let mut bits = HugeBitSet::new(200);
        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(199);
        assert!(bits.get(63));
        assert!(!bits.get(62));
        assert_eq!(bits.cardinality(), 4);
        bits.clear(63);
        assert!(!bits.get(63));
        assert_eq!(bits.cardinality(), 3);
    }

    #[test]
    fn next_set_bit_scans_words() {
        let mut bits = HugeBitSet::new(300);
        bits.set(5);
        bits.set(130);
        assert_eq!(bits.next_set_bit(0), Some(5));
        assert_eq!(bits.next_set_bit(6), Some(130));
        assert_eq!(bits.next_set_bit(131), None);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![5, 130]);
    }
}
