//! Stateful block decoder behind the adjacency cursors.
//!
//! The reader decodes one block of ids at a time into a fixed buffer. Callers
//! pass the page holding the list and the number of ids they have not yet
//! consumed (`remaining`); the reader derives how many ids are still encoded.
//!
//! Skip operations read block headers first and step over a whole block when
//! its maximum id cannot satisfy the request, without decoding its payload.

use super::varlong;
use crate::primitives::{BLOCK_SIZE, NOT_FOUND};

/// Reusable decoder state for one compressed list.
#[derive(Debug, Clone)]
pub struct AdjacencyDecompressingReader {
    block: [u64; BLOCK_SIZE],
    block_len: usize,
    position: usize,
    offset: usize,
    last_value: u64,
}

impl Default for AdjacencyDecompressingReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjacencyDecompressingReader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            block: [0; BLOCK_SIZE],
            block_len: 0,
            position: 0,
            offset: 0,
            last_value: 0,
        }
    }

    /// Point the reader at a list starting at byte `offset` of its page.
    #[inline]
    pub fn reset(&mut self, offset: usize) {
        self.block_len = 0;
        self.position = 0;
        self.offset = offset;
        self.last_value = 0;
    }

    /// Copy the iteration state of `other` without touching any bytes.
    pub fn copy_from(&mut self, other: &Self) {
        let len = other.block_len;
        self.block[..len].copy_from_slice(&other.block[..len]);
        self.block_len = len;
        self.position = other.position;
        self.offset = other.offset;
        self.last_value = other.last_value;
    }

    #[inline]
    fn buffered(&self) -> usize {
        self.block_len - self.position
    }

    fn header(&self, bytes: &[u8]) -> (u64, usize) {
        let mut offset = self.offset;
        let block_sum = varlong::decode(bytes, &mut offset);
        let payload_len = varlong::decode(bytes, &mut offset) as usize;
        (self.last_value + block_sum, offset + payload_len)
    }

    fn decode_block(&mut self, bytes: &[u8], count: usize) {
        let mut offset = self.offset;
        let _block_sum = varlong::decode(bytes, &mut offset);
        let _payload_len = varlong::decode(bytes, &mut offset);
        self.last_value =
            varlong::decode_deltas(bytes, &mut offset, self.last_value, &mut self.block[..count]);
        self.offset = offset;
        self.block_len = count;
        self.position = 0;
    }

    fn skip_block(&mut self, block_max: u64, next_offset: usize) {
        self.last_value = block_max;
        self.offset = next_offset;
        self.block_len = 0;
        self.position = 0;
    }

    #[inline]
    fn fill_if_empty(&mut self, bytes: &[u8], remaining: usize) {
        if self.position == self.block_len {
            self.decode_block(bytes, remaining.min(BLOCK_SIZE));
        }
    }

    /// Consume and return the next id. `remaining` must be positive.
    #[inline]
    pub fn next(&mut self, bytes: &[u8], remaining: usize) -> u64 {
        self.fill_if_empty(bytes, remaining);
        let value = self.block[self.position];
        self.position += 1;
        value
    }

    /// Return the next id without consuming it. `remaining` must be positive.
    #[inline]
    pub fn peek(&mut self, bytes: &[u8], remaining: usize) -> u64 {
        self.fill_if_empty(bytes, remaining);
        self.block[self.position]
    }

    /// First id `>= min` and the number of ids consumed to reach it, or
    /// `None` with the reader parked at the end of the list.
    fn find(&mut self, bytes: &[u8], min: u64, remaining: usize) -> Option<(u64, usize)> {
        let buffered = self.buffered();
        let mut consumed = 0;
        if buffered > 0 {
            if self.block[self.block_len - 1] >= min {
                return Some(self.scan_block(min, consumed));
            }
            consumed += buffered;
            self.position = self.block_len;
        }
        let mut encoded = remaining - buffered;
        while encoded > 0 {
            let count = encoded.min(BLOCK_SIZE);
            let (block_max, next_offset) = self.header(bytes);
            if block_max < min {
                self.skip_block(block_max, next_offset);
                consumed += count;
                encoded -= count;
                continue;
            }
            self.decode_block(bytes, count);
            return Some(self.scan_block(min, consumed));
        }
        None
    }

    #[inline]
    fn scan_block(&mut self, min: u64, consumed: usize) -> (u64, usize) {
        let start = self.position;
        let index = start
            + self.block[start..self.block_len]
                .iter()
                .position(|&v| v >= min)
                .unwrap_or(self.block_len - start - 1);
        self.position = index + 1;
        (self.block[index], consumed + index - start + 1)
    }

    /// Consume ids `<= target` and return the first id `> target` with the
    /// count consumed including it.
    ///
    /// Returns `(NOT_FOUND, 0)` when no such id exists.
    pub fn skip_until(&mut self, bytes: &[u8], target: u64, remaining: usize) -> (u64, usize) {
        let Some(min) = target.checked_add(1) else {
            return (NOT_FOUND, 0);
        };
        self.find(bytes, min, remaining).unwrap_or((NOT_FOUND, 0))
    }

    /// Consume ids `< target` and return the first id `>= target` with the
    /// count consumed including it.
    ///
    /// When every id is smaller, returns the last id of the list and `0`.
    pub fn advance(&mut self, bytes: &[u8], target: u64, remaining: usize) -> (u64, usize) {
        match self.find(bytes, target, remaining) {
            Some(found) => found,
            None => (self.last_value, 0),
        }
    }

    /// Skip `n` ids and return the one after them; consumes `n + 1`.
    ///
    /// `n` must be smaller than `remaining`.
    pub fn advance_by(&mut self, bytes: &[u8], n: usize, remaining: usize) -> (u64, usize) {
        let buffered = self.buffered();
        if n < buffered {
            self.position += n;
            let value = self.block[self.position];
            self.position += 1;
            return (value, n + 1);
        }
        let mut to_skip = n - buffered;
        let mut encoded = remaining - buffered;
        self.position = self.block_len;
        loop {
            let count = encoded.min(BLOCK_SIZE);
            if to_skip < count {
                break;
            }
            let (block_max, next_offset) = self.header(bytes);
            self.skip_block(block_max, next_offset);
            to_skip -= count;
            encoded -= count;
        }
        self.decode_block(bytes, encoded.min(BLOCK_SIZE));
        self.position = to_skip;
        let value = self.block[self.position];
        self.position += 1;
        (value, n + 1)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::DeltaVarLongCompressor;

    fn encode(targets: &[u64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        DeltaVarLongCompressor::new().compress(targets, &mut bytes);
        bytes
    }

    #[test]
    fn next_and_peek() {
        let bytes = encode(&[1, 5, 9]);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        assert_eq!(reader.peek(&bytes, 3), 1);
        assert_eq!(reader.next(&bytes, 3), 1);
        assert_eq!(reader.next(&bytes, 2), 5);
        assert_eq!(reader.peek(&bytes, 1), 9);
        assert_eq!(reader.next(&bytes, 1), 9);
    }

    #[test]
    fn skip_until_crosses_block_boundary() {
        let targets: Vec<u64> = (0..128).collect();
        let bytes = encode(&targets);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        let mut remaining = 128;

        let (value, consumed) = reader.skip_until(&bytes, 0, remaining);
        assert_eq!((value, consumed), (1, 2));
        remaining -= consumed;

        let (value, consumed) = reader.skip_until(&bytes, 62, remaining);
        assert_eq!((value, consumed), (63, 62));
        remaining -= consumed;

        assert_eq!(reader.skip_until(&bytes, 128, remaining), (NOT_FOUND, 0));
    }

    #[test]
    fn skip_until_jumps_whole_blocks() {
        let targets: Vec<u64> = (0..300).map(|i| i * 2).collect();
        let bytes = encode(&targets);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        let (value, consumed) = reader.skip_until(&bytes, 401, 300);
        assert_eq!(value, 402);
        assert_eq!(consumed, 202);
    }

    #[test]
    fn advance_returns_last_when_exhausted() {
        let bytes = encode(&[3, 8, 20]);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        assert_eq!(reader.advance(&bytes, 8, 3), (8, 2));
        assert_eq!(reader.advance(&bytes, 21, 1), (20, 0));
    }

    #[test]
    fn advance_past_multiple_blocks_returns_list_max() {
        let targets: Vec<u64> = (10..210).collect();
        let bytes = encode(&targets);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        assert_eq!(reader.advance(&bytes, 1000, 200), (209, 0));
    }

    #[test]
    fn advance_by_skips_blocks_by_count() {
        let targets: Vec<u64> = (0..200).map(|i| i * 5).collect();
        let bytes = encode(&targets);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        assert_eq!(reader.advance_by(&bytes, 0, 200), (0, 1));
        assert_eq!(reader.advance_by(&bytes, 150, 199), (755, 151));
        assert_eq!(reader.next(&bytes, 48), 760);
    }

    #[test]
    fn copy_from_preserves_position() {
        let targets: Vec<u64> = (0..70).collect();
        let bytes = encode(&targets);
        let mut reader = AdjacencyDecompressingReader::new();
        reader.reset(0);
        reader.advance_by(&bytes, 9, 70);
        let mut copy = AdjacencyDecompressingReader::new();
        copy.copy_from(&reader);
        assert_eq!(copy.next(&bytes, 60), 10);
        assert_eq!(reader.next(&bytes, 60), 10);
    }
}
