//! Block-wise delta + varlong compression of sorted target lists.
//!
//! ## Byte layout of one list
//!
//! ```text
//! block*  := header payload
//! header  := varlong(block_max - base) varlong(payload_bytes)
//! payload := varlong(delta)   (one per id in the block)
//! ```
//!
//! Blocks hold [`BLOCK_SIZE`] ids except the last. `base` is the maximum id
//! of the previous block, `0` for the first. Deltas inside a block are taken
//! against the previous id, so duplicates encode as zero.

use super::varlong;
use crate::primitives::BLOCK_SIZE;

/// Encodes sorted target lists, reusing one scratch buffer across lists.
#[derive(Debug, Default)]
pub struct DeltaVarLongCompressor {
    payload: Vec<u8>,
}

impl DeltaVarLongCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the encoding of ascending `targets` to `out`; returns the bytes written.
    pub fn compress(&mut self, targets: &[u64], out: &mut Vec<u8>) -> usize {
        let start = out.len();
        let mut base = 0u64;
        for block in targets.chunks(BLOCK_SIZE) {
            self.payload.clear();
            let mut previous = base;
            for &target in block {
                varlong::encode(target - previous, &mut self.payload);
                previous = target;
            }
            varlong::encode(previous - base, out);
            varlong::encode(self.payload.len() as u64, out);
            out.extend_from_slice(&self.payload);
            base = previous;
        }
        out.len() - start
    }
}

/// Decode a whole list; the inverse of [`DeltaVarLongCompressor::compress`].
pub fn decompress(bytes: &[u8], degree: usize) -> Vec<u64> {
    let mut out = vec![0u64; degree];
    let mut offset = 0;
    let mut base = 0;
    for block in out.chunks_mut(BLOCK_SIZE) {
        let _block_sum = varlong::decode(bytes, &mut offset);
        let _payload_len = varlong::decode(bytes, &mut offset);
        base = varlong::decode_deltas(bytes, &mut offset, base, block);
    }
    out
}
