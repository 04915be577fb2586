//! # Adjacency Compression
//!
//! Turns sorted target id lists into compact byte blocks and back.
//!
//! - [`varlong`]: byte-aligned variable-length integers
//! - [`aggregation`]: sorting and parallel-relationship aggregation
//! - [`DeltaVarLongCompressor`]: block-wise delta encoding
//! - [`AdjacencyDecompressingReader`]: block decoding with header-based skips

pub mod aggregation;
mod compressor;
mod reader;
pub mod varlong;

pub use compressor::{DeltaVarLongCompressor, decompress};
pub use reader::AdjacencyDecompressingReader;
