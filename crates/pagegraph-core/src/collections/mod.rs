//! # Huge Collections
//!
//! Paged primitive arrays addressed by 64-bit indices.
//!
//! - [`HugeArray`]: plain values, mutated only while a structure is built
//! - [`HugeAtomicArray`]: lock-free cells for concurrent writers
//! - [`HugeBitSet`]: membership sets over node ids
//! - [`HugeObjectArray`]: optional owned values on width-sized pages
//! - [`HugeLongLongMap`]: open-addressing `u64 -> i64` map
//! - [`SparseLongArray`]: rank/select renumbering of an id subset

mod atomic;
mod bitset;
mod builder;
mod element;
mod huge_array;
mod long_map;
mod object_array;
mod pages;
mod sparse;

pub use atomic::{AtomicElement, HugeAtomicArray};
pub use bitset::HugeBitSet;
pub use builder::HugeArrayBuilder;
pub use element::{BitElement, HugeElement};
pub use huge_array::{HugeArray, HugeCursor};
pub use long_map::HugeLongLongMap;
pub use object_array::HugeObjectArray;
pub use pages::{ConstantPages, DefaultPages, IdentityPages, PageCreator, PageGeometry};
pub use sparse::{SparseLongArray, SparseLongArrayBuilder};
