//! Element kinds storable in huge arrays.
//!
//! The set is closed: `u8`, `i32`, `u32`, `i64`, `u64`, `f32` and `f64`.
//! Each kind derives its page geometry from its byte width once, at compile time.

use crate::mem::page_shift_for;
use crate::primitives::PAGE_SIZE_IN_BYTES;
use std::fmt::Debug;
use std::ops::{BitAnd, BitOr};

mod sealed {
    pub trait Sealed {}
}

/// A primitive value that can live in a [`HugeArray`](super::HugeArray).
pub trait HugeElement:
    sealed::Sealed + Copy + Default + PartialOrd + Debug + Send + Sync + 'static
{
    /// `log2` of the number of elements per page.
    const PAGE_SHIFT: u32 = page_shift_for(PAGE_SIZE_IN_BYTES, std::mem::size_of::<Self>());

    /// Addition with the element's overflow semantics (wrapping for integers).
    fn add(self, other: Self) -> Self;

    /// Convert an index into an element value, truncating when the kind is narrower.
    fn from_index(index: u64) -> Self;
}

/// Integer kinds, which additionally support bitwise combination.
pub trait BitElement: HugeElement + BitOr<Output = Self> + BitAnd<Output = Self> {}

impl<T> BitElement for T where T: HugeElement + BitOr<Output = T> + BitAnd<Output = T> {}

macro_rules! integer_element {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl HugeElement for $t {
            #[inline]
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }

            #[inline]
            fn from_index(index: u64) -> Self {
                index as $t
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl HugeElement for $t {
            #[inline]
            fn add(self, other: Self) -> Self {
                self + other
            }

            #[inline]
            fn from_index(index: u64) -> Self {
                index as $t
            }
        }
    )*};
}

integer_element!(u8, i32, u32, i64, u64);
float_element!(f32, f64);
