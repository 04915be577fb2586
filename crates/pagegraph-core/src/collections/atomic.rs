//! # Huge Atomic Array
//!
//! Same addressing as [`HugeArray`](super::HugeArray), but every element is an
//! atomic cell that many threads may update at once.
//!
//! ## Ordering
//!
//! - `get` reads with `Acquire`, `set` writes with `Release`
//! - read-modify-write operations are retry loops: load (`Acquire`), compute a
//!   candidate, `compare_exchange` (`Release` on success), retry with the
//!   witness until the exchange succeeds
//! - floating-point cells hold bit patterns and compare by bits, so a `NaN`
//!   expectation can succeed
//! - `set_all` finishes with a release fence so a later `get` on another
//!   thread sees the whole fill

use super::element::HugeElement;
use super::pages::{DefaultPages, PageCreator, PageGeometry};
use crate::mem;
use crate::primitives::MAX_ARRAY_LENGTH;
use std::fmt::Debug;
use std::sync::atomic::{
    AtomicI32, AtomicI64, AtomicU8, AtomicU32, AtomicU64, Ordering, fence,
};

/// An element kind with a lock-free atomic cell.
pub trait AtomicElement: HugeElement {
    type Cell: Send + Sync + Debug;

    fn new_cell(value: Self) -> Self::Cell;
    fn load(cell: &Self::Cell, order: Ordering) -> Self;
    fn store(cell: &Self::Cell, value: Self, order: Ordering);

    /// Compare by bit pattern; `Ok(previous)` on success, `Err(witness)` otherwise.
    fn compare_exchange(
        cell: &Self::Cell,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
}

macro_rules! integer_atomic {
    ($($t:ty => $cell:ty),*) => {$(
        impl AtomicElement for $t {
            type Cell = $cell;

            #[inline]
            fn new_cell(value: Self) -> Self::Cell {
                <$cell>::new(value)
            }

            #[inline]
            fn load(cell: &Self::Cell, order: Ordering) -> Self {
                cell.load(order)
            }

            #[inline]
            fn store(cell: &Self::Cell, value: Self, order: Ordering) {
                cell.store(value, order);
            }

            #[inline]
            fn compare_exchange(
                cell: &Self::Cell,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                cell.compare_exchange(current, new, success, failure)
            }
        }
    )*};
}

macro_rules! float_atomic {
    ($($t:ty => $cell:ty),*) => {$(
        impl AtomicElement for $t {
            type Cell = $cell;

            #[inline]
            fn new_cell(value: Self) -> Self::Cell {
                <$cell>::new(value.to_bits())
            }

            #[inline]
            fn load(cell: &Self::Cell, order: Ordering) -> Self {
                <$t>::from_bits(cell.load(order))
            }

            #[inline]
            fn store(cell: &Self::Cell, value: Self, order: Ordering) {
                cell.store(value.to_bits(), order);
            }

            #[inline]
            fn compare_exchange(
                cell: &Self::Cell,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                cell.compare_exchange(current.to_bits(), new.to_bits(), success, failure)
                    .map(<$t>::from_bits)
                    .map_err(<$t>::from_bits)
            }
        }
    )*};
}

integer_atomic!(u8 => AtomicU8, i32 => AtomicI32, u32 => AtomicU32, i64 => AtomicI64, u64 => AtomicU64);
float_atomic!(f32 => AtomicU32, f64 => AtomicU64);

#[derive(Debug)]
enum Cells<C> {
    Single(Vec<C>),
    Paged(Vec<Vec<C>>),
}

/// Fixed-size array of atomic cells, shareable across threads by reference.
#[derive(Debug)]
pub struct HugeAtomicArray<T: AtomicElement> {
    size: u64,
    geometry: PageGeometry,
    cells: Cells<T::Cell>,
    memory_used: u64,
}

impl<T: AtomicElement> HugeAtomicArray<T> {
    /// Allocate `size` cells initialised by `creator`.
    pub fn of(size: u64, creator: impl PageCreator<T>) -> Self {
        if size <= MAX_ARRAY_LENGTH {
            let page = Self::cell_page(size as usize, 0, &creator);
            Self {
                size,
                geometry: PageGeometry::of::<T>(),
                cells: Cells::Single(page),
                memory_used: mem::size_of_vec::<T::Cell>(size),
            }
        } else {
            Self::of_paged(size, creator)
        }
    }

    /// Allocate `size` default-valued cells.
    pub fn new(size: u64) -> Self {
        Self::of(size, DefaultPages)
    }

    /// Allocate the paged representation regardless of `size`.
    pub fn of_paged(size: u64, creator: impl PageCreator<T>) -> Self {
        let geometry = PageGeometry::of::<T>();
        let num_pages = geometry.num_pages(size);
        let pages = (0..num_pages)
            .map(|page_index| {
                let len = if page_index + 1 == num_pages {
                    geometry.last_page_size(size)
                } else {
                    geometry.page_size
                };
                Self::cell_page(len, (page_index as u64) << geometry.page_shift, &creator)
            })
            .collect();
        Self {
            size,
            geometry,
            cells: Cells::Paged(pages),
            memory_used: Self::paged_bytes(size),
        }
    }

    fn cell_page(len: usize, base: u64, creator: &impl PageCreator<T>) -> Vec<T::Cell> {
        let mut values = vec![T::default(); len];
        creator.fill_page(&mut values, base);
        values.into_iter().map(T::new_cell).collect()
    }

    fn paged_bytes(size: u64) -> u64 {
        let num_pages = PageGeometry::of::<T>().num_pages(size) as u64;
        mem::size_of_vec::<Vec<T::Cell>>(num_pages) + mem::size_of_elements::<T::Cell>(size)
    }

    /// Bytes an atomic array of `size` elements will occupy, before allocating it.
    #[must_use]
    pub fn memory_estimation(size: u64) -> u64 {
        let data = if size <= MAX_ARRAY_LENGTH {
            mem::size_of_vec::<T::Cell>(size)
        } else {
            Self::paged_bytes(size)
        };
        mem::size_of_instance::<Self>() + data
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.memory_used
    }

    /// Free the cells and return the bytes released; `0` on any later call.
    pub fn release(&mut self) -> u64 {
        let freed = self.memory_used;
        if freed > 0 {
            self.cells = match self.cells {
                Cells::Single(_) => Cells::Single(Vec::new()),
                Cells::Paged(_) => Cells::Paged(Vec::new()),
            };
            self.memory_used = 0;
            tracing::trace!(freed, size = self.size, "released huge atomic array");
        }
        freed
    }

    #[inline]
    fn cell(&self, index: u64) -> &T::Cell {
        match &self.cells {
            Cells::Single(page) => &page[index as usize],
            Cells::Paged(pages) => {
                &pages[self.geometry.page_index(index)][self.geometry.index_in_page(index)]
            }
        }
    }

    fn pages(&self) -> &[Vec<T::Cell>] {
        match &self.cells {
            Cells::Single(page) => std::slice::from_ref(page),
            Cells::Paged(pages) => pages,
        }
    }

    // =========================================================================
    // ATOMIC ACCESS
    // =========================================================================

    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> T {
        T::load(self.cell(index), Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, index: u64, value: T) {
        T::store(self.cell(index), value, Ordering::Release);
    }

    /// Add `delta` and return the previous value. Concurrent adders never lose updates.
    pub fn get_and_add(&self, index: u64, delta: T) -> T {
        self.get_and_update(index, |current| current.add(delta))
    }

    /// Replace with `value` and return the previous value.
    pub fn get_and_replace(&self, index: u64, value: T) -> T {
        self.get_and_update(index, |_| value)
    }

    /// Atomically apply `f`. `f` may run several times under contention.
    pub fn update(&self, index: u64, f: impl Fn(T) -> T) {
        self.get_and_update(index, f);
    }

    fn get_and_update(&self, index: u64, f: impl Fn(T) -> T) -> T {
        let cell = self.cell(index);
        let mut previous = T::load(cell, Ordering::Acquire);
        loop {
            let candidate = f(previous);
            match T::compare_exchange(cell, previous, candidate, Ordering::Release, Ordering::Acquire)
            {
                Ok(_) => return previous,
                Err(witness) => previous = witness,
            }
        }
    }

    /// Store `update` if the cell holds `expected`; report whether it did.
    pub fn compare_and_set(&self, index: u64, expected: T, update: T) -> bool {
        T::compare_exchange(
            self.cell(index),
            expected,
            update,
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        .is_ok()
    }

    /// Store `update` if the cell holds `expected`; return the value observed.
    ///
    /// The exchange happened iff the witness has the bits of `expected`.
    pub fn compare_and_exchange(&self, index: u64, expected: T, update: T) -> T {
        match T::compare_exchange(
            self.cell(index),
            expected,
            update,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(witness) | Err(witness) => witness,
        }
    }

    /// Store `value` into every cell, then fence.
    pub fn set_all(&self, value: T) {
        for page in self.pages() {
            for cell in page {
                T::store(cell, value, Ordering::Relaxed);
            }
        }
        fence(Ordering::Release);
    }

    /// Copy the first `length` values into `dest`, resetting the rest of `dest`.
    pub fn copy_to(&self, dest: &HugeAtomicArray<T>, length: u64) {
        let length = length.min(self.size).min(dest.size);
        for index in 0..length {
            T::store(dest.cell(index), T::load(self.cell(index), Ordering::Acquire), Ordering::Relaxed);
        }
        for index in length..dest.size {
            T::store(dest.cell(index), T::default(), Ordering::Relaxed);
        }
        fence(Ordering::Release);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::pages::IdentityPages;

    #[test]
    fn get_and_add_returns_previous() {
        let array = HugeAtomicArray::<i64>::new(4);
        assert_eq!(array.get_and_add(2, 5), 0);
        assert_eq!(array.get_and_add(2, 5), 5);
        assert_eq!(array.get(2), 10);
    }

    #[test]
    fn compare_and_set_and_exchange() {
        let array = HugeAtomicArray::<u64>::of(3, IdentityPages);
        assert!(array.compare_and_set(1, 1, 42));
        assert!(!array.compare_and_set(1, 1, 43));
        assert_eq!(array.compare_and_exchange(1, 7, 8), 42);
        assert_eq!(array.get(1), 42);
        assert_eq!(array.compare_and_exchange(1, 42, 8), 42);
        assert_eq!(array.get(1), 8);
    }

    #[test]
    fn float_cells_compare_bits() {
        let array = HugeAtomicArray::<f64>::of(2, |p: &mut [f64], _: u64| p.fill(f64::NAN));
        assert!(array.compare_and_set(0, f64::NAN, 1.5));
        assert_eq!(array.get(0), 1.5);
        assert!(!array.compare_and_set(0, -0.0, 2.0));
        assert_eq!(array.get_and_replace(1, 3.0).to_bits(), f64::NAN.to_bits());
        assert_eq!(array.get(1), 3.0);
    }

    #[test]
    fn update_applies_function() {
        let array = HugeAtomicArray::<i32>::new(1);
        array.set(0, 20);
        array.update(0, |v| v * 2 + 1);
        assert_eq!(array.get(0), 41);
    }

    #[test]
    fn concurrent_adders_lose_nothing() {
        let array = HugeAtomicArray::<u64>::new(8);
        let threads = 8;
        let per_thread = 10_000;
        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..per_thread {
                        array.get_and_add(3, 1);
                    }
                });
            }
        });
        assert_eq!(array.get(3), threads * per_thread);
    }

    #[test]
    fn set_all_visible_across_paged_representation() {
        let size = (1u64 << <f32 as HugeElement>::PAGE_SHIFT) + 3;
        let array = HugeAtomicArray::<f32>::of_paged(size, DefaultPages);
        array.set_all(0.25);
        assert_eq!(array.get(0), 0.25);
        assert_eq!(array.get(size - 1), 0.25);
    }

    #[test]
    fn copy_to_resets_tail() {
        let source = HugeAtomicArray::<u64>::of(4, IdentityPages);
        let dest = HugeAtomicArray::<u64>::of(6, |p: &mut [u64], _: u64| p.fill(9));
        source.copy_to(&dest, 10);
        assert_eq!(dest.get(3), 3);
        assert_eq!(dest.get(4), 0);
        assert_eq!(dest.get(5), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let mut array = HugeAtomicArray::<u8>::new(16);
        assert_eq!(array.release(), 24 + 16);
        assert_eq!(array.release(), 0);
        assert_eq!(
            HugeAtomicArray::<u8>::memory_estimation(16),
            mem::size_of_instance::<HugeAtomicArray<u8>>() + 24 + 16
        );
    }
}
