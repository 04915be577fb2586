//! # Huge Object Array
//!
//! A fixed-size array of optional owned values addressed by a 64-bit index.
//!
//! Slots are `Option<T>` and start out empty. The array is always paged; the
//! page length is derived from the slot width so that a page stays within
//! [`PAGE_SIZE_IN_BYTES`], which keeps wide values on short pages.

use super::huge_array::HugeCursor;
use super::pages::{DefaultPages, PageCreator, PageGeometry};
use crate::mem;
use crate::primitives::PAGE_SIZE_IN_BYTES;

/// Fixed-size paged array of `Option<T>` slots.
#[derive(Debug, Clone)]
pub struct HugeObjectArray<T> {
    size: u64,
    geometry: PageGeometry,
    pages: Vec<Vec<Option<T>>>,
    memory_used: u64,
}

impl<T> HugeObjectArray<T> {
    /// Page geometry for `Option<T>` slots.
    #[must_use]
    pub fn geometry() -> PageGeometry {
        let slot = std::mem::size_of::<Option<T>>()
            .next_power_of_two()
            .min(PAGE_SIZE_IN_BYTES);
        PageGeometry::with_shift(mem::page_shift_for(PAGE_SIZE_IN_BYTES, slot))
    }

    /// `size` empty slots.
    pub fn new(size: u64) -> Self {
        Self::of(size, DefaultPages)
    }

    /// `size` slots; `creator` fills each page after it is allocated empty.
    pub fn of(size: u64, creator: impl PageCreator<Option<T>>) -> Self {
        let geometry = Self::geometry();
        let num_pages = geometry.num_pages(size);
        let mut pages = Vec::with_capacity(num_pages);
        for page_index in 0..num_pages {
            let len = if page_index + 1 == num_pages {
                geometry.last_page_size(size)
            } else {
                geometry.page_size
            };
            let mut page: Vec<Option<T>> = std::iter::repeat_with(|| None).take(len).collect();
            creator.fill_page(&mut page, (page_index as u64) << geometry.page_shift);
            pages.push(page);
        }
        Self {
            size,
            geometry,
            pages,
            memory_used: Self::slot_bytes(size),
        }
    }

    fn slot_bytes(size: u64) -> u64 {
        let num_pages = Self::geometry().num_pages(size) as u64;
        mem::size_of_vec::<Vec<Option<T>>>(num_pages) + mem::size_of_elements::<Option<T>>(size)
    }

    /// Bytes of an array of `size` slots, each holding a value that owns
    /// `object_size` further heap bytes.
    #[must_use]
    pub fn memory_estimation(size: u64, object_size: u64) -> u64 {
        mem::size_of_instance::<Self>() + Self::slot_bytes(size) + size.saturating_mul(object_size)
    }

    /// Bytes held by the slots themselves; heap owned by values is not counted.
    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.memory_used
    }

    /// Drop every page and return the slot bytes released; `0` on later calls.
    pub fn release(&mut self) -> u64 {
        let freed = self.memory_used;
        if freed > 0 {
            self.pages = Vec::new();
            self.memory_used = 0;
            tracing::trace!(freed, size = self.size, "released huge object array");
        }
        freed
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    fn slot(&self, index: u64) -> &Option<T> {
        &self.pages[self.geometry.page_index(index)][self.geometry.index_in_page(index)]
    }

    #[inline]
    fn slot_mut(&mut self, index: u64) -> &mut Option<T> {
        &mut self.pages[self.geometry.page_index(index)][self.geometry.index_in_page(index)]
    }

    /// Value at `index`, `None` for an empty slot. Out-of-range indices are a fault.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> Option<&T> {
        self.slot(index).as_ref()
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, index: u64, default: &'a T) -> &'a T {
        self.get(index).unwrap_or(default)
    }

    #[inline]
    pub fn set(&mut self, index: u64, value: T) {
        *self.slot_mut(index) = Some(value);
    }

    /// Empty the slot at `index`, returning what it held.
    pub fn take(&mut self, index: u64) -> Option<T> {
        self.slot_mut(index).take()
    }

    /// The value at `index`, storing `supplier()` first if the slot is empty.
    pub fn put_if_absent(&mut self, index: u64, supplier: impl FnOnce() -> T) -> &T {
        self.slot_mut(index).get_or_insert_with(supplier)
    }

    /// Set every slot to `generator(index)`.
    pub fn set_all(&mut self, generator: impl Fn(u64) -> T) {
        let shift = self.geometry.page_shift;
        for (page_index, page) in self.pages.iter_mut().enumerate() {
            let base = (page_index as u64) << shift;
            for (offset, slot) in page.iter_mut().enumerate() {
                *slot = Some(generator(base + offset as u64));
            }
        }
    }

    /// Cursor over `(base_index, page)` slices in index order.
    #[must_use]
    pub fn cursor(&self) -> HugeCursor<'_, Option<T>> {
        HugeCursor::over(&self.pages)
    }

    /// Every slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.pages.iter().flat_map(|page| page.iter().map(Option::as_ref))
    }
}

impl<T: Clone> HugeObjectArray<T> {
    /// Set every slot to a clone of `value`.
    pub fn fill(&mut self, value: &T) {
        for page in &mut self.pages {
            for slot in page.iter_mut() {
                *slot = Some(value.clone());
            }
        }
    }

    /// Clone the first `length` slots into `dest`.
    ///
    /// `length` is clamped to both sizes; the rest of `dest` is emptied.
    pub fn copy_to(&self, dest: &mut HugeObjectArray<T>, length: u64) {
        let length = length.min(self.size).min(dest.size);
        let shift = dest.geometry.page_shift;
        for (page_index, dest_page) in dest.pages.iter_mut().enumerate() {
            let base = (page_index as u64) << shift;
            for (offset, slot) in dest_page.iter_mut().enumerate() {
                let index = base + offset as u64;
                *slot = if index < length {
                    self.slot(index).clone()
                } else {
                    None
                };
            }
        }
    }

    /// A new array of `new_length` slots holding a prefix copy of this one.
    #[must_use]
    pub fn copy_of(&self, new_length: u64) -> HugeObjectArray<T> {
        let mut copy = HugeObjectArray::new(new_length);
        self.copy_to(&mut copy, new_length);
        copy
    }
}

// =============================================================================
// TESTS
// =============================================================================
