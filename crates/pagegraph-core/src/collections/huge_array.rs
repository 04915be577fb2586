//! # Huge Array
//!
//! A fixed-size array addressed by a 64-bit index.
//!
//! Arrays up to [`MAX_ARRAY_LENGTH`] elements live in one allocation. Larger
//! arrays are split into pages of `1 << T::PAGE_SHIFT` elements; every page
//! except the last is full. Callers never see the difference.
//!
//! ## Addressing
//!
//! ```text
//! page_index    = index >> page_shift
//! index_in_page = index &  page_mask
//! ```

use super::element::{BitElement, HugeElement};
use super::pages::{DefaultPages, PageCreator, PageGeometry};
use crate::mem;
use crate::primitives::MAX_ARRAY_LENGTH;
use crate::types::GraphError;

#[derive(Debug, Clone)]
enum Storage<T> {
    Single(Vec<T>),
    Paged(Vec<Vec<T>>),
}

/// Fixed-size array of primitive values, paged beyond a single allocation.
#[derive(Debug, Clone)]
pub struct HugeArray<T: HugeElement> {
    size: u64,
    geometry: PageGeometry,
    storage: Storage<T>,
    memory_used: u64,
}

impl<T: HugeElement> HugeArray<T> {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Allocate `size` elements, filling every page with `creator`.
    ///
    /// Chooses the single-page representation when `size <= MAX_ARRAY_LENGTH`.
    pub fn of(size: u64, creator: impl PageCreator<T>) -> Self {
        if size <= MAX_ARRAY_LENGTH {
            Self::of_single(size, creator)
        } else {
            Self::of_paged(size, creator)
        }
    }

    /// Allocate `size` default-valued elements.
    pub fn new(size: u64) -> Self {
        Self::of(size, DefaultPages)
    }

    /// Allocate the paged representation regardless of `size`.
    pub fn of_paged(size: u64, creator: impl PageCreator<T>) -> Self {
        let geometry = PageGeometry::of::<T>();
        let num_pages = geometry.num_pages(size);
        let mut pages = Vec::with_capacity(num_pages);
        for page_index in 0..num_pages {
            let len = if page_index + 1 == num_pages {
                geometry.last_page_size(size)
            } else {
                geometry.page_size
            };
            let mut page = vec![T::default(); len];
            creator.fill_page(&mut page, (page_index as u64) << geometry.page_shift);
            pages.push(page);
        }
        Self {
            size,
            geometry,
            storage: Storage::Paged(pages),
            memory_used: Self::paged_bytes(size),
        }
    }

    fn of_single(size: u64, creator: impl PageCreator<T>) -> Self {
        let mut page = vec![T::default(); size as usize];
        creator.fill_page(&mut page, 0);
        Self {
            size,
            geometry: PageGeometry::of::<T>(),
            storage: Storage::Single(page),
            memory_used: mem::size_of_vec::<T>(size),
        }
    }

    /// Adopt pre-built pages holding at least `size` elements.
    ///
    /// Every page but the last must be exactly one page long; the last may be
    /// shorter but never longer.
    pub fn of_pages(mut pages: Vec<Vec<T>>, size: u64) -> Result<Self, GraphError> {
        let geometry = PageGeometry::of::<T>();
        let last_index = pages.len().saturating_sub(1);
        for (page, values) in pages.iter().enumerate() {
            let misshaped = if page == last_index {
                values.len() > geometry.page_size
            } else {
                values.len() != geometry.page_size
            };
            if misshaped {
                let expected = if page == last_index {
                    format!("at most {}", geometry.page_size)
                } else {
                    geometry.page_size.to_string()
                };
                return Err(GraphError::MisshapedPage {
                    page,
                    len: values.len(),
                    expected,
                });
            }
        }
        let capacity = match pages.last() {
            Some(last) => (last_index as u64) * geometry.page_size as u64 + last.len() as u64,
            None => 0,
        };
        if size > capacity {
            return Err(GraphError::CapacityExceeded { size, capacity });
        }
        pages.truncate(geometry.num_pages(size));
        if let Some(last) = pages.last_mut() {
            last.truncate(geometry.last_page_size(size));
        }
        Ok(Self::from_full_pages(pages, size))
    }

    /// Wrap pages already shaped for `size`.
    pub(super) fn from_full_pages(pages: Vec<Vec<T>>, size: u64) -> Self {
        Self {
            size,
            geometry: PageGeometry::of::<T>(),
            storage: Storage::Paged(pages),
            memory_used: Self::paged_bytes(size),
        }
    }

    /// Take ownership of `values`, paging them if they exceed one allocation.
    pub fn from_vec(values: Vec<T>) -> Self {
        let size = values.len() as u64;
        if size <= MAX_ARRAY_LENGTH {
            return Self {
                size,
                geometry: PageGeometry::of::<T>(),
                storage: Storage::Single(values),
                memory_used: mem::size_of_vec::<T>(size),
            };
        }
        let page_size = PageGeometry::of::<T>().page_size;
        let pages = values.chunks(page_size).map(<[T]>::to_vec).collect();
        Self::from_full_pages(pages, size)
    }

    // =========================================================================
    // MEMORY ACCOUNTING
    // =========================================================================

    /// Bytes an array of `size` elements will occupy, before allocating it.
    #[must_use]
    pub fn memory_estimation(size: u64) -> u64 {
        let data = if size <= MAX_ARRAY_LENGTH {
            mem::size_of_vec::<T>(size)
        } else {
            Self::paged_bytes(size)
        };
        mem::size_of_instance::<Self>() + data
    }

    fn paged_bytes(size: u64) -> u64 {
        let geometry = PageGeometry::of::<T>();
        let num_pages = geometry.num_pages(size) as u64;
        mem::size_of_vec::<Vec<T>>(num_pages) + mem::size_of_elements::<T>(size)
    }

    /// Bytes held by this array's data; `0` once released.
    #[must_use]
    pub fn size_of(&self) -> u64 {
        self.memory_used
    }

    /// Free the pages and return the bytes released; `0` on any later call.
    ///
    /// The array must not be read after release.
    pub fn release(&mut self) -> u64 {
        let freed = self.memory_used;
        if freed > 0 {
            self.storage = match self.storage {
                Storage::Single(_) => Storage::Single(Vec::new()),
                Storage::Paged(_) => Storage::Paged(Vec::new()),
            };
            self.memory_used = 0;
            tracing::trace!(freed, size = self.size, "released huge array");
        }
        freed
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn is_paged(&self) -> bool {
        matches!(self.storage, Storage::Paged(_))
    }

    /// Value at `index`. Out-of-range indices are a fault.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> T {
        match &self.storage {
            Storage::Single(page) => page[index as usize],
            Storage::Paged(pages) => {
                pages[self.geometry.page_index(index)][self.geometry.index_in_page(index)]
            }
        }
    }

    #[inline]
    fn slot(&mut self, index: u64) -> &mut T {
        match &mut self.storage {
            Storage::Single(page) => &mut page[index as usize],
            Storage::Paged(pages) => {
                &mut pages[self.geometry.page_index(index)][self.geometry.index_in_page(index)]
            }
        }
    }

    #[inline]
    pub fn set(&mut self, index: u64, value: T) {
        *self.slot(index) = value;
    }

    /// Add `delta` to the value at `index`.
    #[inline]
    pub fn add_to(&mut self, index: u64, delta: T) {
        let slot = self.slot(index);
        *slot = HugeElement::add(*slot, delta);
    }

    /// Set every element to `value`.
    pub fn set_all(&mut self, value: T) {
        for page in self.pages_mut() {
            page.fill(value);
        }
    }

    /// Set every element to `generator(index)`.
    pub fn set_all_with(&mut self, generator: impl Fn(u64) -> T) {
        let shift = self.geometry.page_shift;
        for (page_index, page) in self.pages_mut().enumerate() {
            let base = (page_index as u64) << shift;
            for (offset, slot) in page.iter_mut().enumerate() {
                *slot = generator(base + offset as u64);
            }
        }
    }

    fn pages_mut(&mut self) -> std::slice::IterMut<'_, Vec<T>> {
        match &mut self.storage {
            Storage::Single(page) => std::slice::from_mut(page).iter_mut(),
            Storage::Paged(pages) => pages.iter_mut(),
        }
    }

    fn page_slices(&self) -> &[Vec<T>] {
        match &self.storage {
            Storage::Single(page) => std::slice::from_ref(page),
            Storage::Paged(pages) => pages,
        }
    }

    /// Cursor over `(base_index, page)` slices in index order.
    #[must_use]
    pub fn cursor(&self) -> HugeCursor<'_, T> {
        HugeCursor::over(self.page_slices())
    }

    /// Iterate every value in index order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.cursor().flat_map(|(_, page)| page.iter().copied())
    }

    /// Copy all values into a `Vec`. Intended for small arrays.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    // =========================================================================
    // COPYING
    // =========================================================================

    /// Copy the first `length` elements into `dest`.
    ///
    /// `length` is clamped to both sizes; the rest of `dest` is reset to the
    /// element default. Single and paged arrays may be mixed freely.
    pub fn copy_to(&self, dest: &mut HugeArray<T>, length: u64) {
        let length = length.min(self.size).min(dest.size);
        let shift = dest.geometry.page_shift;
        for (page_index, dest_page) in dest.pages_mut().enumerate() {
            let base = (page_index as u64) << shift;
            let to_copy = length.saturating_sub(base).min(dest_page.len() as u64) as usize;
            self.read_range(base, &mut dest_page[..to_copy]);
            dest_page[to_copy..].fill(T::default());
        }
    }

    /// Fill `out` with the values starting at `start`.
    fn read_range(&self, start: u64, out: &mut [T]) {
        match &self.storage {
            Storage::Single(page) => {
                let start = start as usize;
                out.copy_from_slice(&page[start..start + out.len()]);
            }
            Storage::Paged(pages) => {
                let mut written = 0;
                let mut index = start;
                while written < out.len() {
                    let page = &pages[self.geometry.page_index(index)];
                    let offset = self.geometry.index_in_page(index);
                    let n = (page.len() - offset).min(out.len() - written);
                    out[written..written + n].copy_from_slice(&page[offset..offset + n]);
                    written += n;
                    index += n as u64;
                }
            }
        }
    }

    /// A new array of `new_length` holding a prefix copy of this one.
    #[must_use]
    pub fn copy_of(&self, new_length: u64) -> HugeArray<T> {
        let mut copy = HugeArray::new(new_length);
        self.copy_to(&mut copy, new_length);
        copy
    }

    /// Binary search over an ascending array, with the contract of
    /// [`slice::binary_search`].
    pub fn binary_search(&self, value: T) -> Result<u64, u64> {
        let mut low = 0u64;
        let mut high = self.size;
        while low < high {
            let mid = low + (high - low) / 2;
            let candidate = self.get(mid);
            if candidate < value {
                low = mid + 1;
            } else if candidate > value {
                high = mid;
            } else {
                return Ok(mid);
            }
        }
        Err(low)
    }
}

impl<T: BitElement> HugeArray<T> {
    /// Bitwise-or `value` into `index`, returning the new value.
    pub fn or(&mut self, index: u64, value: T) -> T {
        let slot = self.slot(index);
        *slot = *slot | value;
        *slot
    }

    /// Bitwise-and `value` into `index`, returning the new value.
    pub fn and(&mut self, index: u64, value: T) -> T {
        let slot = self.slot(index);
        *slot = *slot & value;
        *slot
    }
}

/// Iterator over the pages of a [`HugeArray`], yielding each page with the
/// global index of its first element.
pub struct HugeCursor<'a, T> {
    pages: &'a [Vec<T>],
    next_page: usize,
    base: u64,
}

impl<'a, T> HugeCursor<'a, T> {
    pub(super) fn over(pages: &'a [Vec<T>]) -> Self {
        Self {
            pages,
            next_page: 0,
            base: 0,
        }
    }
}

impl<'a, T> Iterator for HugeCursor<'a, T> {
    type Item = (u64, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.pages.get(self.next_page)?;
        let base = self.base;
        self.next_page += 1;
        self.base += page.len() as u64;
        Some((base, page.as_slice()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::pages::IdentityPages;

    fn paged_size() -> u64 {
        // three and a bit pages of u64
        (1u64 << <u64 as HugeElement>::PAGE_SHIFT) * 3 + 17
    }

    #[test]
    fn single_and_paged_agree() {
        let size = paged_size();
        let single = HugeArray::<u64>::of(size, IdentityPages);
        let paged = HugeArray::<u64>::of_paged(size, IdentityPages);
        assert!(!single.is_paged());
        assert!(paged.is_paged());
        for i in [0, 1, 4095, 4096, 4097, size - 1] {
            assert_eq!(single.get(i), i);
            assert_eq!(paged.get(i), i);
        }
    }

    #[test]
    fn set_and_add_to() {
        let mut array = HugeArray::<i64>::of_paged(paged_size(), DefaultPages);
        array.set(5000, 7);
        array.add_to(5000, 3);
        assert_eq!(array.get(5000), 10);
        assert_eq!(array.get(4999), 0);
    }

    #[test]
    fn set_all_and_generator() {
        let mut array = HugeArray::<i32>::new(10);
        array.set_all(4);
        assert!(array.iter().all(|v| v == 4));
        array.set_all_with(|i| i as i32 * 2);
        assert_eq!(array.get(9), 18);
    }

    #[test]
    fn copy_to_truncates_and_zero_fills() {
        let source = HugeArray::<u64>::of(10, IdentityPages);
        let mut dest = HugeArray::<u64>::of(20, |p: &mut [u64], _: u64| p.fill(99));
        source.copy_to(&mut dest, 15);
        assert_eq!(dest.get(9), 9);
        assert_eq!(dest.get(10), 0);
        assert_eq!(dest.get(19), 0);
    }

    #[test]
    fn copy_between_representations() {
        let size = paged_size();
        let paged = HugeArray::<u64>::of_paged(size, IdentityPages);
        let mut single = HugeArray::<u64>::new(size);
        paged.copy_to(&mut single, size - 5);
        assert_eq!(single.get(size - 6), size - 6);
        assert_eq!(single.get(size - 5), 0);

        let mut paged_dest = HugeArray::<u64>::of_paged(size, DefaultPages);
        single.copy_to(&mut paged_dest, size);
        assert_eq!(paged_dest.get(4100), 4100);
        assert_eq!(paged_dest.get(size - 1), 0);
    }

    #[test]
    fn copy_of_extends() {
        let array = HugeArray::<u64>::of(3, IdentityPages);
        let copy = array.copy_of(5);
        assert_eq!(copy.to_vec(), vec![0, 1, 2, 0, 0]);
    }

    #[test]
    fn release_is_idempotent() {
        let mut array = HugeArray::<u64>::new(100);
        let size_of = array.size_of();
        assert_eq!(size_of, 24 + 800);
        assert_eq!(array.release(), size_of);
        assert_eq!(array.release(), 0);
        assert_eq!(array.size_of(), 0);
    }

    #[test]
    fn memory_estimation_matches_instance() {
        for size in [0, 1, 1000] {
            let array = HugeArray::<f64>::new(size);
            assert_eq!(
                HugeArray::<f64>::memory_estimation(size),
                mem::size_of_instance::<HugeArray<f64>>() + array.size_of()
            );
        }
    }

    #[test]
    fn of_pages_checks_capacity() {
        let page = 1usize << <u64 as HugeElement>::PAGE_SHIFT;
        let pages = vec![vec![1u64; page], vec![2u64; 10]];
        let array = HugeArray::of_pages(pages.clone(), page as u64 + 5).expect("fits");
        assert_eq!(array.get(page as u64 + 4), 2);
        assert_eq!(array.size(), page as u64 + 5);

        let err = HugeArray::of_pages(pages, page as u64 + 11).expect_err("too large");
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn of_pages_rejects_misshaped_pages() {
        let page = 1usize << <i64 as HugeElement>::PAGE_SHIFT;

        let oversized_last = vec![vec![1i64; page], vec![2i64; page * 2]];
        let err = HugeArray::of_pages(oversized_last, page as u64 * 3).expect_err("last page too long");
        assert!(matches!(err, GraphError::MisshapedPage { page: 1, .. }));

        let short_middle = vec![vec![1i64; page - 1], vec![2i64; 4]];
        let err = HugeArray::of_pages(short_middle, 4).expect_err("first page short");
        assert!(matches!(err, GraphError::MisshapedPage { page: 0, .. }));

        let exact = vec![vec![1i64; page], vec![2i64; page]];
        let array = HugeArray::of_pages(exact, page as u64 * 2).expect("two full pages");
        assert_eq!(array.get(page as u64 * 2 - 1), 2);
    }

    #[test]
    fn from_vec_keeps_values() {
        let array = HugeArray::from_vec(vec![3i64, 1, 4]);
        assert!(!array.is_paged());
        assert_eq!(array.to_vec(), vec![3, 1, 4]);
    }

    #[test]
    fn binary_search_sorted() {
        let array = HugeArray::<u64>::of(100, |p: &mut [u64], base: u64| {
            for (i, v) in p.iter_mut().enumerate() {
                *v = (base + i as u64) * 2;
            }
        });
        assert_eq!(array.binary_search(42), Ok(21));
        assert_eq!(array.binary_search(43), Err(22));
        assert_eq!(array.binary_search(1000), Err(100));
    }

    #[test]
    fn bitwise_helpers() {
        let mut array = HugeArray::<u64>::new(2);
        assert_eq!(array.or(1, 0b1010), 0b1010);
        assert_eq!(array.or(1, 0b0101), 0b1111);
        assert_eq!(array.and(1, 0b0110), 0b0110);
    }

    #[test]
    fn cursor_visits_pages_in_order() {
        let size = paged_size();
        let array = HugeArray::<u64>::of_paged(size, IdentityPages);
        let mut expected_base = 0;
        for (base, page) in array.cursor() {
            assert_eq!(base, expected_base);
            assert_eq!(page[0], base);
            expected_base += page.len() as u64;
        }
        assert_eq!(expected_base, size);
    }
}
