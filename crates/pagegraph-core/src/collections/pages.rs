//! Page geometry and page fill strategies.

use super::element::HugeElement;
use crate::mem;

/// Shift/mask arithmetic of a paged array, computed once per element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub page_shift: u32,
    pub page_size: usize,
    pub page_mask: u64,
}

impl PageGeometry {
    #[must_use]
    pub const fn with_shift(page_shift: u32) -> Self {
        let page_size = 1usize << page_shift;
        Self {
            page_shift,
            page_size,
            page_mask: page_size as u64 - 1,
        }
    }

    #[must_use]
    pub const fn of<T: HugeElement>() -> Self {
        Self::with_shift(T::PAGE_SHIFT)
    }

    #[inline]
    #[must_use]
    pub const fn page_index(&self, index: u64) -> usize {
        (index >> self.page_shift) as usize
    }

    #[inline]
    #[must_use]
    pub const fn index_in_page(&self, index: u64) -> usize {
        (index & self.page_mask) as usize
    }

    #[must_use]
    pub const fn num_pages(&self, size: u64) -> usize {
        mem::num_pages(size, self.page_shift)
    }

    /// Length of the last page for an array of `size` elements.
    #[must_use]
    pub const fn last_page_size(&self, size: u64) -> usize {
        let rest = self.index_in_page(size);
        if rest == 0 && size > 0 {
            self.page_size
        } else {
            rest
        }
    }
}

/// Fills freshly allocated pages.
///
/// Pages arrive default-filled; `base` is the global index of the page's first element.
pub trait PageCreator<T>: Sync {
    fn fill_page(&self, page: &mut [T], base: u64);
}

impl<T, F> PageCreator<T> for F
where
    F: Fn(&mut [T], u64) + Sync,
{
    fn fill_page(&self, page: &mut [T], base: u64) {
        self(page, base);
    }
}

/// Leaves pages at the element default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPages;

impl<T> PageCreator<T> for DefaultPages {
    fn fill_page(&self, _page: &mut [T], _base: u64) {}
}

/// Sets every element to its own index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPages;

impl<T: HugeElement> PageCreator<T> for IdentityPages {
    fn fill_page(&self, page: &mut [T], base: u64) {
        for (offset, slot) in page.iter_mut().enumerate() {
            *slot = T::from_index(base + offset as u64);
        }
    }
}

/// Sets every element to one value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPages<T>(pub T);

impl<T: HugeElement> PageCreator<T> for ConstantPages<T> {
    fn fill_page(&self, page: &mut [T], _base: u64) {
        page.fill(self.0);
    }
}
