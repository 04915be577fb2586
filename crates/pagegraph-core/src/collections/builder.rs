//! Append-only construction of huge arrays whose final size is unknown up front.

use super::element::HugeElement;
use super::huge_array::HugeArray;
use super::pages::PageGeometry;

/// Grows page by page, then freezes into a [`HugeArray`].
#[derive(Debug)]
pub struct HugeArrayBuilder<T: HugeElement> {
    pages: Vec<Vec<T>>,
    current: Vec<T>,
    page_size: usize,
    size: u64,
}

impl<T: HugeElement> Default for HugeArrayBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HugeElement> HugeArrayBuilder<T> {
    pub fn new() -> Self {
        let page_size = PageGeometry::of::<T>().page_size;
        Self {
            pages: Vec::new(),
            current: Vec::with_capacity(page_size),
            page_size,
            size: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        if self.current.len() == self.page_size {
            let full = std::mem::replace(&mut self.current, Vec::with_capacity(self.page_size));
            self.pages.push(full);
        }
        self.current.push(value);
        self.size += 1;
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        let mut rest = values;
        while !rest.is_empty() {
            if self.current.len() == self.page_size {
                let full = std::mem::replace(&mut self.current, Vec::with_capacity(self.page_size));
                self.pages.push(full);
            }
            let take = (self.page_size - self.current.len()).min(rest.len());
            self.current.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
        }
        self.size += values.len() as u64;
    }

    /// Freeze the appended values. A single page becomes a single-allocation array.
    pub fn build(mut self) -> HugeArray<T> {
        if self.pages.is_empty() {
            return HugeArray::from_vec(self.current);
        }
        if !self.current.is_empty() {
            self.pages.push(self.current);
        }
        HugeArray::from_full_pages(self.pages, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_builds_single() {
        let mut builder = HugeArrayBuilder::<f64>::new();
        builder.push(1.0);
        builder.extend_from_slice(&[2.0, 3.0]);
        let array = builder.build();
        assert!(!array.is_paged());
        assert_eq!(array.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn large_builds_paged() {
        let page = PageGeometry::of::<u64>().page_size as u64;
        let mut builder = HugeArrayBuilder::<u64>::new();
        let values: Vec<u64> = (0..page + 10).collect();
        builder.extend_from_slice(&values[..7]);
        for &v in &values[7..] {
            builder.push(v);
        }
        assert_eq!(builder.size(), page + 10);
        let array = builder.build();
        assert!(array.is_paged());
        assert_eq!(array.get(page + 9), page + 9);
        assert_eq!(array.get(page - 1), page - 1);
    }
}
