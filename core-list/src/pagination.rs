//! Pagination helper types for remote list queries

use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based, matching the remote API)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_list::pagination::PageRequest;
    ///
    /// let request = PageRequest::new(1, 20);
    /// assert_eq!(request.page, 1);
    /// assert_eq!(request.page_size, 20);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    /// Request for the first page
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    /// Request for the page after this one
    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            page_size: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of a remote collection, with server-reported pagination state.
///
/// Item ordering is server-defined and preserved as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Page number (1-based)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
    /// Total number of items across all pages
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Check if there are more pages after the current one
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_is_one_based() {
        let request = PageRequest::new(0, 20);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_page_request_next() {
        let request = PageRequest::first(10);
        assert_eq!(request.next().page, 2);
        assert_eq!(request.next().page_size, 10);
    }

    #[test]
    fn test_has_next() {
        let page = Page {
            items: vec![1, 2, 3],
            page: 1,
            page_size: 10,
            total: 25,
            total_pages: 3,
        };
        assert!(page.has_next());

        let last = Page { page: 3, ..page };
        assert!(!last.has_next());
    }

    #[test]
    fn test_map_preserves_metadata() {
        let page = Page {
            items: vec![1, 2, 3],
            page: 2,
            page_size: 10,
            total: 25,
            total_pages: 3,
        };
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_pages, 3);
    }
}
