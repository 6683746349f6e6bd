//! Paging over the current block's transaction hashes.
//!
//! Pages are 1-based. With an empty list there are zero pages, the current
//! page stays at 1 and every navigation request is ignored.

pub const DEFAULT_ITEMS_PER_PAGE: usize = 15;

/// Number of pages needed for `len` items (`ceil(len / per_page)`).
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}

/// Half-open index range of `page` within a list of `len` items.
pub fn page_bounds(page: usize, per_page: usize, len: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(per_page).min(len);
    let end = start.saturating_add(per_page).min(len);
    (start, end)
}

/// The slice of `items` visible on `page`.
pub fn visible<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let (start, end) = page_bounds(page, per_page, items.len());
    &items[start..end]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    items_per_page: usize,
    total_pages: usize,
}

impl Pagination {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
            total_pages: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }
    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Recompute page count for a list of `len` items, keeping the current
    /// page when it still exists.
    pub fn resize(&mut self, len: usize) {
        self.total_pages = total_pages(len, self.items_per_page);
        if self.current_page > self.total_pages {
            self.current_page = self.total_pages.max(1);
        }
    }

    /// Start over on page 1 of a fresh list of `len` items.
    pub fn reset(&mut self, len: usize) {
        self.current_page = 1;
        self.resize(len);
    }

    /// Jump to `page` if it exists. Out-of-range targets are a no-op.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev(&mut self) -> bool {
        // page 0 is rejected by go_to_page
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    /// Offset of the first visible item within the full list.
    pub fn offset(&self) -> usize {
        (self.current_page - 1) * self.items_per_page
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        visible(items, self.current_page, self.items_per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("0x{i:064x}")).collect()
    }

    #[test]
    fn pages_partition_the_list() {
        for n in 0..=50 {
            for per_page in 1..=16 {
                let list = hashes(n);
                let pages = total_pages(n, per_page);
                assert_eq!(pages, (n + per_page - 1) / per_page);

                let mut joined = Vec::new();
                for k in 1..=pages {
                    let page = visible(&list, k, per_page);
                    if k < pages {
                        assert_eq!(page.len(), per_page, "n={n} p={per_page} k={k}");
                    } else {
                        assert!(!page.is_empty() && page.len() <= per_page);
                    }
                    joined.extend_from_slice(page);
                }
                assert_eq!(joined, list);
            }
        }
    }

    #[test]
    fn forty_seven_items_fifteen_per_page() {
        let list = hashes(47);
        let mut p = Pagination::new(15);
        p.reset(list.len());
        assert_eq!(p.total_pages(), 4);
        assert_eq!(p.slice(&list), &list[0..15]);

        assert!(p.go_to_page(4));
        assert_eq!(p.slice(&list), &list[45..47]);
        assert_eq!(p.offset(), 45);
    }

    #[test]
    fn out_of_range_navigation_is_ignored() {
        let mut p = Pagination::new(15);
        p.reset(47);
        p.go_to_page(2);

        let before = p;
        assert!(!p.go_to_page(0));
        assert!(!p.go_to_page(5));
        assert!(!p.go_to_page(usize::MAX));
        assert_eq!(p, before);
    }

    #[test]
    fn prev_and_next_stop_at_the_edges() {
        let mut p = Pagination::new(10);
        p.reset(25);
        assert!(!p.prev());
        assert!(p.next());
        assert!(p.next());
        assert!(!p.next());
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let mut p = Pagination::new(15);
        p.reset(0);
        assert_eq!(p.total_pages(), 0);
        assert_eq!(p.current_page(), 1);
        assert!(!p.go_to_page(1));
        assert!(p.slice::<String>(&[]).is_empty());
    }

    #[test]
    fn resize_clamps_a_page_that_no_longer_exists() {
        let mut p = Pagination::new(15);
        p.reset(47);
        p.go_to_page(4);
        p.resize(20);
        assert_eq!(p.current_page(), 2);
    }
}
