//! Pagination planning.
//!
//! The one place where pagination arithmetic lives. Every category used to
//! be one off-by-one away from its neighbours when this math was repeated
//! per call site; [`PagePlan::compute`] takes the three inputs and returns
//! the whole layout.

/// One page's worth of records, as a query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// 1-indexed page number (page 1 is the implicit first page; overflow
    /// pages start at 2).
    pub number: u64,
    /// Offset into the newest-first record ordering.
    pub offset: u64,
    /// Maximum records on this page (the final page may hold fewer).
    pub limit: u64,
}

/// The full fragment layout for one category at one record count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// Records shown in the front-page preview.
    pub home_len: u64,
    /// The implicit first listing page.
    pub first_page: PageSlice,
    /// Overflow pages, numbered from 2 upward.
    pub overflow: Vec<PageSlice>,
}

impl PagePlan {
    /// Compute the page layout for `total_records` records.
    ///
    /// `page_size` and `home_count` must be at least 1 (enforced at
    /// configuration load).
    ///
    /// The number of overflow pages is
    /// `ceil(max(0, total_records - page_size) / page_size)`: the first
    /// `page_size` records live on the implicit page 1, and each overflow
    /// page `i` (0-based) covers the window at offset
    /// `page_size + i * page_size`.
    pub fn compute(total_records: u64, page_size: u64, home_count: u64) -> Self {
        let overflow_pages = total_records.saturating_sub(page_size).div_ceil(page_size);
        let overflow = (0..overflow_pages)
            .map(|i| PageSlice {
                number: i + 2,
                offset: page_size + i * page_size,
                limit: page_size,
            })
            .collect();
        Self {
            home_len: home_count.min(total_records),
            first_page: PageSlice { number: 1, offset: 0, limit: page_size.min(total_records) },
            overflow,
        }
    }

    /// Number of overflow pages beyond the implicit first page.
    ///
    /// This is the value published in the category's page-count file.
    pub fn overflow_pages(&self) -> u64 {
        self.overflow.len() as u64
    }

    /// Highest valid 1-indexed page number (at least 1, even when empty —
    /// page 1 always exists as an empty listing).
    pub fn last_page(&self) -> u64 {
        self.overflow.last().map_or(1, |slice| slice.number)
    }

    /// The page following `number`, if any.
    pub fn next_after(&self, number: u64) -> Option<u64> {
        (number < self.last_page()).then_some(number + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // ceil(max(0, N - page_size) / page_size)
    #[case(0, 6, 0)]
    #[case(1, 6, 0)]
    #[case(6, 6, 0)]
    #[case(7, 6, 1)]
    #[case(12, 6, 1)]
    #[case(13, 6, 2)]
    #[case(3, 2, 1)]
    #[case(4, 2, 1)]
    #[case(5, 2, 2)]
    #[case(100, 12, 8)]
    fn test_overflow_page_count(#[case] total: u64, #[case] page_size: u64, #[case] expected: u64) {
        let plan = PagePlan::compute(total, page_size, 2);
        assert_eq!(plan.overflow_pages(), expected);
    }

    #[test]
    fn test_offsets_tile_the_record_range() {
        let plan = PagePlan::compute(13, 6, 2);
        assert_eq!(plan.first_page, PageSlice { number: 1, offset: 0, limit: 6 });
        assert_eq!(plan.overflow, vec![
            PageSlice { number: 2, offset: 6, limit: 6 },
            PageSlice { number: 3, offset: 12, limit: 6 },
        ]);
    }

    #[test]
    fn test_home_and_first_page_clamp_to_total() {
        let plan = PagePlan::compute(1, 6, 2);
        assert_eq!(plan.home_len, 1);
        assert_eq!(plan.first_page.limit, 1);
        let empty = PagePlan::compute(0, 6, 2);
        assert_eq!(empty.home_len, 0);
        assert_eq!(empty.first_page.limit, 0);
        assert_eq!(empty.overflow_pages(), 0);
    }

    #[test]
    fn test_next_after() {
        let plan = PagePlan::compute(5, 2, 2);
        assert_eq!(plan.last_page(), 3);
        assert_eq!(plan.next_after(1), Some(2));
        assert_eq!(plan.next_after(2), Some(3));
        assert_eq!(plan.next_after(3), None);
        let single = PagePlan::compute(2, 2, 2);
        assert_eq!(single.last_page(), 1);
        assert_eq!(single.next_after(1), None);
    }
}
