use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ViewMode {
    /// Paged list of per-instance summaries.
    #[default]
    SinglePage,
    /// Paged grid of full boards, refreshed by its own display task.
    MultiGrid,
}

/// Which page of the swarm the operator is looking at.
///
/// Page indices always stay in range: every move wraps modulo the page count,
/// and the page count is never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    mode: ViewMode,
    single_page: usize,
    multi_page: usize,
    total: usize,
    page_size: usize,
    multi_page_size: usize,
}

impl ViewState {
    pub fn new(total: usize, page_size: usize, multi_page_size: usize) -> Self {
        Self {
            mode: ViewMode::SinglePage,
            single_page: 0,
            multi_page: 0,
            total,
            page_size: page_size.max(1),
            multi_page_size: multi_page_size.max(1),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn single_page(&self) -> usize {
        self.single_page
    }

    pub fn multi_page(&self) -> usize {
        self.multi_page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn multi_page_size(&self) -> usize {
        self.multi_page_size
    }

    pub fn single_page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    pub fn multi_page_count(&self) -> usize {
        page_count(self.total, self.multi_page_size)
    }

    pub fn next_page(&mut self) -> usize {
        self.single_page = (self.single_page + 1) % self.single_page_count();
        self.single_page
    }

    pub fn prev_page(&mut self) -> usize {
        let pages = self.single_page_count();
        self.single_page = (self.single_page + pages - 1) % pages;
        self.single_page
    }

    pub fn multi_next_page(&mut self) -> usize {
        self.multi_page = (self.multi_page + 1) % self.multi_page_count();
        self.multi_page
    }

    pub fn multi_prev_page(&mut self) -> usize {
        let pages = self.multi_page_count();
        self.multi_page = (self.multi_page + pages - 1) % pages;
        self.multi_page
    }

    /// Switch to the board grid, starting from its first page.
    pub fn enter_multi(&mut self) {
        self.mode = ViewMode::MultiGrid;
        self.multi_page = 0;
    }

    pub fn leave_multi(&mut self) {
        self.mode = ViewMode::SinglePage;
    }

    /// The collection changed size; pull both page indices back into range.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.single_page = self.single_page.min(self.single_page_count() - 1);
        self.multi_page = self.multi_page.min(self.multi_page_count() - 1);
    }

    /// Index range of the page currently shown in `mode`.
    pub fn window(&self) -> Range<usize> {
        match self.mode {
            ViewMode::SinglePage => page_range(self.single_page, self.page_size, self.total),
            ViewMode::MultiGrid => page_range(self.multi_page, self.multi_page_size, self.total),
        }
    }

    /// Current page index and page count for the active mode.
    pub fn position(&self) -> (usize, usize) {
        match self.mode {
            ViewMode::SinglePage => (self.single_page, self.single_page_count()),
            ViewMode::MultiGrid => (self.multi_page, self.multi_page_count()),
        }
    }
}

fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size).max(1)
}

fn page_range(page: usize, page_size: usize, total: usize) -> Range<usize> {
    let start = (page * page_size).min(total);
    let end = (start + page_size).min(total);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_games_ten_per_page() {
        let mut view = ViewState::new(1000, 10, 5);
        assert_eq!(view.single_page_count(), 100);
        for _ in 0..99 {
            view.next_page();
        }
        assert_eq!(view.single_page(), 99);
        assert_eq!(view.window(), 990..1000);
        assert_eq!(view.next_page(), 0);
    }

    #[test]
    fn navigation_is_cyclic_both_ways() {
        let mut view = ViewState::new(23, 4, 3);
        let pages = view.single_page_count();
        assert_eq!(pages, 6);

        view.next_page();
        view.next_page();
        let start = view.single_page();
        for _ in 0..pages {
            view.next_page();
        }
        assert_eq!(view.single_page(), start);
        for _ in 0..pages {
            view.prev_page();
        }
        assert_eq!(view.single_page(), start);
    }

    #[test]
    fn prev_from_first_page_wraps_to_last() {
        let mut view = ViewState::new(23, 4, 3);
        assert_eq!(view.prev_page(), 5);
        assert_eq!(view.window(), 20..23);
    }

    #[test]
    fn multi_grid_uses_its_own_page_size() {
        let mut view = ViewState::new(23, 4, 3);
        view.next_page();
        view.enter_multi();
        assert_eq!(view.mode(), ViewMode::MultiGrid);
        assert_eq!(view.multi_page(), 0);
        assert_eq!(view.multi_page_count(), 8);
        assert_eq!(view.window(), 0..3);

        let pages = view.multi_page_count();
        for _ in 0..pages {
            view.multi_next_page();
        }
        assert_eq!(view.multi_page(), 0);
        assert_eq!(view.multi_prev_page(), 7);
        assert_eq!(view.window(), 21..23);

        view.leave_multi();
        assert_eq!(view.mode(), ViewMode::SinglePage);
        assert_eq!(view.single_page(), 1);
    }

    #[test]
    fn reentering_multi_resets_its_page() {
        let mut view = ViewState::new(50, 10, 5);
        view.enter_multi();
        view.multi_next_page();
        view.multi_next_page();
        view.leave_multi();
        view.enter_multi();
        assert_eq!(view.multi_page(), 0);
    }

    #[test]
    fn shrinking_total_clamps_pages() {
        let mut view = ViewState::new(100, 10, 5);
        for _ in 0..7 {
            view.next_page();
        }
        view.set_total(15);
        assert_eq!(view.single_page(), 1);
        assert_eq!(view.window(), 10..15);
    }

    #[test]
    fn empty_swarm_has_one_empty_page() {
        let mut view = ViewState::new(0, 10, 5);
        assert_eq!(view.single_page_count(), 1);
        assert_eq!(view.next_page(), 0);
        assert_eq!(view.prev_page(), 0);
        assert!(view.window().is_empty());
    }
}
