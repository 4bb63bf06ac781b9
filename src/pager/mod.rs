//! Pager: slices ordered groups into fixed-size pages and navigates them.
//!
//! Manual navigation is clamped to `[0, page_count - 1]`; only the page
//! autoplay timer wraps (see [`Pager::advance_wrapping`]).

use serde_json::json;

use crate::grouping::Group;
use crate::logging::{LogLevel, Logger, emit, json_kv};

const LOG_TARGET: &str = "tile_deck::pager";

/// Direction of the page transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideDirection {
    Left,
    Right,
}

impl SlideDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// One page indicator dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDot {
    pub index: usize,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Pager {
    groups: Vec<Group>,
    columns: usize,
    rows: usize,
    current_page: usize,
    direction: SlideDirection,
    logger: Option<Logger>,
}

impl Pager {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            groups: Vec::new(),
            columns: columns.max(1),
            rows: rows.max(1),
            current_page: 0,
            direction: SlideDirection::Right,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn items_per_page(&self) -> usize {
        self.columns * self.rows
    }

    /// `ceil(groups / items_per_page)`; zero when there are no groups.
    pub fn page_count(&self) -> usize {
        self.groups.len().div_ceil(self.items_per_page())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn direction(&self) -> SlideDirection {
        self.direction
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn current_page_groups(&self) -> &[Group] {
        let per_page = self.items_per_page();
        let start = (self.current_page * per_page).min(self.groups.len());
        let end = (start + per_page).min(self.groups.len());
        &self.groups[start..end]
    }

    pub fn can_scroll_left(&self) -> bool {
        self.current_page > 0
    }

    pub fn can_scroll_right(&self) -> bool {
        self.current_page + 1 < self.page_count()
    }

    /// Navigation controls are only meaningful with more than one page.
    pub fn navigation_enabled(&self) -> bool {
        self.page_count() > 1
    }

    /// One dot per page, empty when there is a single page or none.
    pub fn page_dots(&self) -> Vec<PageDot> {
        if !self.navigation_enabled() {
            return Vec::new();
        }
        (0..self.page_count())
            .map(|index| PageDot {
                index,
                active: index == self.current_page,
            })
            .collect()
    }

    /// Step one page in `direction`. Returns whether the page changed.
    pub fn scroll(&mut self, direction: SlideDirection) -> bool {
        self.direction = direction;
        let target = match direction {
            SlideDirection::Left if self.can_scroll_left() => self.current_page - 1,
            SlideDirection::Right if self.can_scroll_right() => self.current_page + 1,
            _ => return false,
        };
        self.set_page(target, "scroll");
        true
    }

    /// Jump to `index`, animating towards it. Returns whether the page changed.
    pub fn goto_page(&mut self, index: usize) -> bool {
        self.direction = if index > self.current_page {
            SlideDirection::Right
        } else {
            SlideDirection::Left
        };
        let last = self.page_count().saturating_sub(1);
        let target = if index > last {
            emit(
                self.logger.as_ref(),
                LogLevel::Warn,
                LOG_TARGET,
                "goto_out_of_range",
                [json_kv("requested", json!(index)), json_kv("last", json!(last))],
            );
            last
        } else {
            index
        };
        let changed = target != self.current_page;
        self.set_page(target, "goto");
        changed
    }

    /// Autoplay step: always moves right and wraps from the last page to the first.
    pub fn advance_wrapping(&mut self) -> bool {
        self.direction = SlideDirection::Right;
        let count = self.page_count();
        if count == 0 {
            return false;
        }
        let target = (self.current_page + 1) % count;
        let changed = target != self.current_page;
        self.set_page(target, "autoplay");
        changed
    }

    /// Apply a new column count. Page boundaries move, so the page resets to 0.
    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
        self.set_page(0, "columns_changed");
    }

    /// Replace the group list, keeping the current page if it is still in range.
    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
        let last = self.page_count().saturating_sub(1);
        if self.current_page > last {
            self.set_page(last, "groups_replaced");
        }
    }

    fn set_page(&mut self, page: usize, reason: &str) {
        if page != self.current_page {
            emit(
                self.logger.as_ref(),
                LogLevel::Debug,
                LOG_TARGET,
                "page_changed",
                [
                    json_kv("from", json!(self.current_page)),
                    json_kv("to", json!(page)),
                    json_kv("reason", json!(reason)),
                ],
            );
        }
        self.current_page = page;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_records;
    use crate::record::Record;

    fn groups(count: u32) -> Vec<Group> {
        let records: Vec<Record> = (0..count)
            .map(|i| Record::new(format!("r{i}"), i))
            .collect();
        group_records(&records)
    }

    fn pager_with(count: u32, columns: usize, rows: usize) -> Pager {
        let mut pager = Pager::new(columns, rows);
        pager.set_groups(groups(count));
        pager
    }

    fn page_keys(pager: &Pager) -> Vec<String> {
        pager
            .current_page_groups()
            .iter()
            .map(|g| g.key.to_string())
            .collect()
    }

    #[test]
    fn fifteen_groups_on_seven_by_two() {
        let mut pager = pager_with(15, 7, 2);
        assert_eq!(pager.items_per_page(), 14);
        assert_eq!(pager.page_count(), 2);
        let expected: Vec<String> = (0..14).map(|i| i.to_string()).collect();
        assert_eq!(page_keys(&pager), expected);

        assert!(pager.scroll(SlideDirection::Right));
        assert_eq!(page_keys(&pager), vec!["14".to_string()]);
    }

    #[test]
    fn page_count_is_ceiling() {
        for (count, columns, rows, pages) in [
            (0, 7, 2, 0),
            (1, 7, 2, 1),
            (14, 7, 2, 1),
            (28, 7, 2, 2),
            (29, 7, 2, 3),
            (9, 2, 2, 3),
        ] {
            assert_eq!(
                pager_with(count, columns, rows).page_count(),
                pages,
                "{count} groups at {columns}x{rows}"
            );
        }
    }

    #[test]
    fn scroll_is_clamped() {
        let mut pager = pager_with(15, 7, 2);
        assert!(!pager.can_scroll_left());
        assert!(!pager.scroll(SlideDirection::Left));
        assert_eq!(pager.current_page(), 0);
        assert_eq!(pager.direction(), SlideDirection::Left);

        assert!(pager.scroll(SlideDirection::Right));
        assert!(!pager.can_scroll_right());
        assert!(!pager.scroll(SlideDirection::Right));
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn autoplay_wraps_where_scroll_does_not() {
        let mut pager = pager_with(15, 7, 2);
        pager.scroll(SlideDirection::Right);
        pager.scroll(SlideDirection::Left);
        pager.goto_page(1);
        assert!(pager.advance_wrapping());
        assert_eq!(pager.current_page(), 0);
        assert_eq!(pager.direction(), SlideDirection::Right);
    }

    #[test]
    fn goto_sets_direction_from_target() {
        let mut pager = pager_with(40, 2, 2);
        assert!(pager.goto_page(5));
        assert_eq!(pager.direction(), SlideDirection::Right);
        assert!(pager.goto_page(2));
        assert_eq!(pager.direction(), SlideDirection::Left);
        assert!(!pager.goto_page(2));
        assert_eq!(pager.direction(), SlideDirection::Left);
    }

    #[test]
    fn goto_out_of_range_clamps_to_last_page() {
        let mut pager = pager_with(15, 7, 2);
        pager.goto_page(9);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn column_change_resets_to_first_page() {
        let mut pager = pager_with(30, 2, 2);
        pager.goto_page(6);
        pager.set_columns(7);
        assert_eq!(pager.current_page(), 0);
        assert_eq!(pager.page_count(), 3);
        assert!(pager.current_page() < pager.page_count().max(1));
    }

    #[test]
    fn replacing_groups_clamps_page() {
        let mut pager = pager_with(30, 2, 2);
        pager.goto_page(7);
        pager.set_groups(groups(5));
        assert_eq!(pager.current_page(), 1);
        pager.set_groups(Vec::new());
        assert_eq!(pager.current_page(), 0);
        assert!(pager.current_page_groups().is_empty());
    }

    #[test]
    fn dots_only_with_multiple_pages() {
        assert!(pager_with(14, 7, 2).page_dots().is_empty());
        let mut pager = pager_with(15, 7, 2);
        pager.goto_page(1);
        assert_eq!(
            pager.page_dots(),
            vec![
                PageDot { index: 0, active: false },
                PageDot { index: 1, active: true },
            ]
        );
    }
}
