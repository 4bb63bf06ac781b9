//! Viewport classifier: maps a viewport width to a tile column count.

use crate::config::{Breakpoint, DeckConfig};

/// Column count for `width` under the stock breakpoints.
pub fn columns_for(width: u32) -> usize {
    let config = DeckConfig::default();
    columns_with(&config.breakpoints, config.wide_columns, width)
}

fn columns_with(breakpoints: &[Breakpoint], wide_columns: usize, width: u32) -> usize {
    breakpoints
        .iter()
        .find(|bp| width < bp.max_width)
        .map(|bp| bp.columns)
        .unwrap_or(wide_columns)
}

/// Tracks the current column count across resize notifications.
#[derive(Debug, Clone)]
pub struct ViewportClassifier {
    breakpoints: Vec<Breakpoint>,
    wide_columns: usize,
    columns: usize,
    width: Option<u32>,
}

impl ViewportClassifier {
    pub fn new(config: &DeckConfig) -> Self {
        Self {
            breakpoints: config.breakpoints.clone(),
            wide_columns: config.wide_columns,
            columns: config.initial_columns,
            width: None,
        }
    }

    pub fn classify(&self, width: u32) -> usize {
        columns_with(&self.breakpoints, self.wide_columns, width)
    }

    /// Record a new width. Returns the new column count only when it changed.
    pub fn observe(&mut self, width: u32) -> Option<usize> {
        self.width = Some(width);
        let columns = self.classify(width);
        if columns == self.columns {
            return None;
        }
        self.columns = columns;
        Some(columns)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Last observed width, `None` before the first measurement.
    pub fn width(&self) -> Option<u32> {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_breakpoints() {
        assert_eq!(columns_for(0), 2);
        assert_eq!(columns_for(639), 2);
        assert_eq!(columns_for(640), 3);
        assert_eq!(columns_for(767), 3);
        assert_eq!(columns_for(768), 4);
        assert_eq!(columns_for(1023), 4);
        assert_eq!(columns_for(1024), 7);
        assert_eq!(columns_for(3840), 7);
    }

    #[test]
    fn starts_wide_before_measurement() {
        let classifier = ViewportClassifier::new(&DeckConfig::default());
        assert_eq!(classifier.columns(), 8);
        assert_eq!(classifier.width(), None);
    }

    #[test]
    fn observe_reports_only_changes() {
        let mut classifier = ViewportClassifier::new(&DeckConfig::default());
        assert_eq!(classifier.observe(1280), Some(7));
        assert_eq!(classifier.observe(1100), None);
        assert_eq!(classifier.observe(700), Some(3));
        assert_eq!(classifier.observe(650), None);
        assert_eq!(classifier.width(), Some(650));
    }

    #[test]
    fn custom_breakpoints() {
        let config = DeckConfig {
            breakpoints: vec![Breakpoint::new(500, 1)],
            wide_columns: 5,
            ..DeckConfig::default()
        };
        let classifier = ViewportClassifier::new(&config);
        assert_eq!(classifier.classify(499), 1);
        assert_eq!(classifier.classify(500), 5);
    }
}
