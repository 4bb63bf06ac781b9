//! Deck configuration knobs.
//!
//! Every field has a default matching the stock layout, so a JSON document
//! only needs to name what it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A viewport width boundary: widths strictly below `max_width` get `columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub max_width: u32,
    pub columns: usize,
}

impl Breakpoint {
    pub const fn new(max_width: u32, columns: usize) -> Self {
        Self { max_width, columns }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Tile rows per page.
    pub rows: usize,
    /// Column count assumed before the first viewport measurement.
    pub initial_columns: usize,
    /// Ascending breakpoints; the first whose `max_width` exceeds the width wins.
    pub breakpoints: Vec<Breakpoint>,
    /// Columns used once the width clears every breakpoint.
    pub wide_columns: usize,
    pub page_interval_ms: u64,
    /// Slide dwell when an item does not declare its own.
    pub default_slide_speed_ms: u64,
    /// Minimum intersection ratio for a tile to count as visible.
    pub visibility_threshold: f32,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            rows: 2,
            initial_columns: 8,
            breakpoints: vec![
                Breakpoint::new(640, 2),
                Breakpoint::new(768, 3),
                Breakpoint::new(1024, 4),
            ],
            wide_columns: 7,
            page_interval_ms: 15_000,
            default_slide_speed_ms: 3_000,
            visibility_threshold: 0.3,
        }
    }
}

impl DeckConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::Invalid("rows must be at least 1".into()));
        }
        if self.initial_columns == 0 || self.wide_columns == 0 {
            return Err(ConfigError::Invalid("column counts must be at least 1".into()));
        }
        if self.breakpoints.iter().any(|bp| bp.columns == 0) {
            return Err(ConfigError::Invalid(
                "breakpoint column counts must be at least 1".into(),
            ));
        }
        if self
            .breakpoints
            .windows(2)
            .any(|pair| pair[0].max_width >= pair[1].max_width)
        {
            return Err(ConfigError::Invalid(
                "breakpoints must be strictly ascending by width".into(),
            ));
        }
        if self.page_interval_ms == 0 || self.default_slide_speed_ms == 0 {
            return Err(ConfigError::Invalid("intervals must be non-zero".into()));
        }
        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "visibility threshold {} outside (0, 1]",
                self.visibility_threshold
            )));
        }
        Ok(())
    }

    pub fn page_interval(&self) -> Duration {
        Duration::from_millis(self.page_interval_ms)
    }

    pub fn default_slide_speed(&self) -> Duration {
        Duration::from_millis(self.default_slide_speed_ms)
    }
}
