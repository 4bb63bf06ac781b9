use thiserror::Error;

use crate::config::ConfigError;

/// Unified result type for the tile deck crate.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Failure reported by a content provider.
///
/// Every variant surfaces to the page the same way: a user-visible message
/// plus a retry action. No partial data is shown.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the deck engine.
///
/// Provider failures are not errors at this level; they become
/// `LoadState::Failed` and wait for a retry. Logging failures are dropped.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("tile `{0}` is not mounted")]
    TileNotMounted(String),
    #[error("slide index {index} out of range for tile `{tile}` ({len} items)")]
    SlideOutOfRange {
        tile: String,
        index: usize,
        len: usize,
    },
    #[error("a fetch is already in flight")]
    FetchInFlight,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_io_errors_convert() {
        let err: DeckError = ConfigError::Invalid("rows must be at least 1".into()).into();
        assert_eq!(
            err.to_string(),
            "configuration error: invalid config: rows must be at least 1"
        );
        let err: DeckError = std::io::Error::other("closed").into();
        assert!(matches!(err, DeckError::Io(_)));
    }
}
