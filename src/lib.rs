//! Paginated, auto-rotating deck of content tiles.
//!
//! Records fetched from a content provider are grouped by key into tiles,
//! laid out in a responsive grid of `columns x rows` per page, and rotated on
//! a page timer. Every tile is itself a carousel that advances only while it
//! is on screen and not hovered. [`DeckRuntime`] owns the whole graph and is
//! driven by [`DeckEvent`]s on a virtual clock.

pub mod autoplay;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod logging;
pub mod metrics;
pub mod pager;
pub mod provider;
pub mod record;
pub mod render;
pub mod runtime;
pub mod tile;
pub mod timers;
pub mod viewport;
pub mod visibility;

pub use autoplay::{
    DeckTimers, PageAutoplay, Playhead, SlideAutoplay, SlideState, TimerChange, TimerTag,
};
pub use config::{Breakpoint, ConfigError, DeckConfig};
pub use error::{DeckError, FetchError, Result};
pub use geometry::{Rect, Size};
pub use grouping::{Group, GroupingEngine, group_records};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{DeckMetrics, MetricSnapshot};
pub use pager::{PageDot, Pager, SlideDirection};
pub use provider::{
    ContentLoader, ContentProvider, FETCH_FAILED_MESSAGE, FetchTicket, JsonProvider, LoadState,
};
pub use record::{ContentEnvelope, DEFAULT_GROUP_KEY, GroupKey, Media, Rank, Record};
pub use render::{Frame, RecordingSurface, RenderSurface, TextSurface, TileView};
pub use runtime::{DeckEvent, DeckRuntime, RuntimeConfig};
pub use tile::{OpenRequest, SlideKey, Tile};
pub use timers::{Fired, TimerId, TimerQueue};
pub use viewport::{ViewportClassifier, columns_for};
pub use visibility::VisibilitySensor;
