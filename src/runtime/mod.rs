//! Page-level runtime: owns every deck component and routes input events.
//!
//! All state changes happen inside [`DeckRuntime::dispatch`]. Each dispatch
//! applies the event, reconciles mounted tiles and the page timer against the
//! pager, and only then paints, so a frame never pairs new column counts with
//! stale page slicing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::json;

use crate::autoplay::{DeckTimers, PageAutoplay, TimerChange, TimerTag};
use crate::config::DeckConfig;
use crate::error::{DeckError, FetchError, Result};
use crate::geometry::{Rect, Size};
use crate::grouping::{Group, GroupingEngine};
use crate::logging::{LogLevel, Logger, emit, json_kv};
use crate::metrics::{DeckMetrics, MetricSnapshot};
use crate::pager::{Pager, SlideDirection};
use crate::provider::{ContentLoader, ContentProvider, FetchTicket, LoadState};
use crate::record::{ContentEnvelope, GroupKey};
use crate::render::{Frame, RenderSurface, TileView};
use crate::tile::{OpenRequest, SlideKey, Tile};
use crate::viewport::ViewportClassifier;

const LOG_TARGET: &str = "tile_deck::runtime";

/// Configuration knobs for the runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub deck: DeckConfig,
    /// Optional structured logger shared with every component.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<DeckMetrics>>>,
    /// Virtual time between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            deck: DeckConfig::default(),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(60),
            metrics_target: "tile_deck::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn new(deck: DeckConfig) -> Self {
        Self {
            deck,
            ..Self::default()
        }
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(DeckMetrics::new())));
        }
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<DeckMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Inputs delivered to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    /// Virtual time passed.
    Tick { elapsed: Duration },
    /// The viewport now has this width in CSS pixels.
    Resize { width: u32 },
    /// The host measured the page area for the current column count.
    PageAreaMeasured { height: u32 },
    /// Intersection ratio reported by a tile's observer.
    Intersection { tile: GroupKey, ratio: f32 },
    /// Tile bounds in viewport coordinates; the ratio is computed here.
    TileRects { tile: GroupKey, bounds: Rect, viewport: Size },
    HoverEnter(GroupKey),
    HoverLeave(GroupKey),
    ScrollLeft,
    ScrollRight,
    GotoPage(usize),
    SlideGoTo { tile: GroupKey, index: usize },
    SlideClick { tile: GroupKey, index: usize },
    SlideKey { tile: GroupKey, index: usize, key: SlideKey },
    /// User asked to fetch again after a failure.
    Retry,
}

impl DeckEvent {
    fn describe(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Resize { .. } => "resize",
            Self::PageAreaMeasured { .. } => "page_area_measured",
            Self::Intersection { .. } => "intersection",
            Self::TileRects { .. } => "tile_rects",
            Self::HoverEnter(_) => "hover_enter",
            Self::HoverLeave(_) => "hover_leave",
            Self::ScrollLeft => "scroll_left",
            Self::ScrollRight => "scroll_right",
            Self::GotoPage(_) => "goto_page",
            Self::SlideGoTo { .. } => "slide_goto",
            Self::SlideClick { .. } => "slide_click",
            Self::SlideKey { .. } => "slide_key",
            Self::Retry => "retry",
        }
    }
}

pub struct DeckRuntime<S: RenderSurface> {
    config: RuntimeConfig,
    classifier: ViewportClassifier,
    grouping: GroupingEngine,
    pager: Pager,
    page_autoplay: PageAutoplay,
    tiles: IndexMap<GroupKey, Tile>,
    timers: DeckTimers,
    loader: ContentLoader,
    provider: Box<dyn ContentProvider>,
    surface: S,
    page_area_height: Option<u32>,
    open_requests: Vec<OpenRequest>,
    last_metrics_emit: Duration,
    running: bool,
}

impl<S: RenderSurface> DeckRuntime<S> {
    pub fn new(config: RuntimeConfig, provider: Box<dyn ContentProvider>, surface: S) -> Result<Self> {
        config.deck.validate()?;
        let mut config = config;
        config.enable_metrics();

        let deck = &config.deck;
        let classifier = ViewportClassifier::new(deck);
        let mut pager = Pager::new(classifier.columns(), deck.rows);
        let mut loader = ContentLoader::new();
        let mut grouping = GroupingEngine::new();
        if let Some(logger) = config.logger.as_ref() {
            pager = pager.with_logger(logger.clone());
            loader = loader.with_logger(logger.clone());
            grouping = GroupingEngine::with_logger(logger.clone());
        }

        Ok(Self {
            page_autoplay: PageAutoplay::new(deck.page_interval()),
            classifier,
            grouping,
            pager,
            tiles: IndexMap::new(),
            timers: DeckTimers::new(),
            loader,
            provider,
            surface,
            page_area_height: None,
            open_requests: Vec::new(),
            last_metrics_emit: Duration::ZERO,
            running: false,
            config,
        })
    }

    /// Take the first viewport measurement and paint without fetching. Hosts
    /// driving their own transport follow up with [`DeckRuntime::begin_fetch`].
    pub fn start(&mut self, width: u32) -> Result<()> {
        self.running = true;
        self.log(
            LogLevel::Info,
            "runtime_started",
            [json_kv("initial_columns", json!(self.classifier.columns()))],
        );
        self.apply_resize(width);
        self.reconcile();
        self.paint()
    }

    /// Start, fetch from the configured provider, and paint.
    pub fn bootstrap(&mut self, width: u32) -> Result<()> {
        self.start(width)?;
        self.fetch_now()?;
        self.reconcile();
        self.paint()
    }

    /// Bootstrap, then feed `events` in order. The runtime stays live afterwards.
    pub fn run_scripted<I>(&mut self, width: u32, events: I) -> Result<()>
    where
        I: IntoIterator<Item = DeckEvent>,
    {
        self.bootstrap(width)?;
        for event in events {
            self.dispatch(event)?;
        }
        Ok(())
    }

    pub fn dispatch(&mut self, event: DeckEvent) -> Result<()> {
        let label = event.describe();
        match event {
            DeckEvent::Tick { elapsed } => self.advance_time(elapsed),
            DeckEvent::Resize { width } => self.apply_resize(width),
            DeckEvent::PageAreaMeasured { height } => self.page_area_height = Some(height),
            DeckEvent::Intersection { tile, ratio } => {
                let change = match self.tiles.get_mut(&tile) {
                    Some(mounted) => mounted.observe_intersection(ratio, &mut self.timers),
                    None => {
                        self.log_unmounted(label, &tile);
                        TimerChange::default()
                    }
                };
                self.record_timer_change(change);
            }
            DeckEvent::TileRects {
                tile,
                bounds,
                viewport,
            } => {
                let change = match self.tiles.get_mut(&tile) {
                    Some(mounted) => {
                        mounted.observe_rects(&bounds, &Rect::from_size(viewport), &mut self.timers)
                    }
                    None => {
                        self.log_unmounted(label, &tile);
                        TimerChange::default()
                    }
                };
                self.record_timer_change(change);
            }
            DeckEvent::HoverEnter(tile) | DeckEvent::HoverLeave(tile) => {
                let hovered = label == "hover_enter";
                let change = match self.tiles.get_mut(&tile) {
                    Some(mounted) => mounted.set_hovered(hovered, &mut self.timers),
                    None => {
                        self.log_unmounted(label, &tile);
                        TimerChange::default()
                    }
                };
                self.record_timer_change(change);
            }
            DeckEvent::ScrollLeft => {
                self.pager.scroll(SlideDirection::Left);
            }
            DeckEvent::ScrollRight => {
                self.pager.scroll(SlideDirection::Right);
            }
            DeckEvent::GotoPage(index) => {
                self.pager.goto_page(index);
            }
            DeckEvent::SlideGoTo { tile, index } => {
                let mounted = self
                    .tiles
                    .get_mut(&tile)
                    .ok_or_else(|| DeckError::TileNotMounted(tile.to_string()))?;
                let len = mounted.items().len();
                let change = mounted
                    .go_to(index, &mut self.timers)
                    .ok_or(DeckError::SlideOutOfRange {
                        tile: tile.to_string(),
                        index,
                        len,
                    })?;
                self.record_timer_change(change);
            }
            DeckEvent::SlideClick { tile, index } => {
                let request = self.mounted(&tile)?.click(index);
                self.queue_open(request);
            }
            DeckEvent::SlideKey { tile, index, key } => {
                let request = self.mounted(&tile)?.key_press(index, key);
                self.queue_open(request);
            }
            DeckEvent::Retry => self.retry()?,
        }

        self.reconcile();
        self.record_metric(DeckMetrics::record_event);
        self.log(
            LogLevel::Debug,
            "event_dispatched",
            [
                json_kv("event", json!(label)),
                json_kv("page", json!(self.pager.current_page())),
            ],
        );
        self.maybe_emit_metrics();
        self.paint()
    }

    /// Start a fetch for a host that settles it asynchronously.
    /// The grid is replaced by the loading state until the fetch settles, so
    /// every tile unmounts and its slide timer is cancelled.
    pub fn begin_fetch(&mut self) -> Result<FetchTicket> {
        let ticket = self.loader.begin()?;
        self.reconcile();
        self.paint()?;
        Ok(ticket)
    }

    /// Settle a fetch started with [`DeckRuntime::begin_fetch`] and repaint.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<ContentEnvelope, FetchError>,
    ) -> Result<()> {
        if !self.loader.accepts(&ticket) {
            // The loader logs and drops it.
            self.loader.complete(ticket, result);
            return Ok(());
        }
        let failed = result.is_err();
        self.loader.complete(ticket, result);
        self.record_metric(|m| m.record_fetch(failed));
        self.apply_records();
        self.reconcile();
        self.paint()
    }

    /// Unmount every tile and cancel every timer.
    pub fn shutdown(&mut self) {
        let keys: Vec<GroupKey> = self.tiles.keys().cloned().collect();
        for key in keys {
            self.unmount(&key);
        }
        let change = self.page_autoplay.teardown(&mut self.timers);
        self.record_timer_change(change);
        self.running = false;
        let snapshot = self.metrics_snapshot();
        self.log(
            LogLevel::Info,
            "runtime_stopped",
            [
                json_kv("uptime_ms", json!(self.timers.now().as_millis() as u64)),
                json_kv("live_timers", json!(self.timers.len())),
                json_kv(
                    "paints",
                    json!(snapshot.as_ref().map(|s| s.paints).unwrap_or(0)),
                ),
            ],
        );
    }

    /// Snapshot of what the surface would receive right now.
    pub fn frame(&self) -> Frame {
        Frame {
            load_state: self.loader.state().clone(),
            columns: self.pager.columns(),
            rows: self.pager.rows(),
            current_page: self.pager.current_page(),
            page_count: self.pager.page_count(),
            direction: self.pager.direction(),
            can_scroll_left: self.pager.can_scroll_left(),
            can_scroll_right: self.pager.can_scroll_right(),
            page_dots: self.pager.page_dots(),
            page_area_height: self.page_area_height,
            tiles: self
                .tiles
                .values()
                .map(|tile| TileView {
                    key: tile.key().clone(),
                    items: Arc::clone(tile.shared_items()),
                    playhead: tile.playhead(),
                    dots: tile.dots(),
                })
                .collect(),
        }
    }

    pub fn take_open_requests(&mut self) -> Vec<OpenRequest> {
        std::mem::take(&mut self.open_requests)
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn tile(&self, key: &GroupKey) -> Option<&Tile> {
        self.tiles.get(key)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    pub fn page_autoplay(&self) -> &PageAutoplay {
        &self.page_autoplay
    }

    pub fn columns(&self) -> usize {
        self.classifier.columns()
    }

    pub fn page_area_height(&self) -> Option<u32> {
        self.page_area_height
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Number of timers currently armed across the page and every tile.
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        let guard = metrics.lock().ok()?;
        Some(guard.snapshot(self.timers.now()))
    }

    fn mounted(&self, key: &GroupKey) -> Result<&Tile> {
        self.tiles
            .get(key)
            .ok_or_else(|| DeckError::TileNotMounted(key.to_string()))
    }

    fn queue_open(&mut self, request: Option<OpenRequest>) {
        if let Some(request) = request {
            self.log(
                LogLevel::Info,
                "open_requested",
                [
                    json_kv("tile", json!(request.tile.to_string())),
                    json_kv("url", json!(request.url)),
                ],
            );
            self.open_requests.push(request);
        }
    }

    fn advance_time(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some(fired) = self.timers.pop_due(until) {
            match fired.tag {
                TimerTag::Page => {
                    if self.page_autoplay.on_fire(fired.id, &mut self.pager) {
                        self.record_metric(DeckMetrics::record_page_advance);
                        self.log(
                            LogLevel::Debug,
                            "page_autoplay",
                            [json_kv("page", json!(self.pager.current_page()))],
                        );
                        // Remount for the new page before later timers fire.
                        self.reconcile();
                    }
                }
                TimerTag::Slide(key) => {
                    let outcome = self.tiles.get_mut(&key).map(|tile| {
                        let advanced = tile.on_fire(fired.id, &mut self.timers);
                        (advanced, tile.pending_timer().is_some())
                    });
                    if let Some((true, rearmed)) = outcome {
                        self.record_metric(DeckMetrics::record_slide_advance);
                        if rearmed {
                            self.record_metric(DeckMetrics::record_timer_armed);
                        }
                    }
                }
            }
        }
    }

    /// Every resize returns to the first page; the measured page height is
    /// only stale when the column count moved.
    fn apply_resize(&mut self, width: u32) {
        let changed = self.classifier.observe(width);
        self.pager.set_columns(self.classifier.columns());
        if let Some(columns) = changed {
            self.page_area_height = None;
            self.log(
                LogLevel::Info,
                "columns_changed",
                [
                    json_kv("width", json!(width)),
                    json_kv("columns", json!(columns)),
                ],
            );
        }
    }

    fn retry(&mut self) -> Result<()> {
        if self.loader.is_loading() {
            self.log(LogLevel::Warn, "retry_ignored", [json_kv("reason", json!("in_flight"))]);
            return Ok(());
        }
        self.fetch_now()
    }

    fn fetch_now(&mut self) -> Result<()> {
        let state = self.loader.load(self.provider.as_mut())?;
        let failed = matches!(state, LoadState::Failed(_));
        self.record_metric(|m| m.record_fetch(failed));
        self.apply_records();
        Ok(())
    }

    fn apply_records(&mut self) {
        let groups = self.grouping.group(self.loader.records());
        self.log(
            LogLevel::Debug,
            "groups_built",
            [json_kv("groups", json!(groups.len()))],
        );
        self.pager.set_groups(groups);
    }

    /// Mount tiles for the current page, unmount the rest, and resync the page timer.
    fn reconcile(&mut self) {
        let page: Vec<Group> = match self.loader.state() {
            LoadState::Ready => self.pager.current_page_groups().to_vec(),
            _ => Vec::new(),
        };

        let stale: Vec<GroupKey> = self
            .tiles
            .keys()
            .filter(|key| !page.iter().any(|group| &group.key == *key))
            .cloned()
            .collect();
        for key in stale {
            self.unmount(&key);
        }

        let mut ordered = IndexMap::with_capacity(page.len());
        for group in &page {
            let tile = match self.tiles.shift_remove(&group.key) {
                Some(mut tile) => {
                    let change = tile.sync_items(group, &mut self.timers);
                    self.record_timer_change(change);
                    tile
                }
                None => {
                    self.log(
                        LogLevel::Debug,
                        "tile_mounted",
                        [json_kv("tile", json!(group.key.to_string()))],
                    );
                    Tile::mount(group, &self.config.deck)
                }
            };
            ordered.insert(group.key.clone(), tile);
        }
        self.tiles = ordered;

        let change = self.page_autoplay.sync(&self.pager, &mut self.timers);
        self.record_timer_change(change);
    }

    fn unmount(&mut self, key: &GroupKey) {
        if let Some(mut tile) = self.tiles.shift_remove(key) {
            let change = tile.unmount(&mut self.timers);
            self.record_timer_change(change);
            self.log(
                LogLevel::Debug,
                "tile_unmounted",
                [json_kv("tile", json!(key.to_string()))],
            );
        }
    }

    fn paint(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        let frame = self.frame();
        self.surface.paint(&frame)?;
        self.record_metric(DeckMetrics::record_paint);
        Ok(())
    }

    fn record_timer_change(&self, change: TimerChange) {
        if change.armed {
            self.record_metric(DeckMetrics::record_timer_armed);
        }
        if change.cancelled {
            self.record_metric(DeckMetrics::record_timer_cancelled);
        }
    }

    fn record_metric(&self, record: impl FnOnce(&mut DeckMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }
        let now = self.timers.now();
        if now.saturating_sub(self.last_metrics_emit) < self.config.metrics_interval {
            return;
        }
        self.last_metrics_emit = now;
        if let (Some(logger), Some(snapshot)) =
            (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    fn log_unmounted(&self, event: &str, tile: &GroupKey) {
        self.log(
            LogLevel::Debug,
            "event_for_unmounted_tile",
            [
                json_kv("event", json!(event)),
                json_kv("tile", json!(tile.to_string())),
            ],
        );
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        emit(self.config.logger.as_ref(), level, LOG_TARGET, message, fields);
    }
}
