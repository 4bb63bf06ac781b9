use std::sync::Arc;
use std::time::Duration;

use crate::record::{GroupKey, Record};
use crate::timers::TimerId;

use super::{DeckTimers, TimerChange, TimerTag, cancel_slot};

/// Observable state of a tile carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Playhead {
    pub active_index: usize,
    pub visible: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideState {
    Idle,
    Scheduled,
}

/// One-shot, re-armed slide advance for a single tile.
///
/// Each item may declare its own dwell, so instead of a fixed-period interval
/// the timer is re-armed after every change with the dwell of whichever item
/// is active at that moment. The rule, evaluated on every input change:
///
/// * hidden, hovered, or at most one item: cancel and go idle;
/// * otherwise: cancel, then arm a one-shot for the active item's dwell.
#[derive(Debug, Clone)]
pub struct SlideAutoplay {
    key: GroupKey,
    items: Arc<[Record]>,
    playhead: Playhead,
    pending: Option<TimerId>,
    default_dwell: Duration,
}

impl SlideAutoplay {
    pub fn new(key: GroupKey, items: Arc<[Record]>, default_dwell: Duration) -> Self {
        Self {
            key,
            items,
            playhead: Playhead::default(),
            pending: None,
            default_dwell,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn items(&self) -> &Arc<[Record]> {
        &self.items
    }

    pub fn playhead(&self) -> Playhead {
        self.playhead
    }

    pub fn active_item(&self) -> Option<&Record> {
        self.items.get(self.playhead.active_index)
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn state(&self) -> SlideState {
        match self.pending {
            Some(_) => SlideState::Scheduled,
            None => SlideState::Idle,
        }
    }

    /// Dwell of the active item. Missing or zero speeds use the default.
    pub fn current_dwell(&self) -> Duration {
        self.active_item()
            .and_then(|item| item.autoplay_speed_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(self.default_dwell)
    }

    /// Replace the item list. A different list resets the playhead to the first slide.
    pub fn set_items(&mut self, items: Arc<[Record]>, timers: &mut DeckTimers) -> TimerChange {
        if Arc::ptr_eq(&self.items, &items) {
            return TimerChange::default();
        }
        self.items = items;
        self.playhead.active_index = 0;
        self.reevaluate(timers)
    }

    pub fn set_visible(&mut self, visible: bool, timers: &mut DeckTimers) -> TimerChange {
        if self.playhead.visible == visible {
            return TimerChange::default();
        }
        self.playhead.visible = visible;
        self.reevaluate(timers)
    }

    pub fn set_hovered(&mut self, hovered: bool, timers: &mut DeckTimers) -> TimerChange {
        if self.playhead.hovered == hovered {
            return TimerChange::default();
        }
        self.playhead.hovered = hovered;
        self.reevaluate(timers)
    }

    /// Jump to `index` synchronously so the next dwell is the new item's.
    /// Returns `None` when `index` is out of range.
    pub fn go_to(&mut self, index: usize, timers: &mut DeckTimers) -> Option<TimerChange> {
        if index >= self.items.len() {
            return None;
        }
        self.playhead.active_index = index;
        Some(self.reevaluate(timers))
    }

    /// Handle a fired timer. Returns whether it was this tile's pending timer.
    pub fn on_fire(&mut self, id: TimerId, timers: &mut DeckTimers) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        let len = self.items.len();
        if len > 0 {
            self.playhead.active_index = (self.playhead.active_index + 1) % len;
        }
        self.reevaluate(timers);
        true
    }

    pub fn teardown(&mut self, timers: &mut DeckTimers) -> TimerChange {
        cancel_slot(&mut self.pending, timers)
    }

    fn should_play(&self) -> bool {
        self.playhead.visible && !self.playhead.hovered && self.items.len() > 1
    }

    fn reevaluate(&mut self, timers: &mut DeckTimers) -> TimerChange {
        let mut change = cancel_slot(&mut self.pending, timers);
        if self.should_play() {
            let dwell = self.current_dwell();
            self.pending = Some(timers.schedule_once(dwell, TimerTag::Slide(self.key.clone())));
            change.armed = true;
        }
        change
    }
}
