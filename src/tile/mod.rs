//! A mounted tile: one group's carousel plus the sensor gating its autoplay.

use std::sync::Arc;

use crate::autoplay::{DeckTimers, Playhead, SlideAutoplay, SlideState, TimerChange};
use crate::config::DeckConfig;
use crate::geometry::Rect;
use crate::grouping::Group;
use crate::record::{GroupKey, Record};
use crate::timers::TimerId;
use crate::visibility::VisibilitySensor;

/// Request to open a slide target in a fresh browsing context that holds no
/// reference back to the deck (no opener, no referrer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub url: String,
    pub tile: GroupKey,
    pub index: usize,
    pub no_opener: bool,
    pub no_referrer: bool,
}

impl OpenRequest {
    fn isolated(url: &str, tile: GroupKey, index: usize) -> Self {
        Self {
            url: url.to_string(),
            tile,
            index,
            no_opener: true,
            no_referrer: true,
        }
    }
}

/// Keys a focused slide reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKey {
    Enter,
    Space,
    Other,
}

impl SlideKey {
    pub fn activates(&self) -> bool {
        matches!(self, Self::Enter | Self::Space)
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    sensor: VisibilitySensor,
    carousel: SlideAutoplay,
}

impl Tile {
    /// Mount a tile for `group`. The sensor is attached immediately; the tile
    /// counts as hidden until its first intersection report.
    pub fn mount(group: &Group, config: &DeckConfig) -> Self {
        let mut sensor = VisibilitySensor::new(config.visibility_threshold);
        sensor.attach();
        Self {
            sensor,
            carousel: SlideAutoplay::new(
                group.key.clone(),
                Arc::clone(&group.items),
                config.default_slide_speed(),
            ),
        }
    }

    pub fn key(&self) -> &GroupKey {
        self.carousel.key()
    }

    pub fn items(&self) -> &[Record] {
        self.carousel.items()
    }

    /// The item list as shared with the group it was mounted from.
    pub fn shared_items(&self) -> &Arc<[Record]> {
        self.carousel.items()
    }

    pub fn playhead(&self) -> Playhead {
        self.carousel.playhead()
    }

    pub fn slide_state(&self) -> SlideState {
        self.carousel.state()
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.carousel.pending()
    }

    pub fn sensor(&self) -> &VisibilitySensor {
        &self.sensor
    }

    /// One flag per slide marking the active one; empty for single-slide tiles.
    pub fn dots(&self) -> Vec<bool> {
        let len = self.items().len();
        if len <= 1 {
            return Vec::new();
        }
        let active = self.playhead().active_index;
        (0..len).map(|i| i == active).collect()
    }

    pub fn sync_items(&mut self, group: &Group, timers: &mut DeckTimers) -> TimerChange {
        self.carousel.set_items(Arc::clone(&group.items), timers)
    }

    pub fn observe_intersection(&mut self, ratio: f32, timers: &mut DeckTimers) -> TimerChange {
        match self.sensor.observe_ratio(ratio) {
            Some(visible) => self.carousel.set_visible(visible, timers),
            None => TimerChange::default(),
        }
    }

    pub fn observe_rects(
        &mut self,
        tile: &Rect,
        viewport: &Rect,
        timers: &mut DeckTimers,
    ) -> TimerChange {
        self.observe_intersection(tile.coverage_by(viewport), timers)
    }

    pub fn set_hovered(&mut self, hovered: bool, timers: &mut DeckTimers) -> TimerChange {
        self.carousel.set_hovered(hovered, timers)
    }

    pub fn go_to(&mut self, index: usize, timers: &mut DeckTimers) -> Option<TimerChange> {
        self.carousel.go_to(index, timers)
    }

    pub fn on_fire(&mut self, id: TimerId, timers: &mut DeckTimers) -> bool {
        self.carousel.on_fire(id, timers)
    }

    /// Resolve the open target for slide `index`: its link, else its media URL.
    pub fn click(&self, index: usize) -> Option<OpenRequest> {
        let item = self.items().get(index)?;
        let url = item.target_url()?;
        Some(OpenRequest::isolated(url, self.key().clone(), index))
    }

    pub fn key_press(&self, index: usize, key: SlideKey) -> Option<OpenRequest> {
        if !key.activates() {
            return None;
        }
        self.click(index)
    }

    /// Detach the sensor and cancel the slide timer.
    pub fn unmount(&mut self, timers: &mut DeckTimers) -> TimerChange {
        self.sensor.detach();
        self.carousel.teardown(timers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_records;

    fn group() -> Group {
        let records = vec![
            Record::new("a", "shoes")
                .with_media("https://cdn/a.png")
                .with_speed_ms(1000),
            Record::new("b", "shoes")
                .with_media("https://cdn/b.png")
                .with_link("https://brand/b"),
            Record::new("c", "shoes"),
        ];
        group_records(&records).remove(0)
    }

    #[test]
    fn click_resolves_link_then_media() {
        let tile = Tile::mount(&group(), &DeckConfig::default());
        let open = tile.click(0).unwrap();
        assert_eq!(open.url, "https://cdn/a.png");
        assert!(open.no_opener && open.no_referrer);
        assert_eq!(tile.click(1).unwrap().url, "https://brand/b");
        assert_eq!(tile.click(2), None);
        assert_eq!(tile.click(9), None);
    }

    #[test]
    fn only_enter_and_space_activate() {
        let tile = Tile::mount(&group(), &DeckConfig::default());
        assert!(tile.key_press(0, SlideKey::Enter).is_some());
        assert!(tile.key_press(0, SlideKey::Space).is_some());
        assert!(tile.key_press(0, SlideKey::Other).is_none());
    }

    #[test]
    fn intersection_gates_autoplay() {
        let mut timers = DeckTimers::new();
        let mut tile = Tile::mount(&group(), &DeckConfig::default());
        assert!(tile.sensor().is_attached());
        assert!(!tile.observe_intersection(0.1, &mut timers).armed);
        assert!(tile.observe_intersection(0.5, &mut timers).armed);
        assert_eq!(tile.slide_state(), SlideState::Scheduled);
        assert!(tile.observe_intersection(0.2, &mut timers).cancelled);
        assert!(timers.is_empty());
    }

    #[test]
    fn dots_track_active_slide() {
        let mut timers = DeckTimers::new();
        let mut tile = Tile::mount(&group(), &DeckConfig::default());
        assert_eq!(tile.dots(), vec![true, false, false]);
        tile.go_to(2, &mut timers);
        assert_eq!(tile.dots(), vec![false, false, true]);
    }

    #[test]
    fn unmount_detaches_and_cancels() {
        let mut timers = DeckTimers::new();
        let mut tile = Tile::mount(&group(), &DeckConfig::default());
        tile.observe_intersection(1.0, &mut timers);
        assert_eq!(timers.len(), 1);
        tile.unmount(&mut timers);
        assert!(timers.is_empty());
        assert!(!tile.sensor().is_attached());
    }
}
