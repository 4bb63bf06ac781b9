//! Per-tile visibility sensor.
//!
//! The host reports how much of a tile intersects the viewport, either as a
//! ratio or as a pair of rectangles. The sensor turns that into the boolean
//! that gates the tile's slide autoplay.

use crate::geometry::Rect;

#[derive(Debug, Clone)]
pub struct VisibilitySensor {
    threshold: f32,
    visible: bool,
    attached: bool,
}

impl VisibilitySensor {
    /// A detached sensor that reports hidden until the first observation.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            visible: false,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop observing. A detached sensor reports hidden and ignores input.
    pub fn detach(&mut self) {
        self.attached = false;
        self.visible = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed an intersection ratio. Returns the new visibility when it flipped.
    pub fn observe_ratio(&mut self, ratio: f32) -> Option<bool> {
        if !self.attached {
            return None;
        }
        let visible = ratio.is_finite() && ratio >= self.threshold;
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(visible)
    }

    pub fn observe_rects(&mut self, tile: &Rect, viewport: &Rect) -> Option<bool> {
        self.observe_ratio(tile.coverage_by(viewport))
    }
}
