/// Integer size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in page coordinates. Origins may be negative when
/// an element is scrolled past the top or left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin covering `size`.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Overlapping region, `None` when the rectangles do not touch.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// Fraction of `self` covered by `other`, in `[0, 1]`.
    pub fn coverage_by(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area == 0 {
            return 0.0;
        }
        let covered = self.intersection(other).map(|r| r.area()).unwrap_or(0);
        (covered as f64 / area as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(a.coverage_by(&b), 0.0);
    }

    #[test]
    fn partial_coverage() {
        let tile = Rect::new(0, -50, 100, 100);
        let viewport = Rect::from_size(Size::new(800, 600));
        assert_eq!(tile.intersection(&viewport), Some(Rect::new(0, 0, 100, 50)));
        assert!((tile.coverage_by(&viewport) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_rect_has_no_coverage() {
        let tile = Rect::new(0, 0, 0, 10);
        assert_eq!(tile.coverage_by(&Rect::new(0, 0, 100, 100)), 0.0);
    }
}
