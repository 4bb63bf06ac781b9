use std::io::Write;
use std::sync::Arc;

use blake3::Hash;

use crate::autoplay::Playhead;
use crate::error::Result;
use crate::pager::{PageDot, SlideDirection};
use crate::provider::LoadState;
use crate::record::{GroupKey, Record};

/// Render-ready view of one mounted tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub key: GroupKey,
    pub items: Arc<[Record]>,
    pub playhead: Playhead,
    /// Slide indicator flags, empty for single-slide tiles.
    pub dots: Vec<bool>,
}

/// Everything the surface needs for one paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub load_state: LoadState,
    pub columns: usize,
    pub rows: usize,
    pub current_page: usize,
    pub page_count: usize,
    pub direction: SlideDirection,
    pub can_scroll_left: bool,
    pub can_scroll_right: bool,
    pub page_dots: Vec<PageDot>,
    /// Cached page-area height; `None` until measured for the current columns.
    pub page_area_height: Option<u32>,
    pub tiles: Vec<TileView>,
}

impl Frame {
    /// Content hash used to skip repainting an unchanged frame.
    pub fn fingerprint(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(format!("{:?}", self.load_state).as_bytes());
        for value in [
            self.columns,
            self.rows,
            self.current_page,
            self.page_count,
            usize::from(self.can_scroll_left),
            usize::from(self.can_scroll_right),
        ] {
            hasher.update(&(value as u64).to_le_bytes());
        }
        hasher.update(self.direction.as_str().as_bytes());
        hasher.update(&self.page_area_height.map(i64::from).unwrap_or(-1).to_le_bytes());
        for tile in &self.tiles {
            hasher.update(tile.key.to_string().as_bytes());
            hasher.update(&[0]);
            hasher.update(&(tile.playhead.active_index as u64).to_le_bytes());
            hasher.update(&[u8::from(tile.playhead.visible), u8::from(tile.playhead.hovered)]);
            for item in tile.items.iter() {
                item.fingerprint_into(&mut hasher);
            }
        }
        hasher.finalize()
    }
}

/// Destination for painted frames.
pub trait RenderSurface {
    fn paint(&mut self, frame: &Frame) -> Result<()>;
}

/// Plain-text surface writing a short description of each distinct frame.
pub struct TextSurface<W: Write> {
    writer: W,
    last: Option<Hash>,
    painted: usize,
}

impl<W: Write> TextSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last: None,
            painted: 0,
        }
    }

    /// Frames actually written, excluding skipped duplicates.
    pub fn painted(&self) -> usize {
        self.painted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSurface for TextSurface<W> {
    fn paint(&mut self, frame: &Frame) -> Result<()> {
        let hash = frame.fingerprint();
        if self.last == Some(hash) {
            return Ok(());
        }
        self.last = Some(hash);
        self.painted += 1;
        write_frame(&mut self.writer, frame)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn write_frame(writer: &mut impl Write, frame: &Frame) -> Result<()> {
    match &frame.load_state {
        LoadState::Idle | LoadState::Loading => {
            writeln!(writer, "Loading...")?;
            return Ok(());
        }
        LoadState::Failed(message) => {
            writeln!(writer, "{message} [retry]")?;
            return Ok(());
        }
        LoadState::Empty => {
            writeln!(writer, "No content")?;
            return Ok(());
        }
        LoadState::Ready => {}
    }

    writeln!(
        writer,
        "{} page {}/{} slide-{} grid {}x{}",
        if frame.can_scroll_left { "‹" } else { " " },
        frame.current_page + 1,
        frame.page_count.max(1),
        frame.direction.as_str(),
        frame.columns,
        frame.rows,
    )?;
    for tile in &frame.tiles {
        let active = tile.items.get(tile.playhead.active_index);
        let label = active
            .and_then(|item| item.brand_name.as_deref().or(item.text.as_deref()))
            .or(active.map(|item| item.id.as_str()))
            .unwrap_or("");
        let dots: String = tile
            .dots
            .iter()
            .map(|active| if *active { '●' } else { '○' })
            .collect();
        writeln!(
            writer,
            "  [{}] {}/{} {} {}",
            tile.key,
            tile.playhead.active_index + 1,
            tile.items.len(),
            label,
            dots
        )?;
    }
    if !frame.page_dots.is_empty() {
        let dots: String = frame
            .page_dots
            .iter()
            .map(|dot| if dot.active { '●' } else { '○' })
            .collect();
        writeln!(
            writer,
            "{} {}",
            dots,
            if frame.can_scroll_right { "›" } else { " " }
        )?;
    }
    Ok(())
}

/// Keeps every painted frame in memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    frames: Vec<Frame>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl RenderSurface for RecordingSurface {
    fn paint(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(active: usize) -> Frame {
        let items: Arc<[Record]> = vec![
            Record::new("a", "shoes").with_media("https://cdn/a.png"),
            Record::new("b", "shoes"),
        ]
        .into();
        Frame {
            load_state: LoadState::Ready,
            columns: 7,
            rows: 2,
            current_page: 0,
            page_count: 2,
            direction: SlideDirection::Right,
            can_scroll_left: false,
            can_scroll_right: true,
            page_dots: vec![
                PageDot { index: 0, active: true },
                PageDot { index: 1, active: false },
            ],
            page_area_height: None,
            tiles: vec![TileView {
                key: GroupKey::named("shoes"),
                items,
                playhead: Playhead {
                    active_index: active,
                    visible: true,
                    hovered: false,
                },
                dots: vec![active == 0, active == 1],
            }],
        }
    }

    #[test]
    fn text_surface_skips_identical_frames() {
        let mut surface = TextSurface::new(Vec::new());
        surface.paint(&frame(0)).unwrap();
        surface.paint(&frame(0)).unwrap();
        surface.paint(&frame(1)).unwrap();
        assert_eq!(surface.painted(), 2);

        let output = String::from_utf8(surface.into_inner()).unwrap();
        assert!(output.contains("page 1/2 slide-right grid 7x2"));
        assert!(output.contains("[shoes] 1/2 a ●○"));
        assert!(output.contains("[shoes] 2/2 b ○●"));
    }

    #[test]
    fn fingerprint_tracks_playhead() {
        assert_eq!(frame(0).fingerprint(), frame(0).fingerprint());
        assert_ne!(frame(0).fingerprint(), frame(1).fingerprint());
    }

    #[test]
    fn non_ready_states_render_status_lines() {
        let mut surface = TextSurface::new(Vec::new());
        let mut failed = frame(0);
        failed.load_state = LoadState::Failed("Failed to fetch data".into());
        surface.paint(&failed).unwrap();
        let mut empty = frame(0);
        empty.load_state = LoadState::Empty;
        surface.paint(&empty).unwrap();

        let output = String::from_utf8(surface.into_inner()).unwrap();
        assert!(output.contains("Failed to fetch data [retry]"));
        assert!(output.contains("No content"));
    }
}
