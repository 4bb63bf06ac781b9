//! Render module orchestrator.
//!
//! The deck never draws anything itself. Each paint produces a [`Frame`]
//! snapshot that a [`RenderSurface`] turns into output.

mod core;

pub use core::{Frame, RecordingSurface, RenderSurface, TextSurface, TileView};
