//! Autoplay timers: one page-level rotation timer and one slide timer per tile.
//!
//! Both arm their timers on a shared [`TimerQueue`](crate::timers::TimerQueue)
//! tagged with [`TimerTag`], and both hold at most one pending handle. Every
//! re-evaluation cancels what it armed before arming again.

pub mod page;
pub mod slide;

pub use page::PageAutoplay;
pub use slide::{Playhead, SlideAutoplay, SlideState};

use crate::record::GroupKey;
use crate::timers::{TimerId, TimerQueue};

/// Identifies what a timer drives when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerTag {
    Page,
    Slide(GroupKey),
}

pub type DeckTimers = TimerQueue<TimerTag>;

/// What a re-evaluation did to the timer queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerChange {
    pub armed: bool,
    pub cancelled: bool,
}

/// Cancel the handle in `slot`, if any.
pub(crate) fn cancel_slot(slot: &mut Option<TimerId>, timers: &mut DeckTimers) -> TimerChange {
    match slot.take() {
        Some(id) => TimerChange {
            armed: false,
            cancelled: timers.cancel(id),
        },
        None => TimerChange::default(),
    }
}
