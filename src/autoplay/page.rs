use std::time::Duration;

use crate::pager::Pager;
use crate::timers::TimerId;

use super::{DeckTimers, TimerChange, TimerTag, cancel_slot};

/// Repeating page rotation, alive only while there is more than one page.
///
/// The timer is rebuilt whenever the page count or the current page changes,
/// so a manual navigation restarts the full interval and a tick never fires
/// against a stale page count.
#[derive(Debug, Clone)]
pub struct PageAutoplay {
    interval: Duration,
    timer: Option<TimerId>,
    armed_for: Option<(usize, usize)>,
}

impl PageAutoplay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
            armed_for: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Bring the timer in line with the pager's current page count and page.
    pub fn sync(&mut self, pager: &Pager, timers: &mut DeckTimers) -> TimerChange {
        let key = (pager.page_count(), pager.current_page());
        if self.armed_for == Some(key) && self.timer.is_some_and(|id| timers.is_armed(id)) {
            return TimerChange::default();
        }

        let mut change = cancel_slot(&mut self.timer, timers);
        self.armed_for = Some(key);
        if key.0 > 1 {
            self.timer = Some(timers.schedule_repeating(self.interval, TimerTag::Page));
            change.armed = true;
        }
        change
    }

    /// Handle a fired timer. Returns whether it was ours and advanced the pager.
    pub fn on_fire(&mut self, id: TimerId, pager: &mut Pager) -> bool {
        if self.timer != Some(id) {
            return false;
        }
        pager.advance_wrapping()
    }

    pub fn teardown(&mut self, timers: &mut DeckTimers) -> TimerChange {
        self.armed_for = None;
        cancel_slot(&mut self.timer, timers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_records;
    use crate::pager::SlideDirection;
    use crate::record::Record;

    fn pager(groups: u32) -> Pager {
        let records: Vec<Record> = (0..groups).map(|i| Record::new(format!("r{i}"), i)).collect();
        let mut pager = Pager::new(7, 2);
        pager.set_groups(group_records(&records));
        pager
    }

    fn run(
        autoplay: &mut PageAutoplay,
        pager: &mut Pager,
        timers: &mut DeckTimers,
        until: Duration,
    ) -> Vec<Duration> {
        let mut fired_at = Vec::new();
        while let Some(fired) = timers.pop_due(until) {
            if autoplay.on_fire(fired.id, pager) {
                fired_at.push(fired.at);
            }
            autoplay.sync(pager, timers);
        }
        fired_at
    }

    #[test]
    fn single_page_never_arms() {
        let mut timers = DeckTimers::new();
        let mut autoplay = PageAutoplay::new(Duration::from_secs(15));
        let pager = pager(14);
        let change = autoplay.sync(&pager, &mut timers);
        assert!(!change.armed);
        assert!(timers.is_empty());
    }

    #[test]
    fn ticks_wrap_every_interval() {
        let mut timers = DeckTimers::new();
        let mut autoplay = PageAutoplay::new(Duration::from_secs(15));
        let mut pager = pager(15);
        autoplay.sync(&pager, &mut timers);

        let fired = run(&mut autoplay, &mut pager, &mut timers, Duration::from_secs(45));
        assert_eq!(
            fired,
            vec![
                Duration::from_secs(15),
                Duration::from_secs(30),
                Duration::from_secs(45)
            ]
        );
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.direction(), SlideDirection::Right);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn manual_navigation_restarts_interval() {
        let mut timers = DeckTimers::new();
        let mut autoplay = PageAutoplay::new(Duration::from_secs(15));
        let mut pager = pager(30);
        autoplay.sync(&pager, &mut timers);

        assert!(run(&mut autoplay, &mut pager, &mut timers, Duration::from_secs(10)).is_empty());
        pager.scroll(SlideDirection::Right);
        autoplay.sync(&pager, &mut timers);

        let fired = run(&mut autoplay, &mut pager, &mut timers, Duration::from_secs(24));
        assert!(fired.is_empty());
        let fired = run(&mut autoplay, &mut pager, &mut timers, Duration::from_secs(25));
        assert_eq!(fired, vec![Duration::from_secs(25)]);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn dropping_to_one_page_disarms() {
        let mut timers = DeckTimers::new();
        let mut autoplay = PageAutoplay::new(Duration::from_secs(15));
        let mut pager = pager(15);
        autoplay.sync(&pager, &mut timers);
        assert!(autoplay.is_active());

        pager.set_columns(8);
        let change = autoplay.sync(&pager, &mut timers);
        assert!(change.cancelled);
        assert!(!autoplay.is_active());
        assert!(timers.is_empty());
    }

    #[test]
    fn teardown_cancels() {
        let mut timers = DeckTimers::new();
        let mut autoplay = PageAutoplay::new(Duration::from_secs(15));
        let pager = pager(40);
        autoplay.sync(&pager, &mut timers);
        assert!(autoplay.teardown(&mut timers).cancelled);
        assert!(timers.is_empty());
    }
}
