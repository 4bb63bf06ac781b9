use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct DeckMetrics {
    events: u64,
    paints: u64,
    page_advances: u64,
    slide_advances: u64,
    timers_armed: u64,
    timers_cancelled: u64,
    fetches: u64,
    fetch_failures: u64,
}

impl DeckMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_paint(&mut self) {
        self.paints = self.paints.saturating_add(1);
    }

    pub fn record_page_advance(&mut self) {
        self.page_advances = self.page_advances.saturating_add(1);
    }

    pub fn record_slide_advance(&mut self) {
        self.slide_advances = self.slide_advances.saturating_add(1);
    }

    pub fn record_timer_armed(&mut self) {
        self.timers_armed = self.timers_armed.saturating_add(1);
    }

    pub fn record_timer_cancelled(&mut self) {
        self.timers_cancelled = self.timers_cancelled.saturating_add(1);
    }

    pub fn record_fetch(&mut self, failed: bool) {
        self.fetches = self.fetches.saturating_add(1);
        if failed {
            self.fetch_failures = self.fetch_failures.saturating_add(1);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            paints: self.paints,
            page_advances: self.page_advances,
            slide_advances: self.slide_advances,
            timers_armed: self.timers_armed,
            timers_cancelled: self.timers_cancelled,
            fetches: self.fetches,
            fetch_failures: self.fetch_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub paints: u64,
    pub page_advances: u64,
    pub slide_advances: u64,
    pub timers_armed: u64,
    pub timers_cancelled: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "deck_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("paints".to_string(), json!(self.paints));
        map.insert("page_advances".to_string(), json!(self.page_advances));
        map.insert("slide_advances".to_string(), json!(self.slide_advances));
        map.insert("timers_armed".to_string(), json!(self.timers_armed));
        map.insert("timers_cancelled".to_string(), json!(self.timers_cancelled));
        map.insert("fetches".to_string(), json!(self.fetches));
        map.insert("fetch_failures".to_string(), json!(self.fetch_failures));
        map
    }
}
