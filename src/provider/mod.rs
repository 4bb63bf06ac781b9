//! Content provider boundary and load-state tracking.
//!
//! A fetch is split into [`ContentLoader::begin`] and
//! [`ContentLoader::complete`] so hosts with a real asynchronous transport can
//! hold the ticket across their await point. Only one fetch is outstanding at
//! a time; failures are terminal until the user retries.

use std::path::PathBuf;

use serde_json::json;

use crate::error::{DeckError, FetchError};
use crate::logging::{LogLevel, Logger, emit, json_kv};
use crate::record::{ContentEnvelope, Record};

const LOG_TARGET: &str = "tile_deck::provider";

/// Message shown to the user for any provider failure.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data";

pub trait ContentProvider {
    fn fetch(&mut self) -> Result<ContentEnvelope, FetchError>;
}

impl<F> ContentProvider for F
where
    F: FnMut() -> Result<ContentEnvelope, FetchError>,
{
    fn fetch(&mut self) -> Result<ContentEnvelope, FetchError> {
        self()
    }
}

#[derive(Debug, Clone)]
enum JsonSource {
    Inline(String),
    File(PathBuf),
}

/// Provider reading a `{ "data": [...] }` payload from a string or a file.
#[derive(Debug, Clone)]
pub struct JsonProvider {
    source: JsonSource,
}

impl JsonProvider {
    pub fn inline(raw: impl Into<String>) -> Self {
        Self {
            source: JsonSource::Inline(raw.into()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: JsonSource::File(path.into()),
        }
    }
}

impl ContentProvider for JsonProvider {
    fn fetch(&mut self) -> Result<ContentEnvelope, FetchError> {
        let envelope = match &self.source {
            JsonSource::Inline(raw) => serde_json::from_str(raw)?,
            JsonSource::File(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        };
        Ok(envelope)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    /// The fetch succeeded but carried no records.
    Empty,
    /// The fetch failed; holds the user-facing message.
    Failed(String),
}

/// Proof that a fetch was started; required to complete it.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone)]
pub struct ContentLoader {
    state: LoadState,
    records: Vec<Record>,
    in_flight: Option<u64>,
    next_ticket: u64,
    logger: Option<Logger>,
}

impl Default for ContentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentLoader {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            records: Vec::new(),
            in_flight: None,
            next_ticket: 0,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Records from the last successful fetch. Empty unless the state is `Ready`.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Start a fetch, resetting any previous error. Refused while one is in flight.
    pub fn begin(&mut self) -> Result<FetchTicket, DeckError> {
        if self.in_flight.is_some() {
            return Err(DeckError::FetchInFlight);
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.state = LoadState::Loading;
        emit(
            self.logger.as_ref(),
            LogLevel::Info,
            LOG_TARGET,
            "fetch_started",
            [json_kv("ticket", json!(ticket))],
        );
        Ok(FetchTicket(ticket))
    }

    /// Whether `ticket` belongs to the fetch currently in flight.
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.in_flight == Some(ticket.0)
    }

    /// Settle the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<ContentEnvelope, FetchError>,
    ) -> &LoadState {
        if !self.accepts(&ticket) {
            emit(
                self.logger.as_ref(),
                LogLevel::Warn,
                LOG_TARGET,
                "stale_ticket",
                [json_kv("ticket", json!(ticket.0))],
            );
            return &self.state;
        }
        self.in_flight = None;

        match result {
            Ok(envelope) if envelope.data.is_empty() => {
                self.records.clear();
                self.state = LoadState::Empty;
                emit(
                    self.logger.as_ref(),
                    LogLevel::Info,
                    LOG_TARGET,
                    "fetch_empty",
                    std::iter::empty(),
                );
            }
            Ok(envelope) => {
                self.records = envelope.data;
                self.state = LoadState::Ready;
                emit(
                    self.logger.as_ref(),
                    LogLevel::Info,
                    LOG_TARGET,
                    "fetch_succeeded",
                    [json_kv("records", json!(self.records.len()))],
                );
            }
            Err(err) => {
                self.records.clear();
                self.state = LoadState::Failed(FETCH_FAILED_MESSAGE.to_string());
                emit(
                    self.logger.as_ref(),
                    LogLevel::Error,
                    LOG_TARGET,
                    "fetch_failed",
                    [json_kv("error", json!(err.to_string()))],
                );
            }
        }
        &self.state
    }

    /// Run a whole fetch against `provider`. Retry is the same call.
    pub fn load(&mut self, provider: &mut dyn ContentProvider) -> Result<&LoadState, DeckError> {
        let ticket = self.begin()?;
        let result = provider.fetch();
        Ok(self.complete(ticket, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    const PAYLOAD: &str = r#"{ "data": [ { "id": 1, "type": "shoes" }, { "id": 2, "type": "hats" } ] }"#;

    #[test]
    fn successful_load_is_ready() {
        let mut loader = ContentLoader::new();
        let mut provider = JsonProvider::inline(PAYLOAD);
        assert_eq!(loader.load(&mut provider).unwrap(), &LoadState::Ready);
        assert_eq!(loader.records().len(), 2);
        assert!(!loader.is_loading());
    }

    #[test]
    fn empty_payload_is_distinct_from_failure() {
        let mut loader = ContentLoader::new();
        let mut provider = JsonProvider::inline(r#"{ "data": [] }"#);
        assert_eq!(loader.load(&mut provider).unwrap(), &LoadState::Empty);
    }

    #[test]
    fn failure_shows_message_and_drops_data() {
        let mut loader = ContentLoader::new();
        loader.load(&mut JsonProvider::inline(PAYLOAD)).unwrap();

        let mut failing = || -> Result<ContentEnvelope, FetchError> {
            Err(FetchError::Unavailable("503".into()))
        };
        let state = loader.load(&mut failing).unwrap().clone();
        assert_eq!(state, LoadState::Failed(FETCH_FAILED_MESSAGE.into()));
        assert!(loader.records().is_empty());
    }

    #[test]
    fn undecodable_payload_fails() {
        let mut loader = ContentLoader::new();
        let state = loader.load(&mut JsonProvider::inline("<html>")).unwrap();
        assert!(matches!(state, LoadState::Failed(_)));
    }

    #[test]
    fn second_begin_is_refused_while_in_flight() {
        let mut loader = ContentLoader::new();
        let ticket = loader.begin().unwrap();
        assert_eq!(loader.state(), &LoadState::Loading);
        assert!(matches!(loader.begin(), Err(DeckError::FetchInFlight)));
        loader.complete(ticket, Ok(ContentEnvelope::default()));
        assert!(loader.begin().is_ok());
    }

    #[test]
    fn retry_after_failure_resets_to_loading_then_ready() {
        let sink = MemorySink::new();
        let mut loader = ContentLoader::new().with_logger(Logger::new(sink.clone()));
        let mut attempts = 0;
        let mut flaky = || -> Result<ContentEnvelope, FetchError> {
            attempts += 1;
            if attempts == 1 {
                Err(FetchError::Unavailable("timeout".into()))
            } else {
                Ok(serde_json::from_str(PAYLOAD)?)
            }
        };
        assert!(matches!(loader.load(&mut flaky).unwrap(), LoadState::Failed(_)));
        assert_eq!(loader.load(&mut flaky).unwrap(), &LoadState::Ready);
        assert_eq!(
            sink.messages_for(LOG_TARGET),
            vec![
                "fetch_started",
                "fetch_failed",
                "fetch_started",
                "fetch_succeeded"
            ]
        );
    }

    #[test]
    fn ticket_from_another_loader_is_rejected() {
        let mut loader = ContentLoader::new();
        loader.load(&mut JsonProvider::inline(PAYLOAD)).unwrap();

        let mut other = ContentLoader::new();
        let foreign = other.begin().unwrap();
        assert!(!loader.accepts(&foreign));
        loader.complete(foreign, Ok(ContentEnvelope::default()));
        assert_eq!(loader.state(), &LoadState::Ready);
        assert_eq!(loader.records().len(), 2);
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let mut provider = JsonProvider::from_file("/nonexistent/tile_deck/payload.json");
        assert!(matches!(provider.fetch(), Err(FetchError::Io(_))));
    }
}
