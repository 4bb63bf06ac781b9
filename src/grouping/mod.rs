//! Grouping engine: buckets records into tiles and orders each bucket.
//!
//! Bucketing goes through an insertion-ordered map so identical input always
//! yields identical output. Numeric group keys are then lifted ahead of named
//! keys in ascending order; named keys keep first-seen order.
//!
//! Within a group, priority records come first, ordered by ascending rank.
//! A priority record whose rank is missing or malformed sorts after every
//! validly ranked priority record but before all non-priority records. Both
//! sorts are stable, so ties and non-priority records keep input order.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;

use crate::logging::{LogLevel, Logger, emit, json_kv};
use crate::record::{GroupKey, Rank, Record};

const LOG_TARGET: &str = "tile_deck::grouping";

/// One tile's worth of records, already ordered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: GroupKey,
    pub items: Arc<[Record]>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    logger: Option<Logger>,
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger: Some(logger),
        }
    }

    pub fn group(&self, records: &[Record]) -> Vec<Group> {
        let mut buckets: IndexMap<GroupKey, Vec<Record>> = IndexMap::new();
        for record in records {
            buckets
                .entry(record.group_key.clone())
                .or_default()
                .push(record.clone());
        }

        let mut ordered: Vec<(GroupKey, Vec<Record>)> = buckets.into_iter().collect();
        ordered.sort_by_key(|(key, _)| match key {
            GroupKey::Numeric(n) => (0u8, *n),
            GroupKey::Named(_) => (1u8, 0),
        });

        ordered
            .into_iter()
            .map(|(key, mut items)| {
                self.report_malformed(&key, &items);
                items.sort_by_key(display_order);
                Group {
                    key,
                    items: items.into(),
                }
            })
            .collect()
    }

    fn report_malformed(&self, key: &GroupKey, items: &[Record]) {
        for record in items.iter().filter(|r| r.priority) {
            if let Rank::Malformed(raw) = &record.rank {
                emit(
                    self.logger.as_ref(),
                    LogLevel::Debug,
                    LOG_TARGET,
                    "malformed_rank",
                    [
                        json_kv("group", json!(key.to_string())),
                        json_kv("record", json!(record.id)),
                        json_kv("rank", json!(raw)),
                    ],
                );
            }
        }
    }
}

/// Convenience wrapper for callers that do not log.
pub fn group_records(records: &[Record]) -> Vec<Group> {
    GroupingEngine::new().group(records)
}

fn display_order(record: &Record) -> (u8, i64) {
    match (record.priority, record.rank.value()) {
        (true, Some(rank)) => (0, rank),
        (true, None) => (1, 0),
        (false, _) => (2, 0),
    }
}
