use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Largest key treated as numeric. Keys at or above this are ordinary names.
const MAX_NUMERIC_KEY: u64 = u32::MAX as u64 - 1;

/// Bucket used for records that carry no group key.
pub const DEFAULT_GROUP_KEY: GroupKey = GroupKey::Numeric(1);

/// Identifier of the tile a record belongs to.
///
/// Numeric keys sort ascending ahead of every named key; named keys keep the
/// order in which they were first seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Numeric(u32),
    Named(String),
}

impl GroupKey {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        match parse_numeric_key(&name) {
            Some(n) => Self::Numeric(n),
            None => Self::Named(name),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => DEFAULT_GROUP_KEY,
            Value::String(s) => Self::named(s.as_str()),
            Value::Number(n) => match n.as_u64() {
                Some(v) if v <= MAX_NUMERIC_KEY => Self::Numeric(v as u32),
                _ => Self::named(n.to_string()),
            },
            other => Self::Named(other.to_string()),
        }
    }
}

impl Default for GroupKey {
    fn default() -> Self {
        DEFAULT_GROUP_KEY
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<u32> for GroupKey {
    fn from(value: u32) -> Self {
        Self::Numeric(value)
    }
}

impl From<i32> for GroupKey {
    fn from(value: i32) -> Self {
        match u32::try_from(value) {
            Ok(v) => Self::Numeric(v),
            Err(_) => Self::Named(value.to_string()),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self::named(value)
    }
}

/// Canonical decimal without leading zeros ("0" itself allowed).
fn parse_numeric_key(raw: &str) -> Option<u32> {
    let bytes = raw.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    raw.parse::<u64>()
        .ok()
        .filter(|v| *v <= MAX_NUMERIC_KEY)
        .map(|v| v as u32)
}

/// Ordering rank of a priority record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Rank {
    Parsed(i64),
    /// Present but not an integer; kept verbatim for diagnostics.
    Malformed(String),
    #[default]
    Missing,
}

impl Rank {
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Parsed(v) => Some(*v),
            _ => None,
        }
    }

    /// Lenient integer parse: optional leading whitespace and sign, an
    /// optional `0x` prefix selecting hex, then the longest run of digits.
    /// Anything after the digits is ignored and out-of-range values saturate.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (radix, digits) = match unsigned.get(..2) {
            Some("0x" | "0X") => (16, &unsigned[2..]),
            _ => (10, unsigned),
        };
        let mut magnitude: Option<i64> = None;
        for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
            let acc = magnitude.unwrap_or(0);
            magnitude = Some(
                acc.saturating_mul(i64::from(radix))
                    .saturating_add(i64::from(digit)),
            );
        }
        match magnitude {
            Some(v) if negative => Self::Parsed(-v),
            Some(v) => Self::Parsed(v),
            None => Self::Malformed(raw.to_string()),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::Parsed(v)
                } else if let Some(v) = n.as_f64().filter(|v| v.is_finite()) {
                    Self::Parsed(v.trunc() as i64)
                } else {
                    Self::Malformed(n.to_string())
                }
            }
            Value::String(s) => Self::parse(s),
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl From<i64> for Rank {
    fn from(value: i64) -> Self {
        Self::Parsed(value)
    }
}

impl From<i32> for Rank {
    fn from(value: i32) -> Self {
        Self::Parsed(i64::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
}

/// One content item. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, alias = "type", deserialize_with = "group_key")]
    pub group_key: GroupKey,
    #[serde(default, deserialize_with = "strict_true")]
    pub priority: bool,
    #[serde(default, deserialize_with = "rank")]
    pub rank: Rank,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "autoplaySpeed")]
    pub autoplay_speed_ms: Option<u64>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, group_key: impl Into<GroupKey>) -> Self {
        Self {
            id: id.into(),
            group_key: group_key.into(),
            ..Self::default()
        }
    }

    /// Mark as a priority record with the given rank.
    pub fn prioritized(mut self, rank: impl Into<Rank>) -> Self {
        self.priority = true;
        self.rank = rank.into();
        self
    }

    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media = Some(Media {
            url: Some(url.into()),
        });
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_speed_ms(mut self, speed: u64) -> Self {
        self.autoplay_speed_ms = Some(speed);
        self
    }

    pub fn media_url(&self) -> Option<&str> {
        self.media.as_ref().and_then(|m| m.url.as_deref())
    }

    /// Target opened when the slide is activated: the explicit link, else the media URL.
    pub fn target_url(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty())
            .or_else(|| self.media_url().filter(|url| !url.is_empty()))
    }

    pub(crate) fn fingerprint_into(&self, hasher: &mut blake3::Hasher) {
        for part in [
            self.id.as_str(),
            self.media_url().unwrap_or_default(),
            self.link.as_deref().unwrap_or_default(),
        ] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update(&self.autoplay_speed_ms.unwrap_or(0).to_le_bytes());
    }
}

/// Payload shape returned by the content provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentEnvelope {
    #[serde(default, deserialize_with = "record_list")]
    pub data: Vec<Record>,
}

impl ContentEnvelope {
    pub fn new(data: Vec<Record>) -> Self {
        Self { data }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn group_key<'de, D>(deserializer: D) -> Result<GroupKey, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(GroupKey::from_value(&Value::deserialize(deserializer)?))
}

fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn rank<'de, D>(deserializer: D) -> Result<Rank, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Rank::from_value(&Value::deserialize(deserializer)?))
}

fn record_list<'de, D>(deserializer: D) -> Result<Vec<Record>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Record>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_are_canonical_indices() {
        assert_eq!(GroupKey::named("3"), GroupKey::Numeric(3));
        assert_eq!(GroupKey::named("0"), GroupKey::Numeric(0));
        assert_eq!(GroupKey::named("03"), GroupKey::Named("03".into()));
        assert_eq!(GroupKey::named("-1"), GroupKey::Named("-1".into()));
        assert_eq!(
            GroupKey::named("4294967295"),
            GroupKey::Named("4294967295".into())
        );
        assert_eq!(GroupKey::named("shoes"), GroupKey::Named("shoes".into()));
    }

    #[test]
    fn rank_parse_is_lenient() {
        assert_eq!(Rank::parse("12"), Rank::Parsed(12));
        assert_eq!(Rank::parse("  -4"), Rank::Parsed(-4));
        assert_eq!(Rank::parse("7th"), Rank::Parsed(7));
        assert_eq!(Rank::parse("abc"), Rank::Malformed("abc".into()));
        assert_eq!(Rank::parse(""), Rank::Malformed(String::new()));
    }

    #[test]
    fn rank_parse_reads_hex_and_saturates() {
        assert_eq!(Rank::parse("0x10"), Rank::Parsed(16));
        assert_eq!(Rank::parse("-0XfF"), Rank::Parsed(-255));
        assert_eq!(Rank::parse("0x"), Rank::Malformed("0x".into()));
        assert_eq!(Rank::parse("0x1g"), Rank::Parsed(1));
        assert_eq!(
            Rank::parse("99999999999999999999999"),
            Rank::Parsed(i64::MAX)
        );
        assert_eq!(
            Rank::parse("-99999999999999999999999"),
            Rank::Parsed(-i64::MAX)
        );
    }

    #[test]
    fn deserializes_loose_payload() {
        let raw = r#"{
            "data": [
                { "id": 7, "type": 2, "priority": true, "rank": "3",
                  "media": { "url": "https://cdn/a.png" }, "brandName": "Acme" },
                { "id": "b", "groupKey": "hats", "priority": "true", "rank": 1.9,
                  "autoplaySpeedMs": 1200, "link": "https://acme/hats" },
                { "id": "c" }
            ]
        }"#;
        let envelope: ContentEnvelope = serde_json::from_str(raw).unwrap();
        let data = envelope.data;
        assert_eq!(data.len(), 3);

        assert_eq!(data[0].id, "7");
        assert_eq!(data[0].group_key, GroupKey::Numeric(2));
        assert!(data[0].priority);
        assert_eq!(data[0].rank, Rank::Parsed(3));
        assert_eq!(data[0].brand_name.as_deref(), Some("Acme"));

        assert_eq!(data[1].group_key, GroupKey::Named("hats".into()));
        assert!(!data[1].priority, "only boolean true counts as priority");
        assert_eq!(data[1].rank, Rank::Parsed(1));
        assert_eq!(data[1].autoplay_speed_ms, Some(1200));

        assert_eq!(data[2].group_key, DEFAULT_GROUP_KEY);
        assert_eq!(data[2].rank, Rank::Missing);
    }

    #[test]
    fn null_data_is_empty() {
        let envelope: ContentEnvelope = serde_json::from_str(r#"{ "data": null }"#).unwrap();
        assert!(envelope.data.is_empty());
        let envelope: ContentEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn target_prefers_link_over_media() {
        let record = Record::new("a", 1).with_media("https://cdn/a.png");
        assert_eq!(record.target_url(), Some("https://cdn/a.png"));
        let record = record.with_link("https://brand/a");
        assert_eq!(record.target_url(), Some("https://brand/a"));
        assert_eq!(Record::new("b", 1).target_url(), None);
    }
}
