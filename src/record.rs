//! Flat per-video export model.
//!
//! Everything the pipeline learns about one video (snippet metadata,
//! statistics, comment engagement, transcript) is denormalized into a single
//! [`VideoRecord`] so the CSV writer never has to join anything. Records are
//! built once by the aggregator and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Wire format the platform uses for `publishedAt`.
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Sentinel comment text written when comment retrieval fails for a video.
pub const COMMENTS_DISABLED_SENTINEL: &str = "Videos has disabled comments";

/// Placeholder emitted when neither transcript language attempt succeeded.
pub const TRANSCRIPT_PLACEHOLDER: &str = "No Transcript Found neither in Portuguese or English";

/// Comment text mapped to its like count. Texts are not unique on the
/// platform; a duplicate text simply overwrites the earlier count. A sorted
/// map keeps the serialized cell deterministic.
pub type EngagementMap = BTreeMap<String, u64>;

/// The map a video's engagement collapses to when comment retrieval fails.
pub fn disabled_comments_sentinel() -> EngagementMap {
    let mut map = EngagementMap::new();
    map.insert(COMMENTS_DISABLED_SENTINEL.to_string(), 0);
    map
}

/// A platform statistic that may be legitimately absent. `Count(0)` and
/// `NotAvailable` are deliberately distinct: the platform omitting a counter
/// is not the same as the counter being zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Stat {
    Count(u64),
    NotAvailable,
}

impl Stat {
    /// Builds a statistic from the platform's optional string counter.
    /// An unparseable value is treated the same as a missing one.
    pub fn from_field(value: Option<&str>) -> Self {
        match value.and_then(|v| v.parse::<u64>().ok()) {
            Some(count) => Stat::Count(count),
            None => Stat::NotAvailable,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Count(count) => write!(f, "{count}"),
            Stat::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// Outcome of the two-language transcript attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TranscriptResult {
    /// Caption texts in platform order, one entry per caption event.
    Captions(Vec<String>),
    /// Neither the primary nor the fallback language produced captions.
    Unavailable,
}

impl TranscriptResult {
    /// Renders the transcript for a CSV cell: a JSON array of caption texts,
    /// or the fixed placeholder when nothing was available.
    pub fn render(&self) -> String {
        match self {
            TranscriptResult::Captions(texts) => {
                serde_json::to_string(texts).unwrap_or_default()
            }
            TranscriptResult::Unavailable => TRANSCRIPT_PLACEHOLDER.to_string(),
        }
    }
}

/// Livestream-only fields. Present as a block so regular uploads carry a
/// single `None` instead of four.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LiveDetails {
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub concurrent_viewers: Option<u64>,
}

/// One denormalized output row. Field order mirrors the export columns.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRecord {
    pub channel_name: String,
    pub channel_id: String,
    pub video_id: String,
    pub published_at_raw: String,
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub description: String,
    pub views: Stat,
    pub likes: Stat,
    pub dislikes: Stat,
    pub favorite_count: Stat,
    pub comment_count: Stat,
    pub tags: Vec<String>,
    pub duration_raw: String,
    pub duration: String,
    pub live: LiveDetails,
    pub engagement: EngagementMap,
    pub transcript: TranscriptResult,
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Parses the platform's fixed `publishedAt` wire format.
pub fn parse_published_at(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, PUBLISHED_AT_FORMAT)?;
    Ok(naive.and_utc())
}

/// Normalizes an ISO-8601 period (`PT#H#M#S`, every component optional) to
/// zero-padded `HH:MM:SS`. Strings that do not follow the pattern are passed
/// through unchanged as a degraded fallback.
pub fn format_duration(raw: &str) -> String {
    let Some(rest) = raw.strip_prefix("PT") else {
        return raw.to_string();
    };

    let mut hours = 0u64;
    let mut minutes = 0u64;
    let mut seconds = 0u64;
    let mut digits = String::new();

    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u64 = digits.parse().unwrap_or(0);
        match ch {
            'H' => hours = value,
            'M' => minutes = value,
            'S' => seconds = value,
            _ => return raw.to_string(),
        }
        digits.clear();
    }

    // Trailing digits without a unit letter mean the string is not a valid
    // period after all.
    if !digits.is_empty() {
        return raw.to_string();
    }

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
