//! Blocking transcript retrieval with a two-language fallback.
//!
//! Captions come from the public timedtext endpoint in its `json3` format.
//! Each language attempt is a single call; the aggregator asks for the
//! primary locale first and falls back to the secondary one, so transient
//! failures are never retried within a language.

use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::record::TranscriptResult;

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// Typed failure for a single transcript attempt.
#[derive(Debug)]
pub enum TranscriptFetchError {
    /// The platform has no track for the requested language.
    NotAvailable,
    /// Transport or decoding failure.
    Api(String),
}

impl fmt::Display for TranscriptFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptFetchError::NotAvailable => write!(f, "no transcript for this language"),
            TranscriptFetchError::Api(message) => write!(f, "transcript fetch failed: {message}"),
        }
    }
}

impl std::error::Error for TranscriptFetchError {}

/// Transcript source seam; tests substitute fixtures for the HTTP client.
pub trait TranscriptProvider {
    /// Returns the ordered caption texts for one video in one language.
    fn fetch(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<String>, TranscriptFetchError>;
}

#[derive(Debug, Deserialize)]
struct TimedTextResponse {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    utf8: Option<String>,
}

/// HTTP client for the timedtext endpoint.
pub struct TimedTextClient {
    agent: ureq::Agent,
}

impl Default for TimedTextClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedTextClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::agent(),
        }
    }
}

impl TranscriptProvider for TimedTextClient {
    fn fetch(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<String>, TranscriptFetchError> {
        let url = format!(
            "{TIMEDTEXT_URL}?v={video_id}&lang={}&fmt=json3",
            urlencoding::encode(language)
        );

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| TranscriptFetchError::Api(err.to_string()))?;

        let body = response
            .into_string()
            .map_err(|err| TranscriptFetchError::Api(err.to_string()))?;

        // The endpoint answers 200 with an empty body when no track exists
        // for the requested language.
        if body.trim().is_empty() {
            return Err(TranscriptFetchError::NotAvailable);
        }

        let parsed: TimedTextResponse = serde_json::from_str(&body)
            .map_err(|err| TranscriptFetchError::Api(err.to_string()))?;

        let texts: Vec<String> = parsed
            .events
            .into_iter()
            .flat_map(|event| event.segs)
            .filter_map(|segment| segment.utf8)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        if texts.is_empty() {
            return Err(TranscriptFetchError::NotAvailable);
        }

        Ok(texts)
    }
}

/// Runs the primary-then-fallback language strategy. Each attempt is one
/// call; the first success wins and both failing yields the placeholder
/// marker in the result.
pub fn fetch_with_fallback<T: TranscriptProvider>(
    provider: &T,
    video_id: &str,
    primary_lang: &str,
    fallback_lang: &str,
) -> TranscriptResult {
    match provider.fetch(video_id, primary_lang) {
        Ok(texts) => TranscriptResult::Captions(texts),
        Err(primary_err) => {
            debug!(
                "Transcript in '{primary_lang}' unavailable for {video_id} ({primary_err}), \
                 trying '{fallback_lang}'"
            );
            match provider.fetch(video_id, fallback_lang) {
                Ok(texts) => TranscriptResult::Captions(texts),
                Err(fallback_err) => {
                    debug!("Transcript in '{fallback_lang}' unavailable for {video_id} ({fallback_err})");
                    TranscriptResult::Unavailable
                }
            }
        }
    }
}
