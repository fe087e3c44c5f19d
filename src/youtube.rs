//! Blocking adapter around the YouTube Data API v3.
//!
//! Only the four endpoints the pipeline needs are wrapped: free-text channel
//! search, channel-scoped video search, video detail, and paginated comment
//! threads. The adapter is pure request/response; resolution and enumeration
//! policy (first-hit wins, failures degrade to empty lists) live in the thin
//! wrappers at the bottom of the module.

use std::fmt;

use anyhow::{Context, Result};
use log::{error, info};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Outcome of mapping a human-readable channel name to a platform id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResolution {
    Found(String),
    NotFound,
}

/// Closed publish-date interval applied to video enumeration.
#[derive(Debug, Clone)]
pub struct PublishWindow {
    pub published_after: String,
    pub published_before: String,
}

/// One page of comment threads for a video.
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub comments: Vec<CommentEntry>,
    pub next_page_token: Option<String>,
}

/// A single top-level comment reduced to what the engagement map stores.
#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub text: String,
    pub like_count: u64,
}

/// Typed failure for comment-thread listing so callers can branch on the
/// kind instead of swallowing every error identically.
#[derive(Debug)]
pub enum CommentFetchError {
    /// The platform refused the listing (comments turned off for the video).
    Disabled,
    /// Transport or API failure unrelated to the video's comment settings.
    Api(String),
}

impl fmt::Display for CommentFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentFetchError::Disabled => write!(f, "comments are disabled for this video"),
            CommentFetchError::Api(message) => write!(f, "comment listing failed: {message}"),
        }
    }
}

impl std::error::Error for CommentFetchError {}

// Response shapes. Every field the platform may omit is optional; the
// aggregator decides what absence means.

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub id: Option<SearchItemId>,
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub channel_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub snippet: Option<VideoSnippet>,
    pub content_details: Option<ContentDetails>,
    pub live_streaming_details: Option<LiveStreamingDetails>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamingDetails {
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub concurrent_viewers: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub dislike_count: Option<String>,
    pub favorite_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: Option<CommentThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: Option<String>,
    like_count: Option<i64>,
}

/// The platform contract the aggregator and pipeline are written against.
/// Tests substitute fixture implementations for the HTTP client.
pub trait VideoPlatform {
    /// Maps a channel name to its platform id via free-text search; zero
    /// results yield the `NotFound` sentinel rather than an error.
    fn resolve_channel(&self, channel_name: &str) -> Result<ChannelResolution>;

    /// Lists video ids for a resolved channel id, newest first, bounded by
    /// `max_results` and the publish window.
    fn search_video_ids(
        &self,
        channel_id: &str,
        max_results: u32,
        window: &PublishWindow,
    ) -> Result<Vec<String>>;

    /// Fetches the combined detail parts for one video. `None` means the
    /// platform returned zero items for the id.
    fn video_detail(&self, video_id: &str) -> Result<Option<VideoDetail>>;

    /// Fetches one page of comment threads.
    fn comment_page(
        &self,
        video_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> std::result::Result<CommentPage, CommentFetchError>;
}

/// HTTP client for the Data API. One agent is reused for connection pooling
/// across the whole run.
pub struct YoutubeClient {
    agent: ureq::Agent,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            api_key: api_key.into(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("requesting {url}"))?;
        let parsed = response
            .into_json::<T>()
            .with_context(|| format!("decoding response from {url}"))?;
        Ok(parsed)
    }
}

impl VideoPlatform for YoutubeClient {
    fn resolve_channel(&self, channel_name: &str) -> Result<ChannelResolution> {
        let url = format!(
            "{API_BASE}/search?part=snippet&type=channel&q={}&key={}",
            urlencoding::encode(channel_name),
            self.api_key
        );
        let response: SearchResponse = self.get_json(&url)?;

        // First hit wins. Common channel names can resolve to the wrong
        // channel; the resolved id is logged so a mismatch is auditable.
        let channel_id = response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.channel_id);

        match channel_id {
            Some(id) => {
                info!("Resolved channel '{channel_name}' to {id}");
                Ok(ChannelResolution::Found(id))
            }
            None => Ok(ChannelResolution::NotFound),
        }
    }

    fn search_video_ids(
        &self,
        channel_id: &str,
        max_results: u32,
        window: &PublishWindow,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{API_BASE}/search?part=id&channelId={channel_id}&order=date&maxResults={max_results}\
             &publishedAfter={}&publishedBefore={}&key={}",
            urlencoding::encode(&window.published_after),
            urlencoding::encode(&window.published_before),
            self.api_key
        );
        let response: SearchResponse = self.get_json(&url)?;

        // Channel searches can also surface playlist and channel hits; only
        // items carrying a videoId are videos.
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id)
            .filter_map(|id| id.video_id)
            .collect())
    }

    fn video_detail(&self, video_id: &str) -> Result<Option<VideoDetail>> {
        let url = format!(
            "{API_BASE}/videos?part=snippet,contentDetails,liveStreamingDetails,statistics\
             &id={video_id}&key={}",
            self.api_key
        );
        let response: VideoListResponse = self.get_json(&url)?;
        Ok(response.items.into_iter().next())
    }

    fn comment_page(
        &self,
        video_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> std::result::Result<CommentPage, CommentFetchError> {
        let mut url = format!(
            "{API_BASE}/commentThreads?part=snippet&videoId={video_id}&maxResults={page_size}\
             &key={}",
            self.api_key
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={token}"));
        }

        let response = self.agent.get(&url).call().map_err(|err| match err {
            // The API answers comment listings for comment-disabled videos
            // with a 403.
            ureq::Error::Status(403, _) => CommentFetchError::Disabled,
            other => CommentFetchError::Api(other.to_string()),
        })?;

        let parsed: CommentThreadsResponse = response
            .into_json()
            .map_err(|err| CommentFetchError::Api(err.to_string()))?;

        let comments = parsed
            .items
            .into_iter()
            .filter_map(|thread| thread.snippet)
            .filter_map(|snippet| snippet.top_level_comment)
            .filter_map(|comment| comment.snippet)
            .filter_map(|snippet| {
                snippet.text_display.map(|text| CommentEntry {
                    text,
                    like_count: snippet.like_count.unwrap_or(0).max(0) as u64,
                })
            })
            .collect();

        Ok(CommentPage {
            comments,
            next_page_token: parsed.next_page_token,
        })
    }
}

/// Video enumeration policy: a not-found channel or a failed search both
/// degrade to an empty list. The operator sees the failure in the log; the
/// export for that channel is simply empty.
pub fn list_video_ids<P: VideoPlatform>(
    platform: &P,
    channel_name: &str,
    resolution: &ChannelResolution,
    max_results: u32,
    window: &PublishWindow,
) -> Vec<String> {
    let channel_id = match resolution {
        ChannelResolution::Found(id) => id,
        ChannelResolution::NotFound => {
            error!("No channel found for username: {channel_name}");
            return Vec::new();
        }
    };

    match platform.search_video_ids(channel_id, max_results, window) {
        Ok(ids) => {
            info!("Found {} videos for '{channel_name}'", ids.len());
            ids
        }
        Err(err) => {
            error!("Error fetching video IDs for '{channel_name}': {err:#}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyPlatform;

    impl VideoPlatform for EmptyPlatform {
        fn resolve_channel(&self, _channel_name: &str) -> Result<ChannelResolution> {
            Ok(ChannelResolution::NotFound)
        }

        fn search_video_ids(
            &self,
            _channel_id: &str,
            _max_results: u32,
            _window: &PublishWindow,
        ) -> Result<Vec<String>> {
            anyhow::bail!("search should not be reached for unresolved channels")
        }

        fn video_detail(&self, _video_id: &str) -> Result<Option<VideoDetail>> {
            Ok(None)
        }

        fn comment_page(
            &self,
            _video_id: &str,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> std::result::Result<CommentPage, CommentFetchError> {
            Ok(CommentPage::default())
        }
    }

    struct FailingSearch;

    impl VideoPlatform for FailingSearch {
        fn resolve_channel(&self, _channel_name: &str) -> Result<ChannelResolution> {
            Ok(ChannelResolution::Found("UC123".into()))
        }

        fn search_video_ids(
            &self,
            _channel_id: &str,
            _max_results: u32,
            _window: &PublishWindow,
        ) -> Result<Vec<String>> {
            anyhow::bail!("quota exceeded")
        }

        fn video_detail(&self, _video_id: &str) -> Result<Option<VideoDetail>> {
            Ok(None)
        }

        fn comment_page(
            &self,
            _video_id: &str,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> std::result::Result<CommentPage, CommentFetchError> {
            Ok(CommentPage::default())
        }
    }

    fn window() -> PublishWindow {
        PublishWindow {
            published_after: "2023-10-01T00:00:00Z".into(),
            published_before: "2023-11-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn unresolved_channel_enumerates_to_empty() {
        let ids = list_video_ids(
            &EmptyPlatform,
            "nobody",
            &ChannelResolution::NotFound,
            10,
            &window(),
        );
        assert!(ids.is_empty());
    }

    #[test]
    fn search_failure_enumerates_to_empty() {
        let resolution = ChannelResolution::Found("UC123".into());
        let ids = list_video_ids(&FailingSearch, "acme", &resolution, 10, &window());
        assert!(ids.is_empty());
    }

    #[test]
    fn search_response_keeps_only_video_hits() {
        let payload = r#"{
            "items": [
                {"id": {"videoId": "vid1"}},
                {"id": {"playlistId": "pl1"}},
                {"id": {"videoId": "vid2"}},
                {"snippet": {"channelId": "UC1"}}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(payload).unwrap();
        let ids: Vec<String> = parsed
            .items
            .into_iter()
            .filter_map(|item| item.id)
            .filter_map(|id| id.video_id)
            .collect();
        assert_eq!(ids, vec!["vid1", "vid2"]);
    }

    #[test]
    fn video_detail_tolerates_missing_parts() {
        let payload = r#"{"items": [{"snippet": {"title": "t", "publishedAt": "2023-10-02T00:00:00Z"}}]}"#;
        let parsed: VideoListResponse = serde_json::from_str(payload).unwrap();
        let detail = parsed.items.into_iter().next().unwrap();
        assert!(detail.statistics.is_none());
        assert!(detail.live_streaming_details.is_none());
        assert_eq!(detail.snippet.unwrap().title.as_deref(), Some("t"));
    }
}
