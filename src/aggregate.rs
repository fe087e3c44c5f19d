//! The per-video aggregation core.
//!
//! For one video id this module merges four independently fetched sources
//! (detail metadata, statistics, paginated comment threads, and the
//! two-language transcript attempt) into a single flat [`VideoRecord`].
//! Failures below the per-video boundary degrade to sentinel values instead
//! of propagating; a video whose detail fetch returns nothing is skipped
//! outright rather than exported half-filled.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::record::{
    self, EngagementMap, LiveDetails, Stat, VideoRecord, disabled_comments_sentinel,
};
use crate::transcript::{TranscriptProvider, fetch_with_fallback};
use crate::youtube::{CommentFetchError, VideoPlatform};

/// Knobs the aggregator needs from the runtime configuration.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub comment_page_size: u32,
    pub primary_lang: String,
    pub fallback_lang: String,
}

/// Builds the denormalized record for one video. Returns `Ok(None)` when the
/// platform knows nothing about the id; such videos contribute no output row.
pub fn build_record<P, T>(
    platform: &P,
    transcripts: &T,
    video_id: &str,
    options: &AggregateOptions,
) -> Result<Option<VideoRecord>>
where
    P: VideoPlatform,
    T: TranscriptProvider,
{
    let Some(detail) = platform.video_detail(video_id)? else {
        return Ok(None);
    };

    let snippet = detail.snippet.unwrap_or_default();
    let content_details = detail.content_details.unwrap_or_default();
    let live_details = detail.live_streaming_details.unwrap_or_default();
    let statistics = detail.statistics.unwrap_or_default();

    let published_at_raw = snippet
        .published_at
        .context("video detail is missing publishedAt")?;
    let published_at = record::parse_published_at(&published_at_raw)
        .with_context(|| format!("parsing publish timestamp '{published_at_raw}'"))?;

    let duration_raw = content_details.duration.unwrap_or_default();
    let duration = record::format_duration(&duration_raw);

    let engagement = collect_engagement(platform, video_id, options.comment_page_size);

    let transcript = fetch_with_fallback(
        transcripts,
        video_id,
        &options.primary_lang,
        &options.fallback_lang,
    );

    Ok(Some(VideoRecord {
        channel_name: snippet.channel_title.unwrap_or_default(),
        channel_id: snippet.channel_id.unwrap_or_default(),
        video_id: video_id.to_string(),
        published_at_raw,
        published_at,
        title: snippet.title.unwrap_or_default(),
        url: record::watch_url(video_id),
        description: snippet.description.unwrap_or_default(),
        views: Stat::from_field(statistics.view_count.as_deref()),
        likes: Stat::from_field(statistics.like_count.as_deref()),
        dislikes: Stat::from_field(statistics.dislike_count.as_deref()),
        favorite_count: Stat::from_field(statistics.favorite_count.as_deref()),
        comment_count: Stat::from_field(statistics.comment_count.as_deref()),
        tags: snippet.tags,
        duration_raw,
        duration,
        live: LiveDetails {
            actual_start_time: live_details.actual_start_time,
            actual_end_time: live_details.actual_end_time,
            scheduled_start_time: live_details.scheduled_start_time,
            concurrent_viewers: live_details
                .concurrent_viewers
                .and_then(|viewers| viewers.parse().ok()),
        },
        engagement,
        transcript,
    }))
}

/// Walks every comment-thread page for the video and accumulates comment
/// text to like count. Any page failing collapses the whole map to the
/// disabled-comments sentinel; comments gathered before the failure are
/// discarded in favor of the sentinel, which is logged since it loses data.
fn collect_engagement<P: VideoPlatform>(
    platform: &P,
    video_id: &str,
    page_size: u32,
) -> EngagementMap {
    let mut engagement = EngagementMap::new();

    if let Err(failure) = paginate_comments(platform, video_id, page_size, &mut engagement) {
        if !engagement.is_empty() {
            warn!(
                "Discarding {} comments collected for {video_id} before the failing page",
                engagement.len()
            );
        }
        match failure {
            CommentFetchError::Disabled => {
                info!("Comments are disabled for {video_id}");
            }
            CommentFetchError::Api(message) => {
                warn!("Comment listing failed for {video_id}: {message}");
            }
        }
        return disabled_comments_sentinel();
    }

    engagement
}

/// Follows continuation tokens until a page arrives without one. Duplicate
/// comment texts overwrite the earlier like count.
fn paginate_comments<P: VideoPlatform>(
    platform: &P,
    video_id: &str,
    page_size: u32,
    engagement: &mut EngagementMap,
) -> std::result::Result<(), CommentFetchError> {
    let mut page_token: Option<String> = None;

    loop {
        let page = platform.comment_page(video_id, page_size, page_token.as_deref())?;

        for comment in page.comments {
            engagement.insert(comment.text, comment.like_count);
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => return Ok(()),
        }
    }
}
