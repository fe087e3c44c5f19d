//! Sequential per-channel pipeline.
//!
//! Channels are processed strictly in input order; within a channel every
//! video is aggregated before the next one starts. The channel list is an
//! explicit parameter; nothing here reads or mutates process-wide state.

use std::path::PathBuf;

use anyhow::Result;
use log::{error, info, warn};

use crate::aggregate::{AggregateOptions, build_record};
use crate::export;
use crate::transcript::TranscriptProvider;
use crate::youtube::{ChannelResolution, PublishWindow, VideoPlatform, list_video_ids};

/// Observational progress reporting. Implementations must not feed anything
/// back into the pipeline.
pub trait ProgressSink {
    fn update(&mut self, percent: u8, message: &str);
}

/// Default sink: progress goes to the operator log.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn update(&mut self, percent: u8, message: &str) {
        info!("[{percent:>3}%] {message}");
    }
}

/// Everything the runner needs beyond the channel list itself.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_results: u32,
    pub window: PublishWindow,
    pub output_dir: PathBuf,
    pub aggregate: AggregateOptions,
}

/// One finished channel export.
#[derive(Debug)]
pub struct ChannelArtifact {
    pub channel_name: String,
    pub path: PathBuf,
    pub download_link: String,
    pub row_count: usize,
}

/// Runs resolve, enumerate, aggregate, and export for every channel, in input
/// order. Per-video failures are logged and skipped; a channel that cannot be
/// resolved still produces an (empty) export so the output set stays aligned
/// with the input list.
pub fn run_channels<P, T, S>(
    platform: &P,
    transcripts: &T,
    progress: &mut S,
    channel_names: &[String],
    options: &PipelineOptions,
) -> Result<Vec<ChannelArtifact>>
where
    P: VideoPlatform,
    T: TranscriptProvider,
    S: ProgressSink,
{
    let mut artifacts = Vec::with_capacity(channel_names.len());

    for channel_name in channel_names {
        info!("Scraping data for channel: {channel_name}");

        let resolution = match platform.resolve_channel(channel_name) {
            Ok(resolution) => resolution,
            Err(err) => {
                error!("Channel resolution failed for '{channel_name}': {err:#}");
                ChannelResolution::NotFound
            }
        };

        let video_ids = list_video_ids(
            platform,
            channel_name,
            &resolution,
            options.max_results,
            &options.window,
        );
        progress.update(
            25,
            &format!("Completed: Getting video IDs for {channel_name} (25%)"),
        );

        let mut records = Vec::with_capacity(video_ids.len());
        for video_id in &video_ids {
            match build_record(platform, transcripts, video_id, &options.aggregate) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => info!("No data found for video ID {video_id}"),
                Err(err) => warn!("Skipping video {video_id}: {err:#}"),
            }
        }
        progress.update(
            75,
            &format!("Completed: Fetching video data for {channel_name} (75%)"),
        );

        let path = export::write_channel_csv(&options.output_dir, channel_name, &records)?;
        let download_link = export::download_link(&path, channel_name)?;
        let file_name = export::export_file_name(channel_name);
        progress.update(
            100,
            &format!("Completed: Exporting data to {file_name} (100%)"),
        );

        artifacts.push(ChannelArtifact {
            channel_name: channel_name.clone(),
            path,
            download_link,
            row_count: records.len(),
        });
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptFetchError;
    use crate::youtube::{
        CommentFetchError, CommentPage, ContentDetails, Statistics, VideoDetail, VideoSnippet,
    };
    use tempfile::tempdir;

    /// Stub platform: one known channel with three videos, comments empty,
    /// transcripts available in the fallback language only.
    struct StubPlatform;

    impl VideoPlatform for StubPlatform {
        fn resolve_channel(&self, channel_name: &str) -> Result<ChannelResolution> {
            if channel_name == "acme" {
                Ok(ChannelResolution::Found("UCacme".into()))
            } else {
                Ok(ChannelResolution::NotFound)
            }
        }

        fn search_video_ids(
            &self,
            channel_id: &str,
            max_results: u32,
            _window: &PublishWindow,
        ) -> Result<Vec<String>> {
            assert_eq!(channel_id, "UCacme");
            let ids = ["vid1", "vid2", "vid3"];
            Ok(ids
                .iter()
                .take(max_results as usize)
                .map(|id| id.to_string())
                .collect())
        }

        fn video_detail(&self, video_id: &str) -> Result<Option<VideoDetail>> {
            Ok(Some(VideoDetail {
                snippet: Some(VideoSnippet {
                    published_at: Some("2023-10-15T08:30:00Z".into()),
                    channel_id: Some("UCacme".into()),
                    channel_title: Some("Acme Clips".into()),
                    title: Some(format!("Video {video_id}")),
                    description: None,
                    tags: Vec::new(),
                }),
                content_details: Some(ContentDetails {
                    duration: Some("PT45S".into()),
                }),
                live_streaming_details: None,
                statistics: Some(Statistics::default()),
            }))
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

    struct FallbackOnly;

    impl TranscriptProvider for FallbackOnly {
        fn fetch(
            &self,
            _video_id: &str,
            language: &str,
        ) -> std::result::Result<Vec<String>, TranscriptFetchError> {
            if language == "en" {
                Ok(vec!["caption".into()])
            } else {
                Err(TranscriptFetchError::NotAvailable)
            }
        }
    }

    /// Records every checkpoint so tests can assert ordering.
    struct RecordingProgress(Vec<(u8, String)>);

    impl ProgressSink for RecordingProgress {
        fn update(&mut self, percent: u8, message: &str) {
            self.0.push((percent, message.to_string()));
        }
    }

    fn options(output_dir: PathBuf) -> PipelineOptions {
        PipelineOptions {
            max_results: 5,
            window: PublishWindow {
                published_after: "2023-10-01T00:00:00Z".into(),
                published_before: "2023-11-01T00:00:00Z".into(),
            },
            output_dir,
            aggregate: AggregateOptions {
                comment_page_size: 100,
                primary_lang: "pt".into(),
                fallback_lang: "en".into(),
            },
        }
    }

    #[test]
    fn end_to_end_exports_three_rows_for_acme() {
        let dir = tempdir().unwrap();
        let mut progress = RecordingProgress(Vec::new());
        let artifacts = run_channels(
            &StubPlatform,
            &FallbackOnly,
            &mut progress,
            &["acme".to_string()],
            &options(dir.path().to_path_buf()),
        )
        .unwrap();

        assert_eq!(artifacts.len(), 1);
        let artifact = &artifacts[0];
        assert_eq!(artifact.row_count, 3);
        assert!(artifact.path.ends_with("acme_output.csv"));
        assert!(artifact.download_link.contains("acme_output.csv"));

        let contents = std::fs::read_to_string(&artifact.path).unwrap();
        // Header plus one row per video.
        assert_eq!(contents.lines().count(), 4);
        assert!(contents.contains("vid1"));
        assert!(contents.contains("vid3"));
        assert!(contents.contains("00:00:45"));

        let checkpoints: Vec<u8> = progress.0.iter().map(|(percent, _)| *percent).collect();
        assert_eq!(checkpoints, vec![25, 75, 100]);
    }

    #[test]
    fn unknown_channel_still_produces_empty_export() {
        let dir = tempdir().unwrap();
        let mut progress = RecordingProgress(Vec::new());
        let artifacts = run_channels(
            &StubPlatform,
            &FallbackOnly,
            &mut progress,
            &["nobody".to_string()],
            &options(dir.path().to_path_buf()),
        )
        .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].row_count, 0);
        let contents = std::fs::read_to_string(&artifacts[0].path).unwrap();
        // Header only.
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn channels_are_processed_in_input_order() {
        let dir = tempdir().unwrap();
        let mut progress = RecordingProgress(Vec::new());
        let channels = vec!["acme".to_string(), "nobody".to_string()];
        let artifacts = run_channels(
            &StubPlatform,
            &FallbackOnly,
            &mut progress,
            &channels,
            &options(dir.path().to_path_buf()),
        )
        .unwrap();

        let names: Vec<&str> = artifacts
            .iter()
            .map(|artifact| artifact.channel_name.as_str())
            .collect();
        assert_eq!(names, vec!["acme", "nobody"]);
    }
}
