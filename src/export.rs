//! CSV artifact writing and download-link rendering.
//!
//! One export per channel, one row per aggregated video. The artifact is
//! written to disk first; the download link base64-encodes the finished file
//! into a `data:` anchor so a browser can save it without another server
//! round-trip.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::record::VideoRecord;

/// Export column set, one entry per `VideoRecord` field group.
pub const CSV_HEADERS: [&str; 22] = [
    "Channel_Name",
    "Channel_ID",
    "Video_ID",
    "Original_date",
    "Parsed_date",
    "Video_Title",
    "Video_URL",
    "Video_Description",
    "Views",
    "Likes",
    "Dislikes",
    "Favorite_Count",
    "Comment_Count",
    "Tags",
    "Original_duration",
    "Parsed_Duration",
    "Actual_End_Time",
    "Actual_Start_Time",
    "Concurrent_Viewers",
    "Scheduled_Start_Time",
    "Comments_Likes",
    "Transcript",
];

/// Strips characters that are illegal or hazardous in filenames (path
/// separators, Windows-reserved punctuation, control characters).
pub fn sanitize_export_name(channel_name: &str) -> String {
    channel_name
        .chars()
        .filter(|ch| !ch.is_control() && !matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect()
}

/// Deterministic artifact name for one channel.
pub fn export_file_name(channel_name: &str) -> String {
    format!("{}_output.csv", sanitize_export_name(channel_name))
}

fn record_row(record: &VideoRecord) -> Vec<String> {
    vec![
        record.channel_name.clone(),
        record.channel_id.clone(),
        record.video_id.clone(),
        record.published_at_raw.clone(),
        record.published_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        record.title.clone(),
        record.url.clone(),
        record.description.clone(),
        record.views.to_string(),
        record.likes.to_string(),
        record.dislikes.to_string(),
        record.favorite_count.to_string(),
        record.comment_count.to_string(),
        serde_json::to_string(&record.tags).unwrap_or_default(),
        record.duration_raw.clone(),
        record.duration.clone(),
        record.live.actual_end_time.clone().unwrap_or_default(),
        record.live.actual_start_time.clone().unwrap_or_default(),
        record
            .live
            .concurrent_viewers
            .map(|viewers| viewers.to_string())
            .unwrap_or_default(),
        record.live.scheduled_start_time.clone().unwrap_or_default(),
        serde_json::to_string(&record.engagement).unwrap_or_default(),
        record.transcript.render(),
    ]
}

/// Writes one channel's records to `{output_dir}/{channel}_output.csv` and
/// returns the artifact path.
pub fn write_channel_csv(
    output_dir: &Path,
    channel_name: &str,
    records: &[VideoRecord],
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let path = output_dir.join(export_file_name(channel_name));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer
        .write_record(CSV_HEADERS)
        .context("writing CSV header row")?;
    for record in records {
        writer
            .write_record(record_row(record))
            .with_context(|| format!("writing row for video {}", record.video_id))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    Ok(path)
}

/// Renders the download anchor for a finished artifact: the whole file is
/// base64-encoded into the link target.
pub fn download_link(path: &Path, channel_name: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let encoded = STANDARD.encode(bytes);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("export.csv");

    Ok(format!(
        "<a href=\"data:text/csv;base64,{encoded}\" download=\"{file_name}\" \
         target=\"_blank\">Download CSV for {channel_name}</a>"
    ))
}

/// Collects every channel's download anchor into a minimal HTML page.
pub fn write_links_page(path: &Path, links: &[String]) -> Result<()> {
    let mut page = String::from("<html><body>\n<p>Download the scraped data:</p>\n");
    for link in links {
        page.push_str(link);
        page.push('\n');
    }
    page.push_str("</body></html>\n");
    fs::write(path, page).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        EngagementMap, LiveDetails, Stat, TranscriptResult, parse_published_at,
    };
    use tempfile::tempdir;

    fn sample_record(video_id: &str) -> VideoRecord {
        let mut engagement = EngagementMap::new();
        engagement.insert("nice".into(), 3);
        VideoRecord {
            channel_name: "Acme Clips".into(),
            channel_id: "UCacme".into(),
            video_id: video_id.into(),
            published_at_raw: "2023-10-15T08:30:00Z".into(),
            published_at: parse_published_at("2023-10-15T08:30:00Z").unwrap(),
            title: "Launch day".into(),
            url: format!("https://www.youtube.com/watch?v={video_id}"),
            description: "notes".into(),
            views: Stat::Count(120),
            likes: Stat::Count(0),
            dislikes: Stat::NotAvailable,
            favorite_count: Stat::Count(3),
            comment_count: Stat::Count(1),
            tags: vec!["rocket".into()],
            duration_raw: "PT1H2M".into(),
            duration: "01:02:00".into(),
            live: LiveDetails::default(),
            engagement,
            transcript: TranscriptResult::Unavailable,
        }
    }

    #[test]
    fn sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_export_name("acme"), "acme");
        assert_eq!(sanitize_export_name("ac/me\\tv"), "acmetv");
        assert_eq!(sanitize_export_name("tabs\tand\nnewlines"), "tabsandnewlines");
        assert_eq!(sanitize_export_name("a:b*c?d\"e<f>g|h"), "abcdefgh");
    }

    #[test]
    fn export_file_name_is_deterministic() {
        assert_eq!(export_file_name("acme"), "acme_output.csv");
        assert_eq!(export_file_name("ac\tme"), "acme_output.csv");
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let dir = tempdir().unwrap();
        let records = vec![sample_record("vid1"), sample_record("vid2")];
        let path = write_channel_csv(dir.path(), "acme", &records).unwrap();
        assert!(path.ends_with("acme_output.csv"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Channel_Name,Channel_ID,Video_ID"));
        assert!(lines[1].contains("vid1"));
        assert!(lines[1].contains("N/A"));
        assert!(lines[2].contains("vid2"));
    }

    #[test]
    fn download_link_embeds_file_and_name() {
        let dir = tempdir().unwrap();
        let path = write_channel_csv(dir.path(), "acme", &[sample_record("vid1")]).unwrap();
        let link = download_link(&path, "acme").unwrap();
        assert!(link.contains("data:text/csv;base64,"));
        assert!(link.contains("download=\"acme_output.csv\""));
        assert!(link.contains("Download CSV for acme"));
    }

    #[test]
    fn links_page_collects_all_anchors() {
        let dir = tempdir().unwrap();
        let page_path = dir.path().join("links.html");
        write_links_page(
            &page_path,
            &["<a href=\"#\">one</a>".to_string(), "<a href=\"#\">two</a>".to_string()],
        )
        .unwrap();
        let contents = std::fs::read_to_string(&page_path).unwrap();
        assert!(contents.contains("one"));
        assert!(contents.contains("two"));
    }
}
