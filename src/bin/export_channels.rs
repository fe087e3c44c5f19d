#![forbid(unsafe_code)]

//! Command-line entry point: reads a channel list, scrapes every channel
//! through the YouTube Data API, and writes one CSV artifact per channel.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use ytexport_tools::config::{self, RuntimeConfig};
use ytexport_tools::input;
use ytexport_tools::pipeline::{self, ConsoleProgress, PipelineOptions};
use ytexport_tools::transcript::TimedTextClient;
use ytexport_tools::youtube::{PublishWindow, YoutubeClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Export per-video channel data to CSV.")]
struct Cli {
    /// Input file with a "Channel Username" column (CSV, or TSV by extension).
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    #[arg(
        long = "max-results",
        value_name = "N",
        default_value_t = 50,
        value_parser = clap::value_parser!(u32).range(1..=1000),
        help = "Maximum video IDs to request per channel"
    )]
    max_results: u32,
    #[arg(
        long = "config",
        value_name = "PATH",
        help = "Path to the config file (default ytexport.env)"
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "output-dir",
        value_name = "PATH",
        help = "Override the export directory from the config file"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long = "links",
        value_name = "PATH",
        help = "Also write an HTML page with a download link per channel"
    )]
    links: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match &cli.config {
        Some(path) => config::load_runtime_config_from(path)?,
        None => config::load_runtime_config()?,
    };
    let runtime = apply_overrides(runtime, &cli);

    let channel_names = input::read_channel_names(&cli.input)
        .with_context(|| format!("Loading channel list from {}", cli.input.display()))?;
    info!("Loaded {} channel(s) from {}", channel_names.len(), cli.input.display());

    let platform = YoutubeClient::new(runtime.api_key.clone());
    let transcripts = TimedTextClient::new();
    let mut progress = ConsoleProgress;

    let options = PipelineOptions {
        max_results: cli.max_results,
        window: PublishWindow {
            published_after: runtime.published_after.clone(),
            published_before: runtime.published_before.clone(),
        },
        output_dir: runtime.output_dir.clone(),
        aggregate: ytexport_tools::aggregate::AggregateOptions {
            comment_page_size: runtime.comment_page_size,
            primary_lang: runtime.primary_lang.clone(),
            fallback_lang: runtime.fallback_lang.clone(),
        },
    };

    let artifacts = pipeline::run_channels(
        &platform,
        &transcripts,
        &mut progress,
        &channel_names,
        &options,
    )?;

    for artifact in &artifacts {
        println!(
            "{}: {} row(s) -> {}",
            artifact.channel_name,
            artifact.row_count,
            artifact.path.display()
        );
    }

    if let Some(links_path) = &cli.links {
        let links: Vec<String> = artifacts
            .iter()
            .map(|artifact| artifact.download_link.clone())
            .collect();
        ytexport_tools::export::write_links_page(links_path, &links)?;
        info!("Wrote download links to {}", links_path.display());
    }

    Ok(())
}

fn apply_overrides(mut runtime: RuntimeConfig, cli: &Cli) -> RuntimeConfig {
    if let Some(dir) = &cli.output_dir {
        runtime.output_dir = dir.clone();
    }
    runtime
}
