use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_PATH: &str = "ytexport.env";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_PRIMARY_LANG: &str = "pt";
pub const DEFAULT_FALLBACK_LANG: &str = "en";
pub const DEFAULT_PUBLISHED_AFTER: &str = "2023-10-01T00:00:00Z";
pub const DEFAULT_PUBLISHED_BEFORE: &str = "2023-11-01T00:00:00Z";
pub const DEFAULT_COMMENT_PAGE_SIZE: u32 = 100;

/// Raw values read from the env file. Everything stays optional so the
/// reader does not have to decide which keys are mandatory.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub primary_lang: Option<String>,
    pub fallback_lang: Option<String>,
    pub published_after: Option<String>,
    pub published_before: Option<String>,
    pub comment_page_size: Option<u32>,
}

/// Fully resolved runtime settings. Constructed once at startup; a missing
/// API key is fatal before any network call is attempted.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub output_dir: PathBuf,
    pub primary_lang: String,
    pub fallback_lang: String,
    pub published_after: String,
    pub published_before: String,
    pub comment_page_size: u32,
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value_raw)) = trimmed.split_once('=') {
            let value = value_raw.trim().trim_matches('"');
            match key {
                "API_KEY" => {
                    if !value.is_empty() {
                        cfg.api_key = Some(value.to_string());
                    }
                }
                "OUTPUT_DIR" => cfg.output_dir = Some(PathBuf::from(value)),
                "PRIMARY_LANG" => {
                    if !value.is_empty() {
                        cfg.primary_lang = Some(value.to_string());
                    }
                }
                "FALLBACK_LANG" => {
                    if !value.is_empty() {
                        cfg.fallback_lang = Some(value.to_string());
                    }
                }
                "PUBLISHED_AFTER" => {
                    if !value.is_empty() {
                        cfg.published_after = Some(value.to_string());
                    }
                }
                "PUBLISHED_BEFORE" => {
                    if !value.is_empty() {
                        cfg.published_before = Some(value.to_string());
                    }
                }
                "COMMENT_PAGE_SIZE" => {
                    let size: u32 = value.parse().with_context(|| {
                        format!("Parsing COMMENT_PAGE_SIZE from {}", path.display())
                    })?;
                    cfg.comment_page_size = Some(size);
                }
                _ => {}
            }
        }
    }
    Ok(Some(cfg))
}

pub fn load_runtime_config() -> Result<RuntimeConfig> {
    load_runtime_config_from(Path::new(DEFAULT_CONFIG_PATH))
}

pub fn load_runtime_config_from(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let cfg = read_env_config(path)?
        .ok_or_else(|| anyhow!("Missing config file at {}", path.display()))?;
    let api_key = cfg
        .api_key
        .ok_or_else(|| anyhow!("API_KEY not set in {}", path.display()))?;
    let output_dir = cfg
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let primary_lang = cfg
        .primary_lang
        .unwrap_or_else(|| DEFAULT_PRIMARY_LANG.to_string());
    let fallback_lang = cfg
        .fallback_lang
        .unwrap_or_else(|| DEFAULT_FALLBACK_LANG.to_string());
    let published_after = cfg
        .published_after
        .unwrap_or_else(|| DEFAULT_PUBLISHED_AFTER.to_string());
    let published_before = cfg
        .published_before
        .unwrap_or_else(|| DEFAULT_PUBLISHED_BEFORE.to_string());
    let comment_page_size = cfg.comment_page_size.unwrap_or(DEFAULT_COMMENT_PAGE_SIZE);
    Ok(RuntimeConfig {
        api_key,
        output_dir,
        primary_lang,
        fallback_lang,
        published_after,
        published_before,
        comment_page_size,
    })
}
