//! Configuration file parser for ~/.config/newsbrief/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde, though we log a warning when
//! the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One feed source: a category name mapped to an RSS/Atom URL.
///
/// Sources are an ordered list (`[[feeds]]` in TOML) rather than a map;
/// ingestion visits them strictly in configured order.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSource {
    pub category: String,
    pub url: String,
}

/// Text-to-speech service settings.
///
/// The endpoint speaks the OpenAI-compatible `/v1/audio/speech` shape, so
/// any self-hosted server exposing it works; `base_url` is also what the
/// tests point at a mock server.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub voice: String,
    /// Bearer token for the TTS service (NEWSBRIEF_TTS_API_KEY env var
    /// takes precedence over the config file).
    pub api_key: Option<String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8880".to_string(),
            voice: "alloy".to_string(),
            api_key: None,
        }
    }
}

/// Mask the TTS key in Debug output to prevent secret leakage in logs.
impl std::fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsConfig")
            .field("base_url", &self.base_url)
            .field("voice", &self.voice)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered feed sources; defaults to the five reference BBC feeds.
    pub feeds: Vec<FeedSource>,

    /// Directory audio files are written under (in a news_audio subfolder).
    pub media_dir: PathBuf,

    /// Public URL prefix audio references are built from.
    pub media_url: String,

    /// How many entries to take from the head of each feed.
    pub entries_per_feed: usize,

    /// Sentence limit for generated summaries.
    pub summary_sentences: usize,

    /// Pause after each entry that made outbound article requests.
    pub entry_pause_secs: u64,

    /// Minutes between ingestion runs. 0 = run once and exit.
    pub interval_minutes: u64,

    /// Text-to-speech service settings.
    pub tts: TtsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            media_dir: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            entries_per_feed: 5,
            summary_sentences: crate::summarize::DEFAULT_SENTENCE_LIMIT,
            entry_pause_secs: 1,
            interval_minutes: 0,
            tts: TtsConfig::default(),
        }
    }
}

fn default_feeds() -> Vec<FeedSource> {
    [
        ("Technology", "https://feeds.bbci.co.uk/news/technology/rss.xml"),
        ("World", "https://feeds.bbci.co.uk/news/world/rss.xml"),
        ("Business", "https://feeds.bbci.co.uk/news/business/rss.xml"),
        (
            "Science",
            "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml",
        ),
        ("Health", "https://feeds.bbci.co.uk/news/health/rss.xml"),
    ]
    .into_iter()
    .map(|(category, url)| FeedSource {
        category: category.to_string(),
        url: url.to_string(),
    })
    .collect()
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to bound memory use on a
        // corrupted or malicious file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to flag probable typos.
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "feeds",
                "media_dir",
                "media_url",
                "entries_per_feed",
                "summary_sentences",
                "entry_pause_secs",
                "interval_minutes",
                "tts",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
