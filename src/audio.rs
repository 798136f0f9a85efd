//! Speech synthesis for article summaries.
//!
//! Thin wrapper over an external TTS service speaking the OpenAI-compatible
//! `/v1/audio/speech` shape. Synthesis is strictly best-effort: every
//! failure is logged and yields `None`, and callers persist the article
//! without audio.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::content::clean_text_for_speech;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Subdirectory of the media root that holds synthesized summaries.
const AUDIO_SUBDIR: &str = "news_audio";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("request timed out after 30s")]
    Timeout,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("audio write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders `text` to speech and stores it as the audio summary for
/// `article_id`.
///
/// Returns the public reference (`{media_url}news_audio/summary_<id>.mp3`)
/// on success, `None` on any failure.
pub async fn synthesize(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
    article_id: i64,
) -> Option<String> {
    let cleaned = clean_text_for_speech(text);
    if cleaned.is_empty() {
        warn!(article_id, "summary empty after speech cleaning, skipping audio");
        return None;
    }

    let bytes = match request_speech(client, config, &cleaned).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(article_id, error = %e, "audio synthesis failed");
            return None;
        }
    };

    match write_audio(config, article_id, &bytes).await {
        Ok(public_ref) => {
            info!(article_id, path = %public_ref, bytes = bytes.len(), "audio summary saved");
            Some(public_ref)
        }
        Err(e) => {
            error!(article_id, error = %e, "audio write failed");
            None
        }
    }
}

/// The env var wins over the config file so deployments can inject the
/// key without touching config on disk.
fn resolve_api_key(config_key: Option<&str>) -> Option<SecretString> {
    std::env::var("NEWSBRIEF_TTS_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .or_else(|| config_key.map(str::to_owned))
        .map(SecretString::from)
}

async fn request_speech(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
) -> Result<Vec<u8>, SpeechError> {
    let endpoint = format!(
        "{}/v1/audio/speech",
        config.tts.base_url.trim_end_matches('/')
    );

    let mut request = client.post(&endpoint).json(&json!({
        "model": "tts-1",
        "input": text,
        "voice": config.tts.voice,
        "response_format": "mp3",
    }));

    if let Some(key) = resolve_api_key(config.tts.api_key.as_deref()) {
        request = request.bearer_auth(key.expose_secret());
    }

    let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| SpeechError::Timeout)?
        .map_err(SpeechError::Network)?;

    if !response.status().is_success() {
        return Err(SpeechError::HttpStatus(response.status().as_u16()));
    }

    let bytes = response.bytes().await.map_err(SpeechError::Network)?;
    Ok(bytes.to_vec())
}

async fn write_audio(
    config: &Config,
    article_id: i64,
    bytes: &[u8],
) -> Result<String, SpeechError> {
    let audio_dir = config.media_dir.join(AUDIO_SUBDIR);
    tokio::fs::create_dir_all(&audio_dir).await?;

    let filename = format!("summary_{}.mp3", article_id);
    tokio::fs::write(audio_dir.join(&filename), bytes).await?;

    Ok(public_audio_ref(&config.media_url, &filename))
}

fn public_audio_ref(media_url: &str, filename: &str) -> String {
    let base = media_url.trim_end_matches('/');
    format!("{}/{}/{}", base, AUDIO_SUBDIR, filename)
}
