//! Feed ingestion orchestrator.
//!
//! Drives the full pipeline per feed entry: dedupe, extract, summarize,
//! persist, synthesize audio, attach the reference. Everything is strictly
//! sequential (feeds in configured order, entries in feed order) so source
//! sites are never hit in parallel, and a fixed pause follows each entry
//! that made outbound article requests.

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::content::{self, clean_html, truncate_chars, ExtractedContent};
use crate::feed::{self, FeedEntry, ParsedFeed};
use crate::storage::{Article, Category, Database, NewArticle};
use crate::{audio, summarize};

/// The fixed category taxonomy, ensured idempotently at the start of every
/// run (the feed table usually covers five of the six).
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Technology",
    "World",
    "Business",
    "Science",
    "Health",
    "Sports",
];

const FEED_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
/// Stored titles are capped at this many characters.
const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("feed parse error: {0}")]
    Parse(String),
    #[error("response too large")]
    ResponseTooLarge,
    #[error("database error: {0}")]
    Database(String),
}

/// Builds the shared HTTP client carrying the browser-like headers that
/// article hosts expect.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    reqwest::Client::builder().default_headers(headers).build()
}

/// Runs one ingestion pass over every configured feed and returns the
/// articles created.
///
/// Failures never cross entry boundaries: a failed feed fetch skips the
/// feed, a failed entry skips the entry, and the run always completes.
pub async fn ingest_feeds(
    db: &Database,
    client: &reqwest::Client,
    config: &Config,
) -> Vec<Article> {
    if let Err(e) = ensure_categories(db).await {
        error!(error = %e, "failed to ensure category taxonomy, aborting run");
        return Vec::new();
    }

    let mut created = Vec::new();

    for source in &config.feeds {
        let category = match db.get_or_create_category(&source.category).await {
            Ok(category) => category,
            Err(e) => {
                error!(category = %source.category, error = %e, "category unavailable, skipping feed");
                continue;
            }
        };

        let parsed = match fetch_feed(client, &source.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(feed = %source.url, error = %e, "feed fetch failed");
                continue;
            }
        };
        if parsed.skipped > 0 {
            warn!(feed = %source.url, skipped = parsed.skipped, "feed entries without links skipped");
        }

        for entry in parsed.entries.into_iter().take(config.entries_per_feed) {
            match db.article_exists(&entry.link).await {
                // Duplicates made no outbound request, so they skip the pause too.
                Ok(true) => {
                    debug!(url = %entry.link, "already stored, skipping");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(url = %entry.link, error = %e, "existence check failed, skipping entry");
                    continue;
                }
            }

            match ingest_entry(db, client, config, &source.category, &category, entry).await {
                Ok(Some(article)) => {
                    info!(url = %article.url, category = %source.category, "article created");
                    created.push(article);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(feed = %source.url, error = %e, "entry processing failed");
                }
            }

            // Rate-limit outbound requests to the source site.
            tokio::time::sleep(Duration::from_secs(config.entry_pause_secs)).await;
        }
    }

    info!(count = created.len(), "ingestion run complete");
    created
}

/// Processes one feed entry through extraction, summarization, persistence
/// and audio synthesis. `Ok(None)` is a policy skip (too little content).
async fn ingest_entry(
    db: &Database,
    client: &reqwest::Client,
    config: &Config,
    category_name: &str,
    category: &Category,
    entry: FeedEntry,
) -> Result<Option<Article>, IngestError> {
    let published = entry
        .published
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    let (text, source) = match content::extract_article(client, &entry.link).await {
        ExtractedContent::Ok { text, source } => (text, source),
        ExtractedContent::Insufficient | ExtractedContent::Failed => {
            info!(url = %entry.link, "skipping entry, too little content");
            return Ok(None);
        }
    };

    let summary = summarize::summarize(&text, config.summary_sentences);

    let title = clean_html(&entry.title);
    let new_article = NewArticle {
        url: entry.link,
        title: truncate_chars(title.trim(), MAX_TITLE_CHARS).to_string(),
        author: entry.author.unwrap_or_else(|| "Unknown".to_string()),
        content: text,
        source: category_name.to_string(),
        published,
        summary: summary.clone(),
    };

    let mut article = db
        .create_article(&new_article)
        .await
        .map_err(|e| IngestError::Database(e.to_string()))?;
    db.link_category(article.id, category.id)
        .await
        .map_err(|e| IngestError::Database(e.to_string()))?;

    debug!(url = %article.url, extractor = source.as_str(), "article stored");

    // Audio is attached as a secondary update; any failure leaves the
    // article persisted without audio.
    if let Some(audio_ref) = audio::synthesize(client, config, &summary, article.id).await {
        match db.attach_audio(article.id, &audio_ref).await {
            Ok(()) => article.audio_path = Some(audio_ref),
            Err(e) => {
                warn!(article_id = article.id, error = %e, "failed to attach audio reference")
            }
        }
    }

    Ok(Some(article))
}

async fn ensure_categories(db: &Database) -> anyhow::Result<()> {
    for name in DEFAULT_CATEGORIES {
        db.get_or_create_category(name).await?;
    }
    Ok(())
}

async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<ParsedFeed, IngestError> {
    let response = tokio::time::timeout(FEED_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| IngestError::Timeout)?
        .map_err(IngestError::Network)?;

    if !response.status().is_success() {
        return Err(IngestError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    feed::parse_feed(&bytes).map_err(|e| IngestError::Parse(e.to_string()))
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, IngestError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(IngestError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(IngestError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(IngestError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Test</title><link>https://example.com/a</link></item>
</channel></rss>"#;

    #[test]
    fn test_build_client() {
        assert!(build_client().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let parsed = fetch_feed(&client, &format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_feed_404() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(IngestError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_fetch_feed_malformed_xml() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }

    #[tokio::test]
    async fn test_ensure_categories_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        ensure_categories(&db).await.unwrap();
        ensure_categories(&db).await.unwrap();

        for name in DEFAULT_CATEGORIES {
            let category = db.get_or_create_category(name).await.unwrap();
            assert_eq!(&category.name, name);
        }
    }
}
