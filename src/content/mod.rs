//! Article content acquisition.
//!
//! Two extractors run in sequence: a readability pass over the full page,
//! then (when that yields too little) a CSS selector cascade tuned for
//! common news templates. Their distinct failure sentinels are folded into
//! one tagged [`ExtractedContent`] so callers never compare empty strings
//! against `None`.

pub mod clean;
pub mod readability;
pub mod scrape;

pub use clean::{clean_html, clean_text_for_speech, truncate_chars, truncate_with_ellipsis};

use tracing::{debug, warn};

/// Content below this length is too little to summarize or store.
pub const MIN_CONTENT_LEN: usize = 100;
/// A primary result below this length triggers the fallback scraper.
pub const FALLBACK_TRIGGER_LEN: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Readability,
    SelectorCascade,
}

impl ContentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentSource::Readability => "readability",
            ContentSource::SelectorCascade => "selector_cascade",
        }
    }
}

/// Outcome of the two-stage extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    /// Usable article text and the extractor that produced it.
    Ok { text: String, source: ContentSource },
    /// Something was extracted, but not enough to be worth storing.
    Insufficient,
    /// Neither extractor produced any text.
    Failed,
}

/// Runs the primary extractor, falls back to the selector cascade when the
/// result is short, and keeps whichever text is longer.
///
/// Extraction failures are logged here and degrade; nothing propagates.
pub async fn extract_article(client: &reqwest::Client, url: &str) -> ExtractedContent {
    let primary = match readability::extract(client, url).await {
        Ok(text) => text,
        Err(e) => {
            warn!(%url, error = %e, "readability extraction failed");
            String::new()
        }
    };

    let (text, source) = if primary.len() < FALLBACK_TRIGGER_LEN {
        let fallback = match scrape::extract(client, url).await {
            Ok(found) => found,
            Err(e) => {
                warn!(%url, error = %e, "fallback extraction failed");
                None
            }
        };
        prefer_longer(primary, fallback)
    } else {
        (primary, ContentSource::Readability)
    };

    let outcome = classify(text, source);
    if let ExtractedContent::Ok { text, source } = &outcome {
        debug!(%url, bytes = text.len(), source = source.as_str(), "extracted article content");
    }
    outcome
}

/// The fallback result replaces the primary text only when strictly longer;
/// a missing primary counts as zero-length.
fn prefer_longer(primary: String, fallback: Option<String>) -> (String, ContentSource) {
    match fallback {
        Some(scraped) if scraped.len() > primary.len() => {
            (scraped, ContentSource::SelectorCascade)
        }
        _ => (primary, ContentSource::Readability),
    }
}

fn classify(text: String, source: ContentSource) -> ExtractedContent {
    if text.is_empty() {
        ExtractedContent::Failed
    } else if text.len() < MIN_CONTENT_LEN {
        ExtractedContent::Insufficient
    } else {
        ExtractedContent::Ok { text, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefer_longer_keeps_primary_on_tie() {
        let (text, source) = prefer_longer("aaaa".into(), Some("bbbb".into()));
        assert_eq!(text, "aaaa");
        assert_eq!(source, ContentSource::Readability);
    }

    #[test]
    fn test_prefer_longer_takes_strictly_longer_fallback() {
        let (text, source) = prefer_longer("aaaa".into(), Some("bbbbb".into()));
        assert_eq!(text, "bbbbb");
        assert_eq!(source, ContentSource::SelectorCascade);
    }

    #[test]
    fn test_prefer_longer_with_empty_primary() {
        let (text, source) = prefer_longer(String::new(), Some("scraped".into()));
        assert_eq!(text, "scraped");
        assert_eq!(source, ContentSource::SelectorCascade);
    }

    #[test]
    fn test_prefer_longer_without_fallback() {
        let (text, source) = prefer_longer("primary".into(), None);
        assert_eq!(text, "primary");
        assert_eq!(source, ContentSource::Readability);
    }

    #[test]
    fn test_classify_empty_is_failed() {
        assert_eq!(
            classify(String::new(), ContentSource::Readability),
            ExtractedContent::Failed
        );
    }

    #[test]
    fn test_classify_short_is_insufficient() {
        assert_eq!(
            classify("x".repeat(MIN_CONTENT_LEN - 1), ContentSource::Readability),
            ExtractedContent::Insufficient
        );
    }

    #[test]
    fn test_classify_at_threshold_is_ok() {
        let text = "x".repeat(MIN_CONTENT_LEN);
        assert_eq!(
            classify(text.clone(), ContentSource::SelectorCascade),
            ExtractedContent::Ok {
                text,
                source: ContentSource::SelectorCascade
            }
        );
    }
}
