use dom_smoothie::Readability;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadabilityError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("readability parse failed: {0}")]
    Parse(String),
}

/// Downloads `url` and extracts the main article text with readability
/// heuristics. Single attempt, no timeout beyond the client's own; the
/// caller decides whether to fall back on error.
pub async fn extract(client: &reqwest::Client, url: &str) -> Result<String, ReadabilityError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ReadabilityError::HttpStatus(response.status().as_u16()));
    }
    let html = response.text().await?;
    parse(&html, url)
}

/// Runs readability over already-fetched HTML.
///
/// The document URL is passed through so relative links resolve during
/// boilerplate scoring.
pub fn parse(html: &str, url: &str) -> Result<String, ReadabilityError> {
    let mut readability =
        Readability::new(html, Some(url), None).map_err(|e| ReadabilityError::Parse(e.to_string()))?;
    let article = readability
        .parse()
        .map_err(|e| ReadabilityError::Parse(e.to_string()))?;
    Ok(article.text_content.trim().to_string())
}
