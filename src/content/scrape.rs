use futures::StreamExt;
use once_cell::sync::Lazy;
use reqwest::header;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;

use super::clean::collect_text;

/// Ordered content-selector cascade, most specific first.
///
/// Site templates vary wildly; known-good article-body selectors are tried
/// before the generic last-resort paragraph scrape so that menus, bylines
/// and related-article teasers stay out of the extracted text.
pub const CONTENT_SELECTORS: &[&str] = &[
    r#"[data-component="text-block"]"#,
    ".ssrcss-1q0x1qg-Paragraph",
    ".story-body__inner p",
    ".zn-body__paragraph",
    ".el__leafmedia--sourced-paragraph",
    ".StandardArticleBody_body p",
    "article p",
    ".article-content p",
    ".entry-content p",
    ".post-content p",
    "p",
];

static COMPILED_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|pattern| Selector::parse(pattern).expect("cascade patterns are valid CSS"))
        .collect()
});

/// Subtrees that never contain article prose.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe",
];

/// A selector must hit at least this many surviving elements to be chosen.
const MIN_MATCHES: usize = 3;
/// Matched blocks at or under this length are discarded as boilerplate.
const MIN_BLOCK_LEN: usize = 40;
/// Only the first blocks in document order are kept.
const MAX_BLOCKS: usize = 12;
/// Joined text at or under this length counts as a failed scrape.
const MIN_TOTAL_LEN: usize = 200;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request timed out after 10s")]
    Timeout,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("invalid UTF-8 in response")]
    InvalidUtf8,
}

/// Fetches `url` and scrapes article text through the selector cascade.
///
/// Returns `Ok(None)` when the page yields too little content, a distinct
/// outcome from the transport errors, which the orchestrator logs and
/// treats the same way.
pub async fn extract(client: &reqwest::Client, url: &str) -> Result<Option<String>, ScrapeError> {
    let request = client
        .get(url)
        .header(header::USER_AGENT, "Mozilla/5.0")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");

    let response = tokio::time::timeout(FETCH_TIMEOUT, request.send())
        .await
        .map_err(|_| ScrapeError::Timeout)?
        .map_err(ScrapeError::Network)?;

    if !response.status().is_success() {
        return Err(ScrapeError::HttpStatus(response.status().as_u16()));
    }

    let body = read_limited_text(response, MAX_BODY_SIZE).await?;
    Ok(extract_from_html(&body))
}

/// Scrapes article text out of already-fetched HTML.
pub fn extract_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let blocks = content_blocks(&document, &COMPILED_SELECTORS)?;
    let joined = blocks.join("\n\n");
    if joined.len() > MIN_TOTAL_LEN {
        Some(joined)
    } else {
        None
    }
}

/// Walks the cascade and returns the first usable set of content blocks.
///
/// A selector is chosen when it matches at least [`MIN_MATCHES`] surviving
/// elements *and* at least one of them carries a block longer than
/// [`MIN_BLOCK_LEN`]; otherwise the cascade keeps descending toward the
/// generic selectors.
fn content_blocks(document: &Html, cascade: &[Selector]) -> Option<Vec<String>> {
    for selector in cascade {
        let matched: Vec<ElementRef> = document
            .select(selector)
            .filter(|el| !in_stripped_subtree(el))
            .collect();

        if matched.len() < MIN_MATCHES {
            continue;
        }

        let blocks: Vec<String> = matched
            .iter()
            .map(block_text)
            .filter(|text| text.len() > MIN_BLOCK_LEN)
            .take(MAX_BLOCKS)
            .collect();

        if !blocks.is_empty() {
            return Some(blocks);
        }
    }
    None
}

fn in_stripped_subtree(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| STRIPPED_TAGS.contains(&ancestor.value().name()))
}

/// Visible text of one matched element, whitespace-normalized.
fn block_text(element: &ElementRef) -> String {
    let mut raw = String::new();
    collect_text(**element, STRIPPED_TAGS, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, ScrapeError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ScrapeError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ScrapeError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ScrapeError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ScrapeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paragraph(n: usize, len: usize) -> String {
        let filler = "word ".repeat(len / 5 + 1);
        format!("<p>Paragraph {} content {}</p>", n, &filler[..len.min(filler.len())])
    }

    fn page_with_paragraphs(count: usize, len: usize) -> String {
        let body: String = (0..count).map(|n| paragraph(n, len)).collect();
        format!("<html><body><div>{}</div></body></html>", body)
    }

    #[test]
    fn test_all_cascade_patterns_compile() {
        assert_eq!(COMPILED_SELECTORS.len(), CONTENT_SELECTORS.len());
    }

    #[test]
    fn test_fewer_than_three_matches_yields_none() {
        let html = page_with_paragraphs(2, 120);
        assert_eq!(extract_from_html(&html), None);
    }

    #[test]
    fn test_short_total_yields_none() {
        // Three blocks over the block threshold but jointly under 200 bytes.
        let html = page_with_paragraphs(3, 45);
        assert_eq!(extract_from_html(&html), None);
    }

    #[test]
    fn test_enough_paragraphs_extracted() {
        let html = page_with_paragraphs(5, 120);
        let text = extract_from_html(&html).expect("should extract");
        assert!(text.contains("Paragraph 0"));
        assert!(text.contains("Paragraph 4"));
        assert!(text.len() > 200);
    }

    #[test]
    fn test_specific_selector_beats_generic() {
        let story: String = (0..3)
            .map(|n| {
                format!(
                    "<p>Story body paragraph {} with plenty of real article text inside it for this page.</p>",
                    n
                )
            })
            .collect();
        let junk: String = (0..4)
            .map(|n| {
                format!(
                    "<p>Unrelated sidebar teaser number {} that should never be selected.</p>",
                    n
                )
            })
            .collect();
        let html = format!(
            "<html><body><div class=\"story-body__inner\">{}</div><div class=\"sidebar\">{}</div></body></html>",
            story, junk
        );

        let text = extract_from_html(&html).expect("should extract");
        assert!(text.contains("Story body paragraph 0"));
        assert!(!text.contains("sidebar teaser"));
    }

    #[test]
    fn test_stripped_subtrees_do_not_count() {
        // All long paragraphs live inside <nav>; the two outside are not
        // enough to satisfy the match minimum.
        let nav: String = (0..5)
            .map(|n| format!("<p>Navigation entry {} with enough text to pass length.</p>", n))
            .collect();
        let html = format!(
            "<html><body><nav>{}</nav>{}{}</body></html>",
            nav,
            paragraph(0, 120),
            paragraph(1, 120),
        );
        assert_eq!(extract_from_html(&html), None);
    }

    #[test]
    fn test_block_cap_at_twelve() {
        let html = page_with_paragraphs(20, 120);
        let text = extract_from_html(&html).expect("should extract");
        assert_eq!(text.split("\n\n").count(), 12);
        assert!(!text.contains("Paragraph 12"));
    }

    #[test]
    fn test_short_blocks_are_skipped() {
        let mut body = String::new();
        body.push_str("<p>tiny</p>");
        for n in 0..4 {
            body.push_str(&paragraph(n, 120));
        }
        let html = format!("<html><body>{}</body></html>", body);
        let text = extract_from_html(&html).expect("should extract");
        assert!(!text.contains("tiny"));
    }

    #[test]
    fn test_cascade_descends_past_unusable_matches() {
        // The data-component selector matches three elements, but all of
        // them are under the block threshold; the generic paragraph
        // selector further down must win instead.
        let tiny: String = (0..3)
            .map(|_| "<div data-component=\"text-block\">x</div>".to_string())
            .collect();
        let html = format!(
            "<html><body>{}{}</body></html>",
            tiny,
            page_with_paragraphs(4, 120)
        );
        let text = extract_from_html(&html).expect("should extract");
        assert!(text.contains("Paragraph 0"));
    }

    #[test]
    fn test_markup_inside_blocks_is_flattened() {
        let html = r#"<html><body>
            <p>First paragraph has <b>bold</b> and <a href="/x">linked</a> words in sufficient quantity here.</p>
            <p>Second paragraph also carries enough text to clear the block length threshold set above.</p>
            <p>Third paragraph rounds out the minimum match count with yet more plain article prose.</p>
        </body></html>"#;
        let text = extract_from_html(html).expect("should extract");
        assert!(text.contains("bold and linked words"));
        assert!(!text.contains("<b>"));
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_with_paragraphs(5, 120)))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = extract(&client, &format!("{}/article", mock_server.uri()))
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_http_error_status_propagates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = extract(&client, &format!("{}/article", mock_server.uri())).await;
        assert!(matches!(result, Err(ScrapeError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_thin_page_yields_none_not_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body><p>hi</p></body></html>"),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = extract(&client, &format!("{}/article", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(result, None);
    }
}
