//! RSS/Atom feed parsing into transient feed entries.

use anyhow::Result;
use feed_rs::parser;
use url::Url;

/// One item parsed out of a feed. The link doubles as the article's
/// unique key downstream; entries without one are dropped at parse time.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub link: String,
    pub title: String,
    pub author: Option<String>,
    /// Publication time as epoch seconds (UTC), when the feed carried one.
    pub published: Option<i64>,
}

/// Parse outcome: usable entries plus a count of items dropped for having
/// no link or an unparseable one.
#[derive(Debug)]
pub struct ParsedFeed {
    pub entries: Vec<FeedEntry>,
    pub skipped: usize,
}

pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)?;

    let mut entries = Vec::with_capacity(feed.entries.len());
    let mut skipped = 0;

    for entry in feed.entries {
        let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
            skipped += 1;
            continue;
        };
        if Url::parse(&link).is_err() {
            skipped += 1;
            continue;
        }

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());
        let author = entry
            .authors
            .first()
            .map(|person| person.name.trim().to_string())
            .filter(|name| !name.is_empty());
        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.timestamp());

        entries.push(FeedEntry {
            link,
            title,
            author,
            published,
        });
    }

    Ok(ParsedFeed { entries, skipped })
}
