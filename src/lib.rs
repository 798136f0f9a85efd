//! RSS news ingestion with extractive summaries and spoken audio.
//!
//! The pipeline runs per feed entry: parse the feed, skip already-stored
//! URLs, extract the article body (readability first, CSS selector cascade
//! as fallback), score and select summary sentences, persist the article,
//! then render the summary to speech through an external TTS service.
//!
//! Extraction is best-effort by design: arbitrary news HTML defeats any
//! single strategy, so failures degrade (primary, then fallback, then skip)
//! instead of propagating. A failed entry is simply retried on the next
//! scheduled run; the URL uniqueness check makes repeated runs idempotent.

pub mod audio;
pub mod config;
pub mod content;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod summarize;
