//! Heuristic extractive summarizer.
//!
//! Sentences are scored on newsworthiness signals (reporting verbs,
//! length, position, numerals, quotations) and the top scorers are
//! re-joined in original order. No language model involved; the split on
//! `.!?` is deliberately naive about abbreviations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::content::clean::{clean_html, truncate_with_ellipsis};

/// Default number of sentences in a summary.
pub const DEFAULT_SENTENCE_LIMIT: usize = 3;

/// Words that mark a sentence as carrying the story, each worth +2 when
/// present (counted once per keyword, not per occurrence).
pub const IMPORTANT_KEYWORDS: &[&str] = &[
    "announced",
    "revealed",
    "confirmed",
    "reported",
    "said",
    "according",
    "new",
    "first",
    "major",
    "significant",
    "important",
    "breaking",
    "today",
    "yesterday",
    "will",
    "plans",
    "expected",
    "launched",
];

/// Fragments at or under this length are discarded before scoring.
const MIN_SENTENCE_LEN: usize = 25;
/// Truncation length for the no-usable-sentences fallback.
const FALLBACK_TRUNCATE_CHARS: usize = 300;

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Produces an extractive summary of at most `sentence_limit` sentences.
///
/// Input markup is stripped first. When nothing sentence-like survives
/// the split, the cleaned text truncated to 300 characters is returned
/// instead. Output always carries a trailing period when non-empty.
pub fn summarize(text: &str, sentence_limit: usize) -> String {
    let cleaned = clean_html(text);

    let sentences: Vec<&str> = SENTENCE_BOUNDARY
        .split(&cleaned)
        .map(str::trim)
        .filter(|s| s.len() > MIN_SENTENCE_LEN)
        .collect();

    if sentences.is_empty() {
        return truncate_with_ellipsis(cleaned.trim(), FALLBACK_TRUNCATE_CHARS);
    }

    if sentences.len() <= sentence_limit {
        return ensure_period(sentences.join(". "));
    }

    let mut scored: Vec<(usize, i32, &str)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| (index, score_sentence(index, sentence), *sentence))
        .collect();

    // Stable sort: among equal scores the earlier sentence wins.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    let mut selected: Vec<(usize, i32, &str)> = scored.into_iter().take(sentence_limit).collect();
    selected.sort_by_key(|&(index, _, _)| index);

    let summary = selected
        .iter()
        .map(|&(_, _, sentence)| sentence)
        .collect::<Vec<_>>()
        .join(". ");
    ensure_period(summary)
}

fn score_sentence(index: usize, sentence: &str) -> i32 {
    let lower = sentence.to_lowercase();
    let mut score = 0;

    for keyword in IMPORTANT_KEYWORDS {
        if lower.contains(keyword) {
            score += 2;
        }
    }

    let len = sentence.len();
    if (60..=150).contains(&len) {
        score += 3;
    } else if (30..=200).contains(&len) {
        score += 1;
    }

    score += match index {
        0 => 4,
        1..=2 => 3,
        3..=5 => 1,
        _ => 0,
    };

    if sentence.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }

    if sentence.contains('"') || sentence.contains('\'') {
        score += 2;
    }

    score
}

fn ensure_period(mut summary: String) -> String {
    if !summary.is_empty() && !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}
