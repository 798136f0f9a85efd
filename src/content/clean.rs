use once_cell::sync::Lazy;
use regex::Regex;
use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Tags whose text never counts as visible content.
const HIDDEN_TAGS: &[&str] = &["script", "style"];

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SPEECH_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[^\w\s,.!?'"]"#).unwrap());

/// Strips all markup from `raw` and returns the concatenated visible text.
///
/// Feed titles and article bodies arrive with arbitrary embedded HTML;
/// parsing with a real HTML parser (rather than tag-stripping regexes)
/// also decodes entities. Text inside `script`/`style` is dropped.
pub fn clean_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let document = Html::parse_document(raw);
    let mut text = String::new();
    collect_text(document.tree.root(), HIDDEN_TAGS, &mut text);
    text
}

/// Collects visible text below `node`, skipping entire subtrees rooted at
/// any element named in `skip`.
pub(crate) fn collect_text(node: NodeRef<'_, Node>, skip: &[&str], out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text),
        Node::Element(element) if skip.contains(&element.name()) => return,
        _ => {}
    }
    for child in node.children() {
        collect_text(child, skip, out);
    }
}

/// Normalizes text for speech synthesis.
///
/// Collapses line breaks and whitespace runs to single spaces, removes
/// everything outside word characters, whitespace and `,.!?'"`, and trims
/// the ends. Idempotent: a second pass is a no-op.
pub fn clean_text_for_speech(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = LINE_BREAKS.replace_all(text, " ");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");
    let text = SPEECH_UNSAFE.replace_all(&text, "");
    text.trim().to_string()
}

/// Truncates to at most `max_chars` characters, always on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncates to `max_chars` characters, appending `...` when text was cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
