//! Plain-text title extraction from note HTML.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

// Every tag is a segment boundary, like a text-node walk with a newline separator
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Split HTML into its trimmed, non-empty text lines (entities still encoded).
fn text_lines(html: &str) -> Vec<String> {
    let text = SCRIPT.replace_all(html, "\n");
    let text = STYLE.replace_all(&text, "\n");
    let text = COMMENT.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "\n");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract a short title from note HTML.
///
/// Returns the first non-empty line of text, entity-decoded, truncated to
/// `max_length` characters with a trailing `...`. Falls back to `fallback`
/// when there is no text at all.
pub fn extract_title(html: &str, max_length: usize, fallback: &str) -> String {
    if html.trim().is_empty() {
        return fallback.to_string();
    }

    let first = text_lines(html).into_iter().find_map(|line| {
        let decoded = html_escape::decode_html_entities(&line).replace('\u{a0}', " ");
        let decoded = decoded.trim().to_string();
        (!decoded.is_empty()).then_some(decoded)
    });

    match first {
        Some(line) if line.chars().count() > max_length => {
            let mut truncated: String = line.chars().take(max_length).collect();
            truncated.push_str("...");
            truncated
        }
        Some(line) => line,
        None => fallback.to_string(),
    }
}
