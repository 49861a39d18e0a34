//! Hidden identity marker (`<!-- anki_id: 123 -->`) embedded in note documents.

use crate::types::NoteId;
use regex::Regex;
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*anki_id:\s*(\d+)\s*-->").unwrap());

/// Render the marker line for `id`.
pub fn format_marker(id: NoteId) -> String {
    format!("<!-- anki_id: {} -->", id)
}

/// Find the first identity marker in `content`.
pub fn parse_marker(content: &str) -> Option<NoteId> {
    MARKER
        .captures(content)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_exact() {
        assert_eq!(format_marker(1502298033753), "<!-- anki_id: 1502298033753 -->");
    }

    #[test]
    fn test_parse_roundtrip_and_loose_spacing() {
        assert_eq!(parse_marker(&format_marker(42)), Some(42));
        assert_eq!(parse_marker("text\n<!--anki_id:7-->\nmore"), Some(7));
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(parse_marker("# Tag\n\n- [[Note]]"), None);
        assert_eq!(parse_marker("<!-- anki_id: abc -->"), None);
    }
}
