//! Filename stem sanitizing.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// Characters rejected by at least one of the filesystems a vault may sync to,
// plus `#`, `^`, `[` and `]` which end or break a `[[stem]]` link
static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*#^\[\]]"#).unwrap());

static CONTROL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x00-\x1f\x7f]").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turn an arbitrary title into a safe filename stem of at most `max_length`
/// characters.
///
/// Path separators and `:` become `-`, other forbidden characters and control
/// characters are removed, whitespace is collapsed. Leading dots are dropped so
/// the document is never hidden. A result that is empty or made only of
/// punctuation becomes `fallback`.
pub fn sanitize_filename(title: &str, max_length: usize, fallback: &str) -> String {
    let normalized: String = title.nfc().collect();
    let replaced = normalized.replace(['/', ':', '\\'], "-");
    let stripped = FORBIDDEN.replace_all(&replaced, "");
    let stripped = CONTROL.replace_all(&stripped, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim().trim_start_matches('.').trim_start();

    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_punctuation()) {
        return fallback.to_string();
    }

    let truncated: String = trimmed.chars().take(max_length).collect();
    truncated.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "Untitled";

    #[test]
    fn test_plain_title_unchanged() {
        assert_eq!(sanitize_filename("Capital of France", 100, FALLBACK), "Capital of France");
    }

    #[test]
    fn test_separators_become_dashes() {
        assert_eq!(
            sanitize_filename("Paris: 1789/1799", 100, FALLBACK),
            "Paris- 1789-1799"
        );
    }

    #[test]
    fn test_forbidden_and_control_chars_removed() {
        assert_eq!(
            sanitize_filename("What \"is\" <this>?*|\u{7}", 100, FALLBACK),
            "What is this"
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(sanitize_filename("  a \t\n  b  ", 100, FALLBACK), "a b");
    }

    #[test]
    fn test_empty_and_punctuation_only_fall_back() {
        assert_eq!(sanitize_filename("", 100, FALLBACK), FALLBACK);
        assert_eq!(sanitize_filename("   ", 100, FALLBACK), FALLBACK);
        assert_eq!(sanitize_filename("...", 100, FALLBACK), FALLBACK);
        assert_eq!(sanitize_filename("?/:", 100, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_leading_dots_dropped() {
        assert_eq!(sanitize_filename(".NET basics", 100, FALLBACK), "NET basics");
        assert_eq!(sanitize_filename(" .. hidden", 100, FALLBACK), "hidden");
        assert_eq!(sanitize_filename("Version 2.0", 100, FALLBACK), "Version 2.0");
    }

    #[test]
    fn test_link_syntax_removed() {
        assert_eq!(sanitize_filename("C# generics", 100, FALLBACK), "C generics");
        assert_eq!(sanitize_filename("Array [i] ^2", 100, FALLBACK), "Array i 2");
        assert_eq!(sanitize_filename("C#", 100, FALLBACK), "C");
        assert_eq!(sanitize_filename("#", 100, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        assert_eq!(sanitize_filename("Révolution française", 10, FALLBACK), "Révolution");
        assert_eq!(sanitize_filename("abc def", 4, FALLBACK), "abc");
    }

    #[test]
    fn test_nfc_normalization() {
        let decomposed = "Re\u{301}volution";
        assert_eq!(sanitize_filename(decomposed, 100, FALLBACK), "Révolution");
    }
}
