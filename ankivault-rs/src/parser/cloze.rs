//! Cloze occlusion markup (`{{c1::answer::hint}}`).

use regex::Regex;
use std::sync::LazyLock;

// (?s) so answers spanning several lines are unwrapped too
static CLOZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{c\d+::(.*?)(?:::.*?)?\}\}").unwrap());

/// Replace every occlusion with its answer, dropping the hint.
///
/// Non-breaking spaces are turned into plain spaces as well.
pub fn strip_cloze(text: &str) -> String {
    let text = text.replace('\u{a0}', " ");
    CLOZE.replace_all(&text, "$1").into_owned()
}
