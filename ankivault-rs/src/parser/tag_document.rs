//! Structured view of a tag document.
//!
//! A tag document is plain Markdown that users may edit by hand. It is parsed
//! line by line into a preamble (title header and any free text), a list of
//! recognized sections ("related notes" and "related tags"), and a trailing
//! hashtag line which is dropped on parse and re-added on render. Lines that
//! are not recognized are kept verbatim, so a parse/render cycle leaves
//! hand-written content untouched.
//!
//! Recognized line shapes:
//!
//! ```text
//! # Histoire          <- title header (new documents only)
//! Related notes:      <- section header, configurable label
//! - [[Note stem]]     <- note link
//! Related tags:
//! [[Child tag]]       <- tag link (no leading dash)
//!
//! #histoire           <- trailing hashtag, tag name lowercased
//! ```

use crate::config::Labels;
use regex::Regex;
use std::sync::LazyLock;

static NOTE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^- \[\[([^\]]+)\]\]$").unwrap());

static TAG_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\[([^\]]+)\]\]$").unwrap());

/// Meaning of a single document line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `- [[stem]]`, a link to an exported note.
    NoteLink(String),
    /// `[[stem]]`, a link to a child tag document.
    TagLink(String),
    /// Anything else, kept verbatim.
    Text,
}

/// A line with its original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    pub text: String,
    pub kind: LineKind,
}

impl DocLine {
    fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let kind = if let Some(cap) = NOTE_LINK.captures(trimmed) {
            LineKind::NoteLink(link_target(&cap[1]))
        } else if let Some(cap) = TAG_LINK.captures(trimmed) {
            LineKind::TagLink(link_target(&cap[1]))
        } else {
            LineKind::Text
        };
        Self {
            text: text.to_string(),
            kind,
        }
    }

    fn note_link(stem: &str) -> Self {
        Self {
            text: format!("- [[{}]]", stem),
            kind: LineKind::NoteLink(stem.to_string()),
        }
    }

    fn tag_link(stem: &str) -> Self {
        Self {
            text: format!("[[{}]]", stem),
            kind: LineKind::TagLink(stem.to_string()),
        }
    }

    fn is_link(&self) -> bool {
        !matches!(self.kind, LineKind::Text)
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// `[[target|alias]]` and `[[target#heading]]` point at `target`.
fn link_target(inner: &str) -> String {
    inner
        .split('|')
        .next()
        .and_then(|s| s.split('#').next())
        .unwrap_or(inner)
        .trim()
        .to_string()
}

/// Which recognized section a header opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Notes,
    Tags,
}

/// A recognized section: its header line and the lines below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub header: String,
    pub lines: Vec<DocLine>,
}

/// Result of dropping dangling links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub removed_note_links: usize,
    pub removed_tag_links: usize,
}

impl PruneOutcome {
    pub fn changed(&self) -> bool {
        self.removed_note_links + self.removed_tag_links > 0
    }
}

/// Parsed tag document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDocument {
    /// Raw tag name (case preserved).
    pub name: String,
    pub preamble: Vec<DocLine>,
    pub sections: Vec<Section>,
    related_notes: String,
    related_tags: String,
}

/// Trailing hashtag line for a tag name.
pub fn hashtag(name: &str) -> String {
    format!("#{}", name.to_lowercase())
}

impl TagDocument {
    /// A fresh document holding only the `# Name` title header.
    pub fn new(name: &str, labels: &Labels) -> Self {
        Self {
            name: name.to_string(),
            preamble: vec![DocLine::parse(&format!("# {}", name))],
            sections: Vec::new(),
            related_notes: labels.related_notes.trim().to_string(),
            related_tags: labels.related_tags.trim().to_string(),
        }
    }

    /// Parse existing document content.
    ///
    /// Trailing blank lines and a trailing hashtag line for `name` are
    /// dropped. Empty content yields [`TagDocument::new`].
    pub fn parse(name: &str, content: &str, labels: &Labels) -> Self {
        let mut lines: Vec<&str> = content.lines().collect();
        let tag_line = hashtag(name);

        trim_trailing_blanks(&mut lines);
        if lines.last().is_some_and(|l| l.trim() == tag_line) {
            lines.pop();
        }
        trim_trailing_blanks(&mut lines);

        if lines.is_empty() {
            return Self::new(name, labels);
        }

        let mut doc = Self {
            name: name.to_string(),
            preamble: Vec::new(),
            sections: Vec::new(),
            related_notes: labels.related_notes.trim().to_string(),
            related_tags: labels.related_tags.trim().to_string(),
        };

        for line in lines {
            if let Some(kind) = doc.header_kind(line) {
                doc.sections.push(Section {
                    kind,
                    header: line.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            let parsed = DocLine::parse(line);
            match doc.sections.last_mut() {
                Some(section) => section.lines.push(parsed),
                None => doc.preamble.push(parsed),
            }
        }

        doc
    }

    /// Parse `content` only if it has the shape of a generated tag document:
    /// a `# Name` first line, a trailing `#name` line and at least one
    /// recognized section. The tag name is taken from the title line.
    pub fn recognize(content: &str, labels: &Labels) -> Option<Self> {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let name = lines.next()?.strip_prefix("# ")?.trim();
        if name.is_empty() || lines.last() != Some(hashtag(name).as_str()) {
            return None;
        }

        let doc = Self::parse(name, content, labels);
        (!doc.sections.is_empty()).then_some(doc)
    }

    fn header_kind(&self, line: &str) -> Option<SectionKind> {
        let lower = line.trim().to_lowercase();
        if lower == self.related_notes.to_lowercase() {
            Some(SectionKind::Notes)
        } else if lower == self.related_tags.to_lowercase() {
            Some(SectionKind::Tags)
        } else {
            None
        }
    }

    fn all_lines(&self) -> impl Iterator<Item = &DocLine> {
        self.preamble
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.lines.iter()))
    }

    /// Note stems linked anywhere in the document.
    pub fn note_links(&self) -> Vec<&str> {
        self.all_lines()
            .filter_map(|l| match &l.kind {
                LineKind::NoteLink(target) => Some(target.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Child tag stems linked anywhere in the document.
    pub fn tag_links(&self) -> Vec<&str> {
        self.all_lines()
            .filter_map(|l| match &l.kind {
                LineKind::TagLink(target) => Some(target.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Add `- [[stem]]` to the related-notes section. Returns false if the
    /// link was already present.
    pub fn add_note_link(&mut self, stem: &str) -> bool {
        if self.note_links().contains(&stem) {
            return false;
        }
        let section = self.section_mut(SectionKind::Notes);
        insert_link(&mut section.lines, DocLine::note_link(stem));
        true
    }

    /// Add `[[stem]]` to the related-tags section. Returns false if the link
    /// was already present.
    pub fn add_tag_link(&mut self, stem: &str) -> bool {
        if self.tag_links().contains(&stem) {
            return false;
        }
        let section = self.section_mut(SectionKind::Tags);
        insert_link(&mut section.lines, DocLine::tag_link(stem));
        true
    }

    fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.kind == kind) {
            Some(index) => index,
            None => {
                let header = match kind {
                    SectionKind::Notes => self.related_notes.clone(),
                    SectionKind::Tags => self.related_tags.clone(),
                };
                self.sections.push(Section {
                    kind,
                    header,
                    lines: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Drop links whose target no longer exists.
    ///
    /// `note_exists` is asked about note links, `tag_exists` about tag links.
    pub fn prune<N, T>(&mut self, note_exists: N, tag_exists: T) -> PruneOutcome
    where
        N: Fn(&str) -> bool,
        T: Fn(&str) -> bool,
    {
        let mut outcome = PruneOutcome::default();
        let mut keep = |line: &DocLine| match &line.kind {
            LineKind::NoteLink(target) if !note_exists(target) => {
                outcome.removed_note_links += 1;
                false
            }
            LineKind::TagLink(target) if !tag_exists(target) => {
                outcome.removed_tag_links += 1;
                false
            }
            _ => true,
        };

        self.preamble.retain(&mut keep);
        for section in &mut self.sections {
            section.lines.retain(&mut keep);
        }
        outcome
    }

    /// True when the document has no links and nothing besides headers.
    ///
    /// Lines starting with `#` (title, headings, hashtags) and blank lines do
    /// not count as content.
    pub fn is_effectively_empty(&self) -> bool {
        self.all_lines().all(|line| {
            !line.is_link() && (line.is_blank() || line.text.trim_start().starts_with('#'))
        })
    }

    /// Render back to text with a single trailing hashtag line.
    pub fn render(&self) -> String {
        let tag_line = hashtag(&self.name);
        let mut out: Vec<&str> = self.preamble.iter().map(|l| l.text.as_str()).collect();

        for section in &self.sections {
            if out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push("");
            }
            out.push(&section.header);
            out.extend(section.lines.iter().map(|l| l.text.as_str()));
        }

        trim_trailing_blanks(&mut out);
        if !out.is_empty() {
            out.push("");
        }
        out.push(&tag_line);

        let mut rendered = out.join("\n");
        rendered.push('\n');
        rendered
    }
}

/// Insert after the last link, or after the last non-blank line.
fn insert_link(lines: &mut Vec<DocLine>, link: DocLine) {
    let at = lines
        .iter()
        .rposition(DocLine::is_link)
        .or_else(|| lines.iter().rposition(|l| !l.is_blank()))
        .map(|i| i + 1)
        .unwrap_or(0);
    lines.insert(at, link);
}

fn trim_trailing_blanks(lines: &mut Vec<&str>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels() -> Labels {
        Labels::default()
    }

    #[test]
    fn test_new_leaf_document() {
        let mut doc = TagDocument::new("Histoire", &labels());
        assert!(doc.add_note_link("La Révolution"));

        assert_eq!(
            doc.render(),
            "# Histoire\n\nRelated notes:\n- [[La Révolution]]\n\n#histoire\n"
        );
    }

    #[test]
    fn test_reparse_is_stable() {
        let mut doc = TagDocument::new("A", &labels());
        doc.add_note_link("X");
        doc.add_tag_link("B");
        let first = doc.render();

        let reparsed = TagDocument::parse("A", &first, &labels());
        assert_eq!(reparsed.render(), first);
    }

    #[test]
    fn test_duplicate_links_not_added() {
        let content = "# A\n\nRelated notes:\n- [[X]]\n\n#a\n";
        let mut doc = TagDocument::parse("A", content, &labels());

        assert!(!doc.add_note_link("X"));
        assert_eq!(doc.render(), content);
    }

    #[test]
    fn test_trailing_hashtag_and_blanks_stripped_once() {
        let content = "# A\n\nRelated notes:\n- [[X]]\n\n\n#a\n\n\n";
        let doc = TagDocument::parse("A", content, &labels());
        assert_eq!(doc.render(), "# A\n\nRelated notes:\n- [[X]]\n\n#a\n");
    }

    #[test]
    fn test_new_link_goes_after_existing_links() {
        let content = "# A\n\nRelated notes:\n- [[X]]\n\nRelated tags:\n[[B]]\n\n#a\n";
        let mut doc = TagDocument::parse("A", content, &labels());
        doc.add_note_link("Y");
        doc.add_tag_link("C");

        assert_eq!(
            doc.render(),
            "# A\n\nRelated notes:\n- [[X]]\n- [[Y]]\n\nRelated tags:\n[[B]]\n[[C]]\n\n#a\n"
        );
    }

    #[test]
    fn test_manual_content_preserved() {
        let content = "# Histoire\n\nMy own notes about history.\n\nRelated notes:\n- [[X]]\nSee also the textbook.\n\n#histoire\n";
        let mut doc = TagDocument::parse("Histoire", content, &labels());
        doc.add_note_link("Y");

        assert_eq!(
            doc.render(),
            "# Histoire\n\nMy own notes about history.\n\nRelated notes:\n- [[X]]\n- [[Y]]\nSee also the textbook.\n\n#histoire\n"
        );
    }

    #[test]
    fn test_leaf_and_ancestor_sections_coexist() {
        let mut doc = TagDocument::new("A", &labels());
        doc.add_tag_link("B");
        doc.add_note_link("X");

        assert_eq!(
            doc.render(),
            "# A\n\nRelated tags:\n[[B]]\n\nRelated notes:\n- [[X]]\n\n#a\n"
        );
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let content = "# A\n\nrelated NOTES:\n- [[X]]\n";
        let mut doc = TagDocument::parse("A", content, &labels());
        doc.add_note_link("Y");

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.note_links(), vec!["X", "Y"]);
    }

    #[test]
    fn test_empty_content_starts_fresh() {
        let doc = TagDocument::parse("Sans tag", "\n\n", &labels());
        assert_eq!(doc.render(), "# Sans tag\n\n#sans tag\n");
    }

    #[test]
    fn test_prune_drops_dangling_links() {
        let content = "# A\n\nRelated notes:\n- [[Gone]]\n- [[Kept]]\n\nRelated tags:\n[[Old]]\n\n#a\n";
        let mut doc = TagDocument::parse("A", content, &labels());

        let outcome = doc.prune(|stem| stem == "Kept", |_| false);

        assert_eq!(outcome.removed_note_links, 1);
        assert_eq!(outcome.removed_tag_links, 1);
        assert_eq!(doc.render(), "# A\n\nRelated notes:\n- [[Kept]]\n\nRelated tags:\n\n#a\n");
    }

    #[test]
    fn test_effectively_empty() {
        let doc = TagDocument::parse("A", "# A\n\nRelated notes:\n\n#a\n", &labels());
        assert!(doc.is_effectively_empty());

        let doc = TagDocument::parse("A", "# A\n\nHand-written text\n\n#a\n", &labels());
        assert!(!doc.is_effectively_empty());

        let doc = TagDocument::parse("A", "# A\n\nRelated tags:\n[[B]]\n", &labels());
        assert!(!doc.is_effectively_empty());
    }

    #[test]
    fn test_recognize_generated_documents_only() {
        let doc = TagDocument::recognize("# Chimie\n\nRelated notes:\n- [[X]]\n\n#chimie\n", &labels()).unwrap();
        assert_eq!(doc.name, "Chimie");
        assert_eq!(doc.note_links(), vec!["X"]);

        let doc = TagDocument::recognize("# C#\n\nRelated tags:\n[[Sub]]\n\n#c#\n", &labels()).unwrap();
        assert_eq!(doc.name, "C#");
        assert_eq!(doc.tag_links(), vec!["Sub"]);

        // Hand-written notes that merely link somewhere
        assert!(TagDocument::recognize("# Journal\n\n- [[X]]\n", &labels()).is_none());
        assert!(TagDocument::recognize("Some text\n- [[X]]\n\n#some\n", &labels()).is_none());
        assert!(TagDocument::recognize("# Journal\n\n- [[X]]\n\n#journal\n", &labels()).is_none());
        assert!(TagDocument::recognize("", &labels()).is_none());
    }

    #[test]
    fn test_link_target_ignores_alias_and_heading() {
        let doc = TagDocument::parse("A", "- [[Note|Alias]]\n[[Child#Heading]]\n", &labels());
        assert_eq!(doc.note_links(), vec!["Note"]);
        assert_eq!(doc.tag_links(), vec!["Child"]);
    }
}
