//! Building and merging tag documents.
//!
//! Each note tag `A::B::C` fans out into one document per segment:
//!
//! - `A` and `B` are ancestors and only link to their child tag (`[[B]]`,
//!   `[[C]]`) under the related-tags section.
//! - `C` is the leaf and links to the note (`- [[Note]]`) under the
//!   related-notes section.
//!
//! A flat tag `A` is a leaf on its own. The same segment can be a leaf for one
//! note and an ancestor for another; its document then carries both sections.
//!
//! Every write is a read-modify-write merge through [`TagDocument`], so
//! re-running adds nothing twice and keeps hand-written text.

use crate::config::{Config, Labels};
use crate::error::{Result, SyncError};
use crate::graph::KnownTags;
use crate::parser::{parse_marker, sanitize_filename, TagDocument};
use crate::types::tag_segments;
use crate::vault::Vault;

/// Counts for one note's tag updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Documents whose content changed.
    pub written: usize,
    /// Documents left untouched because of an error.
    pub failed: usize,
}

/// Writes tag documents into a vault.
pub struct TagGraph<'a> {
    vault: &'a Vault,
    labels: &'a Labels,
    max_length: usize,
    index_name: &'a str,
    untagged: Option<&'a str>,
}

impl<'a> TagGraph<'a> {
    pub fn new(vault: &'a Vault, config: &'a Config) -> Self {
        Self {
            vault,
            labels: &config.labels,
            max_length: config.filename_max_length,
            index_name: &config.index_name,
            untagged: config.untagged_label(),
        }
    }

    /// Stem of the document for a tag segment.
    pub fn stem_for(&self, tag: &str) -> String {
        sanitize_filename(tag, self.max_length, &self.labels.fallback_title)
    }

    /// Link a freshly written note from the documents of all its tags.
    ///
    /// Notes without any tag are linked from the untagged document, when one
    /// is configured. Failures are logged per document and never abort.
    pub fn link_note(&self, known: &mut KnownTags, tags: &[String], note_stem: &str) -> LinkOutcome {
        let mut outcome = LinkOutcome::default();
        let mut paths: Vec<Vec<&str>> = tags
            .iter()
            .map(|t| tag_segments(t))
            .filter(|parts| !parts.is_empty())
            .collect();

        if paths.is_empty() {
            match self.untagged {
                Some(label) => paths.push(vec![label]),
                None => return outcome,
            }
        }

        for parts in &paths {
            self.link_path(known, parts, note_stem, &mut outcome);
        }
        outcome
    }

    fn link_path(&self, known: &mut KnownTags, parts: &[&str], note_stem: &str, outcome: &mut LinkOutcome) {
        let Some((leaf, ancestors)) = parts.split_last() else {
            return;
        };

        for (i, ancestor) in ancestors.iter().enumerate() {
            let child_stem = self.stem_for(parts[i + 1]);
            let result = self.merge(known, ancestor, |doc| {
                doc.add_tag_link(&child_stem);
            });
            if i == 0 && result.is_ok() {
                known.register_top_level(&self.stem_for(ancestor));
            }
            self.tally(result, ancestor, outcome);
        }

        let result = self.merge(known, leaf, |doc| {
            doc.add_note_link(note_stem);
        });
        if ancestors.is_empty() && result.is_ok() {
            known.register_top_level(&self.stem_for(leaf));
        }
        self.tally(result, leaf, outcome);
    }

    fn tally(&self, result: Result<bool>, tag: &str, outcome: &mut LinkOutcome) {
        match result {
            Ok(true) => outcome.written += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(tag = %tag, error = %e, "tag document not updated");
                outcome.failed += 1;
            }
        }
    }

    /// Read, edit and write back the document for `tag`.
    ///
    /// Returns whether the file content changed. The document is registered
    /// in `known` once it is safely on disk.
    fn merge<F>(&self, known: &mut KnownTags, tag: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut TagDocument),
    {
        let stem = self.stem_for(tag);
        if stem == self.index_name {
            return Err(SyncError::NotATagDocument(stem));
        }

        let existing = self.vault.read(&stem)?;
        let mut doc = match &existing {
            Some(content) if parse_marker(content).is_some() => {
                return Err(SyncError::NotATagDocument(stem));
            }
            Some(content) => TagDocument::parse(tag, content, self.labels),
            None => TagDocument::new(tag, self.labels),
        };

        edit(&mut doc);
        let rendered = doc.render();
        let changed = existing.as_deref() != Some(rendered.as_str());
        if changed {
            self.vault.write(&stem, &rendered)?;
            tracing::debug!(tag = %tag, stem = %stem, "tag document written");
        }

        known.register(&stem, tag);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Vault, Config) {
        let dir = TempDir::new().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        (dir, vault, Config::default())
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn read(vault: &Vault, stem: &str) -> String {
        vault.read(stem).unwrap().unwrap()
    }

    #[test]
    fn test_flat_tag_is_leaf() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&["Histoire"]), "Note");

        assert_eq!(
            read(&vault, "Histoire"),
            "# Histoire\n\nRelated notes:\n- [[Note]]\n\n#histoire\n"
        );
        assert!(known.contains("Histoire"));
        assert!(known.top_level.contains("Histoire"));
    }

    #[test]
    fn test_hierarchical_fan_out() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        let outcome = graph.link_note(&mut known, &tags(&["A::B::C"]), "Note");

        assert_eq!(outcome, LinkOutcome { written: 3, failed: 0 });
        assert_eq!(read(&vault, "A"), "# A\n\nRelated tags:\n[[B]]\n\n#a\n");
        assert_eq!(read(&vault, "B"), "# B\n\nRelated tags:\n[[C]]\n\n#b\n");
        assert_eq!(read(&vault, "C"), "# C\n\nRelated notes:\n- [[Note]]\n\n#c\n");

        assert_eq!(known.stems().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(known.top_level.iter().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn test_relinking_is_idempotent() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&["A::B", "A"]), "Note");
        let a = read(&vault, "A");
        let b = read(&vault, "B");

        let outcome = graph.link_note(&mut known, &tags(&["A::B", "A"]), "Note");

        assert_eq!(outcome.written, 0);
        assert_eq!(read(&vault, "A"), a);
        assert_eq!(read(&vault, "B"), b);
    }

    #[test]
    fn test_segment_used_as_leaf_and_ancestor() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&["A"]), "X");
        graph.link_note(&mut known, &tags(&["A::B"]), "Y");

        assert_eq!(
            read(&vault, "A"),
            "# A\n\nRelated notes:\n- [[X]]\n\nRelated tags:\n[[B]]\n\n#a\n"
        );
        assert_eq!(read(&vault, "B"), "# B\n\nRelated notes:\n- [[Y]]\n\n#b\n");
    }

    #[test]
    fn test_untagged_note() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&[" :: "]), "Loose");

        assert_eq!(
            read(&vault, "Untagged"),
            "# Untagged\n\nRelated notes:\n- [[Loose]]\n\n#untagged\n"
        );
    }

    #[test]
    fn test_untagged_disabled() {
        let (_dir, vault, mut config) = setup();
        config.labels.untagged = String::new();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        let outcome = graph.link_note(&mut known, &[], "Loose");

        assert_eq!(outcome, LinkOutcome::default());
        assert!(known.is_empty());
    }

    #[test]
    fn test_hand_written_text_preserved() {
        let (_dir, vault, config) = setup();
        vault
            .write("Histoire", "# Histoire\n\nMy reading list.\n\n#histoire\n")
            .unwrap();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&["Histoire"]), "Note");

        assert_eq!(
            read(&vault, "Histoire"),
            "# Histoire\n\nMy reading list.\n\nRelated notes:\n- [[Note]]\n\n#histoire\n"
        );
    }

    #[test]
    fn test_refuses_note_documents_and_index() {
        let (_dir, vault, config) = setup();
        vault.write("Paris", "<!-- anki_id: 9 -->\nCapital").unwrap();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        let outcome = graph.link_note(&mut known, &tags(&["Paris", "Anki"]), "Note");

        assert_eq!(outcome, LinkOutcome { written: 0, failed: 2 });
        assert_eq!(read(&vault, "Paris"), "<!-- anki_id: 9 -->\nCapital");
        assert!(!vault.exists("Anki"));
        assert!(known.is_empty());
    }

    #[test]
    fn test_tag_stems_are_sanitized() {
        let (_dir, vault, config) = setup();
        let graph = TagGraph::new(&vault, &config);
        let mut known = KnownTags::default();

        graph.link_note(&mut known, &tags(&["Q&A::Who/What"]), "Note");

        assert_eq!(read(&vault, "Q&A"), "# Q&A\n\nRelated tags:\n[[Who-What]]\n\n#q&a\n");
        assert!(vault.exists("Who-What"));
    }
}
