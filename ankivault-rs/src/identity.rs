//! Note identity across runs and within a run.
//!
//! A note document is tied to its Anki note by the marker line, not by its
//! filename, so renaming a note in Anki keeps writing to the same file.

use crate::error::Result;
use crate::parser::sanitize_filename;
use crate::types::NoteId;
use crate::vault::Vault;
use std::collections::{HashMap, HashSet};

/// Map from note id to the stem of the document holding it.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    by_id: HashMap<NoteId, String>,
}

impl IdentityIndex {
    /// Build the index from the marker lines currently in the vault.
    ///
    /// Documents are visited in stem order and the first document carrying
    /// an id wins.
    pub fn scan(vault: &Vault) -> Result<Self> {
        let mut by_id = HashMap::new();
        for (stem, id) in vault.scan_markers()? {
            by_id.entry(id).or_insert(stem);
        }
        tracing::debug!(documents = by_id.len(), "indexed existing note documents");
        Ok(Self { by_id })
    }

    /// Stem of the document already holding `id`.
    pub fn locate_existing(&self, id: NoteId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Remember that `id` now lives in `stem`.
    pub fn record(&mut self, id: NoteId, stem: &str) {
        self.by_id.insert(id, stem.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Hex md5 over the rendered body and the note id.
pub fn fingerprint(body: &str, id: NoteId) -> String {
    format!("{:x}", md5::compute(format!("{}{}", body, id)))
}

/// Per-run set of fingerprints already written.
#[derive(Debug, Clone, Default)]
pub struct Fingerprints {
    seen: HashSet<String>,
}

impl Fingerprints {
    /// Record a fingerprint. Returns false if it was already seen this run.
    pub fn insert(&mut self, body: &str, id: NoteId) -> bool {
        self.seen.insert(fingerprint(body, id))
    }
}

/// Options for picking a note document's stem.
#[derive(Debug, Clone, Copy)]
pub struct StemOptions<'a> {
    pub max_length: usize,
    pub fallback: &'a str,
    /// Stems that must never be handed to a note (the index document).
    pub reserved: &'a [&'a str],
}

/// Pick the stem for a note.
///
/// Reuses the stem of the document already holding `id`. Otherwise sanitizes
/// `title` and appends `_1`, `_2`, ... while the candidate exists on disk.
pub fn assign_stem(
    vault: &Vault,
    index: &IdentityIndex,
    id: NoteId,
    title: &str,
    options: StemOptions<'_>,
) -> String {
    if let Some(stem) = index.locate_existing(id) {
        return stem.to_string();
    }

    let base = sanitize_filename(title, options.max_length, options.fallback);
    let taken = |candidate: &str| vault.exists(candidate) || options.reserved.contains(&candidate);

    let mut candidate = base.clone();
    let mut suffix = 1;
    while taken(&candidate) {
        candidate = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OPTIONS: StemOptions<'static> = StemOptions {
        max_length: 95,
        fallback: "Untitled",
        reserved: &["Anki"],
    };

    fn setup_test_vault() -> (TempDir, Vault) {
        let dir = TempDir::new().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        (dir, vault)
    }

    #[test]
    fn test_existing_mapping_reused_after_title_change() {
        let (_dir, vault) = setup_test_vault();
        vault.write("Old title", "<!-- anki_id: 7 -->\nBody").unwrap();

        let index = IdentityIndex::scan(&vault).unwrap();
        let stem = assign_stem(&vault, &index, 7, "New title", OPTIONS);

        assert_eq!(stem, "Old title");
    }

    #[test]
    fn test_collision_gets_numeric_suffix() {
        let (_dir, vault) = setup_test_vault();
        let index = IdentityIndex::default();

        let first = assign_stem(&vault, &index, 1, "Title", OPTIONS);
        vault.write(&first, "<!-- anki_id: 1 -->").unwrap();
        let second = assign_stem(&vault, &index, 2, "Title", OPTIONS);
        vault.write(&second, "<!-- anki_id: 2 -->").unwrap();
        let third = assign_stem(&vault, &index, 3, "Title", OPTIONS);

        assert_eq!(first, "Title");
        assert_eq!(second, "Title_1");
        assert_eq!(third, "Title_2");
    }

    #[test]
    fn test_reserved_stem_avoided() {
        let (_dir, vault) = setup_test_vault();
        let stem = assign_stem(&vault, &IdentityIndex::default(), 1, "Anki", OPTIONS);
        assert_eq!(stem, "Anki_1");
    }

    #[test]
    fn test_first_marker_wins() {
        let (_dir, vault) = setup_test_vault();
        vault.write("B copy", "<!-- anki_id: 5 -->").unwrap();
        vault.write("A original", "<!-- anki_id: 5 -->").unwrap();

        let index = IdentityIndex::scan(&vault).unwrap();
        assert_eq!(index.locate_existing(5), Some("A original"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_fingerprints_per_run() {
        let mut seen = Fingerprints::default();
        assert!(seen.insert("body", 1));
        assert!(!seen.insert("body", 1));
        assert!(seen.insert("body", 2));
        assert!(seen.insert("other body", 1));
    }

    #[test]
    fn test_fingerprint_is_md5_hex() {
        let fp = fingerprint("body", 1);
        assert_eq!(fp.len(), 32);
        assert_eq!(fp, format!("{:x}", md5::compute("body1")));
    }
}
