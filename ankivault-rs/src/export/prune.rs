//! Removing what the latest run no longer references.

use crate::config::Config;
use crate::error::Result;
use crate::graph::KnownTags;
use crate::identity::IdentityIndex;
use crate::parser::{parse_marker, TagDocument};
use crate::types::NoteId;
use crate::vault::Vault;
use std::collections::{BTreeSet, HashSet};

/// Delete note documents whose id is not in `current_ids`.
///
/// Extra copies of a current note (a second file carrying the same marker)
/// are deleted too, keeping the stem recorded in `identity`. Returns the
/// deleted stems.
pub fn prune_stale_notes(
    vault: &Vault,
    identity: &IdentityIndex,
    current_ids: &HashSet<NoteId>,
) -> Result<Vec<String>> {
    let mut deleted = Vec::new();

    for (stem, id) in vault.scan_markers()? {
        let stale = !current_ids.contains(&id);
        let duplicate = matches!(identity.locate_existing(id), Some(kept) if kept != stem);
        if !stale && !duplicate {
            continue;
        }

        match vault.delete(&stem) {
            Ok(()) => {
                if stale {
                    tracing::info!(stem = %stem, note_id = id, "deleted note no longer in Anki");
                } else {
                    tracing::info!(stem = %stem, note_id = id, "deleted duplicate note document");
                }
                deleted.push(stem);
            }
            Err(e) => tracing::warn!(stem = %stem, error = %e, "cannot delete note document"),
        }
    }

    Ok(deleted)
}

/// Register tag documents not touched this run that link to one of the
/// given note or tag stems, so pruning also cleans them.
///
/// Only unmarked documents with the generated tag document shape are taken.
/// Returns how many documents were added to `known`.
pub fn adopt_referrers(
    vault: &Vault,
    config: &Config,
    known: &mut KnownTags,
    note_stems: &[String],
    tag_stems: &[String],
) -> usize {
    if note_stems.is_empty() && tag_stems.is_empty() {
        return 0;
    }
    let stems = match vault.list_stems() {
        Ok(stems) => stems,
        Err(e) => {
            tracing::warn!(error = %e, "cannot list vault for tag documents");
            return 0;
        }
    };

    let mut adopted = 0;
    for stem in stems {
        if known.contains(&stem) || stem == config.index_name {
            continue;
        }
        let content = match vault.read(&stem) {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(stem = %stem, error = %e, "cannot read document");
                continue;
            }
        };
        if parse_marker(&content).is_some() {
            continue;
        }
        let Some(doc) = TagDocument::recognize(&content, &config.labels) else {
            continue;
        };

        let links_note = doc.note_links().into_iter().any(|l| note_stems.iter().any(|s| s.as_str() == l));
        let links_tag = doc.tag_links().into_iter().any(|l| tag_stems.iter().any(|s| s.as_str() == l));
        if links_note || links_tag {
            tracing::debug!(stem = %stem, tag = %doc.name, "tag document links to a deleted document");
            known.register(&stem, &doc.name);
            adopted += 1;
        }
    }
    adopted
}

/// Outcome of [`prune_tag_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPruneReport {
    pub deleted: BTreeSet<String>,
    pub rewritten: BTreeSet<String>,
    pub failed: usize,
}

/// Drop dangling links from every known tag document.
///
/// A document left with no links and no text besides its headers is deleted
/// and forgotten from `known`. Deleting a child can leave its parent empty,
/// so passes repeat until nothing more is deleted. Parents not yet in
/// `known` are found with [`adopt_referrers`].
pub fn prune_tag_documents(vault: &Vault, config: &Config, known: &mut KnownTags) -> TagPruneReport {
    let mut report = TagPruneReport::default();

    loop {
        let mut deleted_in_pass = Vec::new();
        let documents: Vec<(String, String)> = known
            .documents
            .iter()
            .map(|(stem, name)| (stem.clone(), name.clone()))
            .collect();

        for (stem, name) in documents {
            let content = match vault.read(&stem) {
                Ok(Some(content)) => content,
                Ok(None) => {
                    tracing::debug!(stem = %stem, "tag document vanished");
                    known.remove(&stem);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(stem = %stem, error = %e, "cannot read tag document");
                    report.failed += 1;
                    continue;
                }
            };
            if parse_marker(&content).is_some() {
                continue;
            }

            let mut doc = TagDocument::parse(&name, &content, &config.labels);
            let outcome = doc.prune(|target| vault.exists(target), |target| vault.exists(target));

            if doc.is_effectively_empty() {
                match vault.delete(&stem) {
                    Ok(()) => {
                        tracing::info!(stem = %stem, "deleted tag document without links");
                        known.remove(&stem);
                        report.rewritten.remove(&stem);
                        report.deleted.insert(stem.clone());
                        deleted_in_pass.push(stem);
                    }
                    Err(e) => {
                        tracing::warn!(stem = %stem, error = %e, "cannot delete tag document");
                        report.failed += 1;
                    }
                }
                continue;
            }

            let rendered = doc.render();
            if rendered == content {
                continue;
            }
            match vault.write(&stem, &rendered) {
                Ok(()) => {
                    tracing::info!(
                        stem = %stem,
                        removed_note_links = outcome.removed_note_links,
                        removed_tag_links = outcome.removed_tag_links,
                        "tag document cleaned"
                    );
                    report.rewritten.insert(stem);
                }
                Err(e) => {
                    tracing::warn!(stem = %stem, error = %e, "cannot rewrite tag document");
                    report.failed += 1;
                }
            }
        }

        if deleted_in_pass.is_empty() {
            break;
        }
        adopt_referrers(vault, config, known, &[], &deleted_in_pass);
    }

    report
}
