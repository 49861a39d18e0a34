//! The sync pipeline.
//!
//! ```text
//! find note ids -> fetch notes -> per note: render, pick stem, write, link tags
//!               -> delete stale note documents -> prune tag documents -> index
//! ```
//!
//! All state of a run lives in a [`SyncContext`] created by the export phase
//! and handed to the pruning and index phases.

pub mod index;
pub mod prune;

pub use index::{render_index, write_index};
pub use prune::{adopt_referrers, prune_stale_notes, prune_tag_documents, TagPruneReport};

use crate::anki::NoteSource;
use crate::config::Config;
use crate::error::Result;
use crate::graph::{KnownTags, TagGraph};
use crate::identity::{assign_stem, Fingerprints, IdentityIndex, StemOptions};
use crate::note::prepare;
use crate::types::{tag_segments, AnkiNote, NoteId};
use crate::vault::Vault;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Per-run counters of the export phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Note documents created or changed.
    pub exported: usize,
    /// Note documents already up to date.
    pub unchanged: usize,
    /// Notes not exportable (unsupported type, empty fields).
    pub skipped: usize,
    /// Notes seen twice in the same run.
    pub duplicates: usize,
    /// Notes whose document could not be written.
    pub failed: usize,
    pub tag_documents_written: usize,
    pub tag_updates_failed: usize,
}

/// State of one sync run.
#[derive(Debug, Default)]
pub struct SyncContext {
    pub known: KnownTags,
    pub identity: IdentityIndex,
    pub stats: ExportStats,
    fingerprints: Fingerprints,
}

/// Writes note documents and their tag links.
pub struct Exporter<'a> {
    vault: &'a Vault,
    config: &'a Config,
    graph: TagGraph<'a>,
}

impl<'a> Exporter<'a> {
    pub fn new(vault: &'a Vault, config: &'a Config) -> Self {
        Self {
            vault,
            config,
            graph: TagGraph::new(vault, config),
        }
    }

    /// Export every note and return the run context.
    pub fn export(&self, notes: &[AnkiNote]) -> Result<SyncContext> {
        let mut ctx = SyncContext {
            identity: IdentityIndex::scan(self.vault)?,
            ..SyncContext::default()
        };

        let reserved = self.reserved_stems(notes);
        let reserved: Vec<&str> = reserved.iter().map(String::as_str).collect();

        tracing::info!(notes = notes.len(), vault = %self.vault.root.display(), "exporting notes");
        for note in notes {
            self.export_note(&mut ctx, note, &reserved);
        }

        let stats = &ctx.stats;
        tracing::info!(
            exported = stats.exported,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            duplicates = stats.duplicates,
            failed = stats.failed,
            "export finished"
        );
        Ok(ctx)
    }

    /// Stems new note documents must not take: the index and every tag
    /// document this run links to.
    fn reserved_stems(&self, notes: &[AnkiNote]) -> BTreeSet<String> {
        let mut reserved = BTreeSet::from([self.config.index_name.clone()]);
        if let Some(label) = self.config.untagged_label() {
            reserved.insert(self.graph.stem_for(label));
        }
        for tag in notes.iter().flat_map(|n| &n.tags) {
            for segment in tag_segments(tag) {
                reserved.insert(self.graph.stem_for(segment));
            }
        }
        reserved
    }

    fn export_note(&self, ctx: &mut SyncContext, note: &AnkiNote, reserved: &[&str]) {
        let rendered = match prepare(note, self.config) {
            Ok(rendered) => rendered,
            Err(reason) => {
                tracing::info!(note_id = note.id, model = %note.model_name, %reason, "note skipped");
                ctx.stats.skipped += 1;
                return;
            }
        };

        if !ctx.fingerprints.insert(&rendered.body, note.id) {
            tracing::info!(note_id = note.id, "note already exported in this run");
            ctx.stats.duplicates += 1;
            return;
        }

        let stem = assign_stem(
            self.vault,
            &ctx.identity,
            note.id,
            &rendered.title,
            StemOptions {
                max_length: self.config.title_max_length,
                fallback: &self.config.labels.fallback_title,
                reserved,
            },
        );

        match self.write_note(&stem, &rendered.body) {
            Ok(true) => {
                tracing::info!(note_id = note.id, stem = %stem, "note exported");
                ctx.stats.exported += 1;
            }
            Ok(false) => {
                tracing::debug!(note_id = note.id, stem = %stem, "note unchanged");
                ctx.stats.unchanged += 1;
            }
            Err(e) => {
                tracing::warn!(note_id = note.id, stem = %stem, error = %e, "cannot write note");
                ctx.stats.failed += 1;
                return;
            }
        }
        ctx.identity.record(note.id, &stem);

        let outcome = self.graph.link_note(&mut ctx.known, &note.tags, &stem);
        ctx.stats.tag_documents_written += outcome.written;
        ctx.stats.tag_updates_failed += outcome.failed;
    }

    /// Write the note document. Returns false when it was already identical.
    fn write_note(&self, stem: &str, body: &str) -> Result<bool> {
        if self.vault.read(stem)?.as_deref() == Some(body) {
            return Ok(false);
        }
        self.vault.write(stem, body)?;
        Ok(true)
    }
}

/// Summary of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub vault: String,
    pub query: String,
    /// Ids returned by the note source.
    pub note_ids: usize,
    /// Notes whose details were received.
    pub notes_received: usize,
    #[serde(flatten)]
    pub export: ExportStats,
    pub deleted_notes: Vec<String>,
    pub deleted_tag_documents: Vec<String>,
    pub rewritten_tag_documents: Vec<String>,
    pub tag_documents: Vec<String>,
    pub top_level_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl SyncReport {
    fn empty(vault: &Vault, query: String, started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            finished_at: Local::now(),
            vault: vault.root.display().to_string(),
            query,
            note_ids: 0,
            notes_received: 0,
            export: ExportStats::default(),
            deleted_notes: Vec::new(),
            deleted_tag_documents: Vec::new(),
            rewritten_tag_documents: Vec::new(),
            tag_documents: Vec::new(),
            top_level_tags: Vec::new(),
            index: None,
        }
    }
}

/// Run a full sync from `source` into `vault`.
///
/// Retrieval errors abort before anything is written. Per-note and per-file
/// problems are logged and the run continues.
pub fn sync(source: &dyn NoteSource, vault: &Vault, config: &Config) -> Result<SyncReport> {
    let started_at = Local::now();

    let (query, ids): (String, Vec<NoteId>) = match config.note_id {
        Some(id) => {
            tracing::info!(note_id = id, "exporting a single note");
            (format!("nid:{}", id), vec![id])
        }
        None => {
            tracing::info!(query = %config.deck_query, "searching notes");
            let ids = source.find_note_ids(&config.deck_query)?;
            (config.deck_query.clone(), ids)
        }
    };
    tracing::info!(count = ids.len(), "note ids found");

    let mut report = SyncReport::empty(vault, query, started_at);
    if ids.is_empty() {
        tracing::warn!("no notes matched, nothing to do");
        return Ok(report);
    }
    report.note_ids = ids.len();

    let notes = source.notes_info(&ids)?;
    report.notes_received = notes.len();
    tracing::info!(count = notes.len(), "note details received");
    vault.create_root()?;

    let mut ctx = Exporter::new(vault, config).export(&notes)?;
    report.export = ctx.stats;

    if config.note_id.is_none() {
        let current: HashSet<NoteId> = ids.iter().copied().collect();
        report.deleted_notes = prune_stale_notes(vault, &ctx.identity, &current)?;
        adopt_referrers(vault, config, &mut ctx.known, &report.deleted_notes, &[]);
    }

    let pruned = prune_tag_documents(vault, config, &mut ctx.known);
    if pruned.failed > 0 {
        tracing::warn!(failed = pruned.failed, "some tag documents could not be cleaned");
    }
    report.deleted_tag_documents = pruned.deleted.into_iter().collect();
    report.rewritten_tag_documents = pruned.rewritten.into_iter().collect();

    match write_index(vault, &ctx.known, config) {
        Ok(path) => report.index = Some(path.display().to_string()),
        Err(e) => tracing::warn!(error = %e, "cannot write index document"),
    }

    report.tag_documents = ctx.known.stems().map(str::to_string).collect();
    report.top_level_tags = ctx.known.top_level.iter().cloned().collect();
    report.finished_at = Local::now();
    Ok(report)
}
