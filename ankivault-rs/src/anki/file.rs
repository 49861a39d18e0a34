//! Offline source reading a saved `notesInfo` dump.

use crate::anki::NoteSource;
use crate::error::{Result, SyncError};
use crate::types::{AnkiNote, NoteId, RawNoteInfo};
use std::path::Path;

/// Notes loaded from a JSON array of `notesInfo` entries.
///
/// The query is not evaluated: every note in the file matches.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    notes: Vec<AnkiNote>,
}

impl JsonFileSource {
    /// Load a dump from disk.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SyncError::NotesFileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let source = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), notes = source.notes.len(), "loaded notes file");
        Ok(source)
    }

    /// Parse a dump. Entries without a note id are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawNoteInfo> = serde_json::from_str(json)?;
        Ok(Self::from_notes(raw.into_iter().filter_map(RawNoteInfo::into_note).collect()))
    }

    pub fn from_notes(notes: Vec<AnkiNote>) -> Self {
        Self { notes }
    }
}

impl NoteSource for JsonFileSource {
    fn find_note_ids(&self, query: &str) -> Result<Vec<NoteId>> {
        tracing::debug!(query, "notes file ignores the query");
        Ok(self.notes.iter().map(|n| n.id).collect())
    }

    fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<AnkiNote>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.notes.iter().find(|n| n.id == *id))
            .cloned()
            .collect())
    }
}
