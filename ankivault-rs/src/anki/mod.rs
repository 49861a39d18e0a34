//! Note sources: where the notes to export come from.

pub mod connect;
pub mod file;

pub use connect::AnkiConnect;
pub use file::JsonFileSource;

use crate::error::Result;
use crate::types::{AnkiNote, NoteId};

/// Anything that can answer the two queries a sync needs.
///
/// Implementations never retry. A failing call aborts the run before any
/// document is written.
pub trait NoteSource {
    /// Ids of the notes matching an Anki search query.
    fn find_note_ids(&self, query: &str) -> Result<Vec<NoteId>>;

    /// Details of the given notes. Ids that no longer exist are left out.
    fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<AnkiNote>>;
}
