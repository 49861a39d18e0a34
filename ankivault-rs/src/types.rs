//! Shared types for ankivault.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anki note identifier.
pub type NoteId = u64;

/// Separator between segments of a hierarchical tag.
pub const TAG_SEPARATOR: &str = "::";

/// Split a tag into its non-empty, trimmed path segments.
pub fn tag_segments(tag: &str) -> Vec<&str> {
    tag.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// A single named field of a note, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A note as returned by the note source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnkiNote {
    pub id: NoteId,
    pub model_name: String,
    /// Fields ordered by their position in the note type.
    pub fields: Vec<Field>,
    /// Raw tags, each a `::`-separated path.
    pub tags: Vec<String>,
}

impl AnkiNote {
    /// Value of the field named `name` (case-insensitive, trimmed).
    pub fn field(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.fields
            .iter()
            .find(|f| f.name.trim().to_lowercase() == wanted)
            .map(|f| f.value.as_str())
    }

    /// Whether the note type has a field named `name`.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Wire shape of a `notesInfo` entry.
///
/// AnkiConnect answers `{}` for ids that no longer exist, so every key is
/// optional here and validated in [`RawNoteInfo::into_note`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNoteInfo {
    pub note_id: Option<NoteId>,
    pub model_name: String,
    pub tags: Vec<String>,
    pub fields: HashMap<String, RawFieldInfo>,
}

/// Wire shape of one field value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFieldInfo {
    pub value: String,
    pub order: u32,
}

impl RawNoteInfo {
    /// Convert to an [`AnkiNote`], ordering fields by `order`.
    ///
    /// Returns `None` for entries without a note id.
    pub fn into_note(self) -> Option<AnkiNote> {
        let id = self.note_id?;
        let mut fields: Vec<(u32, Field)> = self
            .fields
            .into_iter()
            .map(|(name, info)| (info.order, Field { name, value: info.value }))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));

        Some(AnkiNote {
            id,
            model_name: self.model_name,
            fields: fields.into_iter().map(|(_, f)| f).collect(),
            tags: self.tags,
        })
    }
}
