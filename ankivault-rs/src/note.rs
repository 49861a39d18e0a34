//! Note classification and rendering.
//!
//! Every note is first classified into a [`NoteKind`] by its model name and
//! fields, then rendered into the Markdown body written to the vault:
//!
//! ```text
//! <!-- anki_id: 1502298033753 -->
//! <rendered content>
//!
//! ---
//!
//! Tags: #Histoire #Moderne
//! ```

use crate::config::Config;
use crate::parser::{extract_title, format_marker, strip_cloze};
use crate::types::{tag_segments, AnkiNote, NoteId};
use thiserror::Error;

/// Why a note is not exported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("field '{field}' is missing")]
    MissingClozeField { field: String },

    #[error("field '{field}' is empty")]
    EmptyClozeField { field: String },

    #[error("front field is empty")]
    EmptyFront,

    #[error("no content for the back")]
    NoBack,

    #[error("unsupported note type '{model}'")]
    UnsupportedModel { model: String },
}

/// Shape of a note, with only the fields its renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteKind {
    /// A single field holds the whole body, possibly with occlusions.
    Cloze { text: String },
    /// First field is the front, the remaining non-empty fields the back.
    FrontBack { front: String, back: Vec<String> },
    Unsupported(SkipReason),
}

/// A note ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
    pub id: NoteId,
    pub title: String,
    /// Full document content, marker line included.
    pub body: String,
}

/// Classify a note by model name and fields.
pub fn classify(note: &AnkiNote, config: &Config) -> NoteKind {
    let cloze_field = config
        .cloze
        .fields
        .iter()
        .find(|name| note.has_field(name));

    if config.is_cloze_model(&note.model_name) || cloze_field.is_some() {
        let Some(field) = cloze_field else {
            return NoteKind::Unsupported(SkipReason::MissingClozeField {
                field: config.cloze.fields.join("' or '"),
            });
        };
        let text = note.field(field).unwrap_or_default();
        if text.trim().is_empty() {
            return NoteKind::Unsupported(SkipReason::EmptyClozeField {
                field: field.clone(),
            });
        }
        return NoteKind::Cloze {
            text: text.to_string(),
        };
    }

    if config.is_front_back_model(&note.model_name) {
        let Some((front, rest)) = note.fields.split_first() else {
            return NoteKind::Unsupported(SkipReason::EmptyFront);
        };
        if front.value.trim().is_empty() {
            return NoteKind::Unsupported(SkipReason::EmptyFront);
        }
        let back: Vec<String> = rest
            .iter()
            .filter(|f| !f.value.trim().is_empty())
            .map(|f| f.value.clone())
            .collect();
        if back.is_empty() {
            return NoteKind::Unsupported(SkipReason::NoBack);
        }
        return NoteKind::FrontBack {
            front: front.value.clone(),
            back,
        };
    }

    NoteKind::Unsupported(SkipReason::UnsupportedModel {
        model: note.model_name.clone(),
    })
}

/// Build the `Tags: #a #b` line: one hashtag per distinct path segment, in
/// first-seen order. Empty when the note has no tags.
pub fn tag_line(tags: &[String], prefix: &str) -> String {
    let mut hashtags: Vec<String> = Vec::new();
    for tag in tags {
        for segment in tag_segments(tag) {
            let hashtag = format!("#{}", segment);
            if !hashtags.contains(&hashtag) {
                hashtags.push(hashtag);
            }
        }
    }

    if hashtags.is_empty() {
        String::new()
    } else {
        format!("{}{}", prefix, hashtags.join(" "))
    }
}

/// Render a classified note.
pub fn render(note: &AnkiNote, kind: NoteKind, config: &Config) -> Result<RenderedNote, SkipReason> {
    let labels = &config.labels;
    let (title, content) = match kind {
        NoteKind::Cloze { text } => {
            let text = strip_cloze(&text);
            let title = extract_title(&text, config.title_max_length, &labels.fallback_title);
            (title, text.trim().to_string())
        }
        NoteKind::FrontBack { front, back } => {
            let title = extract_title(&front, config.title_max_length, &labels.fallback_title);
            let back: Vec<String> = back.iter().map(|part| strip_cloze(part)).collect();
            (title, back.join("\n\n").trim().to_string())
        }
        NoteKind::Unsupported(reason) => return Err(reason),
    };

    let body = format!(
        "{}\n{}\n\n---\n\n{}",
        format_marker(note.id),
        content,
        tag_line(&note.tags, &labels.tags_prefix)
    )
    .trim()
    .to_string();

    Ok(RenderedNote {
        id: note.id,
        title,
        body,
    })
}

/// Classify and render in one step.
pub fn prepare(note: &AnkiNote, config: &Config) -> Result<RenderedNote, SkipReason> {
    render(note, classify(note, config), config)
}
