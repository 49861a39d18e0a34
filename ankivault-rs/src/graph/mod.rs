//! Tag graph: tag documents linked to notes and to each other.

pub mod tag_graph;

pub use tag_graph::{LinkOutcome, TagGraph};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Tag documents touched during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnownTags {
    /// Stem of each tag document mapped to its raw tag name.
    pub documents: BTreeMap<String, String>,
    /// Stems of tags that start a tag path (depth-1 tags included).
    pub top_level: BTreeSet<String>,
}

impl KnownTags {
    pub fn register(&mut self, stem: &str, name: &str) {
        self.documents
            .entry(stem.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn register_top_level(&mut self, stem: &str) {
        self.top_level.insert(stem.to_string());
    }

    /// Forget a deleted document.
    pub fn remove(&mut self, stem: &str) {
        self.documents.remove(stem);
        self.top_level.remove(stem);
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.documents.contains_key(stem)
    }

    /// Stems in sorted order.
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
