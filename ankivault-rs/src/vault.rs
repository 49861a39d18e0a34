//! Output vault: a flat directory of Markdown documents addressed by stem.

use crate::error::{Result, SyncError};
use crate::parser::parse_marker;
use crate::types::NoteId;
use glob::{glob, Pattern};
use std::path::PathBuf;

/// A flat Obsidian-style vault directory.
#[derive(Debug, Clone)]
pub struct Vault {
    /// Root path of the vault.
    pub root: PathBuf,
}

impl Vault {
    /// Open a vault. The directory may not exist yet, see [`Vault::create_root`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if root.exists() && !root.is_dir() {
            return Err(SyncError::InvalidOutputDir(root));
        }

        Ok(Self { root })
    }

    /// Create the vault directory and its parents if missing.
    pub fn create_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Full path of the document with this stem.
    pub fn document_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{}.md", stem))
    }

    /// Check on disk whether a document exists.
    pub fn exists(&self, stem: &str) -> bool {
        self.document_path(stem).is_file()
    }

    /// Read a document. Missing documents read as `None`.
    pub fn read(&self, stem: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.document_path(stem)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write (create or replace) a document.
    pub fn write(&self, stem: &str, content: &str) -> Result<()> {
        std::fs::write(self.document_path(stem), content)?;
        Ok(())
    }

    /// Delete a document.
    pub fn delete(&self, stem: &str) -> Result<()> {
        std::fs::remove_file(self.document_path(stem))?;
        Ok(())
    }

    /// List document stems in the vault root, sorted. Hidden files are skipped.
    pub fn list_stems(&self) -> Result<Vec<String>> {
        let pattern = format!("{}/*.md", Pattern::escape(&self.root.to_string_lossy()));

        let mut stems = Vec::new();

        for entry in glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if !path.is_file() {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !stem.starts_with('.') {
                            stems.push(stem.to_string());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "glob error while listing vault");
                }
            }
        }

        stems.sort();
        Ok(stems)
    }

    /// Stems and ids of every document carrying an identity marker, in stem
    /// order. Unreadable documents are logged and skipped.
    pub fn scan_markers(&self) -> Result<Vec<(String, NoteId)>> {
        let mut found = Vec::new();

        for stem in self.list_stems()? {
            match self.read(&stem) {
                Ok(Some(content)) => {
                    if let Some(id) = parse_marker(&content) {
                        found.push((stem, id));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(stem = %stem, error = %e, "cannot read document");
                }
            }
        }

        Ok(found)
    }
}
