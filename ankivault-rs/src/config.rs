//! Configuration loaded from `config.toml`.
//!
//! Every field has a default, so running without a config file performs a
//! sync with the stock settings. The file is looked up at
//! `<config_dir>/ankivault/config.toml` unless a path is given explicitly.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault directory the documents are written to. `~/` is expanded.
    pub output_dir: PathBuf,
    /// Stem of the index document (written as `<index_name>.md`).
    pub index_name: String,
    /// Anki search query selecting the notes to export.
    pub deck_query: String,
    /// Export a single note instead of running the query.
    pub note_id: Option<u64>,
    /// Maximum length of an extracted title (and of note filename stems).
    pub title_max_length: usize,
    /// Maximum length of tag document filename stems.
    pub filename_max_length: usize,
    pub cloze: ClozeConfig,
    /// Lowercased model names handled as front/back notes.
    pub front_back_models: Vec<String>,
    pub anki_connect: AnkiConnectConfig,
    pub labels: Labels,
}

/// How cloze ("texte à trous") notes are recognized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClozeConfig {
    /// Candidate fields holding the whole note body; the first one the note
    /// type has is used.
    pub fields: Vec<String>,
    /// Substrings of the lowercased model name that mark a cloze model.
    pub model_markers: Vec<String>,
}

/// AnkiConnect bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiConnectConfig {
    pub url: String,
    pub find_timeout_secs: u64,
    pub info_timeout_secs: u64,
}

/// User-visible strings written into the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Title used when none can be extracted.
    pub fallback_title: String,
    /// Tag document collecting notes without tags. Empty disables it.
    pub untagged: String,
    /// Header of the note-link section in tag documents.
    pub related_notes: String,
    /// Header of the child-tag section in tag documents.
    pub related_tags: String,
    /// Prefix of the hashtag line at the bottom of note documents.
    pub tags_prefix: String,
    pub index_title: String,
    pub index_empty: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            index_name: "Anki".to_string(),
            deck_query: "deck:*Fiches*".to_string(),
            note_id: None,
            title_max_length: 95,
            filename_max_length: 100,
            cloze: ClozeConfig::default(),
            front_back_models: vec![
                "basique".to_string(),
                "basique (carte inversée optionnelle)".to_string(),
                "basique (saisissez la réponse)".to_string(),
                "généralités (deux sens)".to_string(),
                "basic".to_string(),
                "basic (and reversed card)".to_string(),
                "basic (optional reversed card)".to_string(),
                "basic (type in the answer)".to_string(),
            ],
            anki_connect: AnkiConnectConfig::default(),
            labels: Labels::default(),
        }
    }
}

impl Default for ClozeConfig {
    fn default() -> Self {
        Self {
            fields: vec!["Texte".to_string(), "Text".to_string()],
            model_markers: vec!["cloze".to_string(), "texte à trous".to_string()],
        }
    }
}

impl Default for AnkiConnectConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8765".to_string(),
            find_timeout_secs: 10,
            info_timeout_secs: 30,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            fallback_title: "Untitled".to_string(),
            untagged: "Untagged".to_string(),
            related_notes: "Related notes:".to_string(),
            related_tags: "Related tags:".to_string(),
            tags_prefix: "Tags: ".to_string(),
            index_title: "Tag index".to_string(),
            index_empty: "No tag documents to index.".to_string(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Obsidian")
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ankivault").join("config.toml"))
}

impl Config {
    /// Load the config from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(SyncError::ConfigError(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.index_name.trim().is_empty() {
            return Err(SyncError::ConfigError("index_name must not be empty".to_string()));
        }
        if self.title_max_length == 0 || self.filename_max_length == 0 {
            return Err(SyncError::ConfigError(
                "title_max_length and filename_max_length must be positive".to_string(),
            ));
        }
        if self.labels.related_notes.trim().is_empty() || self.labels.related_tags.trim().is_empty() {
            return Err(SyncError::ConfigError("section labels must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the output directory, preferring a CLI override.
    pub fn resolve_output_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        let path = cli_override.unwrap_or(&self.output_dir);
        expand_home(path)
    }

    /// Whether `model_name` (any case) is a front/back model.
    pub fn is_front_back_model(&self, model_name: &str) -> bool {
        let lower = model_name.trim().to_lowercase();
        self.front_back_models
            .iter()
            .any(|m| m.trim().to_lowercase() == lower)
    }

    /// Whether `model_name` (any case) names a cloze model.
    pub fn is_cloze_model(&self, model_name: &str) -> bool {
        let lower = model_name.to_lowercase();
        self.cloze
            .model_markers
            .iter()
            .any(|marker| !marker.is_empty() && lower.contains(&marker.to_lowercase()))
    }

    /// Untagged document name, if enabled.
    pub fn untagged_label(&self) -> Option<&str> {
        let label = self.labels.untagged.trim();
        (!label.is_empty()).then_some(label)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index_name, "Anki");
        assert_eq!(config.title_max_length, 95);
        assert_eq!(config.anki_connect.url, "http://localhost:8765");
        assert_eq!(config.untagged_label(), Some("Untagged"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "output_dir = \"/tmp/vault\"\n\n[labels]\nrelated_notes = \"Liste des notes liées:\"\nuntagged = \"\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/vault"));
        assert_eq!(config.labels.related_notes, "Liste des notes liées:");
        assert_eq!(config.labels.related_tags, "Related tags:");
        assert_eq!(config.untagged_label(), None);
        assert_eq!(config.deck_query, "deck:*Fiches*");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(SyncError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "title_max_length = 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_model_matching_is_case_insensitive() {
        let config = Config::default();
        assert!(config.is_front_back_model("Basique (Saisissez la réponse)"));
        assert!(config.is_front_back_model("Basic"));
        assert!(!config.is_front_back_model("Basic-ish"));
        assert!(config.is_cloze_model("Texte à trous"));
        assert!(config.is_cloze_model("My Cloze v2"));
        assert!(!config.is_cloze_model("Basic"));
    }

    #[test]
    fn test_resolve_output_dir_prefers_override() {
        let config = Config::default();
        let dir = config.resolve_output_dir(Some(Path::new("/srv/vault")));
        assert_eq!(dir, PathBuf::from("/srv/vault"));
    }
}
