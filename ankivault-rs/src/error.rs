//! Error types and exit codes for ankivault.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CONNECTION_FAILED: i32 = 2;
    pub const TIMEOUT: i32 = 3;
    pub const MALFORMED_RESPONSE: i32 = 4;
    pub const BRIDGE_ERROR: i32 = 5;
    pub const CONFIG_ERROR: i32 = 6;
}

/// Main error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Cannot connect to AnkiConnect at {url}: is Anki running with the AnkiConnect add-on enabled?")]
    ConnectionRefused { url: String },

    #[error("Timed out waiting for AnkiConnect ({action})")]
    Timeout { action: String },

    #[error("AnkiConnect returned HTTP status {status} for {action}")]
    HttpStatus { action: String, status: u16 },

    #[error("Malformed response from AnkiConnect ({action}): {message}")]
    MalformedResponse { action: String, message: String },

    #[error("AnkiConnect reported an error for {action}: {message}")]
    Bridge { action: String, message: String },

    #[error("Transport error ({action}): {message}")]
    Transport { action: String, message: String },

    #[error("Notes file not found: {0}")]
    NotesFileNotFound(PathBuf),

    #[error("Invalid output directory: {0}")]
    InvalidOutputDir(PathBuf),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialize error: {0}")]
    YamlSerialize(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Refusing to overwrite {0}: it is not a tag document")]
    NotATagDocument(String),
}

impl SyncError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::ConnectionRefused { .. } => exit_code::CONNECTION_FAILED,
            SyncError::Timeout { .. } => exit_code::TIMEOUT,
            SyncError::MalformedResponse { .. } | SyncError::HttpStatus { .. } => {
                exit_code::MALFORMED_RESPONSE
            }
            SyncError::Bridge { .. } => exit_code::BRIDGE_ERROR,
            SyncError::ConfigError(_) | SyncError::TomlParse(_) => exit_code::CONFIG_ERROR,
            _ => exit_code::GENERAL_ERROR,
        }
    }

    /// Whether this error came from talking to the note source.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionRefused { .. }
                | SyncError::Timeout { .. }
                | SyncError::HttpStatus { .. }
                | SyncError::MalformedResponse { .. }
                | SyncError::Bridge { .. }
                | SyncError::Transport { .. }
        )
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
