//! ankivault - export Anki notes into a linked Obsidian-style vault.
//!
//! # Overview
//!
//! A sync run pulls notes from a [`NoteSource`] (AnkiConnect or a saved
//! `notesInfo` dump) and writes:
//! - one Markdown document per note, tied to its Anki id by a hidden marker
//! - one document per tag segment, linking notes and child tags
//! - an index document listing every tag document
//!
//! Re-running converges: unchanged notes are left alone, notes deleted from
//! Anki are removed, and tag documents left without links are cleaned up.
//!
//! # Example
//!
//! ```no_run
//! use ankivault::{sync, AnkiConnect, Config, Vault};
//!
//! let config = Config::load(None).unwrap();
//! let vault = Vault::open(config.resolve_output_dir(None)).unwrap();
//! let source = AnkiConnect::new(&config.anki_connect);
//!
//! let report = sync(&source, &vault, &config).unwrap();
//! println!("{} notes exported", report.export.exported);
//! ```

pub mod anki;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod identity;
pub mod note;
pub mod parser;
pub mod types;
pub mod vault;

// Re-export main types at crate root
pub use anki::{AnkiConnect, JsonFileSource, NoteSource};
pub use config::Config;
pub use error::{Result, SyncError};
pub use export::{sync, SyncReport};
pub use types::*;
pub use vault::Vault;
