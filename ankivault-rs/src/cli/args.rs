//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ankivault")]
#[command(author, version, about = "Export Anki notes into a linked Markdown vault", long_about = None)]
pub struct Cli {
    /// Vault directory to write into (overrides config output_dir)
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Config file (default: <config dir>/ankivault/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read notes from a saved notesInfo JSON dump instead of AnkiConnect
    #[arg(long)]
    pub notes_file: Option<PathBuf>,

    /// Export a single note by id
    #[arg(long, conflicts_with = "query")]
    pub note_id: Option<u64>,

    /// Anki search query (overrides config deck_query)
    #[arg(long)]
    pub query: Option<String>,

    /// Print the report as JSON (default)
    #[arg(long, conflicts_with_all = ["yaml", "toml"])]
    pub json: bool,

    /// Print the report as YAML
    #[arg(long, conflicts_with_all = ["json", "toml"])]
    pub yaml: bool,

    /// Print the report as TOML
    #[arg(long, conflicts_with_all = ["json", "yaml"])]
    pub toml: bool,

    /// Do not print the report or errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else {
            OutputFormat::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ankivault"]).unwrap();
        assert_eq!(cli.output_format(), OutputFormat::Json);
        assert!(cli.vault.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "ankivault",
            "--vault",
            "/tmp/v",
            "--notes-file",
            "notes.json",
            "--note-id",
            "42",
            "--yaml",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.vault, Some(PathBuf::from("/tmp/v")));
        assert_eq!(cli.notes_file, Some(PathBuf::from("notes.json")));
        assert_eq!(cli.note_id, Some(42));
        assert_eq!(cli.output_format(), OutputFormat::Yaml);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_conflicting_formats_rejected() {
        assert!(Cli::try_parse_from(["ankivault", "--json", "--toml"]).is_err());
        assert!(Cli::try_parse_from(["ankivault", "--note-id", "1", "--query", "x"]).is_err());
    }
}
