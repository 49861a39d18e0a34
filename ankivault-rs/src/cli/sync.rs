//! The sync command.

use crate::anki::{AnkiConnect, JsonFileSource, NoteSource};
use crate::cli::args::Cli;
use crate::cli::output::Output;
use crate::config::Config;
use crate::error::Result;
use crate::export::sync;
use crate::vault::Vault;

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(query) = &cli.query {
        config.deck_query = query.clone();
        config.note_id = None;
    }
    if let Some(id) = cli.note_id {
        config.note_id = Some(id);
    }
}

/// Pick the note source: a dump file when given, AnkiConnect otherwise.
pub fn open_source(cli: &Cli, config: &Config) -> Result<Box<dyn NoteSource>> {
    match &cli.notes_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "reading notes from file");
            Ok(Box::new(JsonFileSource::open(path)?))
        }
        None => {
            let client = AnkiConnect::new(&config.anki_connect);
            tracing::info!(url = client.url(), "using AnkiConnect");
            Ok(Box::new(client))
        }
    }
}

pub fn run(cli: &Cli, config: &Config, output: &Output) -> Result<()> {
    let source = open_source(cli, config)?;
    let vault = Vault::open(config.resolve_output_dir(cli.vault.as_deref()))?;

    let report = sync(source.as_ref(), &vault, config)?;
    output.print(&report)
}
