//! The index document listing every tag document.

use crate::config::Config;
use crate::error::Result;
use crate::graph::KnownTags;
use crate::vault::Vault;
use std::path::PathBuf;

/// Render the index for the tag documents in `known`.
///
/// The index links to itself first so it shows up in the graph view next to
/// the tags it lists.
pub fn render_index(known: &KnownTags, config: &Config) -> String {
    if known.is_empty() {
        return format!("{}\n", config.labels.index_empty);
    }

    let mut lines = vec![
        format!("# {}", config.labels.index_title),
        String::new(),
        format!("- [[{}]]", config.index_name),
        String::new(),
    ];
    lines.extend(known.stems().map(|stem| format!("- [[{}]]", stem)));

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

/// Write the index document, overwriting the previous one.
pub fn write_index(vault: &Vault, known: &KnownTags, config: &Config) -> Result<PathBuf> {
    let content = render_index(known, config);
    vault.write(&config.index_name, &content)?;
    tracing::info!(tags = known.len(), name = %config.index_name, "index written");
    Ok(vault.document_path(&config.index_name))
}
