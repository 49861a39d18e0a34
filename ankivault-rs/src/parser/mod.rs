//! Parsers for note HTML and vault document conventions.

pub mod cloze;
pub mod filename;
pub mod html;
pub mod marker;
pub mod tag_document;

pub use cloze::strip_cloze;
pub use filename::sanitize_filename;
pub use html::extract_title;
pub use marker::{format_marker, parse_marker};
pub use tag_document::{hashtag, LineKind, PruneOutcome, SectionKind, TagDocument};
