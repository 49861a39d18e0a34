//! CLI command implementations.

pub mod args;
pub mod output;
pub mod sync;

pub use args::Cli;
pub use output::Output;
