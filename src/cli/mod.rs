// CLI support for the vorbistag binary

pub mod commands;
pub mod output;

pub use commands::WriteEdits;
pub use output::{OutputFormat, OutputFormatter};
