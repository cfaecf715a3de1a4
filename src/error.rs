// Error types for FLAC/OGG parsing and writing

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for all vorbistag operations
pub type Result<T> = std::result::Result<T, TagError>;

/// Errors raised while parsing or rewriting a tagged file.
///
/// Parse errors are fatal for the whole file: when one is returned no
/// reader or writer is handed out, so callers never see a half-populated
/// object. Degraded conditions (a malformed picture, a truncated comment
/// list) are not errors; they are logged and skipped.
#[derive(Error, Debug)]
pub enum TagError {
    /// The file could not be opened for reading
    #[error("cannot open {path}: {source}")]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The container signature did not match
    #[error("{path}: not a valid {expected} stream")]
    InvalidSignature {
        path: PathBuf,
        expected: &'static str,
    },

    /// A block header declared more bytes than the file contains
    #[error("{path}: truncated metadata block (expected {expected} bytes)")]
    Truncated { path: PathBuf, expected: usize },

    /// Structurally invalid data inside the container
    #[error("{path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// An Ogg stream with no Vorbis comment header packet at all
    #[error("{path}: no Vorbis comment header found")]
    NoVorbisComments { path: PathBuf },

    /// Neither a FLAC nor an Ogg signature was found
    #[error("{path}: unsupported file format")]
    UnsupportedFormat { path: PathBuf },

    /// A write failed after staging; the original file is untouched
    #[error("failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: Box<TagError>,
    },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TagError {
    /// Wrap a write-phase failure, preserving the cause
    pub(crate) fn write_failed(path: PathBuf, cause: TagError) -> Self {
        TagError::WriteFailed {
            path,
            source: Box::new(cause),
        }
    }
}
