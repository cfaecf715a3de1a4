// FLAC reader façade
//
// Wraps a fully-parsed FlacParser and serves the format-agnostic
// accessors from the MetadataReader trait, plus the FLAC-only views
// (stream info, seek table, raw blocks).

use std::path::Path;

use crate::error::Result;
use crate::flac::parser::{FlacParser, MetadataBlock, SeekTable, StreamInfo};
use crate::flac::picture::Picture;
use crate::flac::vorbis::VorbisComments;
use crate::{FileFormat, MetadataReader};

/// Read-only view over one FLAC file's metadata.
///
/// `open` parses the whole metadata section up front; it either returns a
/// fully populated reader or an error, never a partially usable one.
#[derive(Debug)]
pub struct FlacReader {
    parser: FlacParser,
    comments: VorbisComments,
}

impl FlacReader {
    pub fn open(path: &Path) -> Result<Self> {
        let parser = FlacParser::parse(path)?;
        let comments = parser.vorbis_comments().cloned().unwrap_or_default();
        Ok(FlacReader { parser, comments })
    }

    /// Decoded STREAMINFO, if the file carried a well-formed one
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.parser.stream_info()
    }

    pub fn seek_table(&self) -> Option<&SeekTable> {
        self.parser.seek_table()
    }

    /// All metadata blocks in file order, raw payloads included
    pub fn metadata_blocks(&self) -> &[MetadataBlock] {
        self.parser.blocks()
    }
}

impl MetadataReader for FlacReader {
    fn vorbis_comments(&self) -> &VorbisComments {
        &self.comments
    }

    fn pictures(&self) -> &[Picture] {
        self.parser.pictures()
    }

    fn format(&self) -> FileFormat {
        FileFormat::Flac
    }

    fn path(&self) -> &Path {
        self.parser.path()
    }
}
