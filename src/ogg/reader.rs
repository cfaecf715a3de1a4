// Ogg reader façade

use std::path::Path;

use crate::error::Result;
use crate::flac::picture::Picture;
use crate::flac::vorbis::VorbisComments;
use crate::ogg::parser::OggParser;
use crate::{FileFormat, MetadataReader};

/// Read-only view over one Ogg Vorbis file's metadata.
#[derive(Debug)]
pub struct OggReader {
    parser: OggParser,
}

impl OggReader {
    pub fn open(path: &Path) -> Result<Self> {
        let parser = OggParser::parse(path)?;
        Ok(OggReader { parser })
    }
}

impl MetadataReader for OggReader {
    fn vorbis_comments(&self) -> &VorbisComments {
        self.parser.vorbis_comments()
    }

    fn pictures(&self) -> &[Picture] {
        self.parser.pictures()
    }

    fn format(&self) -> FileFormat {
        FileFormat::Ogg
    }

    fn path(&self) -> &Path {
        self.parser.path()
    }
}
