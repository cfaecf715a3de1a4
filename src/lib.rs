// vorbistag - FLAC and Ogg Vorbis metadata library
//
// Parses metadata blocks out of FLAC and Ogg-Vorbis containers, exposes a
// format-agnostic reader over the Vorbis comment fields and embedded
// pictures, and rewrites FLAC metadata in place without touching the
// audio payload.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

pub mod error;
pub mod flac;
pub mod ogg;
mod utils;

pub use error::{Result, TagError};
pub use flac::{
    FlacParser, FlacReader, FlacWriter, MetadataBlock, Picture, PictureType, SeekPoint,
    SeekTable, StreamInfo, VorbisComments,
};
pub use ogg::{OggParser, OggReader};

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Flac,
    Ogg,
}

impl FileFormat {
    /// Sniff the container format from the file's leading signature bytes.
    pub fn detect(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| TagError::CannotOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let mut signature = [0u8; 4];
        if file.read_exact(&mut signature).is_err() {
            return Err(TagError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        match &signature {
            b"fLaC" => Ok(FileFormat::Flac),
            b"OggS" => Ok(FileFormat::Ogg),
            _ => Err(TagError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Flac => "flac",
            FileFormat::Ogg => "ogg",
        }
    }
}

/// An ARTIST-style field value: a single string when the field has one
/// value, a list when it repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

/// Format-agnostic metadata accessors shared by [`FlacReader`] and
/// [`OggReader`].
///
/// Every accessor is derived from the Vorbis comment map and picture list
/// cached at construction time; there is no lazy I/O behind these calls.
pub trait MetadataReader {
    /// The cached Vorbis comment fields
    fn vorbis_comments(&self) -> &VorbisComments;

    /// All embedded pictures in file order
    fn pictures(&self) -> &[Picture];

    fn format(&self) -> FileFormat;

    fn path(&self) -> &Path;

    fn title(&self) -> Option<&str> {
        self.vorbis_comments().first("TITLE")
    }

    /// None if absent, a single string for one value, a list for several
    fn artist(&self) -> Option<FieldValue> {
        match self.artists() {
            [] => None,
            [single] => Some(FieldValue::One(single.clone())),
            many => Some(FieldValue::Many(many.to_vec())),
        }
    }

    /// All ARTIST values, always as a list
    fn artists(&self) -> &[String] {
        self.vorbis_comments().get("ARTIST")
    }

    fn album(&self) -> Option<&str> {
        self.vorbis_comments().first("ALBUM")
    }

    fn genre(&self) -> Option<&str> {
        self.vorbis_comments().first("GENRE")
    }

    /// The first 4-digit run in DATE, or the raw YEAR value as a fallback
    fn year(&self) -> Option<String> {
        if let Some(date) = self.vorbis_comments().first("DATE") {
            return Some(
                extract_year(date)
                    .map(str::to_string)
                    .unwrap_or_else(|| date.to_string()),
            );
        }
        self.vorbis_comments().first("YEAR").map(str::to_string)
    }

    /// TRACKNUMBER with any trailing "/total" stripped; None if non-numeric
    fn track_number(&self) -> Option<u32> {
        self.vorbis_comments()
            .first("TRACKNUMBER")
            .and_then(parse_leading_number)
    }

    fn disc_number(&self) -> Option<u32> {
        self.vorbis_comments()
            .first("DISCNUMBER")
            .and_then(parse_leading_number)
    }

    fn track_total(&self) -> Option<u32> {
        self.vorbis_comments()
            .first("TRACKTOTAL")
            .and_then(parse_leading_number)
    }

    fn disc_total(&self) -> Option<u32> {
        self.vorbis_comments()
            .first("DISCTOTAL")
            .and_then(parse_leading_number)
    }

    fn comment(&self) -> Option<&str> {
        self.vorbis_comments().first("COMMENT")
    }

    fn comments(&self) -> &[String] {
        self.vorbis_comments().get("COMMENT")
    }

    fn first_picture(&self) -> Option<&Picture> {
        self.pictures().first()
    }

    fn pictures_by_type(&self, picture_type: PictureType) -> Vec<&Picture> {
        self.pictures()
            .iter()
            .filter(|p| p.picture_type == picture_type)
            .collect()
    }

    /// The first front-cover picture, falling back to the first picture
    /// of any type
    fn front_cover(&self) -> Option<&Picture> {
        self.pictures()
            .iter()
            .find(|p| p.picture_type == PictureType::CoverFront)
            .or_else(|| self.pictures().first())
    }
}

/// Open a reader for `path`, selecting the implementation by signature.
pub fn open(path: &Path) -> Result<Box<dyn MetadataReader>> {
    match FileFormat::detect(path)? {
        FileFormat::Flac => Ok(Box::new(FlacReader::open(path)?)),
        FileFormat::Ogg => Ok(Box::new(OggReader::open(path)?)),
    }
}

/// Strip a trailing "/total" and parse the leading integer
fn parse_leading_number(value: &str) -> Option<u32> {
    let head = value.split('/').next().unwrap_or(value).trim();
    head.parse().ok()
}

/// First run of four consecutive ASCII digits
fn extract_year(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    for i in 0..bytes.len().saturating_sub(3) {
        if bytes[i..i + 4].iter().all(u8::is_ascii_digit) {
            return Some(&value[i..i + 4]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_style_numbers() {
        assert_eq!(parse_leading_number("4/12"), Some(4));
        assert_eq!(parse_leading_number("7"), Some(7));
        assert_eq!(parse_leading_number(" 3 "), Some(3));
        assert_eq!(parse_leading_number("abc"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    #[test]
    fn extracts_first_four_digit_run() {
        assert_eq!(extract_year("2024-01-15"), Some("2024"));
        assert_eq!(extract_year("released 1999, remastered"), Some("1999"));
        assert_eq!(extract_year("12345"), Some("1234"));
        assert_eq!(extract_year("no digits"), None);
        assert_eq!(extract_year("99"), None);
    }
}
