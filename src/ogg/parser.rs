// Ogg Vorbis comment extraction
//
// Scans the page sequence of a single logical stream for the comment
// header packet (0x03 "vorbis"), reassembles it across continuation
// pages, and decodes the remainder as a Vorbis comment block. Pictures
// ride inside the comments, either as base64 METADATA_BLOCK_PICTURE
// values or as the legacy COVERART field.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TagError};
use crate::flac::picture::Picture;
use crate::flac::vorbis::VorbisComments;
use crate::ogg::page::OggPage;
use crate::ogg::{OGG_SIGNATURE, PACKET_TYPE_COMMENT, VORBIS_IDENTIFIER};

/// Comment fields that carry embedded pictures
const PICTURE_FIELD: &str = "METADATA_BLOCK_PICTURE";
const COVER_ART_FIELD: &str = "COVERART";

/// Parsed metadata from one Ogg Vorbis file.
#[derive(Debug)]
pub struct OggParser {
    path: PathBuf,
    vorbis_comments: VorbisComments,
    pictures: Vec<Picture>,
}

impl OggParser {
    /// Parse the file's metadata.
    ///
    /// Fatal conditions: unopenable file, a leading signature that is not
    /// `OggS`, and a stream with no comment header packet at all. A
    /// malformed picture value inside the comments is logged and skipped.
    pub fn parse(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TagError::CannotOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut signature = [0u8; 4];
        if reader.read_exact(&mut signature).is_err() || &signature != OGG_SIGNATURE {
            return Err(TagError::InvalidSignature {
                path: path.to_path_buf(),
                expected: "Ogg",
            });
        }
        reader.seek(SeekFrom::Start(0))?;

        let packet =
            read_comment_packet(&mut reader).ok_or_else(|| TagError::NoVorbisComments {
                path: path.to_path_buf(),
            })?;

        let comments =
            VorbisComments::decode(&packet[1 + VORBIS_IDENTIFIER.len()..]).ok_or_else(|| {
                TagError::Malformed {
                    path: path.to_path_buf(),
                    reason: "comment header packet too short".to_string(),
                }
            })?;
        debug!(
            file = %path.display(),
            fields = comments.total_count(),
            "decoded Ogg Vorbis comment header"
        );

        let pictures = extract_pictures(path, &comments);

        Ok(OggParser {
            path: path.to_path_buf(),
            vorbis_comments: comments,
            pictures,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vorbis_comments(&self) -> &VorbisComments {
        &self.vorbis_comments
    }

    /// Pictures decoded out of the comment fields, in field order
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }
}

/// Scan pages for the comment header packet, appending continuation
/// pages until the next packet begins or the stream ends. None when no
/// page in the stream starts the packet.
fn read_comment_packet<R: Read>(reader: &mut R) -> Option<Vec<u8>> {
    let mut packet: Option<Vec<u8>> = None;

    while let Some(page) = OggPage::read(reader) {
        if let Some(buf) = packet.as_mut() {
            if page.header.is_continuation() {
                buf.extend_from_slice(&page.data);
                continue;
            }
            break;
        }

        if page.data.len() > 1 + VORBIS_IDENTIFIER.len()
            && page.data[0] == PACKET_TYPE_COMMENT
            && &page.data[1..7] == VORBIS_IDENTIFIER
        {
            packet = Some(page.data);
        }
    }

    packet
}

/// Decode picture-bearing comment fields. The fields stay in the map;
/// only their decoded form is collected here.
fn extract_pictures(path: &Path, comments: &VorbisComments) -> Vec<Picture> {
    let mut pictures = Vec::new();

    for value in comments.get(PICTURE_FIELD) {
        match Picture::from_base64_block(value) {
            Some(picture) => pictures.push(picture),
            None => warn!(
                file = %path.display(),
                "skipping malformed METADATA_BLOCK_PICTURE value"
            ),
        }
    }

    for value in comments.get(COVER_ART_FIELD) {
        match Picture::from_cover_art(value) {
            Some(picture) => pictures.push(picture),
            None => warn!(
                file = %path.display(),
                "skipping malformed COVERART value"
            ),
        }
    }

    pictures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flac::PictureType;
    use crate::ogg::testutil;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn parses_comments_from_the_second_page() {
        let f = write_temp(&testutil::ogg_vorbis_file(&[
            ("TITLE", "Ogg Song"),
            ("ARTIST", "Someone"),
        ]));

        let parser = OggParser::parse(f.path()).unwrap();
        assert_eq!(parser.vorbis_comments().first("TITLE"), Some("Ogg Song"));
        assert_eq!(parser.vorbis_comments().first("ARTIST"), Some("Someone"));
    }

    #[test]
    fn wrong_signature_is_fatal() {
        let f = write_temp(b"RIFFxxxxWAVE");
        let err = OggParser::parse(f.path()).unwrap_err();
        assert!(matches!(err, TagError::InvalidSignature { expected: "Ogg", .. }));
    }

    #[test]
    fn missing_comment_packet_is_fatal() {
        // A lone identification page, no comment header anywhere
        let mut ident = vec![0x01];
        ident.extend_from_slice(VORBIS_IDENTIFIER);
        let f = write_temp(&testutil::page(0x02, 0, &ident));

        let err = OggParser::parse(f.path()).unwrap_err();
        assert!(matches!(err, TagError::NoVorbisComments { .. }));
    }

    #[test]
    fn reassembles_a_packet_spanning_continuation_pages() {
        let pairs: Vec<(String, String)> = (0..40)
            .map(|i| (format!("FIELD{}", i), "v".repeat(100)))
            .collect();
        let pair_refs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(f, v)| (f.as_str(), v.as_str()))
            .collect();
        let packet = testutil::comment_packet(&pair_refs);
        assert!(packet.len() > 2000);

        let (head, tail) = packet.split_at(1500);
        let mut bytes = testutil::page(0x02, 0, b"\x01vorbis");
        bytes.extend_from_slice(&testutil::page(0, 1, head));
        bytes.extend_from_slice(&testutil::page(0x01, 2, tail));
        let f = write_temp(&bytes);

        let parser = OggParser::parse(f.path()).unwrap();
        assert_eq!(parser.vorbis_comments().total_count(), 40);
        assert_eq!(parser.vorbis_comments().first("FIELD39"), Some(&*"v".repeat(100)));
    }

    #[test]
    fn decodes_metadata_block_picture_fields() {
        let mut picture = Picture::new(vec![1, 2, 3, 4], "image/png".into(), "art".into());
        picture.picture_type = PictureType::CoverFront;
        let encoded = BASE64.encode(picture.encode());

        let f = write_temp(&testutil::ogg_vorbis_file(&[
            ("TITLE", "With Art"),
            ("METADATA_BLOCK_PICTURE", &encoded),
        ]));

        let parser = OggParser::parse(f.path()).unwrap();
        assert_eq!(parser.pictures().len(), 1);
        assert_eq!(parser.pictures()[0], picture);
        // The raw field stays in the comment map
        assert!(parser.vorbis_comments().contains("METADATA_BLOCK_PICTURE"));
    }

    #[test]
    fn decodes_legacy_cover_art() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 9, 9, 9];
        let f = write_temp(&testutil::ogg_vorbis_file(&[(
            "COVERART",
            &BASE64.encode(jpeg),
        )]));

        let parser = OggParser::parse(f.path()).unwrap();
        assert_eq!(parser.pictures().len(), 1);
        assert_eq!(parser.pictures()[0].mime_type, "image/jpeg");
        assert_eq!(parser.pictures()[0].data, jpeg);
    }

    #[test]
    fn malformed_picture_value_is_skipped_not_fatal() {
        let f = write_temp(&testutil::ogg_vorbis_file(&[
            ("METADATA_BLOCK_PICTURE", "%%% not base64 %%%"),
            ("TITLE", "Still Readable"),
        ]));

        let parser = OggParser::parse(f.path()).unwrap();
        assert!(parser.pictures().is_empty());
        assert_eq!(parser.vorbis_comments().first("TITLE"), Some("Still Readable"));
    }
}
