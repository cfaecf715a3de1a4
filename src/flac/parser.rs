// Low-level FLAC block walker
//
// FLAC layout: 4-byte "fLaC" signature, then framed metadata blocks
// (1 header byte: is-last flag + 7-bit type code; 3 bytes big-endian
// 24-bit payload length; payload), then audio frames. Raw payloads are
// retained so a writer can pass unrecognized blocks through unchanged.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TagError};
use crate::flac::picture::Picture;
use crate::flac::vorbis::VorbisComments;
use crate::flac::{BlockType, FLAC_SIGNATURE};
use crate::utils::io::ByteReader;

/// One framed metadata block with its undecoded payload.
#[derive(Debug, Clone)]
pub struct MetadataBlock {
    pub block_type: BlockType,
    pub is_last: bool,
    pub data: Vec<u8>,
}

/// Decoded STREAMINFO fields. Parsed for callers but never rewritten;
/// the writer passes the original block through byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub total_samples: u64,
}

/// One SEEKTABLE entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekPoint {
    pub sample_number: u64,
    pub byte_offset: u64,
    pub frame_samples: u16,
}

/// Parsed seek table. Read-only; passthrough on write.
#[derive(Debug, Clone, Default)]
pub struct SeekTable {
    pub points: Vec<SeekPoint>,
}

/// Parses a FLAC file's metadata section in one pass.
///
/// Construction via [`FlacParser::parse`] either yields a fully populated
/// parser or a fatal [`TagError`]; there is no partial success.
#[derive(Debug)]
pub struct FlacParser {
    path: PathBuf,
    blocks: Vec<MetadataBlock>,
    stream_info: Option<StreamInfo>,
    vorbis_comments: Option<VorbisComments>,
    pictures: Vec<Picture>,
    seek_table: Option<SeekTable>,
    audio_start: u64,
}

impl FlacParser {
    /// Parse all metadata blocks of the file at `path`.
    pub fn parse(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TagError::CannotOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut signature = [0u8; 4];
        if reader.read_exact(&mut signature).is_err() || &signature != FLAC_SIGNATURE {
            return Err(TagError::InvalidSignature {
                path: path.to_path_buf(),
                expected: "FLAC",
            });
        }

        let mut parser = FlacParser {
            path: path.to_path_buf(),
            blocks: Vec::new(),
            stream_info: None,
            vorbis_comments: None,
            pictures: Vec::new(),
            seek_table: None,
            audio_start: 0,
        };

        parser.parse_blocks(&mut reader)?;
        parser.audio_start = reader.stream_position()?;

        debug!(
            file = %parser.path.display(),
            blocks = parser.blocks.len(),
            has_comments = parser.vorbis_comments.is_some(),
            pictures = parser.pictures.len(),
            has_seektable = parser.seek_table.is_some(),
            audio_start = parser.audio_start,
            "parsed FLAC file"
        );

        Ok(parser)
    }

    fn parse_blocks<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        loop {
            let (block_type, is_last, length) = self.read_block_header(reader)?;

            let mut data = vec![0u8; length];
            reader.read_exact(&mut data).map_err(|_| TagError::Truncated {
                path: self.path.clone(),
                expected: length,
            })?;

            debug!(
                block = %block_type.name(),
                length,
                is_last,
                "read metadata block"
            );

            match block_type {
                BlockType::StreamInfo => self.parse_stream_info(&data),
                BlockType::VorbisComment => {
                    self.vorbis_comments = VorbisComments::decode(&data);
                    if self.vorbis_comments.is_none() {
                        warn!(file = %self.path.display(), "unreadable VORBIS_COMMENT block");
                    }
                }
                BlockType::Picture => match Picture::decode(&data) {
                    Some(picture) => self.pictures.push(picture),
                    // Degraded read: skip this picture, keep the file
                    None => warn!(file = %self.path.display(), "skipping malformed PICTURE block"),
                },
                BlockType::SeekTable => self.parse_seek_table(&data),
                _ => {}
            }

            self.blocks.push(MetadataBlock {
                block_type,
                is_last,
                data,
            });

            if is_last {
                return Ok(());
            }
        }
    }

    fn read_block_header<R: Read>(&self, reader: &mut R) -> Result<(BlockType, bool, usize)> {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).map_err(|_| TagError::Malformed {
            path: self.path.clone(),
            reason: "failed to read metadata block header".to_string(),
        })?;

        let is_last = (header[0] & 0x80) != 0;
        let block_type = BlockType::from_code(header[0] & 0x7F);
        // 24-bit big-endian payload length
        let length = (usize::from(header[1]) << 16)
            | (usize::from(header[2]) << 8)
            | usize::from(header[3]);

        Ok((block_type, is_last, length))
    }

    /// Decode the fixed 34-byte STREAMINFO layout. Sample rate, channel
    /// count, bit depth, and the 36-bit total-sample count are bit-packed
    /// into bytes 10..18.
    fn parse_stream_info(&mut self, data: &[u8]) {
        if data.len() < 34 {
            warn!(
                file = %self.path.display(),
                length = data.len(),
                "STREAMINFO block too short"
            );
            return;
        }

        let upper = u32::from_be_bytes([data[10], data[11], data[12], data[13]]);
        let lower = u32::from_be_bytes([data[14], data[15], data[16], data[17]]);

        let sample_rate = (upper >> 12) & 0xF_FFFF;
        let channels = ((upper >> 9) & 0x7) as u8 + 1;
        let bits_per_sample = ((upper >> 4) & 0x1F) as u8 + 1;
        // 36-bit field spanning the u32 boundary
        let total_samples = (u64::from(upper & 0xF) << 32) | u64::from(lower);

        self.stream_info = Some(StreamInfo {
            sample_rate,
            channels,
            bits_per_sample,
            total_samples,
        });
    }

    /// Decode 18-byte seek points until end-of-block, underrun, or the
    /// all-ones placeholder that marks unused table capacity.
    fn parse_seek_table(&mut self, data: &[u8]) {
        let mut r = ByteReader::new(data);
        let mut points = Vec::new();

        while r.remaining() >= 18 {
            let sample_number = r.be_u64().unwrap_or(u64::MAX);
            let byte_offset = r.be_u64().unwrap_or(u64::MAX);
            let frame_samples = r.be_u16().unwrap_or(u16::MAX);

            if sample_number == u64::MAX && byte_offset == u64::MAX && frame_samples == u16::MAX {
                break;
            }

            points.push(SeekPoint {
                sample_number,
                byte_offset,
                frame_samples,
            });
        }

        self.seek_table = Some(SeekTable { points });
    }

    // Accessors

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All metadata blocks in file order, raw payloads included
    pub fn blocks(&self) -> &[MetadataBlock] {
        &self.blocks
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    pub fn vorbis_comments(&self) -> Option<&VorbisComments> {
        self.vorbis_comments.as_ref()
    }

    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    pub fn seek_table(&self) -> Option<&SeekTable> {
        self.seek_table.as_ref()
    }

    /// File offset of the first audio frame, right after the is-last block
    pub fn audio_start(&self) -> u64 {
        self.audio_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flac::testutil;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn parses_a_minimal_file() {
        let audio = b"AUDIOFRAMES";
        let bytes = testutil::minimal_flac(&[("TITLE", "Song"), ("ARTIST", "A")], audio);
        let f = write_temp(&bytes);

        let parser = FlacParser::parse(f.path()).unwrap();
        assert_eq!(parser.blocks().len(), 2);
        assert_eq!(parser.vorbis_comments().unwrap().first("TITLE"), Some("Song"));
        assert_eq!(parser.audio_start(), (bytes.len() - audio.len()) as u64);
    }

    #[test]
    fn decodes_bit_packed_stream_info() {
        let bytes = testutil::flac_file(
            &[(0, testutil::streaminfo(96_000, 8, 24, 0x5_1234_5678))],
            b"",
        );
        let f = write_temp(&bytes);

        let info = *FlacParser::parse(f.path()).unwrap().stream_info().unwrap();
        assert_eq!(info.sample_rate, 96_000);
        assert_eq!(info.channels, 8);
        assert_eq!(info.bits_per_sample, 24);
        assert_eq!(info.total_samples, 0x5_1234_5678);
    }

    #[test]
    fn rejects_wrong_signature() {
        let f = write_temp(b"OggSrest-of-file");
        match FlacParser::parse(f.path()) {
            Err(TagError::InvalidSignature { expected, .. }) => assert_eq!(expected, "FLAC"),
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn rejects_truncated_block() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(FLAC_SIGNATURE);
        // Last-block header declaring 100 payload bytes, then only 5
        bytes.push(0x80);
        bytes.extend_from_slice(&[0x00, 0x00, 0x64]);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        let f = write_temp(&bytes);

        match FlacParser::parse(f.path()) {
            Err(TagError::Truncated { expected, .. }) => assert_eq!(expected, 100),
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn cannot_open_missing_file() {
        let err = FlacParser::parse(Path::new("/nonexistent/file.flac")).unwrap_err();
        assert!(matches!(err, TagError::CannotOpen { .. }));
    }

    #[test]
    fn seek_table_stops_at_placeholder() {
        let mut table = Vec::new();
        for i in 0..3u64 {
            table.extend_from_slice(&(i * 4096).to_be_bytes());
            table.extend_from_slice(&(i * 1000).to_be_bytes());
            table.extend_from_slice(&4096u16.to_be_bytes());
        }
        // Placeholder point, then one more entry that must be ignored
        table.extend_from_slice(&[0xFF; 18]);
        table.extend_from_slice(&[0x00; 18]);

        let bytes = testutil::flac_file(
            &[(0, testutil::streaminfo(44_100, 2, 16, 0)), (3, table)],
            b"",
        );
        let f = write_temp(&bytes);

        let parser = FlacParser::parse(f.path()).unwrap();
        let points = &parser.seek_table().unwrap().points;
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].sample_number, 8192);
        assert_eq!(points[2].frame_samples, 4096);
    }

    #[test]
    fn malformed_picture_is_skipped_not_fatal() {
        let bytes = testutil::flac_file(
            &[
                (0, testutil::streaminfo(44_100, 2, 16, 0)),
                (6, vec![0, 0, 0, 3, 0, 0]), // picture cut short
                (4, testutil::vorbis_payload(&[("TITLE", "Still here")])),
            ],
            b"audio",
        );
        let f = write_temp(&bytes);

        let parser = FlacParser::parse(f.path()).unwrap();
        assert!(parser.pictures().is_empty());
        assert_eq!(parser.vorbis_comments().unwrap().first("TITLE"), Some("Still here"));
    }

    #[test]
    fn unknown_block_types_are_retained() {
        let bytes = testutil::flac_file(
            &[
                (0, testutil::streaminfo(44_100, 2, 16, 0)),
                (99, vec![0xAB; 7]),
            ],
            b"",
        );
        let f = write_temp(&bytes);

        let parser = FlacParser::parse(f.path()).unwrap();
        let block = &parser.blocks()[1];
        assert_eq!(block.block_type, BlockType::Unknown(99));
        assert_eq!(block.data, vec![0xAB; 7]);
        assert!(block.is_last);
    }
}
