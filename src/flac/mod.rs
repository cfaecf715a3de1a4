// FLAC container support: block parsing, Vorbis comments, pictures,
// reading and rewriting

pub mod parser;
pub mod picture;
pub mod reader;
pub mod vorbis;
pub mod writer;

pub use parser::{FlacParser, MetadataBlock, SeekPoint, SeekTable, StreamInfo};
pub use picture::{Picture, PictureType};
pub use reader::FlacReader;
pub use vorbis::VorbisComments;
pub use writer::FlacWriter;

/// FLAC file signature
pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

/// FLAC metadata block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// Reserved or unrecognized type; payload is passed through untouched
    Unknown(u8),
}

impl BlockType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            2 => BlockType::Application,
            3 => BlockType::SeekTable,
            4 => BlockType::VorbisComment,
            5 => BlockType::CueSheet,
            6 => BlockType::Picture,
            other => BlockType::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            BlockType::StreamInfo => 0,
            BlockType::Padding => 1,
            BlockType::Application => 2,
            BlockType::SeekTable => 3,
            BlockType::VorbisComment => 4,
            BlockType::CueSheet => 5,
            BlockType::Picture => 6,
            BlockType::Unknown(code) => *code,
        }
    }

    pub fn name(&self) -> String {
        match self {
            BlockType::StreamInfo => "STREAMINFO".to_string(),
            BlockType::Padding => "PADDING".to_string(),
            BlockType::Application => "APPLICATION".to_string(),
            BlockType::SeekTable => "SEEKTABLE".to_string(),
            BlockType::VorbisComment => "VORBIS_COMMENT".to_string(),
            BlockType::CueSheet => "CUESHEET".to_string(),
            BlockType::Picture => "PICTURE".to_string(),
            BlockType::Unknown(code) => format!("UNKNOWN({})", code),
        }
    }
}

/// Builders for synthetic FLAC streams used across the flac test modules.
#[cfg(test)]
pub(crate) mod testutil {
    use super::vorbis::VorbisComments;

    /// Frame one metadata block: header byte + 24-bit BE length + payload
    pub fn block(type_code: u8, is_last: bool, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + data.len());
        let header = if is_last { 0x80 | type_code } else { type_code };
        out.push(header);
        let len = data.len() as u32;
        out.extend_from_slice(&len.to_be_bytes()[1..4]);
        out.extend_from_slice(data);
        out
    }

    /// A 34-byte STREAMINFO payload with the given bit-packed fields
    pub fn streaminfo(
        sample_rate: u32,
        channels: u8,
        bits_per_sample: u8,
        total_samples: u64,
    ) -> Vec<u8> {
        let mut data = vec![0u8; 34];
        let upper: u32 = ((sample_rate & 0xF_FFFF) << 12)
            | ((u32::from(channels) - 1) << 9)
            | ((u32::from(bits_per_sample) - 1) << 4)
            | ((total_samples >> 32) as u32 & 0xF);
        let lower = total_samples as u32;
        data[10..14].copy_from_slice(&upper.to_be_bytes());
        data[14..18].copy_from_slice(&lower.to_be_bytes());
        data
    }

    /// A VORBIS_COMMENT payload holding the given field/value pairs
    pub fn vorbis_payload(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut comments = VorbisComments::new();
        for (field, value) in pairs {
            comments.append(field, value);
        }
        comments.encode()
    }

    /// Assemble a complete FLAC file: signature, blocks, audio payload.
    /// Blocks are (type_code, payload); the final one is flagged is-last.
    pub fn flac_file(blocks: &[(u8, Vec<u8>)], audio: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(super::FLAC_SIGNATURE);
        for (i, (code, data)) in blocks.iter().enumerate() {
            out.extend_from_slice(&block(*code, i == blocks.len() - 1, data));
        }
        out.extend_from_slice(audio);
        out
    }

    /// A minimal valid FLAC file: STREAMINFO + comments + audio bytes
    pub fn minimal_flac(pairs: &[(&str, &str)], audio: &[u8]) -> Vec<u8> {
        flac_file(
            &[
                (0, streaminfo(44_100, 2, 16, 1_000_000)),
                (4, vorbis_payload(pairs)),
            ],
            audio,
        )
    }
}
