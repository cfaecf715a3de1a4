// METADATA_BLOCK_PICTURE codec
//
// Every integer and length prefix in this layout is big-endian 32-bit,
// the opposite of the Vorbis comment block in the same file. Decode
// failures are per-picture: callers skip the malformed picture and keep
// the rest of the file.

use crate::utils::io::ByteReader;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Embedded picture types from the FLAC specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    VideoScreenCapture = 16,
    BrightColouredFish = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => PictureType::Other,
            1 => PictureType::FileIcon,
            2 => PictureType::OtherFileIcon,
            3 => PictureType::CoverFront,
            4 => PictureType::CoverBack,
            5 => PictureType::LeafletPage,
            6 => PictureType::Media,
            7 => PictureType::LeadArtist,
            8 => PictureType::Artist,
            9 => PictureType::Conductor,
            10 => PictureType::Band,
            11 => PictureType::Composer,
            12 => PictureType::Lyricist,
            13 => PictureType::RecordingLocation,
            14 => PictureType::DuringRecording,
            15 => PictureType::DuringPerformance,
            16 => PictureType::VideoScreenCapture,
            17 => PictureType::BrightColouredFish,
            18 => PictureType::Illustration,
            19 => PictureType::BandLogo,
            20 => PictureType::PublisherLogo,
            _ => PictureType::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PictureType::Other => "Other",
            PictureType::FileIcon => "32x32 pixels file icon (PNG only)",
            PictureType::OtherFileIcon => "Other file icon",
            PictureType::CoverFront => "Cover (front)",
            PictureType::CoverBack => "Cover (back)",
            PictureType::LeafletPage => "Leaflet page",
            PictureType::Media => "Media (e.g. label side of CD)",
            PictureType::LeadArtist => "Lead artist/lead performer/soloist",
            PictureType::Artist => "Artist/performer",
            PictureType::Conductor => "Conductor",
            PictureType::Band => "Band/Orchestra",
            PictureType::Composer => "Composer",
            PictureType::Lyricist => "Lyricist/text writer",
            PictureType::RecordingLocation => "Recording Location",
            PictureType::DuringRecording => "During recording",
            PictureType::DuringPerformance => "During performance",
            PictureType::VideoScreenCapture => "Movie/video screen capture",
            PictureType::BrightColouredFish => "A bright coloured fish",
            PictureType::Illustration => "Illustration",
            PictureType::BandLogo => "Band/artist logotype",
            PictureType::PublisherLogo => "Publisher/Studio logotype",
        }
    }
}

/// A single embedded picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub picture_type: PictureType,
    pub mime_type: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub color_count: u32,
    pub data: Vec<u8>,
}

impl Picture {
    /// A front-cover picture with unknown dimensions, for freshly staged art
    pub fn new(data: Vec<u8>, mime_type: String, description: String) -> Self {
        Picture {
            picture_type: PictureType::CoverFront,
            mime_type,
            description,
            width: 0,
            height: 0,
            color_depth: 0,
            color_count: 0,
            data,
        }
    }

    /// Decode the METADATA_BLOCK_PICTURE layout.
    ///
    /// Returns None on any bounds violation so the caller can skip this
    /// one picture and keep parsing the rest of the file.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let mut r = ByteReader::new(data);

        let picture_type = PictureType::from_u32(r.be_u32()?);

        let mime_len = r.be_u32()? as usize;
        let mime_type = String::from_utf8_lossy(r.bytes(mime_len)?).into_owned();

        let desc_len = r.be_u32()? as usize;
        let description = String::from_utf8_lossy(r.bytes(desc_len)?).into_owned();

        let width = r.be_u32()?;
        let height = r.be_u32()?;
        let color_depth = r.be_u32()?;
        let color_count = r.be_u32()?;

        let data_len = r.be_u32()? as usize;
        let image = r.bytes(data_len)?.to_vec();

        Some(Picture {
            picture_type,
            mime_type,
            description,
            width,
            height,
            color_depth,
            color_count,
            data: image,
        })
    }

    /// Serialize back to the wire layout, the exact structural inverse of
    /// [`Picture::decode`].
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.mime_type.len() + self.data.len());

        out.extend_from_slice(&(self.picture_type as u32).to_be_bytes());

        out.extend_from_slice(&(self.mime_type.len() as u32).to_be_bytes());
        out.extend_from_slice(self.mime_type.as_bytes());

        out.extend_from_slice(&(self.description.len() as u32).to_be_bytes());
        out.extend_from_slice(self.description.as_bytes());

        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.color_depth.to_be_bytes());
        out.extend_from_slice(&self.color_count.to_be_bytes());

        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);

        out
    }

    /// Decode a base64 METADATA_BLOCK_PICTURE value from a Vorbis comment
    pub fn from_base64_block(value: &str) -> Option<Self> {
        let raw = BASE64.decode(value.trim()).ok()?;
        Picture::decode(&raw)
    }

    /// Decode a legacy Ogg COVERART value: base64 of raw image bytes with
    /// no structured header. The MIME type is sniffed from magic bytes and
    /// the dimension fields default to zero.
    pub fn from_cover_art(value: &str) -> Option<Self> {
        let data = BASE64.decode(value.trim()).ok()?;
        if data.is_empty() {
            return None;
        }
        let mime = sniff_mime_type(&data).to_string();
        Some(Picture::new(data, mime, String::new()))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "jpg",
        }
    }

    /// `data:` URI with base64-encoded image bytes
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

/// Sniff an image MIME type from leading magic bytes
pub fn sniff_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8, 0xFF, 0xE0]) {
        "image/jpeg"
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if data.starts_with(b"GIF") {
        "image/gif"
    } else if data.starts_with(b"BM") {
        "image/bmp"
    } else {
        "image/unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Picture {
        Picture {
            picture_type: PictureType::CoverFront,
            mime_type: "image/png".to_string(),
            description: "front".to_string(),
            width: 600,
            height: 600,
            color_depth: 24,
            color_count: 0,
            data: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A],
        }
    }

    #[test]
    fn round_trips_all_fields() {
        let pic = sample();
        let decoded = Picture::decode(&pic.encode()).unwrap();
        assert_eq!(decoded, pic);
    }

    #[test]
    fn integers_are_big_endian_on_the_wire() {
        let pic = sample();
        let bytes = pic.encode();
        // Picture type 3 as BE u32
        assert_eq!(&bytes[0..4], &[0, 0, 0, 3]);
        // MIME length 9 as BE u32
        assert_eq!(&bytes[4..8], &[0, 0, 0, 9]);
    }

    #[test]
    fn picture_and_vorbis_lengths_use_opposite_byte_orders() {
        // The same file carries BE integers in PICTURE blocks and LE
        // prefixes in VORBIS_COMMENT; pin both here so neither can drift.
        let pic_bytes = sample().encode();
        assert_eq!(&pic_bytes[4..8], &9u32.to_be_bytes());

        let mut comments = crate::flac::VorbisComments::new();
        comments.append("A", "B");
        let vc_bytes = comments.encode();
        let vendor_len = u32::from_le_bytes(vc_bytes[0..4].try_into().unwrap());
        assert!(vendor_len > 0 && (vendor_len as usize) < vc_bytes.len());
        assert_ne!(&vc_bytes[0..4], &vendor_len.to_be_bytes());
    }

    #[test]
    fn declared_length_past_buffer_fails_decode() {
        let mut bytes = sample().encode();
        // Inflate the image-data length prefix (last 4+N bytes)
        let data_len_at = bytes.len() - 6 - 4;
        bytes[data_len_at..data_len_at + 4].copy_from_slice(&999u32.to_be_bytes());
        assert!(Picture::decode(&bytes).is_none());
    }

    #[test]
    fn short_buffer_fails_decode() {
        assert!(Picture::decode(&[0, 0]).is_none());
    }

    #[test]
    fn unknown_type_maps_to_other() {
        assert_eq!(PictureType::from_u32(99), PictureType::Other);
        assert_eq!(PictureType::from_u32(17), PictureType::BrightColouredFish);
    }

    #[test]
    fn cover_art_sniffs_mime_and_zeroes_dimensions() {
        let png = [0x89, 0x50, 0x4E, 0x47, 1, 2, 3];
        let b64 = BASE64.encode(png);

        let pic = Picture::from_cover_art(&b64).unwrap();
        assert_eq!(pic.mime_type, "image/png");
        assert_eq!(pic.picture_type, PictureType::CoverFront);
        assert_eq!((pic.width, pic.height, pic.color_depth, pic.color_count), (0, 0, 0, 0));
        assert_eq!(pic.data, png);
    }

    #[test]
    fn cover_art_rejects_bad_base64() {
        assert!(Picture::from_cover_art("!!! not base64 !!!").is_none());
    }

    #[test]
    fn sniffs_known_magic_bytes() {
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0]), "image/jpeg");
        assert_eq!(sniff_mime_type(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime_type(b"BM1234"), "image/bmp");
        assert_eq!(sniff_mime_type(b"????"), "image/unknown");
    }

    #[test]
    fn extension_and_data_uri_follow_the_mime_type() {
        let pic = sample();
        assert_eq!(pic.extension(), "png");
        assert_eq!(pic.size(), 6);

        let uri = pic.data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        let encoded = uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), pic.data);
    }

    #[test]
    fn base64_block_round_trip() {
        let b64 = BASE64.encode(sample().encode());
        let pic = Picture::from_base64_block(&b64).unwrap();
        assert_eq!(pic, sample());
    }
}
