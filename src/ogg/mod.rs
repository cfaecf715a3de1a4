// Ogg Vorbis metadata support
//
// Ogg page layout (27-byte header):
// - Capture Pattern: "OggS" (4 bytes)
// - Version: 0 (1 byte)
// - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
// - Granule Position (8 bytes)
// - Bitstream Serial Number (4 bytes)
// - Page Sequence Number (4 bytes)
// - CRC Checksum (4 bytes)
// - Number of Page Segments (1 byte)
// - Segment Table (variable)
//
// Vorbis header packets, each prefixed with a packet type byte and the
// "vorbis" identifier:
// 1. Identification header (0x01)
// 2. Comment header (0x03) - the Vorbis comment block
// 3. Setup header (0x05)

pub mod page;
pub mod parser;
pub mod reader;

pub use parser::OggParser;
pub use reader::OggReader;

/// Ogg page capture pattern
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

pub(crate) const PACKET_TYPE_COMMENT: u8 = 0x03;

/// The identifier following the packet type byte in Vorbis headers
pub(crate) const VORBIS_IDENTIFIER: &[u8; 6] = b"vorbis";

pub(crate) const HEADER_TYPE_CONTINUATION: u8 = 0x01;
