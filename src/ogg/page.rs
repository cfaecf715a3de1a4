// Ogg page framing
//
// A page is a 27-byte header, a lacing segment table, and the payload
// whose size is the sum of the lacing values. Header reads return None
// on EOF or a non-page byte sequence; callers decide whether that is an
// error.

use std::io::Read;

use crate::ogg::{HEADER_TYPE_CONTINUATION, OGG_SIGNATURE};

#[derive(Debug, Clone)]
pub struct OggPageHeader {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: u64,
    pub bitstream_serial: u32,
    pub page_sequence: u32,
    pub crc: u32,
    pub segment_table: Vec<u8>,
}

/// One framed page: header plus raw payload bytes
#[derive(Debug, Clone)]
pub struct OggPage {
    pub header: OggPageHeader,
    pub data: Vec<u8>,
}

impl OggPageHeader {
    /// Read one page header, segment table included
    pub fn read<R: Read>(reader: &mut R) -> Option<Self> {
        let mut header = [0u8; 27];
        if reader.read_exact(&mut header).is_err() {
            return None;
        }

        if &header[0..4] != OGG_SIGNATURE {
            return None;
        }

        let version = header[4];
        if version != 0 {
            return None;
        }

        let header_type = header[5];
        let granule_position = u64::from_le_bytes(header[6..14].try_into().ok()?);
        let bitstream_serial = u32::from_le_bytes(header[14..18].try_into().ok()?);
        let page_sequence = u32::from_le_bytes(header[18..22].try_into().ok()?);
        let crc = u32::from_le_bytes(header[22..26].try_into().ok()?);
        let segment_count = header[26];

        let mut segment_table = vec![0u8; segment_count as usize];
        if reader.read_exact(&mut segment_table).is_err() {
            return None;
        }

        Some(OggPageHeader {
            version,
            header_type,
            granule_position,
            bitstream_serial,
            page_sequence,
            crc,
            segment_table,
        })
    }

    /// Payload size, the sum of the lacing values
    pub fn data_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    /// Whether this page continues a packet from the previous page
    pub fn is_continuation(&self) -> bool {
        self.header_type & HEADER_TYPE_CONTINUATION != 0
    }
}

impl OggPage {
    /// Read one complete page, None on EOF or malformed framing
    pub fn read<R: Read>(reader: &mut R) -> Option<Self> {
        let header = OggPageHeader::read(reader)?;

        let mut data = vec![0u8; header.data_size()];
        if reader.read_exact(&mut data).is_err() {
            return None;
        }

        Some(OggPage { header, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::testutil;
    use std::io::Cursor;

    #[test]
    fn reads_header_fields_and_payload() {
        let bytes = testutil::page(0x02, 7, b"hello");
        let page = OggPage::read(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(page.header.version, 0);
        assert_eq!(page.header.header_type, 0x02);
        assert_eq!(page.header.page_sequence, 7);
        assert_eq!(page.header.segment_table, vec![5]);
        assert_eq!(page.data, b"hello");
        assert!(!page.header.is_continuation());
    }

    #[test]
    fn lacing_spans_multiple_segments() {
        let payload = vec![0xAB; 600];
        let bytes = testutil::page(0, 1, &payload);
        let page = OggPage::read(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(page.header.segment_table, vec![255, 255, 90]);
        assert_eq!(page.header.data_size(), 600);
        assert_eq!(page.data, payload);
    }

    #[test]
    fn exact_multiple_of_255_gets_a_zero_terminator() {
        let payload = vec![1u8; 510];
        let bytes = testutil::page(0, 1, &payload);
        let page = OggPage::read(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(page.header.segment_table, vec![255, 255, 0]);
        assert_eq!(page.data, payload);
    }

    #[test]
    fn rejects_wrong_capture_pattern() {
        let mut bytes = testutil::page(0, 0, b"x");
        bytes[0..4].copy_from_slice(b"NOPE");
        assert!(OggPage::read(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut bytes = testutil::page(0, 0, b"payload");
        bytes.truncate(bytes.len() - 3);
        assert!(OggPage::read(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn eof_is_none() {
        assert!(OggPage::read(&mut Cursor::new(Vec::new())).is_none());
    }

    #[test]
    fn continuation_flag() {
        let bytes = testutil::page(0x01, 2, b"rest");
        let page = OggPage::read(&mut Cursor::new(bytes)).unwrap();
        assert!(page.header.is_continuation());
    }
}
