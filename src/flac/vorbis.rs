// Vorbis comment codec
//
// Shared by the FLAC VORBIS_COMMENT block and the Ogg comment header
// packet. All length prefixes are little-endian 32-bit, unlike the
// big-endian PICTURE block that can sit next to this one in a FLAC file.

use crate::utils::io::ByteReader;
use tracing::warn;

/// Vendor string written into every block we serialize
const VENDOR: &str = concat!("vorbistag ", env!("CARGO_PKG_VERSION"));

/// An ordered multimap of Vorbis comment fields.
///
/// Field names are case-insensitive on read and stored uppercased. A field
/// may carry several values (multiple ARTIST entries are common); both the
/// field order and the value order within a field are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VorbisComments {
    vendor: String,
    fields: Vec<(String, Vec<String>)>,
}

impl VorbisComments {
    pub fn new() -> Self {
        VorbisComments::default()
    }

    /// Decode a comment block payload.
    ///
    /// Returns None when even the fixed prefix (vendor length, vendor
    /// string, comment count) is missing. A comment list that runs out of
    /// bytes early is a degraded read: the entries recovered so far are
    /// kept and the rest are dropped. Entries with no `=` separator are
    /// silently discarded.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let mut r = ByteReader::new(data);

        let vendor_len = r.le_u32()? as usize;
        let vendor = String::from_utf8_lossy(r.bytes(vendor_len)?).into_owned();
        let declared_count = r.le_u32()? as usize;

        let mut comments = VorbisComments {
            vendor,
            fields: Vec::new(),
        };

        for _ in 0..declared_count {
            let len = match r.le_u32() {
                Some(len) => len as usize,
                None => break,
            };
            let raw = match r.bytes(len) {
                Some(raw) => raw,
                None => {
                    warn!(declared = len, remaining = r.remaining(),
                        "comment extends beyond block data");
                    break;
                }
            };

            let entry = String::from_utf8_lossy(raw);
            // "FIELD=value", split on the first '=' only
            if let Some((field, value)) = entry.split_once('=') {
                comments.append(field, value);
            }
        }

        Some(comments)
    }

    /// Serialize to the wire layout. The vendor string is always replaced
    /// with this crate's own; the comment count is the total number of
    /// field=value pairs, not the number of distinct fields.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
        out.extend_from_slice(VENDOR.as_bytes());
        out.extend_from_slice(&(self.total_count() as u32).to_le_bytes());

        for (field, values) in &self.fields {
            for value in values {
                let entry = format!("{}={}", field, value);
                out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
                out.extend_from_slice(entry.as_bytes());
            }
        }

        out
    }

    /// Vendor string as found in the parsed block
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// All values for a field (case-insensitive), in original order
    pub fn get(&self, field: &str) -> &[String] {
        let key = field.to_uppercase();
        self.fields
            .iter()
            .find(|(f, _)| *f == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// First value for a field, if any
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    /// Replace all values of a field, keeping its position if it exists
    pub fn set(&mut self, field: &str, values: Vec<String>) {
        let key = field.trim().to_uppercase();
        match self.fields.iter_mut().find(|(f, _)| *f == key) {
            Some((_, existing)) => *existing = values,
            None => self.fields.push((key, values)),
        }
    }

    /// Add one value to a field, creating it if needed
    pub fn append(&mut self, field: &str, value: &str) {
        let key = field.trim().to_uppercase();
        match self.fields.iter_mut().find(|(f, _)| *f == key) {
            Some((_, values)) => values.push(value.to_string()),
            None => self.fields.push((key, vec![value.to_string()])),
        }
    }

    /// Drop a field and all its values
    pub fn remove(&mut self, field: &str) {
        let key = field.to_uppercase();
        self.fields.retain(|(f, _)| *f != key);
    }

    /// Field names in original order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }

    /// Iterate (field, values) pairs in original order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_slice()))
    }

    /// Total number of individual field=value pairs
    pub fn total_count(&self) -> usize {
        self.fields.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
