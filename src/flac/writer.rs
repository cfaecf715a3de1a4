// FLAC metadata writer
//
// Field and picture edits are staged in memory; write() re-parses the
// file, merges the edits into the existing comments and pictures,
// reserializes every metadata block, streams the audio payload into a
// sibling temp file, and atomically renames it over the original. Any
// failure removes the temp file and leaves the original untouched.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{Result, TagError};
use crate::flac::parser::FlacParser;
use crate::flac::picture::{Picture, PictureType};
use crate::flac::vorbis::VorbisComments;
use crate::flac::{BlockType, FLAC_SIGNATURE};

/// Audio payload copy chunk size (8 MB) bounding peak memory
const COPY_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Largest payload a block's 24-bit length field can frame
const MAX_BLOCK_SIZE: usize = 0xFF_FFFF;

/// Stages Vorbis comment and picture edits for one FLAC file.
///
/// All mutation methods are pure in-memory staging; nothing touches the
/// disk until [`FlacWriter::write`]. Setting a field cancels a pending
/// removal of the same field and vice versa, so when both are requested
/// the set wins.
#[derive(Debug)]
pub struct FlacWriter {
    path: PathBuf,
    // Staging order becomes on-disk order for fields the file does not
    // already carry; ordered like VorbisComments itself
    fields: Vec<(String, Vec<String>)>,
    fields_to_remove: HashSet<String>,
    pictures: Vec<Picture>,
    clear_all_pictures: bool,
    picture_types_to_remove: HashSet<PictureType>,
}

impl FlacWriter {
    pub fn new(path: &Path) -> Self {
        FlacWriter {
            path: path.to_path_buf(),
            fields: Vec::new(),
            fields_to_remove: HashSet::new(),
            pictures: Vec::new(),
            clear_all_pictures: false,
            picture_types_to_remove: HashSet::new(),
        }
    }

    /// Stage all values for a field, replacing any existing ones on write.
    /// The name is trimmed and uppercased.
    pub fn set_field<V: Into<FieldValues>>(&mut self, field: &str, value: V) -> &mut Self {
        let key = field.trim().to_uppercase();
        let values = value.into().0;
        match self.fields.iter_mut().find(|(f, _)| *f == key) {
            Some((_, existing)) => *existing = values,
            None => self.fields.push((key.clone(), values)),
        }
        self.fields_to_remove.remove(&key);
        self
    }

    /// Stage several fields at once
    pub fn set_fields<'a, I, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<FieldValues>,
    {
        for (field, value) in fields {
            self.set_field(field, value);
        }
        self
    }

    /// Stage a field for removal from the existing comments
    pub fn remove_field(&mut self, field: &str) -> &mut Self {
        let key = field.trim().to_uppercase();
        self.fields.retain(|(f, _)| *f != key);
        self.fields_to_remove.insert(key);
        self
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.set_field("TITLE", title)
    }

    pub fn set_artist<V: Into<FieldValues>>(&mut self, artist: V) -> &mut Self {
        self.set_field("ARTIST", artist)
    }

    pub fn set_album(&mut self, album: &str) -> &mut Self {
        self.set_field("ALBUM", album)
    }

    pub fn set_genre(&mut self, genre: &str) -> &mut Self {
        self.set_field("GENRE", genre)
    }

    /// Stored in the standard Vorbis DATE field
    pub fn set_year(&mut self, year: &str) -> &mut Self {
        self.set_field("DATE", year)
    }

    pub fn set_track_number(&mut self, track: u32, total: Option<u32>) -> &mut Self {
        self.set_field("TRACKNUMBER", render_numbered(track, total))
    }

    pub fn set_disc_number(&mut self, disc: u32, total: Option<u32>) -> &mut Self {
        self.set_field("DISCNUMBER", render_numbered(disc, total))
    }

    pub fn set_comment(&mut self, comment: &str) -> &mut Self {
        self.set_field("COMMENT", comment)
    }

    /// Stage a picture to append after the existing ones
    pub fn add_picture(&mut self, picture: Picture) -> &mut Self {
        self.pictures.push(picture);
        self
    }

    /// Drop every existing picture on write, along with any staged ones
    pub fn clear_pictures(&mut self) -> &mut Self {
        self.clear_all_pictures = true;
        self.pictures.clear();
        self.picture_types_to_remove.clear();
        self
    }

    /// Drop existing pictures of one type on write
    pub fn remove_pictures_by_type(&mut self, picture_type: PictureType) -> &mut Self {
        self.picture_types_to_remove.insert(picture_type);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply the staged edits to the file.
    ///
    /// With `backup` set, a best-effort copy of the original is left at
    /// `<path>.bak` first; a failed backup is logged and ignored. The
    /// rewrite itself is transactional: all output goes to a `<path>.tmp`
    /// sibling which replaces the original only after a complete,
    /// successful copy.
    pub fn write(&self, backup: bool) -> Result<()> {
        if backup {
            self.create_backup();
        }

        match self.rewrite() {
            Ok(()) => {
                info!(file = %self.path.display(), "wrote FLAC metadata");
                Ok(())
            }
            Err(cause) => {
                error!(file = %self.path.display(), error = %cause, "failed to write FLAC metadata");
                Err(TagError::write_failed(self.path.clone(), cause))
            }
        }
    }

    fn create_backup(&self) {
        let backup_path = self.path.with_extension(backup_extension(&self.path));
        if let Err(e) = fs::copy(&self.path, &backup_path) {
            warn!(
                file = %self.path.display(),
                backup = %backup_path.display(),
                error = %e,
                "failed to create backup"
            );
        }
    }

    fn rewrite(&self) -> Result<()> {
        let parser = FlacParser::parse(&self.path)?;

        let mut original =
            BufReader::new(File::open(&self.path).map_err(|source| TagError::CannotOpen {
                path: self.path.clone(),
                source,
            })?);
        original.seek(SeekFrom::Start(parser.audio_start()))?;

        self.rewrite_from(&parser, &mut original)
    }

    /// Serialize the merged metadata and the audio payload into the temp
    /// sibling, then rename it over the original. Any failure removes the
    /// temp file and leaves the original untouched.
    fn rewrite_from<R: Read>(&self, parser: &FlacParser, audio: &mut R) -> Result<()> {
        let comments = self.merge_comments(parser.vorbis_comments());
        let pictures = self.merge_pictures(parser.pictures());
        let blocks = self.assemble_blocks(parser, &comments, &pictures);

        let temp_path = temp_path_for(&self.path);
        let result = self.write_temp(&temp_path, &blocks, audio);
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            TagError::Io(e)
        })?;

        Ok(())
    }

    /// Removals apply first, then staged fields overwrite, so a field in
    /// both sets ends up present.
    fn merge_comments(&self, existing: Option<&VorbisComments>) -> VorbisComments {
        let mut merged = existing.cloned().unwrap_or_default();

        for field in &self.fields_to_remove {
            merged.remove(field);
        }
        for (field, values) in &self.fields {
            merged.set(field, values.clone());
        }

        merged
    }

    /// Surviving existing pictures followed by staged additions
    fn merge_pictures(&self, existing: &[Picture]) -> Vec<Picture> {
        let mut merged: Vec<Picture> = Vec::new();

        if !self.clear_all_pictures {
            merged.extend(
                existing
                    .iter()
                    .filter(|p| !self.picture_types_to_remove.contains(&p.picture_type))
                    .cloned(),
            );
        }
        merged.extend(self.pictures.iter().cloned());

        merged
    }

    /// New block sequence: passthrough blocks in original relative order
    /// with the fresh VORBIS_COMMENT at index 1 (right after STREAMINFO)
    /// and all PICTURE blocks appended at the end.
    fn assemble_blocks(
        &self,
        parser: &FlacParser,
        comments: &VorbisComments,
        pictures: &[Picture],
    ) -> Vec<(BlockType, Vec<u8>)> {
        let mut blocks: Vec<(BlockType, Vec<u8>)> = parser
            .blocks()
            .iter()
            .filter(|b| {
                b.block_type != BlockType::VorbisComment && b.block_type != BlockType::Picture
            })
            .map(|b| (b.block_type, b.data.clone()))
            .collect();

        let insert_at = blocks.len().min(1);
        blocks.insert(insert_at, (BlockType::VorbisComment, comments.encode()));

        for picture in pictures {
            blocks.push((BlockType::Picture, picture.encode()));
        }

        blocks
    }

    fn write_temp<R: Read>(
        &self,
        temp_path: &Path,
        blocks: &[(BlockType, Vec<u8>)],
        audio: &mut R,
    ) -> Result<()> {
        let mut out = BufWriter::new(File::create(temp_path)?);

        out.write_all(FLAC_SIGNATURE)?;

        let last_index = blocks.len() - 1;
        for (index, (block_type, data)) in blocks.iter().enumerate() {
            if data.len() > MAX_BLOCK_SIZE {
                return Err(TagError::Malformed {
                    path: self.path.clone(),
                    reason: format!(
                        "{} block of {} bytes exceeds the 24-bit length field",
                        block_type.name(),
                        data.len()
                    ),
                });
            }

            let header = if index == last_index {
                0x80 | block_type.code()
            } else {
                block_type.code()
            };
            out.write_all(&[header])?;
            out.write_all(&(data.len() as u32).to_be_bytes()[1..4])?;
            out.write_all(data)?;
        }

        copy_audio(audio, &mut out)?;
        out.flush()?;

        Ok(())
    }
}

/// Stream the audio payload in fixed-size chunks
fn copy_audio<R: Read, W: Write>(from: &mut R, to: &mut W) -> Result<()> {
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    loop {
        let n = from.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        to.write_all(&buf[..n])?;
    }
}

fn render_numbered(number: u32, total: Option<u32>) -> String {
    match total {
        Some(total) => format!("{}/{}", number, total),
        None => number.to_string(),
    }
}

/// Sibling temp file path: the original name with ".tmp" appended
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn backup_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!("{}.bak", ext.to_string_lossy()),
        None => "bak".to_string(),
    }
}

/// Value-or-list argument for field setters
pub struct FieldValues(Vec<String>);

impl From<&str> for FieldValues {
    fn from(value: &str) -> Self {
        FieldValues(vec![value.to_string()])
    }
}

impl From<String> for FieldValues {
    fn from(value: String) -> Self {
        FieldValues(vec![value])
    }
}

impl From<Vec<String>> for FieldValues {
    fn from(values: Vec<String>) -> Self {
        FieldValues(values)
    }
}

impl From<Vec<&str>> for FieldValues {
    fn from(values: Vec<&str>) -> Self {
        FieldValues(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for FieldValues {
    fn from(values: &[&str]) -> Self {
        FieldValues(values.iter().map(|s| s.to_string()).collect())
    }
}
