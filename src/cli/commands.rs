// CLI command implementations

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use glob::glob;

use vorbistag::flac::picture::sniff_mime_type;
use vorbistag::{FileFormat, FlacReader, FlacWriter, MetadataReader, Picture};

use crate::cli::output::{OutputFormatter, TagSummary};

/// Read and print tag summaries for one or more files
pub fn command_read(
    files: &[PathBuf],
    output: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    if files.is_empty() {
        bail!("no files specified");
    }

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let mut failures = 0;
    for path in files {
        match vorbistag::open(path) {
            Ok(reader) => {
                let summary = TagSummary::from_reader(reader.as_ref());
                formatter.write_summary(&summary, &mut *writer)?;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", path.display(), e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} file(s) could not be read", failures);
    }
    Ok(())
}

/// Field edits staged from command-line flags
#[derive(Debug, Default)]
pub struct WriteEdits {
    pub sets: Vec<(String, String)>,
    pub removes: Vec<String>,
    pub title: Option<String>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub disc: Option<u32>,
    pub disc_total: Option<u32>,
    pub comment: Option<String>,
}

impl WriteEdits {
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
            && self.removes.is_empty()
            && self.title.is_none()
            && self.artists.is_empty()
            && self.album.is_none()
            && self.genre.is_none()
            && self.year.is_none()
            && self.track.is_none()
            && self.disc.is_none()
            && self.comment.is_none()
    }

    /// A total only renders as part of `n/total`, so it needs its number
    pub fn validate(&self) -> Result<()> {
        if self.track_total.is_some() && self.track.is_none() {
            bail!("--track-total requires --track");
        }
        if self.disc_total.is_some() && self.disc.is_none() {
            bail!("--disc-total requires --disc");
        }
        Ok(())
    }

    fn apply(&self, writer: &mut FlacWriter) {
        for field in &self.removes {
            writer.remove_field(field);
        }
        for (field, value) in &self.sets {
            writer.set_field(field, value.as_str());
        }
        if let Some(title) = &self.title {
            writer.set_title(title);
        }
        if !self.artists.is_empty() {
            writer.set_artist(self.artists.clone());
        }
        if let Some(album) = &self.album {
            writer.set_album(album);
        }
        if let Some(genre) = &self.genre {
            writer.set_genre(genre);
        }
        if let Some(year) = &self.year {
            writer.set_year(year);
        }
        if let Some(track) = self.track {
            writer.set_track_number(track, self.track_total);
        }
        if let Some(disc) = self.disc {
            writer.set_disc_number(disc, self.disc_total);
        }
        if let Some(comment) = &self.comment {
            writer.set_comment(comment);
        }
    }
}

/// Split a `FIELD=VALUE` argument on the first equals sign
pub fn parse_field_assignment(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.to_string(), value.to_string()))
        }
        _ => Err(anyhow!("expected FIELD=VALUE, got {:?}", arg)),
    }
}

/// Apply field edits to one FLAC file
pub fn command_write(
    file: &Path,
    edits: &WriteEdits,
    backup: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    edits.validate()?;
    if edits.is_empty() {
        bail!("no edits specified");
    }
    ensure_flac(file)?;

    let mut writer = FlacWriter::new(file);
    edits.apply(&mut writer);
    writer.write(backup)?;

    formatter.print_success(&format!("updated {}", file.display()));
    Ok(())
}

/// Apply the same edits to every matching file under a directory
pub fn command_batch(
    directory: &Path,
    pattern: &str,
    edits: &WriteEdits,
    backup: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    edits.validate()?;
    if edits.is_empty() {
        bail!("no edits specified");
    }

    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory.display(), pattern)
    } else {
        format!("{}/**/{}", directory.display(), pattern)
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in glob(&glob_pattern).context("invalid glob pattern")? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => formatter.print_error(&format!("cannot read path: {}", e)),
        }
    }

    if files.is_empty() {
        formatter.print_info("no files matched the pattern");
        return Ok(());
    }
    formatter.print_info(&format!("processing {} file(s)", files.len()));

    let mut succeeded = 0;
    let mut failed = 0;
    for path in &files {
        let result = ensure_flac(path).and_then(|_| {
            let mut writer = FlacWriter::new(path);
            edits.apply(&mut writer);
            writer.write(backup).map_err(Into::into)
        });
        match result {
            Ok(()) => {
                formatter.print_success(&path.display().to_string());
                succeeded += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", path.display(), e));
                failed += 1;
            }
        }
    }

    formatter.print_info(&format!("done: {} updated, {} failed", succeeded, failed));
    if failed > 0 {
        bail!("{} file(s) failed", failed);
    }
    Ok(())
}

/// Write the front cover (or the nth picture) out as an image file
pub fn command_export_cover(
    file: &Path,
    output: Option<&Path>,
    index: Option<usize>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let reader = vorbistag::open(file)?;

    let picture = match index {
        Some(i) => reader
            .pictures()
            .get(i)
            .ok_or_else(|| anyhow!("{} has no picture at index {}", file.display(), i))?,
        None => reader
            .front_cover()
            .ok_or_else(|| anyhow!("{} has no embedded pictures", file.display()))?,
    };

    let target = match output {
        Some(path) if path.is_dir() => {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "cover".to_string());
            path.join(format!("{}.{}", stem, picture.extension()))
        }
        Some(path) => path.to_path_buf(),
        None => file.with_extension(picture.extension()),
    };

    fs::write(&target, &picture.data)
        .with_context(|| format!("writing {}", target.display()))?;
    formatter.print_success(&format!(
        "exported {} ({} bytes) to {}",
        picture.mime_type,
        picture.size(),
        target.display()
    ));
    Ok(())
}

/// Embed an image as the front cover, replacing any existing front cover
pub fn command_set_cover(
    file: &Path,
    image: &Path,
    description: Option<&str>,
    backup: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    ensure_flac(file)?;

    let data = fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    if data.is_empty() {
        bail!("{} is empty", image.display());
    }
    let mime = sniff_mime_type(&data).to_string();
    let picture = Picture::new(data, mime, description.unwrap_or_default().to_string());

    let mut writer = FlacWriter::new(file);
    writer.remove_pictures_by_type(picture.picture_type);
    writer.add_picture(picture);
    writer.write(backup)?;

    formatter.print_success(&format!("set cover for {}", file.display()));
    Ok(())
}

/// Strip all embedded pictures from the given files
pub fn command_remove_cover(
    files: &[PathBuf],
    backup: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    if files.is_empty() {
        bail!("no files specified");
    }

    for file in files {
        ensure_flac(file)?;
        let mut writer = FlacWriter::new(file);
        writer.clear_pictures();
        writer.write(backup)?;
        formatter.print_success(&format!("removed pictures from {}", file.display()));
    }
    Ok(())
}

/// Show file-level details: size, mtime, format, stream properties
pub fn command_info(files: &[PathBuf], formatter: &OutputFormatter) -> Result<()> {
    if files.is_empty() {
        bail!("no files specified");
    }

    for path in files {
        let stat = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;

        println!("{}", path.display());
        println!("  Size: {} bytes", stat.len());
        if let Ok(mtime) = stat.modified() {
            let datetime: chrono::DateTime<chrono::Utc> = mtime.into();
            println!("  Modified: {}", datetime.format("%Y-%m-%d %H:%M:%S UTC"));
        }

        match FileFormat::detect(path) {
            Ok(format) => {
                println!("  Format: {}", format.name());
                if format == FileFormat::Flac {
                    print_flac_details(path, formatter);
                }
            }
            Err(e) => formatter.print_error(&format!("{}: {}", path.display(), e)),
        }
    }
    Ok(())
}

fn print_flac_details(path: &Path, formatter: &OutputFormatter) {
    let reader = match FlacReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            formatter.print_error(&format!("{}: {}", path.display(), e));
            return;
        }
    };

    if let Some(info) = reader.stream_info() {
        println!(
            "  Stream: {} Hz, {} channel(s), {} bits",
            info.sample_rate, info.channels, info.bits_per_sample
        );
        if info.sample_rate > 0 && info.total_samples > 0 {
            let seconds = info.total_samples as f64 / f64::from(info.sample_rate);
            println!("  Duration: {:.1}s", seconds);
        }
    }

    println!("  Metadata blocks:");
    for block in reader.metadata_blocks() {
        println!("    {} ({} bytes)", block.block_type.name(), block.data.len());
    }
}

/// Writing is FLAC-only; reject other containers up front
fn ensure_flac(path: &Path) -> Result<()> {
    match FileFormat::detect(path)? {
        FileFormat::Flac => Ok(()),
        other => bail!(
            "{}: writing {} files is not supported",
            path.display(),
            other.name()
        ),
    }
}
