// Output formatting for the CLI

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use vorbistag::{FieldValue, MetadataReader};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// One embedded picture, as shown to the user
#[derive(Debug, Serialize)]
pub struct PictureSummary {
    #[serde(rename = "type")]
    pub picture_type: String,
    pub mime_type: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

/// The tag fields of one file, flattened for display
#[derive(Debug, Serialize)]
pub struct TagSummary {
    pub file: String,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub pictures: Vec<PictureSummary>,
}

impl TagSummary {
    pub fn from_reader(reader: &dyn MetadataReader) -> Self {
        TagSummary {
            file: reader.path().display().to_string(),
            format: reader.format().name(),
            title: reader.title().map(str::to_string),
            artist: reader.artist(),
            album: reader.album().map(str::to_string),
            genre: reader.genre().map(str::to_string),
            year: reader.year(),
            track_number: reader.track_number(),
            track_total: reader.track_total(),
            disc_number: reader.disc_number(),
            disc_total: reader.disc_total(),
            comment: reader.comment().map(str::to_string),
            pictures: reader
                .pictures()
                .iter()
                .map(|p| PictureSummary {
                    picture_type: p.picture_type.name().to_string(),
                    mime_type: p.mime_type.clone(),
                    size: p.size(),
                    width: p.width,
                    height: p.height,
                })
                .collect(),
        }
    }
}

/// Renders summaries and status lines in the selected format
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn write_summary(&self, summary: &TagSummary, writer: &mut dyn Write) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string_pretty(summary)?)?;
            }
            OutputFormat::Pretty => {
                self.write_pretty(summary, writer)?;
            }
        }
        Ok(())
    }

    fn write_pretty(&self, summary: &TagSummary, writer: &mut dyn Write) -> Result<()> {
        writeln!(writer, "{} [{}]", summary.file, summary.format)?;

        write_line(writer, "Title", summary.title.as_deref())?;
        match &summary.artist {
            Some(FieldValue::One(artist)) => write_line(writer, "Artist", Some(artist))?,
            Some(FieldValue::Many(artists)) => {
                write_line(writer, "Artist", Some(&artists.join("; ")))?
            }
            None => {}
        }
        write_line(writer, "Album", summary.album.as_deref())?;
        write_line(writer, "Genre", summary.genre.as_deref())?;
        write_line(writer, "Year", summary.year.as_deref())?;
        write_numbered(writer, "Track", summary.track_number, summary.track_total)?;
        write_numbered(writer, "Disc", summary.disc_number, summary.disc_total)?;
        write_line(writer, "Comment", summary.comment.as_deref())?;

        for picture in &summary.pictures {
            writeln!(
                writer,
                "  Picture: {} ({}, {} bytes)",
                picture.picture_type, picture.mime_type, picture.size
            )?;
        }

        Ok(())
    }

    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

fn write_line(writer: &mut dyn Write, label: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        writeln!(writer, "  {}: {}", label, value)?;
    }
    Ok(())
}

fn write_numbered(
    writer: &mut dyn Write,
    label: &str,
    number: Option<u32>,
    total: Option<u32>,
) -> Result<()> {
    match (number, total) {
        (Some(n), Some(t)) => writeln!(writer, "  {}: {}/{}", label, n, t)?,
        (Some(n), None) => writeln!(writer, "  {}: {}", label, n)?,
        _ => {}
    }
    Ok(())
}
