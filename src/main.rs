// CLI binary entry point for vorbistag

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::commands::{self, parse_field_assignment, WriteEdits};
use cli::{OutputFormat, OutputFormatter};

/// vorbistag - FLAC and Ogg Vorbis metadata tool
#[derive(Parser, Debug)]
#[command(name = "vorbistag")]
#[command(about = "Read and edit FLAC/Ogg Vorbis metadata", long_about = None)]
#[command(version)]
struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read metadata from audio file(s)
    Read {
        /// Audio file path(s)
        files: Vec<PathBuf>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write metadata fields to a FLAC file
    Write {
        /// FLAC file path
        file: PathBuf,

        /// Set a field, FIELD=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,

        /// Remove a field (repeatable)
        #[arg(short, long = "remove", value_name = "FIELD")]
        removes: Vec<String>,

        #[arg(long)]
        title: Option<String>,

        /// Artist name (repeatable for multiple artists)
        #[arg(long = "artist")]
        artists: Vec<String>,

        #[arg(long)]
        album: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        track: Option<u32>,

        #[arg(long)]
        track_total: Option<u32>,

        #[arg(long)]
        disc: Option<u32>,

        #[arg(long)]
        disc_total: Option<u32>,

        #[arg(long)]
        comment: Option<String>,

        /// Skip the .bak copy of the original
        #[arg(long)]
        no_backup: bool,
    },
    /// Apply the same field edits to every matching file in a directory
    Batch {
        /// Directory to scan
        directory: PathBuf,

        /// File name or glob pattern
        #[arg(short, long, default_value = "*.flac")]
        pattern: String,

        /// Set a field, FIELD=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,

        /// Remove a field (repeatable)
        #[arg(short, long = "remove", value_name = "FIELD")]
        removes: Vec<String>,

        /// Skip the .bak copies of the originals
        #[arg(long)]
        no_backup: bool,
    },
    /// Export embedded cover art to an image file
    ExportCover {
        /// Audio file path
        file: PathBuf,

        /// Output file or directory (defaults next to the audio file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export the nth picture instead of the front cover
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Embed an image as the front cover of a FLAC file
    SetCover {
        /// FLAC file path
        file: PathBuf,

        /// Image file (MIME type sniffed from magic bytes)
        image: PathBuf,

        /// Picture description
        #[arg(short, long)]
        description: Option<String>,

        /// Skip the .bak copy of the original
        #[arg(long)]
        no_backup: bool,
    },
    /// Remove all embedded pictures from FLAC file(s)
    RemoveCover {
        /// FLAC file path(s)
        files: Vec<PathBuf>,

        /// Skip the .bak copies of the originals
        #[arg(long)]
        no_backup: bool,
    },
    /// Show file details: size, format, stream properties, block layout
    Info {
        /// Audio file path(s)
        files: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let formatter = OutputFormatter::new(config.format, config.quiet);

    let result = match config.command {
        Commands::Read { files, output } => {
            commands::command_read(&files, output.as_deref(), &formatter)
        }
        Commands::Write {
            file,
            sets,
            removes,
            title,
            artists,
            album,
            genre,
            year,
            track,
            track_total,
            disc,
            disc_total,
            comment,
            no_backup,
        } => build_edits(sets, removes).and_then(|mut edits| {
            edits.title = title;
            edits.artists = artists;
            edits.album = album;
            edits.genre = genre;
            edits.year = year;
            edits.track = track;
            edits.track_total = track_total;
            edits.disc = disc;
            edits.disc_total = disc_total;
            edits.comment = comment;
            commands::command_write(&file, &edits, !no_backup, &formatter)
        }),
        Commands::Batch {
            directory,
            pattern,
            sets,
            removes,
            no_backup,
        } => build_edits(sets, removes).and_then(|edits| {
            commands::command_batch(&directory, &pattern, &edits, !no_backup, &formatter)
        }),
        Commands::ExportCover {
            file,
            output,
            index,
        } => commands::command_export_cover(&file, output.as_deref(), index, &formatter),
        Commands::SetCover {
            file,
            image,
            description,
            no_backup,
        } => commands::command_set_cover(
            &file,
            &image,
            description.as_deref(),
            !no_backup,
            &formatter,
        ),
        Commands::RemoveCover { files, no_backup } => {
            commands::command_remove_cover(&files, !no_backup, &formatter)
        }
        Commands::Info { files } => commands::command_info(&files, &formatter),
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        process::exit(1);
    }
}

fn build_edits(sets: Vec<String>, removes: Vec<String>) -> anyhow::Result<WriteEdits> {
    let mut edits = WriteEdits::default();
    for arg in &sets {
        edits.sets.push(parse_field_assignment(arg)?);
    }
    edits.removes = removes;
    Ok(edits)
}
