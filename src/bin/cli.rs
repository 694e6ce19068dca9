//! SerialTable CLI
//!
//! Inspect container files and segment directories without knowing the row
//! type at compile time.

use std::path::PathBuf;
use std::process;

use chrono::DateTime;
use clap::{Parser, Subcommand};
use serialtable::archive::{self, SegmentCatalog};
use serialtable::{RawContainer, Result, TimeRange};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::{fmt, EnvFilter};

/// SerialTable CLI
#[derive(Parser, Debug)]
#[command(name = "serialtable-cli")]
#[command(about = "Inspect SerialTable containers and segments")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the header of a container
    Info {
        /// Container file (.sbt)
        file: PathBuf,
    },

    /// Print rows of a container as a table
    Dump {
        /// Container file (.sbt)
        file: PathBuf,

        /// First row to print
        #[arg(short, long, default_value = "0")]
        start: u64,

        /// Number of rows to print
        #[arg(short, long, default_value = "20")]
        count: u64,
    },

    /// List the segments of a table, one line per segment
    Segments {
        /// Segment directory
        dir: PathBuf,

        /// Segment filename prefix
        prefix: String,

        /// Only segments stamped at or after this unix time
        #[arg(long)]
        from: Option<i64>,

        /// Only segments stamped before this unix time
        #[arg(long)]
        to: Option<i64>,
    },

    /// gzip a container into <file>.gz and remove the original
    Compress {
        /// Container file (.sbt)
        file: PathBuf,
    },

    /// Decompress an archived container
    Decompress {
        /// Archive (.sbt.gz)
        file: PathBuf,

        /// Output path (default: <file> with .gz replaced by .decompressed)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,serialtable=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Info { file } => info(file),
        Commands::Dump { file, start, count } => dump(file, start, count),
        Commands::Segments {
            dir,
            prefix,
            from,
            to,
        } => segments(dir, prefix, from, to),
        Commands::Compress { file } => {
            let archive = archive::gzip_file(&file)?;
            std::fs::remove_file(&file)
                .map_err(serialtable::TableError::io(format!("removing {}", file.display())))?;
            println!("{}", archive.display());
            Ok(())
        }
        Commands::Decompress { file, output } => {
            let output = output.unwrap_or_else(|| archive::decompressed_path(&file));
            let bytes = archive::gunzip_file(&file, &output)?;
            println!("{} ({} bytes)", output.display(), bytes);
            Ok(())
        }
    }
}

fn info(file: PathBuf) -> Result<()> {
    let container = RawContainer::open(&file)?;
    let header = container.header();

    let mut builder = Builder::default();
    builder.push_record(["File".to_string(), file.display().to_string()]);
    builder.push_record(["Version".to_string(), header.flags.to_string()]);
    builder.push_record(["Schema hash".to_string(), format!("{:016x}", header.hash)]);
    builder.push_record(["Row size".to_string(), header.spec.row_size().to_string()]);
    builder.push_record(["Content offset".to_string(), header.content_offset().to_string()]);
    builder.push_record(["Rows".to_string(), container.num_rows().to_string()]);
    builder.push_record(["Size".to_string(), container.size().to_string()]);
    builder.push_record(["Columns".to_string(), header.spec.to_string()]);

    let mut table = builder.build();
    table.with(Style::ascii());
    println!("{}", table);
    Ok(())
}

fn dump(file: PathBuf, start: u64, count: u64) -> Result<()> {
    let container = RawContainer::open(&file)?;

    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(container.row_spec().iter().map(|c| c.to_string()));
    builder.push_record(header);

    for (i, row) in container.read_rows(start, count)?.into_iter().enumerate() {
        let mut record = vec![(start + i as u64).to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::ascii());
    println!("{}", table);
    println!("{} of {} rows", count.min(container.num_rows().saturating_sub(start)), container.num_rows());
    Ok(())
}

fn segments(dir: PathBuf, prefix: String, from: Option<i64>, to: Option<i64>) -> Result<()> {
    let catalog = SegmentCatalog::new(dir, prefix);
    let range = TimeRange {
        start: from.and_then(|s| DateTime::from_timestamp(s, 0)),
        end: to.and_then(|s| DateTime::from_timestamp(s, 0)),
    };

    let mut builder = Builder::default();
    builder.push_record(["Segment", "Form", "Timestamp", "File"].map(String::from));
    for entry in catalog.iterable(&range)? {
        builder.push_record([
            entry.name.to_string(),
            format!("{:?}", entry.form),
            entry.name.timestamp().to_rfc3339(),
            entry.path.display().to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::ascii());
    println!("{}", table);
    Ok(())
}
