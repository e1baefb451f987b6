//
// Copyright, 2025.  The s3namic authors.
//
//! `s3namic` command-line tool.
//!
//! Examples:
//! ```bash
//! s3namic list     data/                          # keys under data/
//! s3namic tree     data/ --files                  # nested JSON view
//! s3namic upload   'local/*.csv' data/ -c gzip    # one or more files
//! s3namic download data/a.csv ./a.csv
//! s3namic url      data/a.csv --expires 15m
//! s3namic cat      data/a.csv.gz
//! s3namic cat      legacy/report.csv -e cp949
//! s3namic read-many data/ --workers 8 --contains 2024
//!
//! # Other backends
//! s3namic --store file:///tmp/bucket list
//! s3namic --store mem:// list
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use encoding_rs::Encoding;

use s3namic::constants::{ENV_BUCKET, SCHEME_S3};
use s3namic::{
    encoding_for_label, store_for_uri, Compression, Document, FileFormat, ReadManyOptions,
    ReadOptions, S3namic,
};

/// Macro to safely print with broken pipe handling
macro_rules! safe_println {
    ($($arg:tt)*) => {
        match writeln!(io::stdout(), $($arg)*) {
            Ok(_) => {},
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                // Gracefully exit on broken pipe (e.g., when piped to head/tail)
                std::process::exit(0);
            }
            Err(e) => return Err(e.into())
        }
    };
}

// -- Commands

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short = 'v',
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    /// Store URI: s3://bucket, file:///dir or mem://. Defaults to s3://$S3NAMIC_BUCKET.
    #[arg(long, value_name = "URI")]
    store: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List keys that start with the given prefix.
    List {
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Print the keys under a prefix as a nested JSON tree.
    Tree {
        #[arg(default_value = "")]
        prefix: String,

        /// Include file leaves, not only directories.
        #[arg(long)]
        files: bool,
    },

    /// Find the first key matching a name.
    Find {
        name: String,

        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Match the full key or file name exactly instead of by substring.
        #[arg(long)]
        exact: bool,
    },

    /// Upload local files. Glob patterns are expanded; with several files (or
    /// a KEY ending in `/`) each file lands under KEY by its file name.
    Upload {
        local: String,
        key: String,

        #[arg(short, long, default_value = "none")]
        compression: Compression,
    },

    /// Download one object to a local path.
    Download { key: String, local: PathBuf },

    /// Delete one object.
    Delete { key: String },

    /// Print a presigned GET URL.
    Url {
        key: String,

        /// Validity, e.g. `3600`, `15m`, `2h`.
        #[arg(short, long, value_parser = parse_expiry)]
        expires: Option<Duration>,
    },

    /// Decode an object and print it.
    Cat {
        key: String,

        /// Override the extension-based format (csv, json, pickle, text, parquet, excel).
        #[arg(short, long)]
        format: Option<FileFormat>,

        /// Character encoding of text, CSV and JSON objects (e.g. utf-8, euc-kr, cp949).
        #[arg(short, long, default_value = "utf-8", value_parser = parse_encoding)]
        encoding: &'static Encoding,
    },

    /// Write a compressed copy of an object next to it.
    Compress {
        key: String,

        #[arg(short, long, default_value = "gzip")]
        compression: Compression,
    },

    /// Write a decompressed copy of a `.gz` / `.bz2` object.
    Decompress { key: String },

    /// Read and decode every object under a prefix in parallel.
    ReadMany {
        prefix: String,

        #[arg(short, long)]
        format: Option<FileFormat>,

        /// Worker threads (defaults to the number of CPUs).
        #[arg(short = 'j', long)]
        workers: Option<usize>,

        /// Only keys containing this substring.
        #[arg(long)]
        contains: Option<String>,
    },
}

/// Plain seconds or a humantime duration (`90s`, `15m`, `1h 30m`).
fn parse_expiry(s: &str) -> Result<Duration> {
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).with_context(|| format!("invalid expiry '{s}'"))
}

fn parse_encoding(s: &str) -> Result<&'static Encoding> {
    Ok(encoding_for_label(s)?)
}

fn open(store: Option<String>) -> Result<S3namic> {
    let uri = match store {
        Some(uri) => uri,
        None => match std::env::var(ENV_BUCKET) {
            Ok(bucket) if !bucket.is_empty() => format!("{SCHEME_S3}{bucket}"),
            _ => bail!("no store given: pass --store or set {ENV_BUCKET}"),
        },
    };
    info!("Using store {}", uri);
    Ok(S3namic::with_store(store_for_uri(&uri)?))
}

/// Expand a local path argument, treating `*`, `?` and `[` as glob syntax.
fn expand_local(pattern: &str) -> Result<Vec<PathBuf>> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(pattern)]);
    }
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("Glob error: {}", e),
        }
    }
    if paths.is_empty() {
        bail!("no files match '{pattern}'");
    }
    Ok(paths)
}

fn print_document(doc: &Document) -> Result<()> {
    match doc {
        Document::Text(s) => safe_println!("{s}"),
        Document::Json(v) => safe_println!("{}", serde_json::to_string_pretty(v)?),
        Document::Table(t) => {
            safe_println!("{}", t.headers.join("\t"));
            for row in &t.rows {
                safe_println!("{}", row.join("\t"));
            }
        }
        Document::Pickle(v) => safe_println!("{v:?}"),
        Document::Parquet(batches) => {
            let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
            if let Some(first) = batches.first() {
                let schema = first.schema();
                let fields: Vec<String> = schema
                    .fields()
                    .iter()
                    .map(|f| format!("{}: {}", f.name(), f.data_type()))
                    .collect();
                safe_println!("schema: {}", fields.join(", "));
            }
            safe_println!("batches: {}, rows: {}", batches.len(), rows);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Loads any variables from .env file that are not already set
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",        // no -v: WARN level
        1 => "info",        // -v: INFO level
        _ => "debug",       // -vv or more: DEBUG level
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let s3 = open(cli.store)?;

    match cli.cmd {
        Command::List { prefix } => {
            for key in s3.list_files(&prefix)? {
                safe_println!("{key}");
            }
        }

        Command::Tree { prefix, files } => {
            let tree = s3.make_tree(&prefix, files)?;
            safe_println!("{}", serde_json::to_string_pretty(&tree)?);
        }

        Command::Find { name, prefix, exact } => match s3.find_file(&name, &prefix, !exact)? {
            Some(key) => safe_println!("{key}"),
            None => bail!("no key matching '{name}' under '{prefix}'"),
        },

        Command::Upload { local, key, compression } => {
            let files = expand_local(&local)?;
            let into_dir = files.len() > 1 || key.ends_with('/');
            let t0 = Instant::now();
            for path in &files {
                let target = if into_dir {
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .with_context(|| format!("no file name in {}", path.display()))?;
                    format!("{}/{}", key.trim_end_matches('/'), name)
                } else {
                    key.clone()
                };
                let written = s3.upload(&target, path.clone().into(), compression)?;
                safe_println!("{} -> {}", path.display(), written);
            }
            info!("Uploaded {} file(s) in {:?}", files.len(), t0.elapsed());
        }

        Command::Download { key, local } => {
            s3.download_file(&key, &local)?;
            info!("Downloaded {} to {}", key, local.display());
        }

        Command::Delete { key } => {
            s3.delete_file(&key)?;
            info!("Deleted {}", key);
        }

        Command::Url { key, expires } => {
            safe_println!("{}", s3.get_file_url(&key, expires)?);
        }

        Command::Cat { key, format, encoding } => {
            let doc = s3.read_auto(&key, format, &ReadOptions::default().encoding(encoding))?;
            print_document(&doc)?;
        }

        Command::Compress { key, compression } => {
            safe_println!("{}", s3.compress(&key, compression)?);
        }

        Command::Decompress { key } => {
            safe_println!("{}", s3.decompress(&key)?);
        }

        Command::ReadMany { prefix, format, workers, contains } => {
            let mut opts = ReadManyOptions::with_available_parallelism();
            if let Some(n) = workers {
                opts = opts.workers(n);
            }
            if let Some(f) = format {
                opts = opts.format(f);
            }
            if let Some(c) = contains {
                opts = opts.name_contains(c);
            }
            let t0 = Instant::now();
            let docs = s3.read_thread(&prefix, &opts)?;
            info!("Read {} object(s) with {} workers in {:?}", docs.len(), opts.workers, t0.elapsed());
            for doc in &docs {
                print_document(doc)?;
            }
        }
    }

    Ok(())
}
