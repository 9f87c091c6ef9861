use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use png_stamp::config::Config;
use png_stamp::metadata::{MetadataKeyValue, MetadataReader, MetadataWriter, RawMetadata};

#[derive(Parser, Debug)]
#[command(
    name = "png-stamp",
    version,
    about = "Read and write key/value metadata stored inside PNG files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (default: png-stamp.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Initialize a default config file and exit
    #[arg(long)]
    init: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the metadata stored in PNG files
    Show {
        /// PNG files or directories to scan
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or replace entries in an existing PNG
    Set {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Entries as KEY=VALUE
        #[arg(value_name = "KEY=VALUE", required = true)]
        entries: Vec<String>,
    },
    /// List the raw text chunks in a PNG header
    Chunks {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only show chunks whose keyword contains this (repeatable)
        #[arg(short, long)]
        filter: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("No command given. Use --help for usage.");
    };

    let config = Config::load(cli.config.as_deref())?;

    match command {
        Command::Show { paths, json } => show(&config, &paths, json),
        Command::Set { file, entries } => set(&config, &file, &entries),
        Command::Chunks { file, filter } => chunks(&config, &file, &filter),
    }
}

fn show(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let images = collect_pngs(paths);
    if images.is_empty() {
        anyhow::bail!("No PNG files found in the specified paths.");
    }

    let reader = MetadataReader::new(config);
    let mut results = Vec::new();

    for path in &images {
        match reader.read(path) {
            Ok(raw) => {
                if !json {
                    println!("{}", path.display());
                    if raw.is_empty() {
                        println!("  (no metadata)");
                    }
                    for item in &raw {
                        println!("  {} = {}", item.key, item.write_value());
                    }
                }
                results.push(serde_json::json!({
                    "path": path.display().to_string(),
                    "metadata": raw
                        .iter()
                        .map(|r| (r.key.clone(), r.value.clone()))
                        .collect::<serde_json::Map<_, _>>(),
                    "error": null,
                }));
            }
            Err(e) => {
                log::error!("{}: {e}", path.display());
                results.push(serde_json::json!({
                    "path": path.display().to_string(),
                    "metadata": null,
                    "error": e.to_string(),
                }));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn set(config: &Config, file: &Path, entries: &[String]) -> Result<()> {
    let updates = entries
        .iter()
        .map(|entry| parse_entry(entry))
        .collect::<Result<Vec<_>>>()?;

    let mut stored = MetadataReader::new(config)
        .read(file)
        .with_context(|| format!("Failed to read metadata from {}", file.display()))?;

    for update in updates {
        match stored.iter_mut().find(|r| r.key == update.key) {
            Some(existing) => existing.value = update.value,
            None => stored.push(update),
        }
    }

    let pairs: Vec<MetadataKeyValue> = stored.into_iter().map(Into::into).collect();
    MetadataWriter::new(config)
        .update_existing(file, &pairs)
        .with_context(|| format!("Failed to update {}", file.display()))?;
    log::info!("{}: {} entries stored", file.display(), pairs.len());
    Ok(())
}

fn chunks(config: &Config, file: &Path, filters: &[String]) -> Result<()> {
    let filters: Vec<&str> = filters.iter().map(String::as_str).collect();
    let found = MetadataReader::new(config)
        .read_text_chunks(file, &filters)
        .with_context(|| format!("Failed to read chunks from {}", file.display()))?;

    for chunk in &found {
        println!("{}: {}", chunk.key, chunk.write_value());
    }
    Ok(())
}

/// `KEY=VALUE`. A value that parses as JSON is stored as JSON, anything else as a string.
fn parse_entry(entry: &str) -> Result<RawMetadata> {
    let (key, value) = entry
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got {entry:?}"))?;
    if key.is_empty() {
        anyhow::bail!("Empty key in {entry:?}");
    }
    let value: serde_json::Value =
        serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::from(value));
    Ok(RawMetadata::new(key, value))
}

/// PNG files named by `paths`; directories are searched recursively.
fn collect_pngs(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                log::warn!("Path does not exist: {}", path.display());
            }
            exists
        })
        .flat_map(|path| WalkDir::new(path).follow_links(true))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_png(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
