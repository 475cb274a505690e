//! PDF Range Merge CLI tool
//!
//! A command-line front end that merges page ranges from several PDFs.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

use pdf_range_merge::pdf::extract_metadata;
use pdf_range_merge::{
    FileReader, FileRef, FsReader, LopdfLibrary, MergeConfig, Merger, SlotManager, SlotRequest,
};

/// PDF Range Merge - combine page ranges from up to ten PDFs
#[derive(Parser)]
#[command(name = "pdf-range-merge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge two files completely into merged.pdf
    pdf-range-merge merge a.pdf b.pdf

    # Pages 2-4 of a.pdf, then page 1 of b.pdf
    pdf-range-merge merge -o handout.pdf a.pdf:2-4 b.pdf:1

    # From page 3 to the end, then everything up to page 5
    pdf-range-merge merge a.pdf:3- b.pdf:-5

    # Numbered files in order, first two pages of each
    pdf-range-merge merge \"[0-9]*.pdf:1-2\"")]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge page ranges from several PDFs into one
    Merge {
        /// Inputs in order, each "file.pdf" or "file.pdf:START-END".
        /// Supports glob patterns like "*.pdf:1-2"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (default: merged.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write uncompressed streams
        #[arg(long)]
        no_compress: bool,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            inputs,
            output,
            no_compress,
            open,
        } => cmd_merge(inputs, output, no_compress, open).await,
        Commands::Info { input } => cmd_info(input).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "pdf_range_merge=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse slot descriptions, expanding glob patterns in the path part
///
/// Every match of a pattern becomes its own slot with the pattern's range.
/// Matches are sorted per pattern; the order of the arguments is kept.
fn expand_slots(inputs: Vec<String>) -> Result<Vec<SlotRequest>> {
    let mut requests = Vec::new();

    for input in inputs {
        let request: SlotRequest = input.parse()?;

        if !is_pattern(&request.path) {
            requests.push(request);
            continue;
        }

        let mut matches = Vec::new();
        for entry in glob(&request.path).with_context(|| format!("Invalid pattern: {}", request.path))? {
            match entry {
                Ok(path) => matches.push(path),
                Err(e) => eprintln!("Warning: glob error for {}: {}", request.path, e),
            }
        }
        if matches.is_empty() {
            bail!("No files matched pattern: {}", request.path);
        }
        matches.sort();

        requests.extend(matches.into_iter().map(|path| SlotRequest {
            path: path.display().to_string(),
            start: request.start,
            end: request.end,
        }));
    }

    Ok(requests)
}

/// Whether a path should be glob-expanded
///
/// An existing file is taken literally even if its name has glob characters,
/// e.g. `notes [v2].pdf`.
fn is_pattern(path: &str) -> bool {
    path.contains(['*', '?', '[']) && !Path::new(path).exists()
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Merge page ranges into one PDF
async fn cmd_merge(
    inputs: Vec<String>,
    output: Option<PathBuf>,
    no_compress: bool,
    open: bool,
) -> Result<()> {
    let requests = expand_slots(inputs)?;

    let config = MergeConfig {
        compress: !no_compress,
        ..MergeConfig::default()
    };
    let slots = SlotManager::from_requests(&requests, &config)?;

    // The sequencer picks the final name; we only decide the directory
    let (dir, requested_name) = match &output {
        Some(path) => (
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        None => (PathBuf::new(), String::new()),
    };

    eprintln!("Merging {} PDF files...", slots.len());

    let mut merger = Merger::new(FsReader, LopdfLibrary::new(&config), config);
    let result = merger
        .merge(&slots, &requested_name, |progress| {
            eprintln!("[{:>3.0}%] {}", progress.percent, progress.message);
        })
        .await?;

    let path = dir.join(&result.filename);
    tokio::fs::write(&path, &result.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    eprintln!("Merged {} pages to: {}", result.page_count, path.display());

    if open {
        open_file(&path)?;
    }

    Ok(())
}

/// Show information about a PDF
async fn cmd_info(input: PathBuf) -> Result<()> {
    let file = FileRef::new(&input);
    let bytes = FsReader.read(&file).await?;
    let metadata = extract_metadata(&bytes)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Version: {}", metadata.version);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }
    if metadata.encrypted {
        println!("Encrypted: yes");
    }

    Ok(())
}
