// Entry point for the file-toolkit CLI.
// The library crate carries the pipeline; this binary only parses arguments,
// sets up logging and reports the run.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use file_toolkit_lib::commands::run_tool;
use file_toolkit_lib::core::{PipelineConfig, Tool};
use file_toolkit_lib::utils::load_config;

#[derive(Parser)]
#[command(name = "file-toolkit", version, about = "Compress images, merge PDFs and turn images into a PDF")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for output files
    #[arg(short, long, global = true, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress each image, writing compressed-<name> per file
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Merge PDFs in the given order into merged.pdf
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Place each image on its own page of images.pdf
    ImagesToPdf {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Command {
    fn into_parts(self) -> (Tool, Vec<PathBuf>) {
        match self {
            Self::Compress { files } => (Tool::ImageCompression, files),
            Self::Merge { files } => (Tool::PdfMerge, files),
            Self::ImagesToPdf { files } => (Tool::ImagesToPdf, files),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let (tool, files) = cli.command.into_parts();
    info!("=== {} ===", tool.label());

    let summary = run_tool(tool, &files, &cli.out_dir, config)
        .await
        .with_context(|| format!("{} failed", tool.label()))?;

    for path in &summary.written {
        println!("{}", path.display());
    }
    info!(
        "{} file(s) written, {} skipped, {} → {} bytes",
        summary.written.len(),
        summary.rejected.len(),
        summary.input_bytes,
        summary.output_bytes
    );

    if !summary.is_success() {
        for failure in &summary.failed {
            warn!("'{}' failed: {}", failure.name, failure.error);
        }
        bail!("{} item(s) failed", summary.failed.len());
    }
    Ok(())
}
