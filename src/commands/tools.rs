//! Command handlers that drive a tool session from files on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{OutputMode, PipelineConfig, Progress, SourceFile, Tool, ToolSession};
use crate::utils::{PipelineError, PipelineResult, Rejection, read_source_file};

/// An input that could not be read, or a queued item whose transform ended
/// in `Error`.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub name: String,
    pub error: String,
}

/// What one command run produced.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Output files written, in queue order
    pub written: Vec<PathBuf>,
    /// Inputs that never entered the queue
    pub rejected: Vec<Rejection>,
    /// Inputs that could not be read, and items whose transform failed
    pub failed: Vec<ItemFailure>,
    /// Bytes read from accepted inputs
    pub input_bytes: u64,
    /// Bytes written
    pub output_bytes: u64,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs `tool` over `paths` and writes its outputs into `out_dir`.
///
/// # Arguments
/// * `tool` - The tool to activate
/// * `paths` - Input files, in the order they should be queued
/// * `out_dir` - Directory for outputs; created if missing
/// * `config` - Validated pipeline configuration
///
/// # Returns
/// A [`RunSummary`]. A failed commit is returned as
/// [`PipelineError::CommitFailed`]; per-item failures are listed in the summary.
pub async fn run_tool(
    tool: Tool,
    paths: &[PathBuf],
    out_dir: &Path,
    config: PipelineConfig,
) -> PipelineResult<RunSummary> {
    match tool.output_mode() {
        OutputMode::PerItem => compress_images(paths, out_dir, config).await,
        OutputMode::WholeQueue => commit_documents(tool, paths, out_dir, config).await,
    }
}

/// Compresses every image in `paths`, writing `compressed-<name>` for each
/// one that succeeds.
///
/// A file that cannot be read, decoded or encoded is reported in
/// [`RunSummary::failed`] and does not affect its siblings.
pub async fn compress_images(
    paths: &[PathBuf],
    out_dir: &Path,
    config: PipelineConfig,
) -> PipelineResult<RunSummary> {
    let mut summary = RunSummary::default();
    let files = read_sources(paths, &mut summary).await;
    let mut session = ToolSession::activate(Tool::ImageCompression, config);

    let outcome = session.ingest(files);
    summary.rejected = outcome.rejected;
    info!(
        "Compressing {} images ({} rejected)",
        outcome.accepted.len(),
        summary.rejected.len()
    );

    while session.next_completion().await.is_some() {
        log_progress(&session.progress());
    }

    for item in session.items() {
        summary.input_bytes += item.original_size();
        if let Some(error) = item.status().error() {
            summary.failed.push(ItemFailure {
                name: item.name().to_string(),
                error: error.to_string(),
            });
        }
    }

    for artifact in session.downloads() {
        let path = artifact.write_to(out_dir).await?;
        summary.output_bytes += artifact.size();
        debug!("Wrote {}", path.display());
        summary.written.push(path);
    }

    session.deactivate();
    Ok(summary)
}

/// Queues `paths` for a whole-queue tool and commits once.
///
/// # Returns
/// The summary with the single committed file, or
/// [`PipelineError::CommitFailed`] if any queued input cannot be used. Nothing
/// is written on failure. Paths that cannot be read are skipped and listed in
/// [`RunSummary::failed`].
pub async fn commit_documents(
    tool: Tool,
    paths: &[PathBuf],
    out_dir: &Path,
    config: PipelineConfig,
) -> PipelineResult<RunSummary> {
    if tool.output_mode() != OutputMode::WholeQueue {
        return Err(PipelineError::unsupported(format!("{tool} has no commit step")));
    }

    let mut summary = RunSummary::default();
    let files = read_sources(paths, &mut summary).await;
    let mut session = ToolSession::activate(tool, config);

    let outcome = session.ingest(files);
    summary.rejected = outcome.rejected;
    summary.input_bytes = session.items().iter().map(|item| item.original_size()).sum();
    info!("{}: {} files queued", tool, session.len());

    let artifact = session.commit().await?;
    let path = artifact.write_to(out_dir).await?;
    summary.output_bytes = artifact.size();
    summary.written.push(path);

    session.deactivate();
    Ok(summary)
}

async fn read_sources(paths: &[PathBuf], summary: &mut RunSummary) -> Vec<SourceFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match read_source_file(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.failed.push(ItemFailure {
                    name: path.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    files
}

fn log_progress(progress: &Progress) {
    if progress.failed_tasks > 0 {
        warn!(
            "Progress: {}% ({} done, {} failed of {})",
            progress.progress_percentage,
            progress.completed_tasks,
            progress.failed_tasks,
            progress.total_tasks
        );
    } else {
        info!(
            "Progress: {}% ({}/{})",
            progress.progress_percentage, progress.completed_tasks, progress.total_tasks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, RgbImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, image::Rgb([200, 10, 10])));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();

        let path = dir.join(name);
        std::fs::write(&path, buf.into_inner()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_compress_writes_prefixed_outputs_and_isolates_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let good = write_png(input.path(), "good.png");
        let bad = input.path().join("bad.png");
        std::fs::write(&bad, b"not a png").unwrap();
        let text = input.path().join("notes.txt");
        std::fs::write(&text, b"hello").unwrap();

        let summary = compress_images(&[good, bad, text], output.path(), PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.written, vec![output.path().join("compressed-good.png")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "bad.png");
        assert_eq!(summary.rejected.len(), 1);
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn test_images_to_pdf_writes_single_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let paths = vec![write_png(input.path(), "a.png"), write_png(input.path(), "b.png")];

        let summary = run_tool(Tool::ImagesToPdf, &paths, output.path(), PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.written, vec![output.path().join("images.pdf")]);
        assert!(summary.is_success());
        assert!(summary.output_bytes > 0);
    }

    #[tokio::test]
    async fn test_unreadable_input_is_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let missing = input.path().join("missing.png");
        let paths = vec![
            missing.clone(),
            input.path().to_path_buf(),
            write_png(input.path(), "a.png"),
            write_png(input.path(), "b.png"),
        ];

        let summary = run_tool(Tool::ImagesToPdf, &paths, output.path(), PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.written, vec![output.path().join("images.pdf")]);
        let failed: Vec<&str> = summary.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            failed,
            [missing.display().to_string(), input.path().display().to_string()]
        );
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let broken = input.path().join("broken.pdf");
        std::fs::write(&broken, b"%PDF-1.5 garbage").unwrap();

        let result = commit_documents(
            Tool::PdfMerge,
            &[broken],
            output.path(),
            PipelineConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(PipelineError::CommitFailed(_))));
        assert!(!output.path().join("merged.pdf").exists());
    }

    #[tokio::test]
    async fn test_commit_with_no_accepted_files_is_empty_queue() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let png = write_png(input.path(), "a.png");

        let result =
            commit_documents(Tool::PdfMerge, &[png], output.path(), PipelineConfig::default()).await;

        assert!(matches!(result, Err(PipelineError::EmptyQueue)));
    }
}
