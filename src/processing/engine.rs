//! Transform dispatch.
//!
//! Per-item compression runs inside `tokio::task::spawn_blocking` so the
//! session loop is never blocked, and reports back over the session's
//! completion channel. Whole-queue transforms are awaited by the loop itself,
//! still on the blocking pool.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::{Artifact, CompressionSettings, ItemId, PageLayout, PipelineConfig, SourceFile, Tool};
use crate::processing::pdf::PdfAssembler;
use crate::processing::raster::RasterCodec;
use crate::utils::{PipelineError, PipelineResult};

/// Re-encodes one raster image.
///
/// Must return either a complete artifact or an error, never partial output.
pub trait RasterTransform: Send + Sync {
    fn compress(&self, source: &SourceFile, settings: &CompressionSettings)
    -> PipelineResult<Artifact>;
}

/// Builds one document from an ordered batch of sources.
pub trait DocumentTransform: Send + Sync {
    fn merge(&self, sources: &[SourceFile]) -> PipelineResult<Vec<u8>>;

    fn images_to_pdf(&self, sources: &[SourceFile], layout: &PageLayout)
    -> PipelineResult<Vec<u8>>;
}

/// The three transform variants, one per tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    ImageCompress(CompressionSettings),
    PdfMerge,
    ImagesToPdf(PageLayout),
}

impl Transform {
    pub fn for_tool(tool: Tool, config: &PipelineConfig) -> Self {
        match tool {
            Tool::ImageCompression => Self::ImageCompress(config.compression.clone()),
            Tool::PdfMerge => Self::PdfMerge,
            Tool::ImagesToPdf => Self::ImagesToPdf(config.layout.clone()),
        }
    }

    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::ImageCompress(_))
    }
}

/// Result of one per-item transform, delivered to the session loop.
#[derive(Debug)]
pub struct Completion {
    pub id: ItemId,
    pub result: PipelineResult<Artifact>,
}

/// Dispatches transforms to pluggable backends.
#[derive(Clone)]
pub struct TransformEngine {
    raster: Arc<dyn RasterTransform>,
    documents: Arc<dyn DocumentTransform>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine {
    /// Engine with the `image` and `lopdf` backends.
    pub fn new() -> Self {
        Self::with_backends(Arc::new(RasterCodec), Arc::new(PdfAssembler))
    }

    pub fn with_backends(
        raster: Arc<dyn RasterTransform>,
        documents: Arc<dyn DocumentTransform>,
    ) -> Self {
        Self { raster, documents }
    }

    /// Starts compressing `source` off the loop, on `runtime`.
    ///
    /// The outcome, including a panic inside the codec, arrives on `tx` as a
    /// single [`Completion`] for `id`. Failures are reported as
    /// [`PipelineError::TransformFailed`].
    pub fn spawn_item(
        &self,
        runtime: &Handle,
        id: ItemId,
        source: SourceFile,
        settings: CompressionSettings,
        tx: mpsc::UnboundedSender<Completion>,
    ) {
        let raster = Arc::clone(&self.raster);

        runtime.spawn(async move {
            let name = source.name().to_string();
            let result =
                tokio::task::spawn_blocking(move || raster.compress(&source, &settings))
                    .await
                    .unwrap_or_else(|e| {
                        Err(PipelineError::processing(format!("Task panicked: {e}")))
                    })
                    .map_err(|e| PipelineError::TransformFailed(e.to_string()));

            if let Err(e) = &result {
                debug!("Transform of '{}' failed: {}", name, e);
            }
            if tx.send(Completion { id, result }).is_err() {
                warn!("Session gone before '{}' completed; result dropped", name);
            }
        });
    }

    /// Runs a whole-queue transform over `snapshot`.
    pub async fn run_whole_queue(
        &self,
        transform: Transform,
        snapshot: Vec<SourceFile>,
    ) -> PipelineResult<Vec<u8>> {
        let documents = Arc::clone(&self.documents);

        tokio::task::spawn_blocking(move || match transform {
            Transform::PdfMerge => documents.merge(&snapshot),
            Transform::ImagesToPdf(layout) => documents.images_to_pdf(&snapshot, &layout),
            Transform::ImageCompress(_) => Err(PipelineError::unsupported(
                "image compression runs per item, not on the whole queue",
            )),
        })
        .await
        .unwrap_or_else(|e| Err(PipelineError::processing(format!("Task panicked: {e}"))))
    }
}

impl std::fmt::Debug for TransformEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformEngine").finish_non_exhaustive()
    }
}
