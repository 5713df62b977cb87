//! Transforms and the ingestion boundary.

pub mod engine;
pub mod ingest;
pub mod pdf;
pub mod raster;

pub use engine::{Completion, DocumentTransform, RasterTransform, Transform, TransformEngine};
pub use ingest::{FileIngestor, IngestReport};
pub use pdf::PdfAssembler;
pub use raster::RasterCodec;
