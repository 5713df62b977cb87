//! Raster image re-encoding via the `image` crate.
//!
//! - [`codec`]: decode with format sniffing, format-preserving encode.
//! - [`resize`]: bounding-box downscale and page-height math.

pub mod codec;
pub mod resize;

use tracing::debug;

use crate::core::{Artifact, CompressionSettings, SourceFile};
use crate::processing::engine::RasterTransform;
use crate::utils::PipelineResult;

use self::codec::{decode, encode_within_budget};
use self::resize::fit_within;

/// Default [`RasterTransform`] backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterCodec;

impl RasterTransform for RasterCodec {
    fn compress(
        &self,
        source: &SourceFile,
        settings: &CompressionSettings,
    ) -> PipelineResult<Artifact> {
        let (image, kind) = decode(source)?;
        let image = fit_within(image, settings.max_dimension);

        let encoded =
            encode_within_budget(&image, kind, settings.quality, settings.max_output_bytes)?;

        debug!(
            "'{}' → {} bytes ({} before)",
            source.name(),
            encoded.len(),
            source.size()
        );

        Ok(Artifact::new(encoded, kind))
    }
}
