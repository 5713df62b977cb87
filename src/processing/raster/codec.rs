//! Decode and format-preserving encode helpers built on the `image` crate.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use tracing::debug;

use crate::core::SourceFile;
use crate::utils::{FileKind, PipelineError, PipelineResult};

/// Quality decrement applied while chasing an output byte budget.
const QUALITY_STEP: u8 = 10;
/// Lowest quality the budget loop will go to.
const QUALITY_FLOOR: u8 = 30;

/// Decodes `source`, sniffing the real format from its bytes.
///
/// Empty input and formats outside PNG/JPEG/WebP are format errors.
pub fn decode(source: &SourceFile) -> PipelineResult<(DynamicImage, FileKind)> {
    if source.is_empty() {
        return Err(PipelineError::format(format!("'{}' is empty", source.name())));
    }

    let sniffed = image::guess_format(source.bytes()).map_err(|e| {
        PipelineError::format(format!("Cannot identify '{}': {e}", source.name()))
    })?;
    let kind = FileKind::from_image_format(sniffed)?;

    let image = image::load_from_memory_with_format(source.bytes(), sniffed).map_err(|e| {
        PipelineError::format(format!("Failed to decode '{}': {e}", source.name()))
    })?;

    debug!("Decoded '{}': {}×{} {}", source.name(), image.width(), image.height(), kind);
    Ok((image, kind))
}

/// Encodes `image` as `kind`.
///
/// JPEG honours `quality`; PNG uses maximum deflate effort; WebP is encoded
/// losslessly since the encoder has no lossy mode.
pub fn encode(image: &DynamicImage, kind: FileKind, quality: u8) -> PipelineResult<Vec<u8>> {
    let mut buf = Vec::new();

    match kind {
        FileKind::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        FileKind::Png => {
            image.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                PngFilter::Adaptive,
            ))?;
        }
        FileKind::WebP => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
        FileKind::Pdf => {
            return Err(PipelineError::unsupported("PDF is not a raster output format"));
        }
    }

    Ok(buf)
}

/// Encodes `image`, stepping lossy quality down until the result fits
/// `budget` or the quality floor is reached.
///
/// The last encode is returned even when it is still over budget.
pub fn encode_within_budget(
    image: &DynamicImage,
    kind: FileKind,
    quality: u8,
    budget: Option<u64>,
) -> PipelineResult<Vec<u8>> {
    let mut quality = quality;
    let mut encoded = encode(image, kind, quality)?;

    let Some(budget) = budget else {
        return Ok(encoded);
    };

    while kind == FileKind::Jpeg && encoded.len() as u64 > budget && quality > QUALITY_FLOOR {
        quality = quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
        debug!("Output {} bytes over {} byte budget, retrying at q={}", encoded.len(), budget, quality);
        encoded = encode(image, kind, quality)?;
    }

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        }))
    }

    #[test]
    fn test_encode_preserves_format_family() {
        let image = gradient(16, 16);
        for kind in [FileKind::Png, FileKind::Jpeg, FileKind::WebP] {
            let bytes = encode(&image, kind, 80).unwrap();
            let sniffed = image::guess_format(&bytes).unwrap();
            assert_eq!(FileKind::from_image_format(sniffed).unwrap(), kind);
        }
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        let empty = SourceFile::new("empty.png", None, Vec::new());
        assert!(matches!(decode(&empty), Err(PipelineError::Format(_))));

        let garbage = SourceFile::new("bad.jpg", None, vec![0x13u8; 64]);
        assert!(matches!(decode(&garbage), Err(PipelineError::Format(_))));
    }

    #[test]
    fn test_budget_lowers_jpeg_quality() {
        let image = gradient(256, 256);
        let full = encode(&image, FileKind::Jpeg, 100).unwrap();
        let budgeted =
            encode_within_budget(&image, FileKind::Jpeg, 100, Some(full.len() as u64 / 2)).unwrap();

        assert!(budgeted.len() < full.len());
    }

    #[test]
    fn test_budget_ignored_for_lossless_formats() {
        let image = gradient(32, 32);
        let plain = encode(&image, FileKind::Png, 80).unwrap();
        let budgeted = encode_within_budget(&image, FileKind::Png, 80, Some(1)).unwrap();

        assert_eq!(plain, budgeted);
    }
}
