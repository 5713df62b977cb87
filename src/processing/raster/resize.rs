//! Bounding-box downscale for raster images.

use image::DynamicImage;
use image::imageops::FilterType;

/// Scales `image` so its longest side is at most `max_dimension`.
///
/// Returns the image unchanged when it already fits; never upscales. The
/// aspect ratio is preserved.
pub fn fit_within(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width.max(height) <= max_dimension {
        return image;
    }

    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Page height that keeps `width × height` proportions at `page_width`.
///
/// Rounded to whole points, never below 1.
pub fn proportional_height(width: u32, height: u32, page_width: u32) -> u32 {
    if width == 0 {
        return page_width.max(1);
    }
    let scaled = (height as f64 * page_width as f64) / width as f64;
    (scaled.round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_large_image_is_scaled_to_longest_side() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 200));
        let resized = fit_within(image, 100);

        assert_eq!((resized.width(), resized.height()), (100, 50));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 20));
        let resized = fit_within(image, 100);

        assert_eq!((resized.width(), resized.height()), (40, 20));
    }

    #[test]
    fn test_proportional_height() {
        assert_eq!(proportional_height(300, 200, 595), 397);
        assert_eq!(proportional_height(100, 400, 595), 2380);
        assert_eq!(proportional_height(1000, 1, 595), 1);
    }
}
