//! One-page-per-image PDF construction.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

use crate::core::{PageLayout, SourceFile};
use crate::processing::raster::codec::{decode, encode};
use crate::processing::raster::resize::proportional_height;
use crate::utils::{FileKind, MAX_PAGE_SIDE, PipelineError, PipelineResult};

use super::{PDF_VERSION, save_document};

/// Builds a document with one page per image, in input order.
///
/// Each page is `layout.page_width` points wide and as tall as the image's
/// aspect ratio requires; the image fills the page. An image so narrow that
/// its page would exceed [`MAX_PAGE_SIDE`] in height fails the conversion.
pub fn images_to_pdf(sources: &[SourceFile], layout: &PageLayout) -> PipelineResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(PipelineError::format("No images to convert"));
    }

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(sources.len());

    for source in sources {
        let (image, _) = decode(source)?;
        let (width, height) = (image.width(), image.height());

        let page_height = proportional_height(width, height, layout.page_width);
        if page_height > MAX_PAGE_SIDE {
            return Err(PipelineError::format(format!(
                "'{}' ({width}×{height}) needs a {page_height} pt tall page, over the {MAX_PAGE_SIDE} pt limit",
                source.name()
            )));
        }
        let jpeg = encode(&image, FileKind::Jpeg, layout.image_quality)?;

        let page_width = layout.page_width as i64;
        let page_height = page_height as i64;

        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => Object::Integer(width as i64),
                    "Height" => Object::Integer(height as i64),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => Object::Integer(8),
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false),
        );

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(page_width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(page_height),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(page_width),
                Object::Integer(page_height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });

        debug!(
            "'{}' ({}×{}) → page {}×{} pt",
            source.name(),
            width,
            height,
            page_width,
            page_height
        );
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save_document(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pdf::test_support::{media_boxes, png_bytes};

    #[test]
    fn test_one_page_per_image_with_matching_aspect() {
        let dims = [(300u32, 200u32), (100, 400), (250, 250)];
        let sources: Vec<SourceFile> = dims
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| SourceFile::new(format!("{i}.png"), None, png_bytes(w, h)))
            .collect();

        let pdf = images_to_pdf(&sources, &PageLayout::default()).unwrap();
        let boxes = media_boxes(&pdf);

        assert_eq!(boxes.len(), 3);
        for ((w, h), (page_w, page_h)) in dims.iter().zip(&boxes) {
            assert_eq!(*page_w, 595);
            let source_ratio = *w as f64 / *h as f64;
            let page_ratio = *page_w as f64 / *page_h as f64;
            assert!(
                (source_ratio - page_ratio).abs() / source_ratio < 0.01,
                "{w}x{h} became {page_w}x{page_h}"
            );
        }
    }

    #[test]
    fn test_page_taller_than_pdf_limit_is_rejected() {
        let sources = vec![
            SourceFile::new("ok.png", None, png_bytes(10, 10)),
            SourceFile::new("sliver.png", None, png_bytes(2, 200)),
        ];

        let result = images_to_pdf(&sources, &PageLayout::default());
        assert!(matches!(
            result,
            Err(PipelineError::Format(ref reason)) if reason.contains("sliver.png")
        ));
    }

    #[test]
    fn test_page_at_pdf_limit_is_accepted() {
        // 595 × 24 / 1 = 14280 pt
        let sources = vec![SourceFile::new("tall.png", None, png_bytes(1, 24))];

        let pdf = images_to_pdf(&sources, &PageLayout::default()).unwrap();
        assert_eq!(media_boxes(&pdf), vec![(595, 14_280)]);
    }

    #[test]
    fn test_corrupt_image_fails_whole_conversion() {
        let sources = vec![
            SourceFile::new("ok.png", None, png_bytes(10, 10)),
            SourceFile::new("bad.png", None, vec![0u8; 16]),
        ];

        assert!(images_to_pdf(&sources, &PageLayout::default()).is_err());
    }
}
