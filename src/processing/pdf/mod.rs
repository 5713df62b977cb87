//! PDF assembly via `lopdf`.
//!
//! - [`merge`]: concatenate documents page by page.
//! - [`images`]: build one page per raster image.

pub mod images;
pub mod merge;

use lopdf::Document;

use crate::core::{PageLayout, SourceFile};
use crate::processing::engine::DocumentTransform;
use crate::utils::{PipelineError, PipelineResult};

pub use images::images_to_pdf;
pub use merge::merge_documents;

const PDF_VERSION: &str = "1.5";

/// Default [`DocumentTransform`] backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfAssembler;

impl DocumentTransform for PdfAssembler {
    fn merge(&self, sources: &[SourceFile]) -> PipelineResult<Vec<u8>> {
        merge_documents(sources)
    }

    fn images_to_pdf(&self, sources: &[SourceFile], layout: &PageLayout) -> PipelineResult<Vec<u8>> {
        images_to_pdf(sources, layout)
    }
}

fn save_document(doc: &mut Document) -> PipelineResult<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| PipelineError::processing(format!("Failed to write PDF: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, RgbImage};
    use lopdf::{Document, Object, Stream, dictionary};

    /// A document with `pages` blank pages whose MediaBox (width × 100) is
    /// inherited from the page tree root.
    pub fn sample_pdf(pages: usize, width: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                }))
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(pages as i64),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(100),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// `(width, height)` of each page's own MediaBox, in page order.
    pub fn media_boxes(pdf: &[u8]) -> Vec<(i64, i64)> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .into_values()
            .map(|page_id| {
                let page = doc.get_dictionary(page_id).unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                (
                    media_box[2].as_i64().unwrap(),
                    media_box[3].as_i64().unwrap(),
                )
            })
            .collect()
    }

    pub fn page_widths(pdf: &[u8]) -> Vec<i64> {
        media_boxes(pdf).into_iter().map(|(w, _)| w).collect()
    }

    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }
}
