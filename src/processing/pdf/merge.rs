//! Page-preserving PDF concatenation.

use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::{debug, warn};

use crate::core::SourceFile;
use crate::utils::{PipelineError, PipelineResult};

use super::{PDF_VERSION, save_document};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Deepest page tree we walk before assuming a reference cycle.
const MAX_TREE_DEPTH: usize = 64;

/// Concatenates the pages of `sources`, in order, into one document.
///
/// Every page keeps its position within its own document. A single unreadable
/// source fails the whole merge.
pub fn merge_documents(sources: &[SourceFile]) -> PipelineResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(PipelineError::format("No documents to merge"));
    }

    let mut merged = Document::with_version(PDF_VERSION);
    let mut next_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for source in sources {
        let mut doc = load_document(source)?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            warn!("'{}' has no pages", source.name());
        }
        for &page_id in &pages {
            flatten_inherited(&mut doc, page_id)?;
        }
        debug!("'{}' contributes {} pages", source.name(), pages.len());
        page_ids.extend(pages);

        // The source's own catalog and page tree are rebuilt below
        merged.objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_tree_node(object)),
        );
    }

    merged.max_id = next_id;
    let pages_id = merged.new_object_id();

    for &page_id in &page_ids {
        let page = merged
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PipelineError::format(format!("Lost page {page_id:?}: {e}")))?;
        page.set("Parent", pages_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_ids.len() as i64),
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    save_document(&mut merged)
}

fn load_document(source: &SourceFile) -> PipelineResult<Document> {
    if source.is_empty() {
        return Err(PipelineError::format(format!("'{}' is empty", source.name())));
    }

    Document::load_mem(source.bytes()).map_err(|e| {
        PipelineError::format(format!("'{}' is not a valid PDF: {e}", source.name()))
    })
}

/// Copies inherited page attributes onto the page itself so it survives
/// being re-parented.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> PipelineResult<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(PipelineError::format("Page tree is too deep or cyclic"));
            }

            let node = doc.get_dictionary(parent_id)?;
            for key in INHERITABLE {
                let already = page.has(key) || inherited.iter().any(|(k, _)| *k == key);
                if !already {
                    if let Ok(value) = node.get(key) {
                        inherited.push((key, value.clone()));
                    }
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

fn is_tree_node(object: &Object) -> bool {
    match object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
    {
        Ok(name) => name == b"Catalog" || name == b"Pages",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pdf::test_support::{page_widths, sample_pdf};

    #[test]
    fn test_merge_concatenates_in_item_order() {
        let sources = vec![
            SourceFile::new("a.pdf", None, sample_pdf(2, 100)),
            SourceFile::new("b.pdf", None, sample_pdf(3, 200)),
        ];

        let merged = merge_documents(&sources).unwrap();
        assert_eq!(page_widths(&merged), vec![100, 100, 200, 200, 200]);
    }

    #[test]
    fn test_merge_order_follows_input_order() {
        let sources = vec![
            SourceFile::new("b.pdf", None, sample_pdf(1, 200)),
            SourceFile::new("a.pdf", None, sample_pdf(2, 100)),
        ];

        let merged = merge_documents(&sources).unwrap();
        assert_eq!(page_widths(&merged), vec![200, 100, 100]);
    }

    #[test]
    fn test_single_malformed_document_aborts_merge() {
        let sources = vec![
            SourceFile::new("a.pdf", None, sample_pdf(2, 100)),
            SourceFile::new("broken.pdf", None, b"%PDF-1.5 garbage".to_vec()),
        ];

        let err = merge_documents(&sources).unwrap_err();
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[test]
    fn test_zero_byte_document_aborts_merge() {
        let sources = vec![SourceFile::new("empty.pdf", None, Vec::new())];
        assert!(matches!(merge_documents(&sources), Err(PipelineError::Format(_))));
    }
}
