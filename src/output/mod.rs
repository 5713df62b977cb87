//! Downloadable artifacts.
//!
//! Per-item tools expose each finished item as its own artifact; whole-queue
//! tools produce one artifact per successful commit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{QueueItem, Tool};
use crate::utils::{FileKind, PipelineResult, write_output};

/// Prefix of per-item output names.
pub const COMPRESSED_PREFIX: &str = "compressed-";

/// A named, downloadable output.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    file_name: String,
    kind: FileKind,
    bytes: Arc<[u8]>,
}

impl OutputArtifact {
    pub fn new(file_name: impl Into<String>, kind: FileKind, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        self.kind.mime()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Writes the artifact into `dir` under its own file name.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> PipelineResult<PathBuf> {
        write_output(dir, &self.file_name, &self.bytes).await
    }
}

/// Output name for a per-item result.
pub fn per_item_name(source_name: &str) -> String {
    format!("{COMPRESSED_PREFIX}{source_name}")
}

/// The downloadable artifact for `item`, if it is `Done`.
pub fn assemble_item(item: &QueueItem) -> Option<OutputArtifact> {
    item.result().map(|artifact| OutputArtifact {
        file_name: per_item_name(item.name()),
        kind: artifact.kind(),
        bytes: artifact.shared_bytes(),
    })
}

/// Wraps whole-queue output bytes under the tool's fixed name.
pub fn assemble_commit(tool: Tool, bytes: Vec<u8>) -> Option<OutputArtifact> {
    tool.commit_file_name()
        .map(|name| OutputArtifact::new(name, FileKind::Pdf, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Artifact, SourceFile};

    #[test]
    fn test_per_item_name_is_prefixed() {
        assert_eq!(per_item_name("holiday photo.jpg"), "compressed-holiday photo.jpg");
    }

    #[test]
    fn test_only_done_items_are_downloadable() {
        let mut item = QueueItem::new(SourceFile::new("a.png", None, vec![1u8; 8]), FileKind::Png);
        assert!(assemble_item(&item).is_none());

        item.status.begin().unwrap();
        assert!(assemble_item(&item).is_none());

        item.status.complete(Artifact::new(vec![2u8; 4], FileKind::Png)).unwrap();
        let output = assemble_item(&item).unwrap();
        assert_eq!(output.file_name(), "compressed-a.png");
        assert_eq!(output.mime(), "image/png");
        assert_eq!(output.size(), 4);
    }

    #[test]
    fn test_commit_names() {
        assert_eq!(
            assemble_commit(Tool::PdfMerge, vec![1]).unwrap().file_name(),
            "merged.pdf"
        );
        assert_eq!(
            assemble_commit(Tool::ImagesToPdf, vec![1]).unwrap().file_name(),
            "images.pdf"
        );
        assert!(assemble_commit(Tool::ImageCompression, vec![1]).is_none());
    }

    #[tokio::test]
    async fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputArtifact::new("merged.pdf", FileKind::Pdf, vec![9u8; 3]);

        let path = output.write_to(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("merged.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), vec![9u8; 3]);
    }
}
