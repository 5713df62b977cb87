//! The file-transformation tools and their contracts.

use serde::{Deserialize, Serialize};

use crate::utils::FileKind;

const RASTER_KINDS: &[FileKind] = &[FileKind::Png, FileKind::Jpeg, FileKind::WebP];
const DOCUMENT_KINDS: &[FileKind] = &[FileKind::Pdf];

/// A file-transformation tool backed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    /// Re-encode each image independently
    ImageCompression,
    /// Concatenate PDFs in queue order
    PdfMerge,
    /// One PDF page per image, in queue order
    ImagesToPdf,
}

/// How a tool turns its queue into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Each item is transformed on ingestion and downloadable on its own
    PerItem,
    /// An explicit commit transforms a snapshot of the whole queue
    WholeQueue,
}

impl Tool {
    pub fn accepted_kinds(&self) -> &'static [FileKind] {
        match self {
            Self::ImageCompression | Self::ImagesToPdf => RASTER_KINDS,
            Self::PdfMerge => DOCUMENT_KINDS,
        }
    }

    pub fn accepts(&self, kind: FileKind) -> bool {
        self.accepted_kinds().contains(&kind)
    }

    pub fn output_mode(&self) -> OutputMode {
        match self {
            Self::ImageCompression => OutputMode::PerItem,
            Self::PdfMerge | Self::ImagesToPdf => OutputMode::WholeQueue,
        }
    }

    /// Fixed output file name for whole-queue tools.
    pub fn commit_file_name(&self) -> Option<&'static str> {
        match self {
            Self::ImageCompression => None,
            Self::PdfMerge => Some("merged.pdf"),
            Self::ImagesToPdf => Some("images.pdf"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ImageCompression => "image compression",
            Self::PdfMerge => "PDF merge",
            Self::ImagesToPdf => "images to PDF",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_types_per_tool() {
        assert!(Tool::ImageCompression.accepts(FileKind::WebP));
        assert!(!Tool::ImageCompression.accepts(FileKind::Pdf));
        assert!(Tool::PdfMerge.accepts(FileKind::Pdf));
        assert!(!Tool::PdfMerge.accepts(FileKind::Png));
        assert_eq!(Tool::ImagesToPdf.accepted_kinds(), RASTER_KINDS);
    }

    #[test]
    fn test_output_names() {
        assert_eq!(Tool::ImageCompression.commit_file_name(), None);
        assert_eq!(Tool::PdfMerge.commit_file_name(), Some("merged.pdf"));
        assert_eq!(Tool::ImagesToPdf.commit_file_name(), Some("images.pdf"));
        assert_eq!(Tool::PdfMerge.output_mode(), OutputMode::WholeQueue);
    }
}
