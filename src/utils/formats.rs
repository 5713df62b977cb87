use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::utils::PipelineError;

/// File kinds understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Png,
    Jpeg,
    WebP,
    Pdf,
}

lazy_static! {
    static ref MIME_TYPES: HashMap<&'static str, FileKind> = {
        let mut m = HashMap::new();
        m.insert("image/png", FileKind::Png);
        m.insert("image/jpeg", FileKind::Jpeg);
        m.insert("image/jpg", FileKind::Jpeg);
        m.insert("image/pjpeg", FileKind::Jpeg);
        m.insert("image/webp", FileKind::WebP);
        m.insert("application/pdf", FileKind::Pdf);
        m.insert("application/x-pdf", FileKind::Pdf);
        m
    };
}

impl FileKind {
    /// Get file extensions associated with this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
            Self::WebP => &["webp"],
            Self::Pdf => &["pdf"],
        }
    }

    /// Canonical MIME type
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Pdf => "application/pdf",
        }
    }

    /// Raster images get a preview handle; documents don't.
    pub fn is_previewable(&self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// Look up a declared MIME type, ignoring parameters such as `; charset=`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
        MIME_TYPES.get(essence.as_str()).copied()
    }

    /// Maps a sniffed `image` format back to a raster kind.
    pub fn from_image_format(format: image::ImageFormat) -> Result<Self, PipelineError> {
        match format {
            image::ImageFormat::Png => Ok(Self::Png),
            image::ImageFormat::Jpeg => Ok(Self::Jpeg),
            image::ImageFormat::WebP => Ok(Self::WebP),
            other => Err(PipelineError::format(format!(
                "Unsupported image sub-format: {other:?}"
            ))),
        }
    }
}

impl FromStr for FileKind {
    type Err = PipelineError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            "pdf" => Ok(Self::Pdf),
            _ => Err(PipelineError::format(format!(
                "Unsupported file type: {ext}"
            ))),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extensions()[0])
    }
}

/// Get kind from file name extension
pub fn kind_from_extension(name: &str) -> Result<FileKind, PipelineError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| PipelineError::format(
            format!("File has no extension: {name}")
        ))?;

    FileKind::from_str(ext)
}

/// Resolves a file's kind: declared MIME type first, then the name's extension.
pub fn resolve_kind(name: &str, declared_mime: Option<&str>) -> Option<FileKind> {
    declared_mime
        .and_then(FileKind::from_mime)
        .or_else(|| kind_from_extension(name).ok())
}
