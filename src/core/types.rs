//! Core types for pipeline settings and results.

use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Settings for the image compression tool
    pub compression: CompressionSettings,
    /// Page layout for the images-to-PDF tool
    pub layout: PageLayout,
    /// Limits applied at the ingestion boundary
    pub admission: AdmissionPolicy,
    /// Buffer size of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compression: CompressionSettings::default(),
            layout: PageLayout::default(),
            admission: AdmissionPolicy::default(),
            event_capacity: 256,
        }
    }
}

/// Settings for raster re-encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressionSettings {
    /// Quality factor (1-100) for lossy encoders
    pub quality: u8,
    /// Longest side in pixels; larger images are scaled down, never up
    pub max_dimension: u32,
    /// Byte budget for lossy outputs; quality steps down until it is met
    pub max_output_bytes: Option<u64>,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            quality: 80,
            max_dimension: 1920,
            max_output_bytes: Some(2 * 1024 * 1024),
        }
    }
}

/// Page geometry for images-to-PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageLayout {
    /// Page width in PDF points; height follows the image's aspect ratio
    pub page_width: u32,
    /// JPEG quality used when embedding images
    pub image_quality: u8,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            // A4 width (595.28 pt), rounded
            page_width: 595,
            image_quality: 92,
        }
    }
}

/// Admission limits for the queue.
///
/// `None` disables a limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionPolicy {
    pub max_items: Option<usize>,
    pub max_total_bytes: Option<u64>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_items: Some(500),
            max_total_bytes: Some(512 * 1024 * 1024),
        }
    }
}

impl AdmissionPolicy {
    /// A policy with no limits.
    pub fn unlimited() -> Self {
        Self {
            max_items: None,
            max_total_bytes: None,
        }
    }
}

/// Size statistics for a compressed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
    /// Original file size in bytes
    pub original_size: u64,
    /// Result size in bytes
    pub result_size: u64,
    /// Bytes saved (negative if the file grew)
    pub saved_bytes: i64,
    /// Saved bytes as a percentage of the original size
    pub compression_ratio: f64,
}

impl CompressionStats {
    pub fn new(original_size: u64, result_size: u64) -> Self {
        let saved_bytes = original_size as i64 - result_size as i64;
        let compression_ratio = if original_size > 0 {
            saved_bytes as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };

        Self {
            original_size,
            result_size,
            saved_bytes,
            compression_ratio,
        }
    }
}
