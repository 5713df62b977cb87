use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::core::{PipelineConfig, SourceFile};
use crate::utils::{PipelineError, PipelineResult, resolve_kind, validate_config};

/// Reads a file from disk into a [`SourceFile`], declaring its MIME type from
/// the extension the same way a file picker would.
pub async fn read_source_file(path: impl AsRef<Path>) -> PipelineResult<SourceFile> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .await
        .map_err(|e| PipelineError::IO(format!("Failed to read {}: {e}", path.display())))?;

    let name = extract_filename(path);
    let declared = resolve_kind(&name, None).map(|kind| kind.mime().to_string());

    debug!("Read '{}' ({} bytes)", name, bytes.len());
    Ok(SourceFile::new(name, declared, bytes))
}

/// Writes `bytes` to `dir/file_name`, creating `dir` first if needed.
pub async fn write_output(
    dir: impl AsRef<Path>,
    file_name: &str,
    bytes: &[u8],
) -> PipelineResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let path = dir.join(file_name);
    fs::write(&path, bytes)
        .await
        .map_err(|e| PipelineError::IO(format!("Failed to write {}: {e}", path.display())))?;
    Ok(path)
}

/// Loads a JSON configuration file and validates it.
pub async fn load_config(path: impl AsRef<Path>) -> PipelineResult<PipelineConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).await?;
    let config: PipelineConfig = serde_json::from_str(&raw).map_err(|e| {
        PipelineError::IO(format!("Invalid config file {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// File name component of `path`, lossily converted.
pub fn extract_filename(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_source_declares_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PDF");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let source = read_source_file(&path).await.unwrap();
        assert_eq!(source.name(), "scan.PDF");
        assert_eq!(source.declared_type(), Some("application/pdf"));
        assert_eq!(source.size(), 8);
    }

    #[tokio::test]
    async fn test_write_output_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("nested");

        let path = write_output(&nested, "merged.pdf", b"data").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_load_config_fills_defaults_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "compression": { "quality": 60 } }"#).unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.compression.quality, 60);
        assert_eq!(config.compression.max_dimension, 1920);

        std::fs::write(&path, r#"{ "compression": { "quality": 0 } }"#).unwrap();
        assert!(matches!(
            load_config(&path).await,
            Err(PipelineError::Validation(_))
        ));
    }
}
