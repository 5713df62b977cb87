use crate::core::{CompressionSettings, PageLayout, PipelineConfig};
use crate::utils::{PipelineResult, ValidationError};

/// Largest page side, in points, PDF readers are required to handle.
pub const MAX_PAGE_SIDE: u32 = 14_400;

/// Validates a full pipeline configuration
pub fn validate_config(config: &PipelineConfig) -> PipelineResult<()> {
    validate_compression(&config.compression)?;
    validate_layout(&config.layout)?;

    if config.event_capacity == 0 {
        return Err(ValidationError::Zero("Event capacity").into());
    }

    Ok(())
}

/// Validates image compression settings
pub fn validate_compression(settings: &CompressionSettings) -> PipelineResult<()> {
    validate_quality(settings.quality)?;

    if settings.max_dimension == 0 {
        return Err(ValidationError::Zero("Max dimension").into());
    }

    if settings.max_output_bytes == Some(0) {
        return Err(ValidationError::Zero("Max output bytes").into());
    }

    Ok(())
}

/// Validates images-to-PDF page layout
pub fn validate_layout(layout: &PageLayout) -> PipelineResult<()> {
    validate_quality(layout.image_quality)?;

    if layout.page_width == 0 {
        return Err(ValidationError::Zero("Page width").into());
    }

    if layout.page_width > MAX_PAGE_SIDE {
        return Err(ValidationError::Settings(format!(
            "Page width {} exceeds the {MAX_PAGE_SIDE} pt PDF limit",
            layout.page_width
        ))
        .into());
    }

    Ok(())
}

fn validate_quality(quality: u8) -> PipelineResult<()> {
    if quality == 0 || quality > 100 {
        return Err(ValidationError::Quality(quality).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PipelineError;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let mut config = PipelineConfig::default();
        config.compression.quality = 0;
        assert!(matches!(
            validate_config(&config),
            Err(PipelineError::Validation(ValidationError::Quality(0)))
        ));

        config.compression.quality = 101;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let mut config = PipelineConfig::default();
        config.layout.page_width = 0;
        assert!(validate_config(&config).is_err());

        let mut config = PipelineConfig::default();
        config.compression.max_dimension = 0;
        assert!(validate_config(&config).is_err());

        let mut config = PipelineConfig::default();
        config.compression.max_output_bytes = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
