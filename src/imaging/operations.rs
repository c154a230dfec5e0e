//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_bounded_dimensions;
use super::params::{ConvertParams, Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 400,
            quality: Quality::default(),
        }
    }
}

impl From<&crate::config::ThumbnailsConfig> for ThumbnailConfig {
    fn from(config: &crate::config::ThumbnailsConfig) -> Self {
        Self {
            max_width: config.max_width,
            quality: Quality::new(config.quality),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    source_dims: Dimensions,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (width, height) =
        calculate_bounded_dimensions((source_dims.width, source_dims.height), config.max_width);

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Create a width-bounded JPEG thumbnail.
///
/// Returns the thumbnail's dimensions.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> Result<Dimensions> {
    let dims = backend.identify(source)?;
    if dims.width == 0 || dims.height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "{} has no pixels",
            source.display()
        )));
    }

    let params = plan_thumbnail(source, output_path, dims, config);
    backend.thumbnail(&params)?;

    Ok(Dimensions {
        width: params.width,
        height: params.height,
    })
}

/// Re-encode a still as JPEG at full size.
pub fn convert_to_jpeg(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    quality: Quality,
) -> Result<Dimensions> {
    backend.convert(&ConvertParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        quality,
    })
}
