//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from a pixel library: identify, thumbnail, and convert.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Formats it cannot decode (HEIC/HEIF) are first turned into PNG by the
//! [media toolchain](crate::toolchain).

use super::params::{ConvertParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by the rayon worker pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize to the exact dimensions in `params` and write a JPEG.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Re-encode as JPEG, returning the decoded dimensions.
    fn convert(&self, params: &ConvertParams) -> Result<Dimensions, BackendError>;
}
