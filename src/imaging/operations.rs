//! High-level image operations.
//!
//! These functions combine the freshness check, parameter planning and
//! backend execution for a single image.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ThumbnailParams};
use crate::cache::is_fresh;
use crate::config::ThumbnailsConfig;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl ThumbnailConfig {
    pub fn from_config(config: &ThumbnailsConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: Quality::new(config.quality),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self::from_config(&ThumbnailsConfig::default())
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, output: &Path, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        max_width: config.max_width,
        max_height: config.max_height,
        quality: config.quality,
    }
}

/// Make sure `output` is an up-to-date thumbnail of `source`.
///
/// Returns `Ok(false)` when the existing thumbnail was reused and
/// `Ok(true)` when a new one was written. Parent directories are created.
pub fn ensure_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<bool> {
    if is_fresh(source, output) {
        return Ok(false);
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    backend.thumbnail(&plan_thumbnail(source, output, config))?;
    Ok(true)
}
