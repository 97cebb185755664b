//! Thumbnail generation for discovered projects.
//!
//! Stage 2 of the build. Takes the scan result and makes sure every source
//! image has an up-to-date thumbnail under `gen/thumbnails/`.
//!
//! ## Output Structure
//!
//! ```text
//! gen/thumbnails/
//! ├── Gokart/
//! │   ├── img1.jpg          # from images/Gokart/img1.jpg
//! │   └── img2.jpg          # from images/Gokart/img2.png
//! └── BSA/
//!     └── Camporee/
//!         └── tent.jpg
//! ```
//!
//! ## Failure Model
//!
//! Each image is independent. A file that fails to decode or encode is
//! logged, counted in [`ThumbnailStats::failed`] and skipped; the batch
//! carries on.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon) on
//! the global pool, which `main` sizes from `[processing]`.

use crate::cache::{ThumbnailStats, thumbnail_path};
use crate::imaging::{ImageBackend, RustBackend, ThumbnailConfig, ensure_thumbnail};
use crate::scan::ProjectFolder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of one image in a batch.
enum Outcome {
    Generated,
    Reused,
    Failed,
}

/// Generate thumbnails for every image in `projects` with the default backend.
pub fn generate_thumbnails<'a>(
    projects: impl IntoIterator<Item = &'a ProjectFolder>,
    thumbnails_root: &Path,
    config: &ThumbnailConfig,
) -> ThumbnailStats {
    generate_thumbnails_with_backend(&RustBackend::new(), projects, thumbnails_root, config)
}

/// Generate thumbnails using a specific backend (allows testing with mock).
pub fn generate_thumbnails_with_backend<'a>(
    backend: &impl ImageBackend,
    projects: impl IntoIterator<Item = &'a ProjectFolder>,
    thumbnails_root: &Path,
    config: &ThumbnailConfig,
) -> ThumbnailStats {
    let jobs: Vec<(PathBuf, PathBuf)> = projects
        .into_iter()
        .flat_map(|project| {
            project.images.iter().map(move |name| {
                (
                    project.image_path(name),
                    thumbnail_path(thumbnails_root, &project.relative_path, name),
                )
            })
        })
        .collect();

    jobs.par_iter()
        .map(|(source, output)| {
            match ensure_thumbnail(backend, source, output, config) {
                Ok(true) => {
                    debug!("thumbnail written: {}", output.display());
                    Outcome::Generated
                }
                Ok(false) => Outcome::Reused,
                Err(err) => {
                    warn!(source = %source.display(), "thumbnail failed: {err}");
                    Outcome::Failed
                }
            }
        })
        .fold(ThumbnailStats::default, |mut stats, outcome| {
            match outcome {
                Outcome::Generated => stats.generated(),
                Outcome::Reused => stats.reused(),
                Outcome::Failed => stats.failed(),
            }
            stats
        })
        .reduce(ThumbnailStats::default, ThumbnailStats::merge)
}
