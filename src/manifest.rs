//! Per-project manifests.
//!
//! Stage 3 of the build. A manifest is the public, ordered image list for one
//! project, written to `gen/manifests/<slug>.json`:
//!
//! ```json
//! {
//!   "project": "BSA/Camporee",
//!   "slug": "bsa-camporee",
//!   "count": 2,
//!   "total_count": 3,
//!   "images": ["tent.jpg", "fire.jpg"],
//!   "generated": "2025-01-01T12:00:00+00:00"
//! }
//! ```
//!
//! ## Ordering and visibility
//!
//! Three inputs are merged, in this order:
//!
//! 1. The scanner's sorted image list.
//! 2. The hidden set: these names are dropped, even if the custom order
//!    names them.
//! 3. The custom order: names it lists come first, in its order; everything
//!    else follows in discovery order.
//!
//! Names in the order list or hidden set that don't exist on disk are
//! ignored. [`build_manifest`] is pure; the same inputs always give the same
//! manifest.

use crate::config::SiteLayout;
use crate::files;
use crate::overrides::{CustomOrder, HiddenImages, hidden_set, order_for};
use crate::scan::{ProjectFolder, ScanResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Public image list for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Folder path relative to the image root, `/`-separated.
    pub project: String,
    pub slug: String,
    /// Number of visible images (`images.len()`).
    pub count: usize,
    /// Number of images found on disk, hidden ones included.
    pub total_count: usize,
    pub images: Vec<String>,
    pub generated: String,
}

/// ISO-8601 timestamp for the `generated` fields.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Order and filter a project's images.
///
/// Stable sort keyed by position in `order` for listed names, and by
/// `discovery index + order.len()` for everything else.
pub fn order_images(images: &[String], order: &[String], hidden: &HashSet<&str>) -> Vec<String> {
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .rev()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut visible: Vec<(usize, &String)> = images
        .iter()
        .filter(|name| !hidden.contains(name.as_str()))
        .enumerate()
        .map(|(i, name)| {
            let key = position
                .get(name.as_str())
                .copied()
                .unwrap_or(i + order.len());
            (key, name)
        })
        .collect();

    visible.sort_by_key(|(key, _)| *key);
    visible.into_iter().map(|(_, name)| name.clone()).collect()
}

/// Build the manifest for one project.
pub fn build_manifest(
    project: &ProjectFolder,
    orders: &CustomOrder,
    hidden: &HiddenImages,
    generated: &str,
) -> Manifest {
    let images = order_images(
        &project.images,
        order_for(orders, &project.slug),
        &hidden_set(hidden, &project.slug),
    );
    Manifest {
        project: project.display_path(),
        slug: project.slug.clone(),
        count: images.len(),
        total_count: project.image_count(),
        images,
        generated: generated.to_string(),
    }
}

/// Write one manifest to `gen/manifests/<slug>.json`.
pub fn write_manifest(layout: &SiteLayout, manifest: &Manifest) -> Result<(), ManifestError> {
    files::write_json(&layout.manifest_path(&manifest.slug), manifest)?;
    Ok(())
}

/// Build and write manifests for every scanned project.
///
/// Returns the manifests in scan order.
pub fn write_manifests(
    layout: &SiteLayout,
    scan: &ScanResult,
    orders: &CustomOrder,
    hidden: &HiddenImages,
    generated: &str,
) -> Result<Vec<Manifest>, ManifestError> {
    scan.projects
        .values()
        .map(|project| {
            let manifest = build_manifest(project, orders, hidden, generated);
            write_manifest(layout, &manifest)?;
            Ok(manifest)
        })
        .collect()
}

/// Read a previously written manifest, if any.
pub fn read_manifest(layout: &SiteLayout, slug: &str) -> Option<Manifest> {
    files::read_json(&layout.manifest_path(slug)).ok().flatten()
}

/// Delete a project's manifest. A missing file is fine.
pub fn remove_manifest(layout: &SiteLayout, slug: &str) -> Result<(), ManifestError> {
    files::remove_if_exists(&layout.manifest_path(slug))?;
    Ok(())
}
