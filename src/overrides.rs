//! Per-project image order and visibility overrides.
//!
//! Two small JSON documents in the site root, both keyed by project slug:
//!
//! ```json
//! // image-orders.json
//! { "gokart": ["img3.jpg", "img1.jpg"] }
//!
//! // hidden-images.json
//! { "gokart": ["img2.png"] }
//! ```
//!
//! Either file may be missing, which reads as "no overrides". Updates are a
//! whole-document read-modify-write; concurrent writers race and the last one
//! wins. Entries naming files or projects that no longer exist are kept as
//! they are and simply ignored when manifests are built.

use crate::files::{self, FileError};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    File(#[from] FileError),
}

/// Slug → preferred image order (filenames, first shown first).
pub type CustomOrder = IndexMap<String, Vec<String>>;

/// Slug → filenames excluded from the public gallery.
pub type HiddenImages = IndexMap<String, Vec<String>>;

/// Access to the two override documents of one site.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    image_orders: PathBuf,
    hidden_images: PathBuf,
}

impl OverrideStore {
    pub fn new(image_orders: impl Into<PathBuf>, hidden_images: impl Into<PathBuf>) -> Self {
        Self {
            image_orders: image_orders.into(),
            hidden_images: hidden_images.into(),
        }
    }

    pub fn image_orders_path(&self) -> &Path {
        &self.image_orders
    }

    pub fn hidden_images_path(&self) -> &Path {
        &self.hidden_images
    }

    pub fn load_custom_order(&self) -> Result<CustomOrder, OverrideError> {
        Ok(files::read_json(&self.image_orders)?.unwrap_or_default())
    }

    pub fn load_hidden_images(&self) -> Result<HiddenImages, OverrideError> {
        Ok(files::read_json(&self.hidden_images)?.unwrap_or_default())
    }

    /// Replace the custom order for `slug`. An empty list removes the entry.
    pub fn set_custom_order(&self, slug: &str, order: &[String]) -> Result<(), OverrideError> {
        let mut doc = self.load_custom_order()?;
        set_entry(&mut doc, slug, dedup(order));
        files::write_json(&self.image_orders, &doc)?;
        Ok(())
    }

    /// Replace the hidden set for `slug`. An empty list removes the entry.
    pub fn set_hidden_images(&self, slug: &str, hidden: &[String]) -> Result<(), OverrideError> {
        let mut doc = self.load_hidden_images()?;
        let mut names = dedup(hidden);
        names.sort();
        set_entry(&mut doc, slug, names);
        files::write_json(&self.hidden_images, &doc)?;
        Ok(())
    }

    /// Forget one filename everywhere it appears for `slug`.
    pub fn forget_image(&self, slug: &str, filename: &str) -> Result<(), OverrideError> {
        for path in [&self.image_orders, &self.hidden_images] {
            let mut doc: IndexMap<String, Vec<String>> =
                files::read_json(path)?.unwrap_or_default();
            let Some(names) = doc.get(slug) else {
                continue;
            };
            let kept: Vec<String> = names.iter().filter(|n| *n != filename).cloned().collect();
            if kept.len() != names.len() {
                set_entry(&mut doc, slug, kept);
                files::write_json(path, &doc)?;
            }
        }
        Ok(())
    }

    /// Drop every override for `slug`.
    pub fn remove_project(&self, slug: &str) -> Result<(), OverrideError> {
        for path in [&self.image_orders, &self.hidden_images] {
            let mut doc: IndexMap<String, Vec<String>> =
                files::read_json(path)?.unwrap_or_default();
            if doc.shift_remove(slug).is_some() {
                files::write_json(path, &doc)?;
            }
        }
        Ok(())
    }
}

/// The hidden set for one project, ready for membership checks.
pub fn hidden_set<'a>(hidden: &'a HiddenImages, slug: &str) -> HashSet<&'a str> {
    hidden
        .get(slug)
        .map(|names| names.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

/// The custom order for one project, or an empty slice.
pub fn order_for<'a>(orders: &'a CustomOrder, slug: &str) -> &'a [String] {
    orders.get(slug).map(Vec::as_slice).unwrap_or(&[])
}

fn set_entry(doc: &mut IndexMap<String, Vec<String>>, slug: &str, names: Vec<String>) {
    if names.is_empty() {
        doc.shift_remove(slug);
    } else {
        doc.insert(slug.to_string(), names);
    }
}

/// Keep the first occurrence of each name.
fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}
