//! Project metadata: titles, years, tags and site-wide settings.
//!
//! Everything lives in one document, `projects-metadata.json`, in the site
//! root. The admin server edits it and the build reads it:
//!
//! ```json
//! {
//!   "projects": {
//!     "gokart": {
//!       "title": "Electric Go-Kart",
//!       "year": "2023",
//!       "tags": "Welding • Electronics • Design",
//!       "description": "Frame, drivetrain and wiring, built from scratch.",
//!       "featured": true,
//!       "category": "makers"
//!     }
//!   },
//!   "defaults": { "year": "2024", "tags": "Project • Build • Maker" },
//!   "siteSettings": { "template": "classic", "layout": "grid" },
//!   "siteContent": { "heroTitle": "..." },
//!   "featuredOrder": ["gokart"]
//! }
//! ```
//!
//! A missing document means "no metadata": every project gets synthesized
//! values. Keys this crate doesn't know (at the top level, in entries, in
//! defaults and in site settings) are carried through a read-modify-write
//! untouched.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title**: project entry → title-cased slug
//! - **Year / tags**: project entry → `defaults` → built-in default
//! - **Description**: project entry → `defaults` → "Project gallery for {title}."
//! - **Category**: project entry → `defaults` → `makers`
//! - **Featured**: project entry → `false`

use crate::files::{self, FileError};
use crate::naming::title_from_slug;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_YEAR: &str = "2024";
pub const DEFAULT_TAGS: &str = "Project • Build • Maker";
pub const DEFAULT_CATEGORY: &str = "makers";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    File(#[from] FileError),
}

type Extra = IndexMap<String, serde_json::Value>;

/// The whole `projects-metadata.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsMetadata {
    #[serde(default)]
    pub projects: IndexMap<String, ProjectEntry>,
    #[serde(default)]
    pub defaults: MetaDefaults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_settings: Option<SiteSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_content: Option<serde_json::Value>,
    /// Slugs to list first, in this order, wherever projects are listed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub featured_order: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One project's stored metadata. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Fallback values for projects without their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Presentation switches for the rendered pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Fully resolved metadata for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectMeta {
    pub title: String,
    pub year: String,
    pub tags: String,
    pub description: String,
    pub featured: bool,
    pub category: String,
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

impl ProjectsMetadata {
    /// Metadata for `slug` with every gap filled in.
    pub fn resolve_project(&self, slug: &str) -> ProjectMeta {
        let entry = self.projects.get(slug).cloned().unwrap_or_default();
        let defaults = &self.defaults;

        let title = resolve(&[entry.title.as_deref()]).unwrap_or_else(|| title_from_slug(slug));
        let year = resolve(&[entry.year.as_deref(), defaults.year.as_deref()])
            .unwrap_or_else(|| DEFAULT_YEAR.to_string());
        let tags = resolve(&[entry.tags.as_deref(), defaults.tags.as_deref()])
            .unwrap_or_else(|| DEFAULT_TAGS.to_string());
        let description = resolve(&[
            entry.description.as_deref(),
            defaults.description.as_deref(),
        ])
        .unwrap_or_else(|| format!("Project gallery for {title}."));
        let category = resolve(&[entry.category.as_deref(), defaults.category.as_deref()])
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let featured = entry.featured.unwrap_or(false);

        ProjectMeta {
            title,
            year,
            tags,
            description,
            featured,
            category,
        }
    }

    /// Replace the stored entry for `slug`.
    pub fn set_project(&mut self, slug: &str, entry: ProjectEntry) {
        self.projects.insert(slug.to_string(), entry);
    }

    /// Drop `slug` from the project entries and from `featuredOrder`.
    pub fn remove_project(&mut self, slug: &str) -> bool {
        let before = self.featured_order.len();
        self.featured_order.retain(|s| s != slug);
        self.projects.shift_remove(slug).is_some() || self.featured_order.len() != before
    }

    pub fn layout(&self) -> Option<&str> {
        self.site_settings.as_ref()?.layout.as_deref()
    }

    pub fn template(&self) -> Option<&str> {
        self.site_settings.as_ref()?.template.as_deref()
    }
}

/// Load the metadata document. A missing file yields empty metadata.
pub fn load_metadata(path: &Path) -> Result<ProjectsMetadata, MetadataError> {
    Ok(files::read_json(path)?.unwrap_or_default())
}

/// Replace the metadata document on disk.
pub fn save_metadata(path: &Path, metadata: &ProjectsMetadata) -> Result<(), MetadataError> {
    files::write_json(path, metadata)?;
    Ok(())
}
