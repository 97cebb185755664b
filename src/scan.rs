//! Filesystem scanning: image root → project galleries.
//!
//! Stage 1 of the build. Walks the image root and turns every folder that
//! directly holds images into one [`ProjectFolder`]. Nothing is persisted
//! here; the result lives for one build pass.
//!
//! ## Directory Structure
//!
//! ```text
//! images/                          # Image root
//! ├── Gokart/                      # Gallery "gokart"
//! │   ├── img1.jpg
//! │   ├── img2.png
//! │   └── final/                   # Skip-listed staging folder, never visited
//! │       └── img3.jpg
//! ├── BSA/                         # No images of its own: not a gallery
//! │   ├── Eagle Scout Project/     # Gallery "bsa-eagle-scout-project"
//! │   └── Camporee/                # Gallery "bsa-camporee"
//! └── Drawings/                    # Gallery "drawings"
//!     └── Sketches/                # Also a gallery: "drawings-sketches"
//! ```
//!
//! ## Rules
//!
//! - Directories named in the policy's exclusion set (exact match) or skip
//!   list (case-insensitive) are neither visited nor descended into.
//! - Directories deeper than the policy's depth bound are ignored.
//! - Only direct children with a recognized image extension count. The
//!   extension match is case-sensitive over [`IMAGE_EXTENSIONS`].
//! - A folder with images becomes a gallery, and its subfolders are still
//!   scanned: nested image folders become sibling galleries.
//! - Traversal is lexicographic, so discovery order is deterministic.
//! - Unreadable directories are skipped; only a missing root is an error.

use crate::naming::slug_from_relative_path;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Image root not found: {0}")]
    RootMissing(PathBuf),
}

/// Extensions recognized as gallery images. Matched case-sensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "JPG", "JPEG", "PNG", "GIF", "WEBP",
];

/// Which directories the scanner refuses to treat as galleries.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    excluded: HashSet<String>,
    skip_lowercase: HashSet<String>,
    max_depth: usize,
}

impl ExclusionPolicy {
    /// Build a policy from exact-match names, case-insensitive names and a
    /// depth bound (levels below the image root).
    pub fn new(
        excluded: impl IntoIterator<Item = String>,
        skip_subfolders: impl IntoIterator<Item = String>,
        max_depth: usize,
    ) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
            skip_lowercase: skip_subfolders
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            max_depth,
        }
    }

    /// Whether a directory with this name is pruned from the scan.
    pub fn skips_name(&self, name: &str) -> bool {
        self.excluded.contains(name) || self.skip_lowercase.contains(&name.to_lowercase())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        crate::config::SiteConfig::default().exclusion_policy()
    }
}

/// A discovered gallery folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFolder {
    pub slug: String,
    /// Path from the image root. Empty for images directly in the root.
    pub relative_path: PathBuf,
    /// Absolute (or root-joined) path of the folder.
    pub path: PathBuf,
    /// Image filenames directly in the folder, sorted.
    pub images: Vec<String>,
}

impl ProjectFolder {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Relative path with `/` separators, as written into manifests.
    pub fn display_path(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Full path of one of this project's source images.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Two folders that normalized to the same slug. The first one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCollision {
    pub slug: String,
    pub kept: PathBuf,
    pub dropped: PathBuf,
}

/// Scanner output: projects in discovery order plus any slug collisions.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub projects: IndexMap<String, ProjectFolder>,
    pub collisions: Vec<SlugCollision>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn total_images(&self) -> usize {
        self.projects.values().map(ProjectFolder::image_count).sum()
    }

    pub fn get(&self, slug: &str) -> Option<&ProjectFolder> {
        self.projects.get(slug)
    }
}

/// Whether `filename` has a recognized image extension.
pub fn is_image_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}

/// Scan `root` for galleries according to `policy`.
pub fn scan(root: &Path, policy: &ExclusionPolicy) -> Result<ScanResult, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootMissing(root.to_path_buf()));
    }

    let mut result = ScanResult::default();

    for entry in folders(root, policy) {
        let images = list_images(entry.path());
        if images.is_empty() {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(Path::new(""))
            .to_path_buf();
        let slug = project_slug(root, &relative_path);

        if let Some(existing) = result.projects.get(&slug) {
            warn!(
                slug = %slug,
                kept = %existing.path.display(),
                dropped = %entry.path().display(),
                "slug collision, keeping the first folder"
            );
            result.collisions.push(SlugCollision {
                slug,
                kept: existing.path.clone(),
                dropped: entry.path().to_path_buf(),
            });
            continue;
        }

        result.projects.insert(
            slug.clone(),
            ProjectFolder {
                slug,
                relative_path,
                path: entry.path().to_path_buf(),
                images,
            },
        );
    }

    Ok(result)
}

/// Every directory the policy lets the scanner visit, in traversal order.
fn folders<'a>(root: &Path, policy: &'a ExclusionPolicy) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .follow_links(true)
        .max_depth(policy.max_depth())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.file_type().is_dir()
                && (entry.depth() == 0 || !policy.skips_name(&entry.file_name().to_string_lossy()))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("skipping unreadable directory: {err}");
                None
            }
        })
}

/// Locate the folder whose slug is `slug`, whether or not it holds images.
///
/// Used for uploads into a freshly created, still empty project folder.
/// Returns the first match in traversal order, like [`scan`].
pub fn find_folder(root: &Path, policy: &ExclusionPolicy, slug: &str) -> Option<PathBuf> {
    folders(root, policy)
        .find(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(Path::new(""));
            project_slug(root, relative) == slug
        })
        .map(DirEntry::into_path)
}

/// Slug for a discovered folder. Images directly in the root take the
/// root folder's own name.
fn project_slug(root: &Path, relative_path: &Path) -> String {
    let slug = slug_from_relative_path(relative_path);
    if !slug.is_empty() {
        return slug;
    }
    root.file_name()
        .map(|name| slug_from_relative_path(Path::new(name)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

/// Sorted image filenames directly inside `dir`. Unreadable → empty.
fn list_images(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot list {}: {err}", dir.display());
            return Vec::new();
        }
    };

    let mut images: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| is_image_filename(name))
        .collect();

    images.sort();
    images
}
