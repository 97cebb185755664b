//! Thumbnail freshness cache.
//!
//! The thumbnail tree under `gen/thumbnails/` is its own cache: there is no
//! manifest of hashes. A thumbnail is reused when it exists and its mtime is
//! **strictly newer** than its source's mtime; anything else (missing file,
//! older or equal mtime, unreadable metadata) means regenerate.
//!
//! Touching a source image therefore forces regeneration on the next build,
//! and re-running a build with nothing changed does no pixel work.
//!
//! ## Layout
//!
//! Thumbnails mirror the source layout below the image root. The extension
//! is always normalized to `.jpg`:
//!
//! ```text
//! images/BSA/Camporee/tent.PNG  →  gen/thumbnails/BSA/Camporee/tent.jpg
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

/// Thumbnail location for a source image.
///
/// `relative_dir` is the project's folder relative to the image root;
/// the filename keeps its stem and gets a `.jpg` extension.
pub fn thumbnail_path(thumbnails_root: &Path, relative_dir: &Path, filename: &str) -> PathBuf {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    thumbnails_root
        .join(relative_dir)
        .join(format!("{stem}.jpg"))
}

/// Whether `thumbnail` can be reused for `source`.
pub fn is_fresh(source: &Path, thumbnail: &Path) -> bool {
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified());
    match (modified(source), modified(thumbnail)) {
        (Ok(src), Ok(thumb)) => thumb > src,
        _ => false,
    }
}

/// Summary of thumbnail work for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailStats {
    pub generated: u32,
    pub reused: u32,
    pub failed: u32,
}

impl ThumbnailStats {
    pub fn generated(&mut self) {
        self.generated += 1;
    }

    pub fn reused(&mut self) {
        self.reused += 1;
    }

    pub fn failed(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.generated + self.reused + self.failed
    }

    /// Combine two partial tallies (used when folding parallel results).
    pub fn merge(self, other: Self) -> Self {
        Self {
            generated: self.generated + other.generated,
            reused: self.reused + other.reused,
            failed: self.failed + other.failed,
        }
    }
}

impl fmt::Display for ThumbnailStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} reused, {} generated, {} failed ({} total)",
                self.reused,
                self.generated,
                self.failed,
                self.total()
            )
        } else if self.reused > 0 {
            write!(
                f,
                "{} reused, {} generated ({} total)",
                self.reused,
                self.generated,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.generated)
        }
    }
}
