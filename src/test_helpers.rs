//! Shared test utilities for the makerfolio test suite.
//!
//! Provides fixture builders (empty files, real encoded images, mtime
//! control) and lookup helpers that work with scan-phase data structures
//! (`ScanResult`, `ProjectFolder`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_jpeg(&tmp.path().join("images/Gokart/img1.jpg"), 640, 480);
//! let result = scan(&tmp.path().join("images"), &ExclusionPolicy::default()).unwrap();
//!
//! assert_eq!(slugs(&result), vec!["gokart"]);
//! let gokart = find_project(&result, "gokart");
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::scan::{ProjectFolder, ScanResult};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create an empty file at `base/relative`, creating parent directories.
pub fn touch(base: &Path, relative: &str) -> PathBuf {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"").unwrap();
    path
}

/// Write a small valid JPEG with a gradient pattern.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with an alpha channel.
pub fn write_png_rgba(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([200, 40, 40, (x % 256) as u8])
    });
    img.save(path).unwrap();
}

/// Set a file's mtime to `now + offset_secs` (negative moves it back).
pub fn set_mtime_offset(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let time = if offset_secs >= 0 {
        now + Duration::from_secs(offset_secs as u64)
    } else {
        now - Duration::from_secs(offset_secs.unsigned_abs())
    };
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(time)).unwrap();
}

/// Read a file's mtime.
pub fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

// =========================================================================
// Scan lookups, panics with a clear message on miss
// =========================================================================

/// Find a project by slug. Panics if not found.
pub fn find_project<'a>(result: &'a ScanResult, slug: &str) -> &'a ProjectFolder {
    result.get(slug).unwrap_or_else(|| {
        let available = slugs(result);
        panic!("project '{slug}' not found. Available: {available:?}")
    })
}

/// All project slugs in discovery order.
pub fn slugs(result: &ScanResult) -> Vec<&str> {
    result.projects.keys().map(String::as_str).collect()
}

/// Build a `ProjectFolder` by hand for tests that don't touch the disk.
pub fn project(slug: &str, images: &[&str]) -> ProjectFolder {
    ProjectFolder {
        slug: slug.to_string(),
        relative_path: PathBuf::from(slug),
        path: PathBuf::from("/images").join(slug),
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}
