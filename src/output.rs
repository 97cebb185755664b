//! CLI output formatting for the build commands.
//!
//! # Information-First Display
//!
//! Each project leads with its positional index, display title and image
//! count; the slug and source folder follow as indented context lines. The
//! output reads as a content inventory while still pointing back at the
//! folders on disk.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Projects
//! 001 Gokart (3 images)
//!     Slug: gokart
//!     Source: Gokart/
//!     001 img1.jpg
//!     002 img2.png
//! 002 Bsa Camporee (1 image)
//!     Slug: bsa-camporee
//!     Source: BSA/Camporee/
//!     001 tent.jpg
//!
//! Collisions
//!     my-build: kept My Build/, dropped my-build/
//!
//! 2 projects, 4 images
//! ```
//!
//! ## Build
//!
//! ```text
//! Projects: 2
//! Images: 4 (3 visible)
//! Thumbnails: 1 reused, 3 generated (4 total)
//! Collisions: 1
//!     my-build: kept My Build/, dropped my-build/
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::ThumbnailStats;
use crate::manifest::Manifest;
use crate::naming::title_from_slug;
use crate::pipeline::BuildReport;
use crate::scan::{ScanResult, SlugCollision};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Format a project header: positional index + title + image count.
///
/// ```text
/// 001 Gokart (3 images)
/// ```
fn project_header(index: usize, title: &str, images: usize) -> String {
    format!("{} {} ({})", format_index(index), title, plural(images, "image"))
}

/// A folder relative to the image root, shown with a trailing slash.
fn folder(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let shown = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{shown}/")
}

fn collision_line(collision: &SlugCollision, root: &Path) -> String {
    format!(
        "{}{}: kept {}, dropped {}",
        indent(1),
        collision.slug,
        folder(&collision.kept, root),
        folder(&collision.dropped, root)
    )
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the scan result as a project inventory.
pub fn format_scan_output(result: &ScanResult, images_root: &Path) -> Vec<String> {
    let mut lines = vec!["Projects".to_string()];

    for (i, project) in result.projects.values().enumerate() {
        lines.push(project_header(
            i + 1,
            &title_from_slug(&project.slug),
            project.image_count(),
        ));
        lines.push(format!("{}Slug: {}", indent(1), project.slug));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            folder(&project.path, images_root)
        ));
        for (j, name) in project.images.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), name));
        }
    }

    if !result.collisions.is_empty() {
        lines.push(String::new());
        lines.push("Collisions".to_string());
        for collision in &result.collisions {
            lines.push(collision_line(collision, images_root));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(result.projects.len(), "project"),
        plural(result.total_images(), "image")
    ));
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(result: &ScanResult, images_root: &Path) {
    for line in format_scan_output(result, images_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbnail output
// ============================================================================

pub fn format_thumbnail_stats(stats: &ThumbnailStats) -> String {
    format!("Thumbnails: {stats}")
}

// ============================================================================
// Manifest output
// ============================================================================

/// One line per written manifest: slug, visible count and hidden count.
pub fn format_manifests_output(manifests: &[Manifest]) -> Vec<String> {
    manifests
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let hidden = m.total_count - m.count;
            if hidden > 0 {
                format!(
                    "{} {} → {} ({} hidden)",
                    format_index(i + 1),
                    m.slug,
                    plural(m.count, "image"),
                    hidden
                )
            } else {
                format!(
                    "{} {} → {}",
                    format_index(i + 1),
                    m.slug,
                    plural(m.count, "image")
                )
            }
        })
        .collect()
}

/// Print manifest output to stdout.
pub fn print_manifests_output(manifests: &[Manifest]) {
    for line in format_manifests_output(manifests) {
        println!("{}", line);
    }
}

// ============================================================================
// Build summary
// ============================================================================

/// Format the end-of-build summary.
pub fn format_build_summary(report: &BuildReport, images_root: &Path) -> Vec<String> {
    let mut lines = vec![
        format!("Projects: {}", report.projects),
        format!(
            "Images: {} ({} visible)",
            report.images, report.visible_images
        ),
        format_thumbnail_stats(&report.thumbnails),
    ];
    if !report.collisions.is_empty() {
        lines.push(format!("Collisions: {}", report.collisions.len()));
        for collision in &report.collisions {
            lines.push(collision_line(collision, images_root));
        }
    }
    lines
}

/// Print the build summary to stdout.
pub fn print_build_summary(report: &BuildReport, images_root: &Path) {
    for line in format_build_summary(report, images_root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ProjectFolder;
    use std::path::PathBuf;

    fn sample_scan() -> ScanResult {
        let mut result = ScanResult::default();
        result.projects.insert(
            "gokart".into(),
            ProjectFolder {
                slug: "gokart".into(),
                relative_path: PathBuf::from("Gokart"),
                path: PathBuf::from("/site/images/Gokart"),
                images: vec!["img1.jpg".into(), "img2.png".into()],
            },
        );
        result.projects.insert(
            "bsa-camporee".into(),
            ProjectFolder {
                slug: "bsa-camporee".into(),
                relative_path: PathBuf::from("BSA/Camporee"),
                path: PathBuf::from("/site/images/BSA/Camporee"),
                images: vec!["tent.jpg".into()],
            },
        );
        result
    }

    fn collision() -> SlugCollision {
        SlugCollision {
            slug: "my-build".into(),
            kept: PathBuf::from("/site/images/My Build"),
            dropped: PathBuf::from("/site/images/my-build"),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_singular_and_many() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
        assert_eq!(plural(3, "project"), "3 projects");
    }

    #[test]
    fn project_header_format() {
        assert_eq!(project_header(1, "Gokart", 3), "001 Gokart (3 images)");
    }

    #[test]
    fn folder_is_relative_with_trailing_slash() {
        assert_eq!(
            folder(Path::new("/site/images/BSA/Camporee"), Path::new("/site/images")),
            "BSA/Camporee/"
        );
    }

    // =========================================================================
    // Scan output tests
    // =========================================================================

    #[test]
    fn scan_output_lists_projects_in_order() {
        let lines = format_scan_output(&sample_scan(), Path::new("/site/images"));
        assert_eq!(lines[0], "Projects");
        assert_eq!(lines[1], "001 Gokart (2 images)");
        assert_eq!(lines[2], "    Slug: gokart");
        assert_eq!(lines[3], "    Source: Gokart/");
        assert_eq!(lines[4], "    001 img1.jpg");
        assert_eq!(lines[5], "    002 img2.png");
        assert_eq!(lines[6], "002 Bsa Camporee (1 image)");
        assert_eq!(lines[8], "    Source: BSA/Camporee/");
        assert_eq!(lines.last().unwrap(), "2 projects, 3 images");
    }

    #[test]
    fn scan_output_shows_collisions() {
        let mut result = sample_scan();
        result.collisions.push(collision());
        let lines = format_scan_output(&result, Path::new("/site/images"));
        let pos = lines.iter().position(|l| l == "Collisions").unwrap();
        assert_eq!(
            lines[pos + 1],
            "    my-build: kept My Build/, dropped my-build/"
        );
    }

    #[test]
    fn scan_output_without_collisions_has_no_section() {
        let lines = format_scan_output(&sample_scan(), Path::new("/site/images"));
        assert!(!lines.iter().any(|l| l == "Collisions"));
    }

    // =========================================================================
    // Manifest and build output tests
    // =========================================================================

    #[test]
    fn manifests_output_mentions_hidden() {
        let manifests = vec![
            Manifest {
                project: "Gokart".into(),
                slug: "gokart".into(),
                count: 2,
                total_count: 3,
                images: vec!["a.jpg".into(), "b.jpg".into()],
                generated: String::new(),
            },
            Manifest {
                project: "Bed".into(),
                slug: "bed".into(),
                count: 1,
                total_count: 1,
                images: vec!["a.jpg".into()],
                generated: String::new(),
            },
        ];
        let lines = format_manifests_output(&manifests);
        assert_eq!(lines[0], "001 gokart → 2 images (1 hidden)");
        assert_eq!(lines[1], "002 bed → 1 image");
    }

    #[test]
    fn build_summary_lines() {
        let report = BuildReport {
            projects: 2,
            images: 4,
            visible_images: 3,
            thumbnails: ThumbnailStats {
                generated: 3,
                reused: 1,
                failed: 0,
            },
            collisions: vec![collision()],
            generated: String::new(),
        };
        let lines = format_build_summary(&report, Path::new("/site/images"));
        assert_eq!(
            lines,
            vec![
                "Projects: 2",
                "Images: 4 (3 visible)",
                "Thumbnails: 1 reused, 3 generated (4 total)",
                "Collisions: 1",
                "    my-build: kept My Build/, dropped my-build/",
            ]
        );
    }

    #[test]
    fn build_summary_reports_failures() {
        let report = BuildReport {
            projects: 1,
            images: 2,
            visible_images: 2,
            thumbnails: ThumbnailStats {
                generated: 1,
                reused: 0,
                failed: 1,
            },
            collisions: Vec::new(),
            generated: String::new(),
        };
        let lines = format_build_summary(&report, Path::new("/site/images"));
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("1 failed"));
    }
}
