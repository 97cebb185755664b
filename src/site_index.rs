//! The site index: one summary document for the whole portfolio.
//!
//! Written to `gen/site-index.json` at the end of every build and consumed
//! by the home page and any client-side code that wants the project list:
//!
//! ```json
//! {
//!   "generated": "2025-01-01T12:00:00+00:00",
//!   "total_projects": 2,
//!   "total_images": 5,
//!   "projects": {
//!     "gokart": {
//!       "path": "Gokart",
//!       "images": 3,
//!       "title": "Electric Go-Kart",
//!       "year": "2023",
//!       "tags": "Welding • Electronics",
//!       "category": "makers",
//!       "featured": true,
//!       "page": "projects/gokart.html",
//!       "manifest": "gen/manifests/gokart.json"
//!     }
//!   }
//! }
//! ```
//!
//! Projects appear in `featuredOrder` first (slugs that were actually
//! discovered, in list order), then the rest in scan order. `images` and
//! `total_images` count files on disk, hidden ones included.

use crate::config::SiteLayout;
use crate::files;
use crate::metadata::ProjectsMetadata;
use crate::scan::{ProjectFolder, ScanResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteIndex {
    pub generated: String,
    pub total_projects: usize,
    pub total_images: usize,
    pub projects: IndexMap<String, IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: String,
    pub images: usize,
    pub title: String,
    pub year: String,
    pub tags: String,
    pub category: String,
    pub featured: bool,
    pub page: String,
    pub manifest: String,
}

/// Scanned projects in listing order: `featuredOrder` first, then scan order.
pub fn listing_order<'a>(
    scan: &'a ScanResult,
    metadata: &ProjectsMetadata,
) -> Vec<&'a ProjectFolder> {
    let mut ordered: Vec<&ProjectFolder> = Vec::with_capacity(scan.projects.len());
    for slug in &metadata.featured_order {
        if let Some(project) = scan.projects.get(slug) {
            if !ordered.iter().any(|p| p.slug == *slug) {
                ordered.push(project);
            }
        }
    }
    for project in scan.projects.values() {
        if !ordered.iter().any(|p| p.slug == project.slug) {
            ordered.push(project);
        }
    }
    ordered
}

/// Aggregate scan results and metadata into the site index.
pub fn build_site_index(
    layout: &SiteLayout,
    scan: &ScanResult,
    metadata: &ProjectsMetadata,
    generated: &str,
) -> SiteIndex {
    let projects: IndexMap<String, IndexEntry> = listing_order(scan, metadata)
        .into_iter()
        .map(|project| {
            let meta = metadata.resolve_project(&project.slug);
            let entry = IndexEntry {
                path: project.display_path(),
                images: project.image_count(),
                title: meta.title,
                year: meta.year,
                tags: meta.tags,
                category: meta.category,
                featured: meta.featured,
                page: layout.site_relative(&layout.page_path(&project.slug)),
                manifest: layout.site_relative(&layout.manifest_path(&project.slug)),
            };
            (project.slug.clone(), entry)
        })
        .collect();

    SiteIndex {
        generated: generated.to_string(),
        total_projects: projects.len(),
        total_images: scan.total_images(),
        projects,
    }
}

/// Write the index to `gen/site-index.json`.
pub fn write_site_index(layout: &SiteLayout, index: &SiteIndex) -> std::io::Result<()> {
    files::write_json(&layout.site_index, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::metadata::ProjectEntry;
    use crate::test_helpers::project;
    use std::path::Path;

    const NOW: &str = "2025-01-01T00:00:00+00:00";

    fn scan_of(projects: &[(&str, &[&str])]) -> ScanResult {
        let mut result = ScanResult::default();
        for (slug, images) in projects {
            result
                .projects
                .insert(slug.to_string(), project(slug, images));
        }
        result
    }

    fn layout() -> SiteLayout {
        SiteConfig::default().layout(Path::new("/site"))
    }

    #[test]
    fn totals_sum_discovered_images() {
        let scan = scan_of(&[("a", &["1.jpg", "2.jpg"]), ("b", &["1.jpg"])]);
        let index = build_site_index(&layout(), &scan, &ProjectsMetadata::default(), NOW);
        assert_eq!(index.total_projects, 2);
        assert_eq!(index.total_images, 3);
        assert_eq!(index.projects["a"].images, 2);
    }

    #[test]
    fn missing_metadata_is_synthesized() {
        let scan = scan_of(&[("knife-&-hatchet", &["1.jpg"])]);
        let index = build_site_index(&layout(), &scan, &ProjectsMetadata::default(), NOW);
        let entry = &index.projects["knife-&-hatchet"];
        assert_eq!(entry.title, "Knife & Hatchet");
        assert_eq!(entry.category, "makers");
        assert!(!entry.featured);
        assert_eq!(entry.page, "projects/knife-&-hatchet.html");
        assert_eq!(entry.manifest, "gen/manifests/knife-&-hatchet.json");
    }

    #[test]
    fn metadata_entry_is_used() {
        let scan = scan_of(&[("gokart", &["1.jpg"])]);
        let mut metadata = ProjectsMetadata::default();
        metadata.set_project(
            "gokart",
            ProjectEntry {
                title: Some("Electric Go-Kart".into()),
                featured: Some(true),
                ..Default::default()
            },
        );
        let index = build_site_index(&layout(), &scan, &metadata, NOW);
        assert_eq!(index.projects["gokart"].title, "Electric Go-Kart");
        assert!(index.projects["gokart"].featured);
    }

    #[test]
    fn featured_order_comes_first() {
        let scan = scan_of(&[("a", &["1.jpg"]), ("b", &["1.jpg"]), ("c", &["1.jpg"])]);
        let metadata = ProjectsMetadata {
            featured_order: vec!["c".into(), "missing".into(), "a".into(), "c".into()],
            ..Default::default()
        };
        let index = build_site_index(&layout(), &scan, &metadata, NOW);
        let slugs: Vec<&str> = index.projects.keys().map(String::as_str).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
        assert_eq!(index.total_projects, 3);
    }

    #[test]
    fn without_featured_order_scan_order_is_kept() {
        let scan = scan_of(&[("z", &["1.jpg"]), ("a", &["1.jpg"])]);
        let index = build_site_index(&layout(), &scan, &ProjectsMetadata::default(), NOW);
        let slugs: Vec<&str> = index.projects.keys().map(String::as_str).collect();
        assert_eq!(slugs, vec!["z", "a"]);
    }

    #[test]
    fn serialized_project_order_is_preserved() {
        let scan = scan_of(&[("b", &["1.jpg"]), ("a", &["1.jpg"])]);
        let index = build_site_index(&layout(), &scan, &ProjectsMetadata::default(), NOW);
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }
}
