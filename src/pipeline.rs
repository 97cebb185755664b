//! Build orchestration.
//!
//! Runs the stages in order against one site root:
//!
//! ```text
//! 1. Scan        images/           →  projects            (filesystem → structured data)
//! 2. Thumbnails  projects          →  gen/thumbnails/     (bounded JPEG copies)
//! 3. Manifests   projects + overrides  →  gen/manifests/
//! 4. Pages       manifests + metadata  →  projects/*.html, index.html
//! 5. Index       projects + metadata   →  gen/site-index.json
//! ```
//!
//! Every stage overwrites its outputs in full, so running the build twice in
//! a row is safe and the second run only re-encodes thumbnails whose source
//! changed. [`refresh_project`] is the targeted variant used by the admin
//! server after a mutation that touches one project.

use crate::cache::ThumbnailStats;
use crate::config::{SiteConfig, SiteLayout};
use crate::generate::{self, GenerateError, PageContext};
use crate::imaging::ThumbnailConfig;
use crate::manifest::{self, Manifest, ManifestError, timestamp};
use crate::metadata::{self, MetadataError, ProjectsMetadata};
use crate::overrides::{CustomOrder, HiddenImages, OverrideError, OverrideStore};
use crate::process;
use crate::scan::{self, ScanError, ScanResult, SlugCollision};
use crate::site_index;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("no projects found under {}", .0.display())]
    NoProjects(PathBuf),
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("overrides: {0}")]
    Override(#[from] OverrideError),
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("pages: {0}")]
    Generate(#[from] GenerateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a full build did, for the CLI summary and the admin status.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub projects: usize,
    pub images: usize,
    /// Images left in manifests after hidden ones are dropped.
    pub visible_images: usize,
    pub thumbnails: ThumbnailStats,
    pub collisions: Vec<SlugCollision>,
    pub generated: String,
}

/// Everything read from the site root before any output is written.
struct SiteState {
    layout: SiteLayout,
    metadata: ProjectsMetadata,
    orders: CustomOrder,
    hidden: HiddenImages,
    scan: ScanResult,
}

impl SiteState {
    fn load(site_root: &Path, config: &SiteConfig) -> Result<Self, BuildError> {
        let layout = config.layout(site_root);
        let metadata = metadata::load_metadata(&layout.metadata)?;
        let store = OverrideStore::new(&layout.image_orders, &layout.hidden_images);
        let orders = store.load_custom_order()?;
        let hidden = store.load_hidden_images()?;
        let scan = scan::scan(&layout.images, &config.exclusion_policy())?;
        Ok(Self {
            layout,
            metadata,
            orders,
            hidden,
            scan,
        })
    }

    fn manifests(&self, generated: &str) -> Vec<Manifest> {
        self.scan
            .projects
            .values()
            .map(|p| manifest::build_manifest(p, &self.orders, &self.hidden, generated))
            .collect()
    }

    fn page_context(&self, now: DateTime<Utc>) -> PageContext {
        PageContext::new(&self.layout, &self.metadata, &asset_version(now))
    }

    /// Home page and site index, which depend on every project.
    fn write_site_wide(
        &self,
        manifests: &[Manifest],
        ctx: &PageContext,
        generated: &str,
    ) -> Result<(), BuildError> {
        let index =
            site_index::build_site_index(&self.layout, &self.scan, &self.metadata, generated);
        generate::write_home_page(&self.layout, &index, &self.metadata, manifests, ctx)?;
        site_index::write_site_index(&self.layout, &index)?;
        Ok(())
    }
}

/// Cache-busting query value for stylesheet and script links.
fn asset_version(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Run the full build for the site at `site_root`.
pub fn run_build(site_root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    run_build_at(site_root, config, Utc::now())
}

/// [`run_build`] with an explicit clock, so outputs can be compared.
pub fn run_build_at(
    site_root: &Path,
    config: &SiteConfig,
    now: DateTime<Utc>,
) -> Result<BuildReport, BuildError> {
    let state = SiteState::load(site_root, config)?;
    if state.scan.is_empty() {
        return Err(BuildError::NoProjects(state.layout.images.clone()));
    }
    let generated = timestamp(now);
    info!(
        projects = state.scan.projects.len(),
        images = state.scan.total_images(),
        "scan complete"
    );

    let thumbnails = process::generate_thumbnails(
        state.scan.projects.values(),
        &state.layout.thumbnails,
        &ThumbnailConfig::from_config(&config.thumbnails),
    );

    let manifests = manifest::write_manifests(
        &state.layout,
        &state.scan,
        &state.orders,
        &state.hidden,
        &generated,
    )?;

    let ctx = state.page_context(now);
    for (project, manifest) in state.scan.projects.values().zip(&manifests) {
        let meta = state.metadata.resolve_project(&project.slug);
        generate::write_project_page(&state.layout, project, manifest, &meta, &ctx)?;
    }
    state.write_site_wide(&manifests, &ctx, &generated)?;

    Ok(BuildReport {
        projects: state.scan.projects.len(),
        images: state.scan.total_images(),
        visible_images: manifests.iter().map(|m| m.count).sum(),
        thumbnails,
        collisions: state.scan.collisions.clone(),
        generated,
    })
}

/// Bring one project's outputs up to date after a targeted change.
///
/// Regenerates the project's thumbnails, manifest and page, then the home
/// page and site index. If the folder no longer holds any images its
/// manifest and page are removed and `None` is returned.
pub fn refresh_project(
    site_root: &Path,
    config: &SiteConfig,
    slug: &str,
) -> Result<Option<Manifest>, BuildError> {
    let now = Utc::now();
    let state = SiteState::load(site_root, config)?;
    let generated = timestamp(now);
    let ctx = state.page_context(now);
    let manifests = state.manifests(&generated);

    let refreshed = match state.scan.get(slug) {
        Some(project) => {
            process::generate_thumbnails(
                [project],
                &state.layout.thumbnails,
                &ThumbnailConfig::from_config(&config.thumbnails),
            );
            let manifest =
                manifest::build_manifest(project, &state.orders, &state.hidden, &generated);
            manifest::write_manifest(&state.layout, &manifest)?;
            let meta = state.metadata.resolve_project(slug);
            generate::write_project_page(&state.layout, project, &manifest, &meta, &ctx)?;
            Some(manifest)
        }
        None => {
            manifest::remove_manifest(&state.layout, slug)?;
            generate::remove_project_page(&state.layout, slug)?;
            None
        }
    };

    state.write_site_wide(&manifests, &ctx, &generated)?;
    Ok(refreshed)
}

/// Rewrite only the manifests (no thumbnails, no pages).
pub fn write_all_manifests(
    site_root: &Path,
    config: &SiteConfig,
) -> Result<Vec<Manifest>, BuildError> {
    let state = SiteState::load(site_root, config)?;
    if state.scan.is_empty() {
        return Err(BuildError::NoProjects(state.layout.images.clone()));
    }
    Ok(manifest::write_manifests(
        &state.layout,
        &state.scan,
        &state.orders,
        &state.hidden,
        &timestamp(Utc::now()),
    )?)
}

/// Generate thumbnails only.
pub fn write_all_thumbnails(
    site_root: &Path,
    config: &SiteConfig,
) -> Result<ThumbnailStats, BuildError> {
    let state = SiteState::load(site_root, config)?;
    if state.scan.is_empty() {
        return Err(BuildError::NoProjects(state.layout.images.clone()));
    }
    Ok(process::generate_thumbnails(
        state.scan.projects.values(),
        &state.layout.thumbnails,
        &ThumbnailConfig::from_config(&config.thumbnails),
    ))
}
