//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site root (the directory that holds `images/`, `gen/`, `projects/` and
//! the JSON documents) and is entirely optional: stock defaults are used for
//! anything it does not set.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! images = "images"                       # Image root scanned for galleries
//! generated = "gen"                       # thumbnails/, manifests/, site-index.json
//! pages = "projects"                      # Rendered project pages
//! metadata = "projects-metadata.json"
//! image_orders = "image-orders.json"
//! hidden_images = "hidden-images.json"
//!
//! [scan]
//! max_depth = 3                           # Levels below the image root
//! excluded = ["thumbnails", "gen", ".git", "__pycache__", "venv", "node_modules", ".DS_Store"]
//! skip_subfolders = ["final", "page1", "page2"]   # Matched case-insensitively
//!
//! [thumbnails]
//! max_width = 200
//! max_height = 200
//! quality = 75                            # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4                       # Max parallel workers (omit for auto = CPU cores)
//!
//! [server]
//! address = "127.0.0.1:5000"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [thumbnails]
//! max_width = 400
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::scan::ExclusionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside the site root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Locations of inputs and generated artifacts, relative to the site root.
    pub paths: PathsConfig,
    /// Gallery discovery rules.
    pub scan: ScanConfig,
    /// Thumbnail bounds and encoding quality.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Admin server settings.
    pub server: ServerConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.quality == 0 || self.thumbnails.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.max_width == 0 || self.thumbnails.max_height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_width and max_height must be non-zero".into(),
            ));
        }
        if self.paths.images.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.images must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every configured path against the site root.
    pub fn layout(&self, site_root: &Path) -> SiteLayout {
        let generated = site_root.join(&self.paths.generated);
        SiteLayout {
            root: site_root.to_path_buf(),
            images: site_root.join(&self.paths.images),
            thumbnails: generated.join("thumbnails"),
            manifests: generated.join("manifests"),
            site_index: generated.join("site-index.json"),
            pages: site_root.join(&self.paths.pages),
            home_page: site_root.join("index.html"),
            metadata: site_root.join(&self.paths.metadata),
            image_orders: site_root.join(&self.paths.image_orders),
            hidden_images: site_root.join(&self.paths.hidden_images),
            generated,
        }
    }

    /// The scanner's exclusion policy as described by `[scan]`.
    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(
            self.scan.excluded.iter().cloned(),
            self.scan.skip_subfolders.iter().cloned(),
            self.scan.max_depth,
        )
    }
}

/// Concrete filesystem locations for one site, derived from [`PathsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub root: PathBuf,
    pub images: PathBuf,
    pub generated: PathBuf,
    pub thumbnails: PathBuf,
    pub manifests: PathBuf,
    pub site_index: PathBuf,
    pub pages: PathBuf,
    pub home_page: PathBuf,
    pub metadata: PathBuf,
    pub image_orders: PathBuf,
    pub hidden_images: PathBuf,
}

impl SiteLayout {
    /// Path of the manifest for `slug`.
    pub fn manifest_path(&self, slug: &str) -> PathBuf {
        self.manifests.join(format!("{slug}.json"))
    }

    /// Path of the rendered page for `slug`.
    pub fn page_path(&self, slug: &str) -> PathBuf {
        self.pages.join(format!("{slug}.html"))
    }

    /// Path of `target` relative to the site root, with `/` separators.
    ///
    /// Used for the links written into the site index and the HTML pages.
    pub fn site_relative(&self, target: &Path) -> String {
        target
            .strip_prefix(&self.root)
            .unwrap_or(target)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Input and output locations, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub images: String,
    pub generated: String,
    pub pages: String,
    pub metadata: String,
    pub image_orders: String,
    pub hidden_images: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images: "images".to_string(),
            generated: "gen".to_string(),
            pages: "projects".to_string(),
            metadata: "projects-metadata.json".to_string(),
            image_orders: "image-orders.json".to_string(),
            hidden_images: "hidden-images.json".to_string(),
        }
    }
}

/// Gallery discovery rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Deepest directory level (below the image root) that may become a gallery.
    pub max_depth: usize,
    /// Directory names never visited. Matched exactly (case-sensitive).
    pub excluded: Vec<String>,
    /// Subfolder names that hold staging material rather than galleries.
    /// Matched case-insensitively.
    pub skip_subfolders: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            excluded: [
                "thumbnails",
                "gen",
                ".git",
                "__pycache__",
                "venv",
                "node_modules",
                ".DS_Store",
            ]
            .map(String::from)
            .to_vec(),
            skip_subfolders: [
                "final",
                "page1",
                "page2",
                "section1-process",
                "section2-team",
                "shelf_final",
                "temple final",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Upper bound on thumbnail width in pixels.
    pub max_width: u32,
    /// Upper bound on thumbnail height in pixels.
    pub max_height: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_width: 200,
            max_height: 200,
            quality: 75,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Admin server settings.
///
/// The admin password is never stored here; it comes from the
/// `ADMIN_PASSWORD` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the admin server binds to.
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(site_root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = site_root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(site_root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(site_root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# makerfolio configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
# Paths are relative to the site root (the directory holding this file).

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
# Image root. Every folder below it that directly holds images is a gallery.
images = "images"

# Generated artifacts: thumbnails/, manifests/ and site-index.json.
generated = "gen"

# Rendered project pages (<slug>.html).
pages = "projects"

# Project titles, years, tags and site settings.
metadata = "projects-metadata.json"

# Per-project custom image order and hidden images.
image_orders = "image-orders.json"
hidden_images = "hidden-images.json"

# ---------------------------------------------------------------------------
# Gallery discovery
# ---------------------------------------------------------------------------
[scan]
# Deepest directory level below the image root that can become a gallery.
max_depth = 3

# Directory names that are never visited (exact match).
excluded = ["thumbnails", "gen", ".git", "__pycache__", "venv", "node_modules", ".DS_Store"]

# Staging subfolders that never become galleries (case-insensitive match).
skip_subfolders = ["final", "page1", "page2", "section1-process", "section2-team", "shelf_final", "temple final"]

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Bounding box in pixels. Aspect ratio is preserved; images are never upscaled.
max_width = 200
max_height = 200

# JPEG quality (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Admin server
# ---------------------------------------------------------------------------
[server]
# The admin password is read from the ADMIN_PASSWORD environment variable.
address = "127.0.0.1:5000"
"##
}
