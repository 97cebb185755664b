//! # Makerfolio
//!
//! A static-site build pipeline for a personal maker portfolio. The image
//! folder tree is the data source: every folder that directly holds images
//! becomes a project gallery, and a handful of JSON documents next to it
//! carry titles, custom image order and hidden images.
//!
//! # Architecture: Staged Build
//!
//! ```text
//! 1. Scan        images/              →  projects          (filesystem → structured data)
//! 2. Thumbnails  projects             →  gen/thumbnails/   (bounded JPEG copies, mtime cache)
//! 3. Manifests   projects + overrides →  gen/manifests/    (ordered, filtered image lists)
//! 4. Pages       manifests + metadata →  projects/*.html, index.html
//! 5. Index       projects + metadata  →  gen/site-index.json
//! ```
//!
//! Every stage overwrites its outputs in full, so re-running the build is
//! always safe. Thumbnails are the only expensive step and are skipped when
//! the existing file is newer than its source.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the image root under an exclusion policy, yields project folders |
//! | [`naming`] | Slugs and default titles derived from folder paths |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`overrides`] | Custom order and hidden-images documents |
//! | [`metadata`] | `projects-metadata.json` with per-field default resolution |
//! | [`imaging`] | Pure-Rust decode, resize and JPEG encode behind a backend trait |
//! | [`cache`] | Thumbnail paths and the mtime freshness rule |
//! | [`process`] | Parallel thumbnail batch with generated/reused/failed counts |
//! | [`manifest`] | Pure manifest construction and persistence |
//! | [`site_index`] | The aggregate site index |
//! | [`generate`] | Project pages and home page rendered with Maud |
//! | [`pipeline`] | Full build and single-project refresh |
//! | [`admin`] | axum admin server: metadata, images, projects, build, publish |
//! | [`output`] | CLI output formatting |
//! | [`files`] | Atomic JSON document reads and writes |
//!
//! # Design Decisions
//!
//! ## Folders Are Galleries
//!
//! There is no project registry. A folder with images is a project; a
//! folder without is a container. Nested image folders fan out into sibling
//! galleries (`BSA/Camporee` → `bsa-camporee`). Staging folders such as
//! `final/` are skipped by name so working copies never leak into the site.
//!
//! ## JSON Documents, Whole-File Writes
//!
//! Metadata, image order and hidden images are small JSON documents edited
//! by the admin server with read-modify-write. Every write goes to a temp
//! file and is renamed into place, so readers never see a torn document.
//! Concurrent writers race; the last one wins.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): malformed markup
//! is a compile error and every interpolation is escaped.

pub mod admin;
pub mod cache;
pub mod config;
pub mod files;
pub mod generate;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod overrides;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod site_index;

#[cfg(test)]
pub(crate) mod test_helpers;
