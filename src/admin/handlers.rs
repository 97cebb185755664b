//! Request handlers for the admin API.
//!
//! Filesystem work runs on tokio's blocking pool. Every mutation finishes by
//! refreshing the affected project, so the manifest, page, home page and
//! site index on disk reflect the change when the response is sent.

use super::AdminState;
use super::error::AdminError;
use super::tracker::{BuildOutcome, BuildStatus};
use crate::cache::thumbnail_path;
use crate::files;
use crate::imaging::{RustBackend, get_dimensions};
use crate::manifest::{Manifest, timestamp};
use crate::metadata::{self, ProjectEntry, ProjectMeta};
use crate::naming::{is_safe_segment, slug_from_relative_path};
use crate::output;
use crate::pipeline;
use crate::scan::{self, ProjectFolder, find_folder, is_image_filename};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

/// Body of the order and hidden endpoints.
#[derive(Debug, Deserialize)]
pub struct ImageList {
    pub images: Vec<String>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Deserialize)]
pub struct NewProject {
    /// Folder name under the image root.
    pub name: String,
    #[serde(default)]
    pub metadata: Option<ProjectEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// One git command run by the publish endpoint.
#[derive(Debug, Serialize)]
pub struct PublishStep {
    pub command: String,
    pub success: bool,
    pub output: String,
}

fn check_segment(value: &str, what: &str) -> Result<(), AdminError> {
    if is_safe_segment(value) {
        Ok(())
    } else {
        Err(AdminError::BadRequest(format!("invalid {what}: {value:?}")))
    }
}

fn check_image_name(filename: &str) -> Result<(), AdminError> {
    check_segment(filename, "filename")?;
    if !is_image_filename(filename) {
        return Err(AdminError::BadRequest(format!(
            "not an image filename: {filename:?}"
        )));
    }
    Ok(())
}

/// The scanned project for `slug`, or 404.
fn require_project(state: &AdminState, slug: &str) -> Result<ProjectFolder, AdminError> {
    let layout = state.layout();
    let result = scan::scan(&layout.images, &state.config.exclusion_policy())
        .map_err(pipeline::BuildError::from)?;
    result
        .get(slug)
        .cloned()
        .ok_or_else(|| AdminError::NotFound(format!("no project {slug:?}")))
}

/// The folder for `slug`, even if it holds no images yet, or 404.
fn require_folder(state: &AdminState, slug: &str) -> Result<PathBuf, AdminError> {
    let layout = state.layout();
    find_folder(&layout.images, &state.config.exclusion_policy(), slug)
        .ok_or_else(|| AdminError::NotFound(format!("no project folder {slug:?}")))
}

fn refresh(state: &AdminState, slug: &str) -> Result<Option<Manifest>, AdminError> {
    Ok(pipeline::refresh_project(&state.site_root, &state.config, slug)?)
}

// ============================================================================
// Build
// ============================================================================

pub async fn build_status(State(state): State<AdminState>) -> Json<BuildStatus> {
    Json(state.tracker.status())
}

pub async fn start_build(
    State(state): State<AdminState>,
) -> Result<(StatusCode, Json<Value>), AdminError> {
    let guard = state
        .tracker
        .try_start()
        .ok_or_else(|| AdminError::Conflict("build already in progress".into()))?;

    spawn_blocking(move || {
        let images_root = state.layout().images;
        let outcome = match pipeline::run_build(&state.site_root, &state.config) {
            Ok(report) => {
                info!(projects = report.projects, images = report.images, "build finished");
                BuildOutcome::succeeded(output::format_build_summary(&report, &images_root))
            }
            Err(err) => {
                warn!("build failed: {err}");
                BuildOutcome::failed(err.to_string())
            }
        };
        guard.finish(outcome, timestamp(Utc::now()));
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Build started", "running": true })),
    ))
}

// ============================================================================
// Project metadata, order and visibility
// ============================================================================

pub async fn update_metadata(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(entry): Json<ProjectEntry>,
) -> Result<Json<ProjectMeta>, AdminError> {
    check_segment(&slug, "slug")?;
    let resolved = spawn_blocking(move || -> Result<ProjectMeta, AdminError> {
        let path = state.layout().metadata;
        let mut doc = metadata::load_metadata(&path)?;
        doc.set_project(&slug, entry);
        metadata::save_metadata(&path, &doc)?;
        refresh(&state, &slug)?;
        Ok(doc.resolve_project(&slug))
    })
    .await??;
    Ok(Json(resolved))
}

pub async fn set_order(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(body): Json<ImageList>,
) -> Result<Json<Manifest>, AdminError> {
    check_segment(&slug, "slug")?;
    let manifest = spawn_blocking(move || -> Result<Manifest, AdminError> {
        require_project(&state, &slug)?;
        state.store().set_custom_order(&slug, &body.images)?;
        refresh(&state, &slug)?.ok_or_else(|| AdminError::NotFound(format!("no project {slug:?}")))
    })
    .await??;
    Ok(Json(manifest))
}

pub async fn set_hidden(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(body): Json<ImageList>,
) -> Result<Json<Manifest>, AdminError> {
    check_segment(&slug, "slug")?;
    let manifest = spawn_blocking(move || -> Result<Manifest, AdminError> {
        require_project(&state, &slug)?;
        state.store().set_hidden_images(&slug, &body.images)?;
        refresh(&state, &slug)?.ok_or_else(|| AdminError::NotFound(format!("no project {slug:?}")))
    })
    .await??;
    Ok(Json(manifest))
}

// ============================================================================
// Images
// ============================================================================

/// Store the request body as `<project folder>/<filename>`.
///
/// The bytes must decode as an image; anything else is rejected before the
/// file appears under its final name.
pub async fn upload_image(
    State(state): State<AdminState>,
    Path((slug, filename)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<Manifest>), AdminError> {
    check_segment(&slug, "slug")?;
    check_image_name(&filename)?;
    if body.is_empty() {
        return Err(AdminError::BadRequest("empty upload".into()));
    }

    let manifest = spawn_blocking(move || -> Result<Manifest, AdminError> {
        let folder = require_folder(&state, &slug)?;
        let mut tmp = files::temp_file_in(&folder)?;
        tmp.write_all(&body)?;
        tmp.flush()?;
        let (width, height) = get_dimensions(&RustBackend::new(), tmp.path())
            .map_err(|err| AdminError::BadRequest(format!("not a readable image: {err}")))?;
        tmp.persist(folder.join(&filename)).map_err(|err| err.error)?;
        info!(slug = %slug, file = %filename, width, height, "image uploaded");

        refresh(&state, &slug)?
            .ok_or_else(|| AdminError::Internal(format!("uploaded image missing from {slug:?}")))
    })
    .await??;
    Ok((StatusCode::CREATED, Json(manifest)))
}

/// Delete a source image, its thumbnail and any override entries naming it.
///
/// Responds with the refreshed manifest, or `null` when the folder no
/// longer holds any images.
pub async fn delete_image(
    State(state): State<AdminState>,
    Path((slug, filename)): Path<(String, String)>,
) -> Result<Json<Option<Manifest>>, AdminError> {
    check_segment(&slug, "slug")?;
    check_image_name(&filename)?;

    let manifest = spawn_blocking(move || -> Result<Option<Manifest>, AdminError> {
        let layout = state.layout();
        let folder = require_folder(&state, &slug)?;
        let source = folder.join(&filename);
        if !source.is_file() {
            return Err(AdminError::NotFound(format!("no image {filename:?} in {slug:?}")));
        }
        std::fs::remove_file(&source)?;
        let relative = folder.strip_prefix(&layout.images).unwrap_or(&folder);
        files::remove_if_exists(&thumbnail_path(&layout.thumbnails, relative, &filename))?;
        state.store().forget_image(&slug, &filename)?;
        info!(slug = %slug, file = %filename, "image deleted");
        refresh(&state, &slug)
    })
    .await??;
    Ok(Json(manifest))
}

// ============================================================================
// Projects
// ============================================================================

pub async fn create_project(
    State(state): State<AdminState>,
    Json(body): Json<NewProject>,
) -> Result<(StatusCode, Json<Value>), AdminError> {
    let name = body.name.trim().to_string();
    check_segment(&name, "project name")?;
    if state.config.exclusion_policy().skips_name(&name) {
        return Err(AdminError::BadRequest(format!(
            "{name:?} is excluded from scanning"
        )));
    }
    let slug = slug_from_relative_path(std::path::Path::new(&name));

    let created = spawn_blocking(move || -> Result<Value, AdminError> {
        let layout = state.layout();
        if find_folder(&layout.images, &state.config.exclusion_policy(), &slug).is_some() {
            return Err(AdminError::Conflict(format!("project {slug:?} already exists")));
        }
        std::fs::create_dir_all(layout.images.join(&name))?;
        if let Some(entry) = body.metadata {
            let mut doc = metadata::load_metadata(&layout.metadata)?;
            doc.set_project(&slug, entry);
            metadata::save_metadata(&layout.metadata, &doc)?;
        }
        info!(slug = %slug, "project created");
        Ok(json!({ "slug": slug, "path": name }))
    })
    .await??;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove a project: its folder, thumbnails, manifest, page, metadata entry
/// and override entries.
///
/// A folder that other galleries live inside is refused with 409.
pub async fn delete_project(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AdminError> {
    check_segment(&slug, "slug")?;

    spawn_blocking(move || -> Result<(), AdminError> {
        let layout = state.layout();
        let folder = require_folder(&state, &slug)?;
        let relative = folder
            .strip_prefix(&layout.images)
            .unwrap_or(&folder)
            .to_path_buf();
        if relative.as_os_str().is_empty() {
            return Err(AdminError::BadRequest("refusing to delete the image root".into()));
        }

        let scanned = scan::scan(&layout.images, &state.config.exclusion_policy())
            .map_err(pipeline::BuildError::from)?;
        let nested: Vec<&str> = scanned
            .projects
            .values()
            .filter(|p| p.path != folder && p.path.starts_with(&folder))
            .map(|p| p.slug.as_str())
            .collect();
        if !nested.is_empty() {
            return Err(AdminError::Conflict(format!(
                "{slug:?} contains other projects: {}",
                nested.join(", ")
            )));
        }

        std::fs::remove_dir_all(&folder)?;
        let thumbs = layout.thumbnails.join(&relative);
        if thumbs.is_dir() {
            std::fs::remove_dir_all(&thumbs)?;
        }

        let mut doc = metadata::load_metadata(&layout.metadata)?;
        if doc.remove_project(&slug) {
            metadata::save_metadata(&layout.metadata, &doc)?;
        }
        state.store().remove_project(&slug)?;
        refresh(&state, &slug)?;
        info!(slug = %slug, "project deleted");
        Ok(())
    })
    .await??;
    Ok(Json(json!({ "deleted": true })))
}

// ============================================================================
// Publish
// ============================================================================

async fn git(site_root: &std::path::Path, args: &[&str]) -> Result<PublishStep, AdminError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(site_root)
        .output()
        .await?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(PublishStep {
        command: format!("git {}", args.join(" ")),
        success: output.status.success(),
        output: text.trim().to_string(),
    })
}

/// Commit everything in the site root and push it.
///
/// A commit with nothing to commit is not a failure; the push still runs.
pub async fn publish(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<Json<Vec<PublishStep>>, AdminError> {
    let request: PublishRequest = if body.is_empty() {
        PublishRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AdminError::BadRequest(format!("invalid publish request: {err}")))?
    };
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Update portfolio {}", Utc::now().format("%Y-%m-%d %H:%M")));

    let mut steps = Vec::new();
    for args in [
        vec!["add", "-A"],
        vec!["commit", "-m", message.as_str()],
        vec!["push"],
    ] {
        let mut step = git(&state.site_root, &args).await?;
        if args[0] == "commit" && !step.success && step.output.contains("nothing to commit") {
            step.success = true;
        }
        if !step.success {
            return Err(AdminError::Internal(format!(
                "{} failed: {}",
                step.command, step.output
            )));
        }
        steps.push(step);
    }
    info!("site published");
    Ok(Json(steps))
}
