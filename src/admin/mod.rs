//! The admin server.
//!
//! An axum app that serves the site root as static files and exposes a small
//! JSON API for editing it:
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | `GET` | `/api/build/status` | Build flag, last run, last result (public) |
//! | `POST` | `/api/build` | Start a full build; 409 while one runs |
//! | `POST` | `/api/projects` | Create a project folder |
//! | `DELETE` | `/api/projects/:slug` | Delete a project and its outputs |
//! | `PUT` | `/api/projects/:slug/metadata` | Replace the metadata entry |
//! | `PUT` | `/api/projects/:slug/order` | Set the custom image order |
//! | `PUT` | `/api/projects/:slug/hidden` | Set the hidden images |
//! | `PUT` | `/api/projects/:slug/images/:filename` | Upload an image (raw body) |
//! | `DELETE` | `/api/projects/:slug/images/:filename` | Delete an image |
//! | `POST` | `/api/publish` | `git add -A`, `commit`, `push` in the site root |
//!
//! Everything except the status route requires the `X-Admin-Password`
//! header to match `ADMIN_PASSWORD`. The check runs before any handler
//! touches the disk. Without a configured password every protected route
//! answers 401.

mod error;
mod handlers;
mod tracker;

pub use error::AdminError;
pub use tracker::{BuildGuard, BuildOutcome, BuildStatus, BuildTracker};

use crate::config::{SiteConfig, SiteLayout};
use crate::overrides::OverrideStore;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Header carrying the admin password.
pub const PASSWORD_HEADER: &str = "x-admin-password";

/// Environment variable the password is read from.
pub const PASSWORD_ENV: &str = "ADMIN_PASSWORD";

/// Largest accepted request body (image uploads).
const UPLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// Shared state for every request.
#[derive(Clone)]
pub struct AdminState {
    pub site_root: PathBuf,
    pub config: Arc<SiteConfig>,
    pub tracker: Arc<BuildTracker>,
    password: Option<Arc<str>>,
}

impl AdminState {
    /// An empty password counts as no password.
    pub fn new(site_root: &Path, config: SiteConfig, password: Option<String>) -> Self {
        Self {
            site_root: site_root.to_path_buf(),
            config: Arc::new(config),
            tracker: Arc::new(BuildTracker::new()),
            password: password.filter(|p| !p.is_empty()).map(Arc::from),
        }
    }

    /// Like [`AdminState::new`], with the password taken from `ADMIN_PASSWORD`.
    pub fn from_env(site_root: &Path, config: SiteConfig) -> Self {
        Self::new(site_root, config, std::env::var(PASSWORD_ENV).ok())
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    fn layout(&self) -> SiteLayout {
        self.config.layout(&self.site_root)
    }

    fn store(&self) -> OverrideStore {
        let layout = self.layout();
        OverrideStore::new(layout.image_orders, layout.hidden_images)
    }
}

async fn require_password(
    State(state): State<AdminState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AdminError> {
    let expected = state.password.as_deref().ok_or(AdminError::Unauthorized)?;
    let given = headers
        .get(PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());
    if !password_matches(expected, given) {
        return Err(AdminError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Compare in constant time over the password bytes.
fn password_matches(expected: &str, given: Option<&str>) -> bool {
    given.is_some_and(|given| bool::from(given.as_bytes().ct_eq(expected.as_bytes())))
}

/// Build the admin app.
pub fn router(state: AdminState) -> Router {
    let protected: Router<AdminState> = Router::new()
        .route("/api/build", post(handlers::start_build))
        .route("/api/publish", post(handlers::publish))
        .route("/api/projects", post(handlers::create_project))
        .route("/api/projects/:slug", delete(handlers::delete_project))
        .route("/api/projects/:slug/metadata", put(handlers::update_metadata))
        .route("/api/projects/:slug/order", put(handlers::set_order))
        .route("/api/projects/:slug/hidden", put(handlers::set_hidden))
        .route(
            "/api/projects/:slug/images/:filename",
            put(handlers::upload_image).delete(handlers::delete_image),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_password,
        ))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT));

    Router::new()
        .route("/api/build/status", get(handlers::build_status))
        .merge(protected)
        .fallback_service(ServeDir::new(&state.site_root))
        .with_state(state)
}

/// Serve the admin app on `address` until Ctrl-C.
pub async fn serve(state: AdminState, address: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("admin server listening on http://{}", listener.local_addr()?);
    if !state.has_password() {
        warn!("{PASSWORD_ENV} is not set; every admin request will be rejected");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::metadata::load_metadata;
    use crate::pipeline::run_build;
    use crate::test_helpers::write_jpeg;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const PASSWORD: &str = "hunter2";

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        write_jpeg(&images.join("Gokart/img1.jpg"), 40, 30);
        write_jpeg(&images.join("Gokart/img2.jpg"), 30, 40);
        write_jpeg(&images.join("BSA/Camporee/tent.jpg"), 20, 20);
        tmp
    }

    fn state(tmp: &TempDir) -> AdminState {
        AdminState::new(tmp.path(), SiteConfig::default(), Some(PASSWORD.into()))
    }

    fn request(method: &str, uri: &str, password: Option<&str>, body: Body) -> Request {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(password) = password {
            builder = builder.header(PASSWORD_HEADER, password);
        }
        builder.body(body).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request {
        let mut req = request(method, uri, Some(PASSWORD), Body::from(body.to_string()));
        req.headers_mut()
            .insert("content-type", "application/json".parse().unwrap());
        req
    }

    async fn send(state: &AdminState, req: Request) -> Response {
        router(state.clone()).oneshot(req).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn jpeg_bytes(tmp: &TempDir) -> Vec<u8> {
        let path = tmp.path().join("upload-source.jpg");
        write_jpeg(&path, 24, 16);
        fs::read(path).unwrap()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    #[tokio::test]
    async fn status_is_public() {
        let tmp = site();
        let response = send(&state(&tmp), request("GET", "/api/build/status", None, Body::empty())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["running"], false);
        assert!(body["last_run"].is_null());
    }

    #[tokio::test]
    async fn missing_password_is_rejected_before_io() {
        let tmp = site();
        let req = request(
            "PUT",
            "/api/projects/gokart/order",
            None,
            Body::from(r#"{"images":["img2.jpg"]}"#),
        );
        let response = send(&state(&tmp), req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!tmp.path().join("image-orders.json").exists());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let tmp = site();
        let state = state(&tmp);
        let req = request("POST", "/api/build", Some("nope"), Body::empty());
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!state.tracker.is_running());
        assert!(state.tracker.status().last_run.is_none());
    }

    #[test]
    fn password_comparison() {
        assert!(password_matches("hunter2", Some("hunter2")));
        assert!(!password_matches("hunter2", Some("hunter3")));
        assert!(!password_matches("hunter2", Some("hunter")));
        assert!(!password_matches("hunter2", Some("")));
        assert!(!password_matches("hunter2", None));
    }

    #[tokio::test]
    async fn unconfigured_password_rejects_everything() {
        let tmp = site();
        let state = AdminState::new(tmp.path(), SiteConfig::default(), Some(String::new()));
        assert!(!state.has_password());
        let req = request("POST", "/api/build", Some(""), Body::empty());
        assert_eq!(send(&state, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[tokio::test]
    async fn second_build_is_conflict() {
        let tmp = site();
        let state = state(&tmp);
        let _running = state.tracker.try_start().unwrap();

        let response = send(&state, request("POST", "/api/build", Some(PASSWORD), Body::empty())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn build_is_accepted_and_reported() {
        let tmp = site();
        let state = state(&tmp);
        let response = send(&state, request("POST", "/api/build", Some(PASSWORD), Body::empty())).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        for _ in 0..200 {
            if !state.tracker.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        let status = state.tracker.status();
        assert!(!status.running);
        assert!(status.last_result.unwrap().success);
        assert!(tmp.path().join("gen/site-index.json").exists());
    }

    // =========================================================================
    // Order, hidden, metadata
    // =========================================================================

    #[tokio::test]
    async fn order_updates_manifest() {
        let tmp = site();
        let state = state(&tmp);
        let req = json_request(
            "PUT",
            "/api/projects/gokart/order",
            json!({ "images": ["img2.jpg", "img1.jpg"] }),
        );
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let manifest: Manifest = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(manifest.images, vec!["img2.jpg", "img1.jpg"]);
        assert!(tmp.path().join("gen/manifests/gokart.json").exists());
        assert!(tmp.path().join("gen/site-index.json").exists());
    }

    #[tokio::test]
    async fn hidden_updates_manifest() {
        let tmp = site();
        let state = state(&tmp);
        let req = json_request(
            "PUT",
            "/api/projects/gokart/hidden",
            json!({ "images": ["img1.jpg"] }),
        );
        let manifest: Manifest =
            serde_json::from_value(body_json(send(&state, req).await).await).unwrap();
        assert_eq!(manifest.images, vec!["img2.jpg"]);
        assert_eq!(manifest.count, 1);
        assert_eq!(manifest.total_count, 2);
    }

    #[tokio::test]
    async fn order_for_unknown_project_is_not_found() {
        let tmp = site();
        let req = json_request("PUT", "/api/projects/nope/order", json!({ "images": [] }));
        let response = send(&state(&tmp), req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metadata_update_is_saved_and_rendered() {
        let tmp = site();
        let state = state(&tmp);
        let req = json_request(
            "PUT",
            "/api/projects/gokart/metadata",
            json!({ "title": "Electric Go-Kart", "year": "2023", "featured": true }),
        );
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Electric Go-Kart");
        assert_eq!(body["tags"], "Project • Build • Maker");

        let doc = load_metadata(&tmp.path().join("projects-metadata.json")).unwrap();
        assert_eq!(doc.projects["gokart"].year.as_deref(), Some("2023"));
        let page = fs::read_to_string(tmp.path().join("projects/gokart.html")).unwrap();
        assert!(page.contains("Electric Go-Kart"));
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[tokio::test]
    async fn upload_adds_image_and_thumbnail() {
        let tmp = site();
        let state = state(&tmp);
        let req = request(
            "PUT",
            "/api/projects/gokart/images/img3.jpg",
            Some(PASSWORD),
            Body::from(jpeg_bytes(&tmp)),
        );
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let manifest: Manifest = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(manifest.images, vec!["img1.jpg", "img2.jpg", "img3.jpg"]);
        assert!(tmp.path().join("images/Gokart/img3.jpg").exists());
        assert!(tmp.path().join("gen/thumbnails/Gokart/img3.jpg").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn uploaded_image_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = site();
        let req = request(
            "PUT",
            "/api/projects/gokart/images/img3.jpg",
            Some(PASSWORD),
            Body::from(jpeg_bytes(&tmp)),
        );
        let response = send(&state(&tmp), req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        for path in ["images/Gokart/img3.jpg", "gen/thumbnails/Gokart/img3.jpg", "gen/manifests/gokart.json"] {
            let mode = fs::metadata(tmp.path().join(path)).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, crate::files::PUBLISHED_MODE, "{path}");
        }
    }

    #[tokio::test]
    async fn upload_rejects_undecodable_bytes() {
        let tmp = site();
        let req = request(
            "PUT",
            "/api/projects/gokart/images/bad.jpg",
            Some(PASSWORD),
            Body::from("definitely not a jpeg"),
        );
        let response = send(&state(&tmp), req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!tmp.path().join("images/Gokart/bad.jpg").exists());
        let leftovers = fs::read_dir(tmp.path().join("images/Gokart")).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[tokio::test]
    async fn upload_rejects_unsafe_or_non_image_names() {
        let tmp = site();
        let state = state(&tmp);
        for uri in [
            "/api/projects/gokart/images/..%2Fescape.jpg",
            "/api/projects/gokart/images/notes.txt",
            "/api/projects/..%2F..%2Fetc/images/a.jpg",
        ] {
            let req = request("PUT", uri, Some(PASSWORD), Body::from(jpeg_bytes(&tmp)));
            assert_eq!(send(&state, req).await.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
        assert!(!tmp.path().join("images/escape.jpg").exists());
    }

    #[tokio::test]
    async fn delete_image_removes_source_thumbnail_and_overrides() {
        let tmp = site();
        let state = state(&tmp);
        run_build(tmp.path(), &SiteConfig::default()).unwrap();
        state
            .store()
            .set_custom_order("gokart", &["img1.jpg".into(), "img2.jpg".into()])
            .unwrap();

        let req = request(
            "DELETE",
            "/api/projects/gokart/images/img1.jpg",
            Some(PASSWORD),
            Body::empty(),
        );
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(!tmp.path().join("images/Gokart/img1.jpg").exists());
        assert!(!tmp.path().join("gen/thumbnails/Gokart/img1.jpg").exists());
        let orders = state.store().load_custom_order().unwrap();
        assert_eq!(orders["gokart"], vec!["img2.jpg"]);
        let manifest: Manifest = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(manifest.images, vec!["img2.jpg"]);
    }

    #[tokio::test]
    async fn deleting_missing_image_is_not_found() {
        let tmp = site();
        let req = request(
            "DELETE",
            "/api/projects/gokart/images/ghost.jpg",
            Some(PASSWORD),
            Body::empty(),
        );
        assert_eq!(send(&state(&tmp), req).await.status(), StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // Projects
    // =========================================================================

    #[tokio::test]
    async fn create_project_then_upload_into_it() {
        let tmp = site();
        let state = state(&tmp);
        let req = json_request(
            "POST",
            "/api/projects",
            json!({ "name": "Platform Bed", "metadata": { "title": "Platform Bed" } }),
        );
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["slug"], "platform-bed");
        assert!(tmp.path().join("images/Platform Bed").is_dir());

        let req = request(
            "PUT",
            "/api/projects/platform-bed/images/frame.jpg",
            Some(PASSWORD),
            Body::from(jpeg_bytes(&tmp)),
        );
        assert_eq!(send(&state, req).await.status(), StatusCode::CREATED);
        assert!(tmp.path().join("projects/platform-bed.html").exists());
    }

    #[tokio::test]
    async fn create_existing_project_is_conflict() {
        let tmp = site();
        let req = json_request("POST", "/api/projects", json!({ "name": "Gokart" }));
        assert_eq!(send(&state(&tmp), req).await.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_excluded_name_is_rejected() {
        let tmp = site();
        let req = json_request("POST", "/api/projects", json!({ "name": "node_modules" }));
        assert_eq!(send(&state(&tmp), req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_project_removes_everything() {
        let tmp = site();
        let state = state(&tmp);
        run_build(tmp.path(), &SiteConfig::default()).unwrap();
        state
            .store()
            .set_hidden_images("gokart", &["img1.jpg".into()])
            .unwrap();

        let req = request("DELETE", "/api/projects/gokart", Some(PASSWORD), Body::empty());
        assert_eq!(send(&state, req).await.status(), StatusCode::OK);

        let root = tmp.path();
        assert!(!root.join("images/Gokart").exists());
        assert!(!root.join("gen/thumbnails/Gokart").exists());
        assert!(!root.join("gen/manifests/gokart.json").exists());
        assert!(!root.join("projects/gokart.html").exists());
        assert!(state.store().load_hidden_images().unwrap().is_empty());
        let index = fs::read_to_string(root.join("gen/site-index.json")).unwrap();
        assert!(!index.contains("\"gokart\""));
        assert!(index.contains("bsa-camporee"));
    }

    #[tokio::test]
    async fn delete_folder_holding_other_projects_is_conflict() {
        let tmp = site();
        write_jpeg(&tmp.path().join("images/BSA/cover.jpg"), 10, 10);
        let req = request("DELETE", "/api/projects/bsa", Some(PASSWORD), Body::empty());
        assert_eq!(send(&state(&tmp), req).await.status(), StatusCode::CONFLICT);
        assert!(tmp.path().join("images/BSA/Camporee/tent.jpg").exists());
    }

    // =========================================================================
    // Static files
    // =========================================================================

    #[tokio::test]
    async fn site_root_is_served() {
        let tmp = site();
        fs::write(tmp.path().join("styles.css"), "body {}").unwrap();
        let response = send(&state(&tmp), request("GET", "/styles.css", None, Body::empty())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
