//! HTML page generation.
//!
//! Stage 4 of the build. Renders one gallery page per project plus the home
//! page, from the manifests, the site index and the metadata document.
//!
//! ## Generated Pages
//!
//! - **Home page** (`/index.html`): hero text from `siteContent`, a featured
//!   strip, then a card for every project in listing order
//! - **Project pages** (`/projects/{slug}.html`): title, year, tags, the
//!   Markdown description and a thumbnail grid of the manifest's images,
//!   each linking to the full-size file
//!
//! ## Site settings
//!
//! `siteSettings.layout` and `siteSettings.template` from the metadata
//! document become body classes (`layout-grid`, `template-classic`); the
//! layout also pulls in `layouts/{layout}.css`. The stylesheet and scripts
//! themselves are authored by hand in the site root and only linked here.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::cache::thumbnail_path;
use crate::config::SiteLayout;
use crate::manifest::Manifest;
use crate::metadata::{ProjectMeta, ProjectsMetadata};
use crate::scan::ProjectFolder;
use crate::site_index::SiteIndex;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Parser, html as md_html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const DEFAULT_SITE_TITLE: &str = "Portfolio";

/// Values shared by every page of one build.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Appended to stylesheet and script URLs as `?v=...`.
    pub asset_version: String,
    /// Site-relative image root, e.g. `images`.
    pub images_url: String,
    /// Site-relative thumbnail root, e.g. `gen/thumbnails`.
    pub thumbnails_url: String,
    pub site_title: String,
    pub layout: Option<String>,
    pub template: Option<String>,
}

impl PageContext {
    pub fn new(layout: &SiteLayout, metadata: &ProjectsMetadata, asset_version: &str) -> Self {
        Self {
            asset_version: asset_version.to_string(),
            images_url: layout.site_relative(&layout.images),
            thumbnails_url: layout.site_relative(&layout.thumbnails),
            site_title: site_content_str(metadata, &["hero", "title"])
                .unwrap_or(DEFAULT_SITE_TITLE)
                .to_string(),
            layout: metadata.layout().map(String::from),
            template: metadata.template().map(String::from),
        }
    }

    fn body_class(&self) -> Option<String> {
        let classes: Vec<String> = [
            self.layout.as_deref().map(|l| format!("layout-{l}")),
            self.template.as_deref().map(|t| format!("template-{t}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!classes.is_empty()).then(|| classes.join(" "))
    }
}

/// Look up a string at `path` inside `siteContent`.
fn site_content_str<'a>(metadata: &'a ProjectsMetadata, path: &[&str]) -> Option<&'a str> {
    let mut value = metadata.site_content.as_ref()?;
    for key in path {
        value = value.get(key)?;
    }
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// Render Markdown to HTML. Raw HTML in the source is shown as text.
fn markdown(source: &str) -> String {
    let events = Parser::new(source).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, events);
    out
}

/// Percent-encode each `/`-separated segment of a relative URL.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// A relative path as a `/`-separated, percent-encoded URL.
fn path_url(path: &Path) -> String {
    path.components()
        .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join URL segments with `/`, skipping empty ones, and percent-encode them.
fn url(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    encode_path(&joined)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure.
///
/// `prefix` is the path from the page back to the site root (`""` or `"../"`).
fn base_document(
    title: &str,
    description: &str,
    prefix: &str,
    ctx: &PageContext,
    content: Markup,
) -> Markup {
    let v = &ctx.asset_version;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(description);
                link rel="stylesheet" href={ (prefix) "styles.css?v=" (v) };
                @if let Some(layout) = &ctx.layout {
                    link rel="stylesheet" href={ (prefix) "layouts/" (layout) ".css?v=" (v) };
                }
            }
            body class=[ctx.body_class()] {
                (content)
                script src={ (prefix) "lightbox.js?v=" (v) } {}
            }
        }
    }
}

/// Renders the top navigation bar.
fn site_nav(prefix: &str, ctx: &PageContext) -> Markup {
    html! {
        nav.navbar {
            div.nav-container {
                a.logo href={ (prefix) "index.html" } { (ctx.site_title) }
                ul.nav-menu {
                    li { a.nav-link href={ (prefix) "index.html" } { "Home" } }
                    li { a.nav-link href={ (prefix) "index.html#featured" } { "Featured" } }
                    li { a.nav-link href={ (prefix) "index.html#projects" } { "Projects" } }
                }
            }
        }
    }
}

/// Renders one project card for the home page.
fn project_card(slug: &str, index: &SiteIndex, cover: Option<&str>) -> Markup {
    let Some(entry) = index.projects.get(slug) else {
        return html! {};
    };
    html! {
        a.project-card href=(encode_path(&entry.page)) data-category=(entry.category) {
            @if let Some(cover) = cover {
                img.project-cover src=(cover) alt=(entry.title) loading="lazy";
            }
            div.project-card-body {
                h3 { (entry.title) }
                span.year-badge { (entry.year) }
                p.project-tags { (entry.tags) }
                span.image-count { (entry.images) " images" }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a project gallery page.
pub fn render_project_page(
    project: &ProjectFolder,
    manifest: &Manifest,
    meta: &ProjectMeta,
    ctx: &PageContext,
) -> Markup {
    let prefix = "../";
    let rel = project.display_path();
    let image_base = url(&[ctx.images_url.as_str(), rel.as_str()]);
    let thumb_url = |name: &str| {
        path_url(&thumbnail_path(
            Path::new(&ctx.thumbnails_url),
            &project.relative_path,
            name,
        ))
    };

    let content = html! {
        (site_nav(prefix, ctx))
        div.breadcrumb {
            ul.breadcrumb-list {
                li { a.breadcrumb-link href={ (prefix) "index.html" } { "Home" } }
                li { span.breadcrumb-current { (meta.title) } }
            }
        }
        section.project-hero {
            div.project-hero-content {
                h1 { (meta.title) }
                div.project-hero-meta {
                    span.year-badge { (meta.year) }
                    span { "•" }
                    span { (meta.tags) }
                }
                div.project-hero-description {
                    (PreEscaped(markdown(&meta.description)))
                }
            }
        }
        section.gallery-section {
            h2.section-title { "Gallery" }
            p.section-subtitle { (manifest.count) " images" }
            div.gallery-grid id="gallery" {
                @for name in &manifest.images {
                    @let full = format!("{prefix}{}", url(&[image_base.as_str(), name.as_str()]));
                    div.gallery-item {
                        a href=(full) {
                            img.gallery-image
                                src={ (prefix) (thumb_url(name)) }
                                data-full-image=(full)
                                alt=(meta.title)
                                loading="lazy";
                        }
                    }
                }
            }
        }
        section.back-link {
            a.contact-button href={ (prefix) "index.html" } { "← Back to Home" }
        }
    };

    let title = format!("{} | {}", meta.title, ctx.site_title);
    base_document(&title, &meta.description, prefix, ctx, content)
}

/// Renders the home page.
///
/// `covers` maps a slug to the site-relative URL of its first visible
/// thumbnail.
pub fn render_home_page(
    index: &SiteIndex,
    metadata: &ProjectsMetadata,
    covers: &dyn Fn(&str) -> Option<String>,
    ctx: &PageContext,
) -> Markup {
    let subtitle = site_content_str(metadata, &["hero", "subtitle"]);
    let paragraphs: Vec<&str> = metadata
        .site_content
        .as_ref()
        .and_then(|c| c.get("about")?.get("paragraphs")?.as_array())
        .map(|items| items.iter().filter_map(|p| p.as_str()).collect())
        .unwrap_or_default();
    let featured: Vec<&str> = index
        .projects
        .iter()
        .filter(|(_, entry)| entry.featured)
        .map(|(slug, _)| slug.as_str())
        .collect();

    let content = html! {
        (site_nav("", ctx))
        section.hero {
            h1.hero-title { (ctx.site_title) }
            @if let Some(subtitle) = subtitle {
                p.hero-subtitle { (subtitle) }
            }
            @if !paragraphs.is_empty() {
                div.hero-about {
                    @for para in &paragraphs {
                        p { (para) }
                    }
                }
            }
        }
        @if !featured.is_empty() {
            section.featured id="featured" {
                h2.section-title { "Featured" }
                div.project-grid {
                    @for &slug in &featured {
                        (project_card(slug, index, covers(slug).as_deref()))
                    }
                }
            }
        }
        section.projects id="projects" {
            h2.section-title { "All Projects" }
            p.section-subtitle {
                (index.total_projects) " projects, " (index.total_images) " images"
            }
            div.project-grid {
                @for slug in index.projects.keys() {
                    (project_card(slug, index, covers(slug).as_deref()))
                }
            }
        }
    };

    base_document(&ctx.site_title, &ctx.site_title, "", ctx, content)
}

/// Write a project page to `projects/<slug>.html`.
pub fn write_project_page(
    layout: &SiteLayout,
    project: &ProjectFolder,
    manifest: &Manifest,
    meta: &ProjectMeta,
    ctx: &PageContext,
) -> Result<(), GenerateError> {
    let path = layout.page_path(&project.slug);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_project_page(project, manifest, meta, ctx).into_string())?;
    Ok(())
}

/// Write the home page to `index.html`.
pub fn write_home_page(
    layout: &SiteLayout,
    index: &SiteIndex,
    metadata: &ProjectsMetadata,
    manifests: &[Manifest],
    ctx: &PageContext,
) -> Result<(), GenerateError> {
    let covers = |slug: &str| -> Option<String> {
        let manifest = manifests.iter().find(|m| m.slug == slug)?;
        let first = manifest.images.first()?;
        let entry = index.projects.get(slug)?;
        Some(path_url(&thumbnail_path(
            Path::new(&ctx.thumbnails_url),
            Path::new(&entry.path),
            first,
        )))
    };
    fs::write(
        &layout.home_page,
        render_home_page(index, metadata, &covers, ctx).into_string(),
    )?;
    Ok(())
}

/// Remove a project's page. A missing file is fine.
pub fn remove_project_page(layout: &SiteLayout, slug: &str) -> Result<(), GenerateError> {
    crate::files::remove_if_exists(&layout.page_path(slug))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
