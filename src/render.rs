//! Layout resolution and HTML rendering.
//!
//! [`TemplateEngine`] is the seam between the build pipeline and the
//! templating world: the pipeline only ever asks "which layout file renders
//! this page" and "give me the final HTML". The production engine is a
//! deliberately small substitution renderer over plain HTML layout files;
//! sites that outgrow it can swap the engine without touching the pipeline.
//!
//! ## Layout files
//!
//! Layouts live under the configured layouts directory as `<name>.html`.
//! A page's `layout` frontmatter picks the file; `default.html` is the
//! fallback. Collection pages try `<kind>.html` (`tag.html`, `posts.html`,
//! ...), then `collection.html`, then `default.html`.
//!
//! ## Substitution slots
//!
//! `{{ title }}`, `{{ content }}`, `{{ url }}`, `{{ date }}`,
//! `{{ site_name }}`, `{{ site_description }}`, `{{ site_url }}`. Text
//! slots are HTML-escaped; `{{ content }}` is inserted raw (it is already
//! rendered HTML).

use crate::config::SiteConfig;
use crate::fs::FileSystem;
use crate::paginate::{PageUrls, PaginatedPage};
use crate::types::{Collection, Page};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No layout '{layout}' (or default.html) under {dir}")]
    LayoutNotFound { layout: String, dir: PathBuf },
}

/// Renders pages and collection pages through layout files.
pub trait TemplateEngine: Sync {
    /// Picks the layout file for a page.
    fn resolve_layout(&self, page: &Page, config: &SiteConfig) -> Result<PathBuf, RenderError>;

    /// Renders a page through a previously resolved layout.
    fn render_with_layout(
        &self,
        page: &Page,
        layout: &Path,
        config: &SiteConfig,
    ) -> Result<String, RenderError>;

    /// Renders one listing page of a collection.
    fn render_collection_page(
        &self,
        collection: &Collection,
        slice: &PaginatedPage,
        config: &SiteConfig,
    ) -> Result<String, RenderError>;
}

/// Production engine: `{{ slot }}` substitution over HTML layout files.
pub struct SubstitutionEngine;

impl TemplateEngine for SubstitutionEngine {
    fn resolve_layout(&self, page: &Page, config: &SiteConfig) -> Result<PathBuf, RenderError> {
        resolve_named_layout(&[page.layout.as_str(), "default"], config)
            .ok_or_else(|| RenderError::LayoutNotFound {
                layout: page.layout.clone(),
                dir: config.layouts_dir(),
            })
    }

    fn render_with_layout(
        &self,
        page: &Page,
        layout: &Path,
        config: &SiteConfig,
    ) -> Result<String, RenderError> {
        let template = fs::read_to_string(layout).map_err(|e| RenderError::Io {
            path: layout.to_path_buf(),
            source: e,
        })?;
        let date = page
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        Ok(substitute(
            &template,
            &[
                ("title", &escape_html(&page.title)),
                ("content", &page.content),
                ("url", &escape_html(&page.url)),
                ("date", &date),
                ("site_name", &escape_html(&config.site_name)),
                ("site_description", &escape_html(&config.description)),
                ("site_url", &escape_html(config.site_url.as_deref().unwrap_or(""))),
            ],
        ))
    }

    fn render_collection_page(
        &self,
        collection: &Collection,
        slice: &PaginatedPage,
        config: &SiteConfig,
    ) -> Result<String, RenderError> {
        let layout = resolve_named_layout(
            &[collection.kind.as_str(), "collection", "default"],
            config,
        )
        .ok_or_else(|| RenderError::LayoutNotFound {
            layout: collection.kind.as_str().to_string(),
            dir: config.layouts_dir(),
        })?;
        let template = fs::read_to_string(&layout).map_err(|e| RenderError::Io {
            path: layout.clone(),
            source: e,
        })?;

        let mut content = item_list(&slice.items);
        content.push_str(&pagination_nav(collection, slice));

        Ok(substitute(
            &template,
            &[
                (
                    "title",
                    &escape_html(&collection.kind.display_title(&collection.name)),
                ),
                ("content", &content),
                ("url", &escape_html(&collection.kind.index_url(&collection.name))),
                ("date", ""),
                ("site_name", &escape_html(&config.site_name)),
                ("site_description", &escape_html(&config.description)),
                ("site_url", &escape_html(config.site_url.as_deref().unwrap_or(""))),
            ],
        ))
    }
}

fn resolve_named_layout(candidates: &[&str], config: &SiteConfig) -> Option<PathBuf> {
    let dir = config.layouts_dir();
    candidates
        .iter()
        .map(|name| dir.join(format!("{name}.html")))
        .find(|path| path.is_file())
}

fn item_list(items: &[Page]) -> String {
    let mut html = String::from("<ul class=\"collection-list\">\n");
    for item in items {
        html.push_str("  <li><a href=\"");
        html.push_str(&escape_html(&page_href(&item.url)));
        html.push_str("\">");
        html.push_str(&escape_html(&item.title));
        html.push_str("</a>");
        if let Some(date) = item.date {
            let stamp = date.format("%Y-%m-%d").to_string();
            html.push_str(&format!(" <time datetime=\"{stamp}\">{stamp}</time>"));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
    html
}

fn pagination_nav(collection: &Collection, slice: &PaginatedPage) -> String {
    let pagination = &slice.pagination;
    if pagination.total_pages <= 1 {
        return String::new();
    }
    let urls = PageUrls {
        index: collection.kind.index_url(&collection.name),
        numbered: collection.kind.numbered_url(&collection.name),
    };

    let mut html = String::from("<nav class=\"pagination\">\n");
    if let Some(prev) = &pagination.prev_url {
        html.push_str(&format!(
            "  <a class=\"prev\" href=\"{}\">Newer</a>\n",
            escape_html(prev)
        ));
    }
    for &n in &pagination.page_numbers {
        if n == pagination.current_page {
            html.push_str(&format!("  <span class=\"current\">{n}</span>\n"));
        } else {
            html.push_str(&format!(
                "  <a href=\"{}\">{n}</a>\n",
                escape_html(&urls.url_for(n))
            ));
        }
    }
    if let Some(next) = &pagination.next_url {
        html.push_str(&format!(
            "  <a class=\"next\" href=\"{}\">Older</a>\n",
            escape_html(next)
        ));
    }
    html.push_str("</nav>\n");
    html
}

/// Replaces `{{ key }}` (and the spaceless `{{key}}`) slots.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{ {key} }}}}"), value);
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Site URL of the written file for a page: the page URL with `.html`
/// appended unless already present.
pub fn page_href(url: &str) -> String {
    if url.ends_with(".html") {
        url.to_string()
    } else {
        format!("{url}.html")
    }
}

/// Output path, relative to the output root, for a page or collection URL:
/// leading `/` stripped, `.html` appended unless already present.
pub fn output_rel_path(url: &str) -> PathBuf {
    PathBuf::from(page_href(url.trim_start_matches('/')))
}

/// All layout files (`**/*.html`) under the layouts directory, in
/// deterministic order. A missing directory is an empty set.
pub fn discover_layouts(fs: &dyn FileSystem, layouts_dir: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(fs
        .walk_files(layouts_dir)?
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html"))
        })
        .collect())
}
