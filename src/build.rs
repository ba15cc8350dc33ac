//! Build orchestration.
//!
//! [`build_site`] sequences the whole pipeline: load the cache, load
//! config, parse content, validate, compute the incrementally-changed
//! subset, derive collections, generate the feed, process assets, render
//! and write, persist the cache, report. Failure handling is tiered:
//!
//! - **fatal**: config load, content parse, duplicate slugs, collection
//!   generation, asset discovery/read, any page render. These abort the
//!   build with a single descriptive error.
//! - **degraded**: feed generation (missing `site_url`, renderer trouble)
//!   skips the feed and nothing else.
//! - **per-item**: individual file writes. A failed write loses that file's
//!   count and nothing else.
//!
//! ## Incremental builds
//!
//! With a warm cache, only pages whose source files changed are re-rendered
//! and re-written. Two deliberate exceptions: a changed *layout* file
//! invalidates every page (layouts feed all of them), and collection pages
//! are always rebuilt from the full page set — a tag index has to list
//! unrelated pages too, so it can never follow the changed subset.
//!
//! ## Collaborators
//!
//! The stages with real externalities sit behind traits bundled in
//! [`Collaborators`]: config loading, content parsing, template rendering,
//! the filesystem, and content hashing. [`build_site`] wires up the
//! production set; [`build_site_with`] accepts substitutes, which is how
//! the pipeline is tested without a real site.

use crate::assets::{self, AssetError};
use crate::cache::{self, BuildCache, Fingerprinter, Sha256Fingerprinter};
use crate::collections::{CollectionError, CollectionOptions, build_collections};
use crate::config::{ConfigError, ConfigLoader, SiteConfig, TomlConfigLoader};
use crate::content::{ContentError, ContentParser, MarkdownContentParser, validate_unique_slugs};
use crate::feed::{FeedOptions, generate_feed};
use crate::fs::{FileSystem, RealFileSystem};
use crate::paginate::{PageUrls, PaginatedPage, paginate, single_page};
use crate::render::{RenderError, SubstitutionEngine, TemplateEngine, discover_layouts, output_rel_path};
use crate::types::{Collection, CollectionKind, Page};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Content: {0}")]
    Content(#[from] ContentError),
    #[error("Collections: {0}")]
    Collections(#[from] CollectionError),
    #[error("Assets: {0}")]
    Assets(#[from] AssetError),
    #[error("Render: {0}")]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flags controlling a build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Include draft pages. Off by default.
    pub include_drafts: bool,
    /// Print per-step diagnostics.
    pub verbose: bool,
    /// Use the build cache to skip unchanged pages. On by default.
    pub incremental: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_drafts: false,
            verbose: false,
            incremental: true,
        }
    }
}

/// The pipeline's pluggable stages, defaulting to the production set.
pub struct Collaborators {
    pub config: Box<dyn ConfigLoader>,
    pub parser: Box<dyn ContentParser>,
    pub templates: Box<dyn TemplateEngine>,
    pub fs: Box<dyn FileSystem>,
    pub crypto: Box<dyn Fingerprinter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            config: Box::new(TomlConfigLoader),
            parser: Box::new(MarkdownContentParser),
            templates: Box::new(SubstitutionEngine),
            fs: Box::new(RealFileSystem),
            crypto: Box::new(Sha256Fingerprinter),
        }
    }
}

/// Per-build counters, nested in [`BuildSummary`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Pages parsed, drafts included.
    pub total_pages: usize,
    pub drafts_excluded: usize,
    /// Pages that went through the renderer this run.
    pub pages_rendered: usize,
    pub tag_pages: usize,
    pub category_pages: usize,
    pub posts_pages: usize,
    pub other_pages: usize,
    /// 1 when feed.xml was written, 0 otherwise.
    pub rss_written: usize,
    pub incremental: bool,
    /// Pages treated as changed this run.
    pub changed: usize,
    /// Pages skipped as unchanged.
    pub skipped: usize,
}

/// The orchestrator's return value.
#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    /// Pages in the build (drafts excluded unless requested).
    pub pages: usize,
    pub collections: usize,
    pub assets: usize,
    /// Files actually written to the output tree.
    pub files_written: usize,
    pub stats: BuildStats,
}

/// Builds the site at `site_path` with the production collaborators.
pub fn build_site(site_path: &Path, options: &BuildOptions) -> Result<BuildSummary, BuildError> {
    build_site_with(site_path, options, &Collaborators::default())
}

/// Builds the site with explicit collaborators.
pub fn build_site_with(
    site_path: &Path,
    options: &BuildOptions,
    collab: &Collaborators,
) -> Result<BuildSummary, BuildError> {
    let log = |msg: String| {
        if options.verbose {
            println!("{msg}");
        }
    };

    let loaded_cache = if options.incremental {
        BuildCache::load(site_path)
    } else {
        BuildCache::empty()
    };

    let mut config = collab.config.load(site_path)?;
    if config.site_path.is_none() {
        config.site_path = Some(site_path.to_path_buf());
    }

    let parsed = collab.parser.parse_content(&config.content_dir())?;
    validate_unique_slugs(&parsed.pages)?;

    let pages: Vec<Page> = parsed
        .pages
        .iter()
        .filter(|p| options.include_drafts || !p.draft)
        .cloned()
        .collect();
    let drafts_excluded = parsed.pages.len() - pages.len();
    validate_unique_slugs(&pages)?;

    let layouts = discover_layouts(collab.fs.as_ref(), &config.layouts_dir())?;

    // Changed/unchanged partition. A cold cache (or --full) means
    // everything is changed; a stale layout means everything is changed.
    let (changed_pages, skipped): (Vec<&Page>, usize) =
        if options.incremental && !loaded_cache.is_empty() {
            if layouts.iter().any(|l| loaded_cache.is_stale(l)) {
                log("layout change detected; rebuilding all pages".to_string());
                (pages.iter().collect(), 0)
            } else {
                let (changed, unchanged): (Vec<&Page>, Vec<&Page>) = pages
                    .iter()
                    .partition(|p| loaded_cache.is_stale(&p.file_path));
                (changed, unchanged.len())
            }
        } else {
            (pages.iter().collect(), 0)
        };

    let collections = build_collections(
        &pages,
        &CollectionOptions {
            include_drafts: options.include_drafts,
        },
    )?;

    let feed_xml = match &config.site_url {
        Some(url) if !url.trim().is_empty() => {
            let feed_options = FeedOptions {
                site_url: url.clone(),
                site_name: config.site_name.clone(),
                description: config.description.clone(),
                max_items: config.feed.max_items,
            };
            match generate_feed(&pages, &feed_options) {
                Ok(xml) => Some(xml),
                Err(e) => {
                    log(format!("feed skipped: {e}"));
                    None
                }
            }
        }
        _ => {
            log("feed skipped: no site_url configured".to_string());
            None
        }
    };

    let processed = assets::process_assets(site_path, collab.fs.as_ref(), collab.crypto.as_ref())?;

    let output_root = config.output_dir();
    collab.fs.create_dir_all(&output_root)?;

    let mut files_written = 0;
    let mut pages_rendered = 0;

    // Changed pages only. Rendering a page is expected to always succeed
    // given valid input, so a render error aborts; a write error only
    // loses that page's count.
    for page in &changed_pages {
        let layout = collab.templates.resolve_layout(page, &config)?;
        let html = collab.templates.render_with_layout(page, &layout, &config)?;
        pages_rendered += 1;
        let out = output_root.join(output_rel_path(&page.url));
        if write_file(collab.fs.as_ref(), &out, html.as_bytes(), options.verbose) {
            files_written += 1;
        }
    }

    // Collection pages are always rebuilt from the full page set,
    // independent of the changed subset.
    let mut tag_pages = 0;
    let mut category_pages = 0;
    let mut posts_pages = 0;
    let mut other_pages = 0;
    for collection in &collections {
        let urls = PageUrls {
            index: collection.kind.index_url(&collection.name),
            numbered: collection.kind.numbered_url(&collection.name),
        };
        for slice in plan_slices(collection, &config, &urls) {
            let html = collab
                .templates
                .render_collection_page(collection, &slice, &config)?;
            let out = output_root.join(output_rel_path(&urls.url_for(slice.number)));
            if write_file(collab.fs.as_ref(), &out, html.as_bytes(), options.verbose) {
                files_written += 1;
                match &collection.kind {
                    CollectionKind::Tag => tag_pages += 1,
                    CollectionKind::Category => category_pages += 1,
                    CollectionKind::Posts => posts_pages += 1,
                    CollectionKind::Custom(_) => other_pages += 1,
                }
            }
        }
    }

    for asset in &processed.assets {
        let out = output_root.join(&asset.output_path);
        if write_file(collab.fs.as_ref(), &out, &asset.content, options.verbose) {
            files_written += 1;
        }
    }

    let mut rss_written = 0;
    if let Some(xml) = &feed_xml {
        let out = output_root.join("feed.xml");
        if write_file(collab.fs.as_ref(), &out, xml.as_bytes(), options.verbose) {
            files_written += 1;
            rss_written = 1;
        }
    }

    // Persist the fingerprints of everything this build saw, but only
    // after all writes are done: a cache describing output that never
    // landed would mask those pages from the next run.
    if options.incremental {
        let mut next_cache = BuildCache::empty();
        for page in &parsed.pages {
            if let Ok(hash) = cache::hash_file(&page.file_path) {
                next_cache.record(&page.file_path, hash);
            }
        }
        for layout in &layouts {
            if let Ok(hash) = cache::hash_file(layout) {
                next_cache.record(layout, hash);
            }
        }
        if let Err(e) = next_cache.save(site_path) {
            log(format!("cache not persisted: {e}"));
        }
    }

    Ok(BuildSummary {
        pages: pages.len(),
        collections: collections.len(),
        assets: processed.assets.len(),
        files_written,
        stats: BuildStats {
            total_pages: parsed.pages.len(),
            drafts_excluded,
            pages_rendered,
            tag_pages,
            category_pages,
            posts_pages,
            other_pages,
            rss_written,
            incremental: options.incremental,
            changed: changed_pages.len(),
            skipped,
        },
    })
}

/// A collection paginates only when a page size is configured, its kind is
/// whitelisted, and it is longer than the page size; otherwise it renders
/// as a single page.
fn plan_slices(
    collection: &Collection,
    config: &SiteConfig,
    urls: &PageUrls,
) -> Vec<PaginatedPage> {
    match config.posts_per_page {
        Some(size)
            if config
                .paginate_types
                .iter()
                .any(|t| t == collection.kind.as_str())
                && collection.pages.len() > size =>
        {
            paginate(&collection.pages, size, urls)
        }
        _ => vec![single_page(&collection.pages)],
    }
}

/// Write one output file, creating parent directories. Returns whether the
/// write landed; failures are reported (when verbose) and swallowed.
fn write_file(fs: &dyn FileSystem, path: &Path, bytes: &[u8], verbose: bool) -> bool {
    let prepared = match path.parent() {
        Some(parent) => fs.create_dir_all(parent).is_ok(),
        None => true,
    };
    let written = prepared && fs.write(path, bytes).is_ok();
    if !written && verbose {
        eprintln!("warning: could not write {}", path.display());
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::FailingEngine;
    use crate::test_helpers::write_site_file;
    use std::fs;
    use tempfile::TempDir;

    fn minimal_site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_site_file(
            tmp.path(),
            "layouts/default.html",
            "<html><title>{{ title }}</title><body>{{ content }}</body></html>",
        );
        write_site_file(
            tmp.path(),
            "content/posts/2024-01-01-hello.md",
            "---\ntitle: Hello\nlayout: post\ntags: [rust]\n---\n\nFirst post.\n",
        );
        write_site_file(tmp.path(), "content/about.md", "---\nlayout: page\n---\nAbout.\n");
        tmp
    }

    #[test]
    fn builds_pages_collections_and_cache() {
        let tmp = minimal_site();
        let summary = build_site(tmp.path(), &BuildOptions::default()).unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.stats.changed, 2);
        assert_eq!(summary.stats.skipped, 0);
        assert!(tmp.path().join("_site/posts/hello.html").exists());
        assert!(tmp.path().join("_site/about.html").exists());
        assert!(tmp.path().join("_site/tags/rust.html").exists());
        assert!(tmp.path().join("_site/posts/index.html").exists());
        assert!(cache::manifest_path(tmp.path()).exists());
    }

    #[test]
    fn non_incremental_build_writes_no_cache() {
        let tmp = minimal_site();
        let options = BuildOptions {
            incremental: false,
            ..BuildOptions::default()
        };
        let summary = build_site(tmp.path(), &options).unwrap();
        assert!(!summary.stats.incremental);
        assert!(!cache::manifest_path(tmp.path()).exists());
    }

    #[test]
    fn render_failure_is_fatal() {
        let tmp = minimal_site();
        let collab = Collaborators {
            templates: Box::new(FailingEngine),
            ..Collaborators::default()
        };
        let result = build_site_with(tmp.path(), &BuildOptions::default(), &collab);
        assert!(matches!(result, Err(BuildError::Render(_))));
    }

    #[test]
    fn missing_layout_dir_fails_the_render() {
        let tmp = TempDir::new().unwrap();
        write_site_file(tmp.path(), "content/a.md", "body");
        let result = build_site(tmp.path(), &BuildOptions::default());
        assert!(matches!(result, Err(BuildError::Render(_))));
    }

    #[test]
    fn duplicate_slug_aborts_before_writes() {
        let tmp = TempDir::new().unwrap();
        write_site_file(tmp.path(), "layouts/default.html", "{{ content }}");
        write_site_file(tmp.path(), "content/posts/2024-01-01-x.md", "a");
        write_site_file(tmp.path(), "content/x.md", "b");

        let result = build_site(tmp.path(), &BuildOptions::default());
        assert!(matches!(result, Err(BuildError::Content(_))));
        assert!(!tmp.path().join("_site").exists());
    }

    #[test]
    fn malformed_config_is_fatal() {
        let tmp = minimal_site();
        fs::write(tmp.path().join("config.toml"), "not = [toml").unwrap();
        let result = build_site(tmp.path(), &BuildOptions::default());
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn error_messages_name_the_failed_step() {
        let tmp = minimal_site();
        fs::write(tmp.path().join("config.toml"), "not = [toml").unwrap();
        let err = build_site(tmp.path(), &BuildOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("Configuration:"));
    }

    #[test]
    fn drafts_excluded_by_default_and_counted() {
        let tmp = minimal_site();
        write_site_file(
            tmp.path(),
            "content/posts/2024-02-01-wip.md",
            "---\nlayout: post\ndraft: true\n---\nNot yet.\n",
        );

        let summary = build_site(tmp.path(), &BuildOptions::default()).unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.stats.total_pages, 3);
        assert_eq!(summary.stats.drafts_excluded, 1);
        assert!(!tmp.path().join("_site/posts/wip.html").exists());

        let with_drafts = build_site(
            tmp.path(),
            &BuildOptions {
                include_drafts: true,
                incremental: false,
                ..BuildOptions::default()
            },
        )
        .unwrap();
        assert_eq!(with_drafts.pages, 3);
        assert!(tmp.path().join("_site/posts/wip.html").exists());
    }

    #[test]
    fn pagination_applies_only_to_whitelisted_kinds() {
        let tmp = TempDir::new().unwrap();
        write_site_file(tmp.path(), "layouts/default.html", "{{ content }}");
        write_site_file(
            tmp.path(),
            "config.toml",
            "posts_per_page = 2\n",
        );
        for i in 1..=5 {
            write_site_file(
                tmp.path(),
                &format!("content/posts/2024-01-0{i}-p{i}.md"),
                &format!("---\nlayout: post\ntags: [all]\n---\nPost {i}.\n"),
            );
        }

        let summary = build_site(tmp.path(), &BuildOptions::default()).unwrap();
        // posts: 5 items / 2 per page = 3 pages; tag "all" renders as one
        // page because only the posts kind is whitelisted.
        assert_eq!(summary.stats.posts_pages, 3);
        assert_eq!(summary.stats.tag_pages, 1);
        assert!(tmp.path().join("_site/posts/index.html").exists());
        assert!(tmp.path().join("_site/posts/page/2.html").exists());
        assert!(tmp.path().join("_site/posts/page/3.html").exists());
        assert!(tmp.path().join("_site/tags/all.html").exists());
        assert!(!tmp.path().join("_site/tags/all/page/2.html").exists());
    }

    #[test]
    fn feed_written_only_with_site_url() {
        let tmp = minimal_site();
        let summary = build_site(tmp.path(), &BuildOptions::default()).unwrap();
        assert_eq!(summary.stats.rss_written, 0);
        assert!(!tmp.path().join("_site/feed.xml").exists());

        write_site_file(
            tmp.path(),
            "config.toml",
            "site_url = \"https://example.com\"\n",
        );
        let summary = build_site(
            tmp.path(),
            &BuildOptions {
                incremental: false,
                ..BuildOptions::default()
            },
        )
        .unwrap();
        assert_eq!(summary.stats.rss_written, 1);
        let xml = fs::read_to_string(tmp.path().join("_site/feed.xml")).unwrap();
        assert!(xml.contains("<item>"));
    }

    #[test]
    fn assets_land_in_output_tree() {
        let tmp = minimal_site();
        write_site_file(tmp.path(), "static/css/app.css", "body { color: red; }");
        write_site_file(tmp.path(), "static/robots.txt", "User-agent: *\n");

        let summary = build_site(tmp.path(), &BuildOptions::default()).unwrap();
        assert_eq!(summary.assets, 2);
        assert!(tmp.path().join("_site/static/robots.txt").exists());
        let css_dir = tmp.path().join("_site/static/css");
        let entries: Vec<_> = fs::read_dir(css_dir).unwrap().collect();
        assert_eq!(entries.len(), 1); // app.<hash8>.css
    }
}
