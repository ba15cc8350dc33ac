//! Site configuration module.
//!
//! Handles loading and validating the `config.toml` at the site root. All
//! options have stock defaults, so a site with no config file builds with the
//! conventional layout (`content/`, `layouts/`, `_site/`).
//!
//! ## Config File Location
//!
//! Place `config.toml` at the site root, next to `content/` and `layouts/`:
//!
//! ```text
//! my-site/
//! ├── config.toml
//! ├── content/
//! │   ├── about.md
//! │   └── posts/
//! │       └── 2024-01-01-hello.md
//! ├── layouts/
//! │   ├── default.html
//! │   └── post.html
//! └── static/
//!     └── css/app.css
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "An inkstone site"
//! description = ""
//! # site_url = "https://example.com"   # required for the RSS feed
//!
//! content_path = "content"   # resolved relative to the site root
//! layouts_path = "layouts"
//! output_path = "_site"
//!
//! # posts_per_page = 10               # omit to disable pagination
//! paginate_types = ["posts"]          # collection kinds that paginate
//!
//! [feed]
//! max_items = 20
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

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
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site root. Usually absent from the file; the build injects the path
    /// it was invoked with when the config doesn't pin one.
    pub site_path: Option<PathBuf>,
    /// Site title, used in layouts and the feed channel.
    pub site_name: String,
    /// Site description, used in layouts and the feed channel.
    pub description: String,
    /// Public base URL (`https://example.com`). Required for feed
    /// generation; the feed is skipped when unset.
    pub site_url: Option<String>,
    /// Content directory, resolved against `site_path` when relative.
    pub content_path: PathBuf,
    /// Layouts directory, resolved against `site_path` when relative.
    pub layouts_path: PathBuf,
    /// Output directory, resolved against `site_path` when relative.
    pub output_path: PathBuf,
    /// Items per collection page. Pagination is off when unset.
    pub posts_per_page: Option<usize>,
    /// Collection kinds that paginate when `posts_per_page` is set.
    pub paginate_types: Vec<String>,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Maximum number of items in the RSS feed.
    pub max_items: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { max_items: 20 }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_path: None,
            site_name: "An inkstone site".to_string(),
            description: String::new(),
            site_url: None,
            content_path: PathBuf::from("content"),
            layouts_path: PathBuf::from("layouts"),
            output_path: PathBuf::from("_site"),
            posts_per_page: None,
            paginate_types: vec!["posts".to_string()],
            feed: FeedConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.posts_per_page == Some(0) {
            return Err(ConfigError::Validation(
                "posts_per_page must be at least 1".into(),
            ));
        }
        if self.feed.max_items == 0 {
            return Err(ConfigError::Validation(
                "feed.max_items must be at least 1".into(),
            ));
        }
        if let Some(url) = &self.site_url
            && url.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "site_url must not be blank when set".into(),
            ));
        }
        Ok(())
    }

    /// Absolute content directory.
    pub fn content_dir(&self) -> PathBuf {
        self.resolve(&self.content_path)
    }

    /// Absolute layouts directory.
    pub fn layouts_dir(&self) -> PathBuf {
        self.resolve(&self.layouts_path)
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_path)
    }

    /// Resolve a configured path against the site root. Absolute paths pass
    /// through untouched.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.site_path {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }
}

/// Loads the site configuration. The production loader reads
/// `<site>/config.toml`; tests substitute canned configs.
pub trait ConfigLoader: Sync {
    fn load(&self, site_path: &Path) -> Result<SiteConfig, ConfigError>;
}

/// Production loader: `config.toml` at the site root, stock defaults when
/// the file doesn't exist, hard error when it exists but doesn't parse or
/// validate.
pub struct TomlConfigLoader;

impl ConfigLoader for TomlConfigLoader {
    fn load(&self, site_path: &Path) -> Result<SiteConfig, ConfigError> {
        let config_path = site_path.join("config.toml");
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            SiteConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

/// A fully documented stock config, printable via `inkstone gen-config`.
pub fn stock_config_toml() -> String {
    r#"# inkstone site configuration.
# All options are optional - the values below are the stock defaults.

site_name = "An inkstone site"
description = ""

# Public base URL. Required for RSS feed generation; without it the
# build skips feed.xml.
# site_url = "https://example.com"

# Directories, resolved relative to the site root.
content_path = "content"
layouts_path = "layouts"
output_path = "_site"

# Items per collection page. Omit to render each collection as a
# single page.
# posts_per_page = 10

# Which collection kinds paginate when posts_per_page is set.
paginate_types = ["posts"]

[feed]
max_items = 20
"#
    .to_string()
}
