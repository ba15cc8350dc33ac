//! Content parsing: markdown files under the content root become [`Page`]s.
//!
//! Each `.md`/`.markdown` file may open with a `---`-fenced YAML frontmatter
//! block; the rest of the file is the markdown body, rendered to HTML with
//! pulldown-cmark. The parser derives the page's identity from its path:
//!
//! - **slug**: filename stem with any `YYYY-MM-DD-` prefix stripped
//!   (`2024-01-01-hello.md` → `hello`)
//! - **url**: the file's path relative to the content root, extension
//!   dropped, slug substituted (`posts/2024-01-01-hello.md` →
//!   `/posts/hello`)
//! - **date**: frontmatter `date:` (ISO `YYYY-MM-DD`), falling back to the
//!   filename prefix when present
//!
//! ## Recognized frontmatter keys
//!
//! `title`, `date`, `draft`, `layout`, `tags`, `category`. Everything else
//! is carried verbatim in [`Page::frontmatter`] for templates to use. A
//! missing `layout` means `"default"`.
//!
//! ## Validation
//!
//! Slugs must be unique across the whole page set; [`validate_unique_slugs`]
//! reports the two offending source files on a collision.

use crate::types::Page;
use chrono::NaiveDate;
use pulldown_cmark::{Parser as MarkdownParser, html as md_html};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid date '{value}' in {path} (expected YYYY-MM-DD)")]
    InvalidDate { path: PathBuf, value: String },
    #[error("Duplicate slug '{slug}': {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Result of the parse stage.
#[derive(Debug)]
pub struct ParsedContent {
    pub pages: Vec<Page>,
    pub stats: ParseStats,
}

/// Counters reported alongside the parsed pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseStats {
    /// Markdown files found under the content root.
    pub files_scanned: usize,
    /// Files successfully parsed into pages. Parsing is all-or-nothing, so
    /// this equals `files_scanned` on success; the split exists for callers
    /// that report progress.
    pub pages_parsed: usize,
}

/// Parses the content tree. The production implementation reads markdown
/// from disk; tests substitute canned page sets.
pub trait ContentParser: Sync {
    fn parse_content(&self, content_dir: &Path) -> Result<ParsedContent, ContentError>;
}

/// Production parser: frontmatter + markdown files under the content root.
pub struct MarkdownContentParser;

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").unwrap());

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

impl ContentParser for MarkdownContentParser {
    fn parse_content(&self, content_dir: &Path) -> Result<ParsedContent, ContentError> {
        let mut files: Vec<PathBuf> = Vec::new();
        if content_dir.is_dir() {
            for entry in WalkDir::new(content_dir).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::other)?;
                if entry.file_type().is_file() && is_markdown(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        }

        let mut pages = Vec::with_capacity(files.len());
        for file in &files {
            pages.push(parse_file(file, content_dir)?);
        }

        let stats = ParseStats {
            files_scanned: files.len(),
            pages_parsed: pages.len(),
        };
        Ok(ParsedContent { pages, stats })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

fn parse_file(path: &Path, content_dir: &Path) -> Result<Page, ContentError> {
    let raw = fs::read_to_string(path).map_err(|e| ContentError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (frontmatter_src, body) = split_frontmatter(&raw);
    let frontmatter = parse_frontmatter(frontmatter_src, path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (slug, filename_date) = split_date_prefix(&stem);

    let date = match frontmatter.get("date").and_then(as_str) {
        Some(value) => Some(
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                ContentError::InvalidDate {
                    path: path.to_path_buf(),
                    value: value.to_string(),
                }
            })?,
        ),
        None => filename_date,
    };

    let mut content = String::new();
    md_html::push_html(&mut content, MarkdownParser::new(body));

    let title = frontmatter
        .get("title")
        .and_then(as_str)
        .map(str::to_string)
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| slug.clone());

    let layout = frontmatter
        .get("layout")
        .and_then(as_str)
        .unwrap_or("default")
        .to_string();

    let draft = frontmatter
        .get("draft")
        .and_then(serde_yaml::Value::as_bool)
        .unwrap_or(false);

    let tags = match frontmatter.get("tags") {
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(as_str)
            .map(str::to_string)
            .collect(),
        Some(serde_yaml::Value::String(tag)) => vec![tag.clone()],
        _ => Vec::new(),
    };

    let category = frontmatter
        .get("category")
        .and_then(as_str)
        .map(str::to_string);

    Ok(Page {
        url: page_url(path, content_dir, &slug),
        slug,
        file_path: path.to_path_buf(),
        title,
        content,
        frontmatter,
        date,
        draft,
        layout,
        tags,
        category,
    })
}

/// Splits a leading `---`-fenced frontmatter block from the body. Files
/// without an opening fence are all body.
fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    const FENCE: &str = "---";
    let Some(rest) = raw.strip_prefix(FENCE) else {
        return (None, raw);
    };
    match rest.find("\n---") {
        Some(end) => {
            let body = rest[end + 1 + FENCE.len()..].trim_start_matches('\n');
            (Some(&rest[..end]), body)
        }
        None => (None, raw),
    }
}

fn parse_frontmatter(
    src: Option<&str>,
    path: &Path,
) -> Result<BTreeMap<String, serde_yaml::Value>, ContentError> {
    match src {
        Some(s) if !s.trim().is_empty() => {
            serde_yaml::from_str(s).map_err(|e| ContentError::Frontmatter {
                path: path.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(BTreeMap::new()),
    }
}

fn as_str(value: &serde_yaml::Value) -> Option<&str> {
    value.as_str()
}

/// `2024-01-01-hello` → (`hello`, Some(2024-01-01)); anything else passes
/// through with no date.
fn split_date_prefix(stem: &str) -> (String, Option<NaiveDate>) {
    if let Some(caps) = DATE_PREFIX.captures(stem) {
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
        if date.is_some() {
            return (caps[2].to_string(), date);
        }
    }
    (stem.to_string(), None)
}

/// Absolute site path for a content file: its directory relative to the
/// content root, joined with the slug, forward-slashed.
fn page_url(path: &Path, content_dir: &Path, slug: &str) -> String {
    let rel_dir = path
        .parent()
        .and_then(|p| p.strip_prefix(content_dir).ok())
        .unwrap_or_else(|| Path::new(""));
    let mut url = String::from("/");
    for part in rel_dir.components() {
        url.push_str(&part.as_os_str().to_string_lossy());
        url.push('/');
    }
    url.push_str(slug);
    url
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find(|line| line.starts_with("# "))
        .map(|line| line.trim_start_matches("# ").trim().to_string())
}

/// Slugs must be unique across the whole page set. Reports both offending
/// source files on a collision.
pub fn validate_unique_slugs(pages: &[Page]) -> Result<(), ContentError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for page in pages {
        if let Some(first) = seen.insert(&page.slug, &page.file_path)
            && first != page.file_path
        {
            return Err(ContentError::DuplicateSlug {
                slug: page.slug.clone(),
                first: first.to_path_buf(),
                second: page.file_path.clone(),
            });
        }
    }
    Ok(())
}
