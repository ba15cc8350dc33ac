//! Static asset processing.
//!
//! Discovers files under `<site>/static`, classifies them by extension, and
//! prepares them for the output tree:
//!
//! - **css / js**: minified textually, then fingerprinted with SHA-256 over
//!   the minified bytes. The first 8 hash chars land in the output filename
//!   (`app.css` → `app.1a2b3c4d.css`), so a content change produces a new
//!   output path and stale browser caches never serve old styles.
//! - **everything else**: copied through byte-for-byte under its own name,
//!   no fingerprint.
//!
//! The minifier is deliberately textual, not a parser: strip comments,
//! collapse whitespace runs, trim. It makes no attempt to understand CSS or
//! JavaScript syntax, which keeps it predictable on malformed input.
//!
//! ## Path mappings
//!
//! Every asset registers two lookup entries so templates can reference it
//! by either form and resolve to the same fingerprinted output:
//!
//! ```text
//! /home/me/site/static/css/app.css  →  static/css/app.1a2b3c4d.css
//! /css/app.css                      →  /static/css/app.1a2b3c4d.css
//! ```
//!
//! The second form is the *web path*: everything up to and including the
//! `static/` segment stripped, a leading `/` prepended.
//!
//! Assets are processed in parallel with [rayon](https://docs.rs/rayon);
//! each file is independent.

use crate::cache::Fingerprinter;
use crate::fs::FileSystem;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Name of the asset source directory under the site root, and of the
/// mirrored directory under the output root.
pub const STATIC_DIR: &str = "static";

/// Asset classification, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Js,
    Binary,
}

/// A static file prepared for the output tree.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Absolute source path.
    pub original_path: PathBuf,
    /// Output path relative to the output root, under `static/`.
    pub output_path: PathBuf,
    pub kind: AssetKind,
    /// Minified bytes for text kinds, verbatim bytes for binary.
    pub content: Vec<u8>,
    /// Content hash of the minified bytes. Never present for binary assets.
    pub fingerprint: Option<String>,
}

/// Result of the asset stage: the prepared assets plus the dual path
/// mappings.
#[derive(Debug, Default)]
pub struct ProcessedAssets {
    pub assets: Vec<Asset>,
    pub mappings: HashMap<String, String>,
}

/// Discovers and processes everything under `<site>/static`. A missing
/// directory is zero assets, not an error; an unreadable file is fatal.
pub fn process_assets(
    site_path: &Path,
    fs: &dyn FileSystem,
    crypto: &dyn Fingerprinter,
) -> Result<ProcessedAssets, AssetError> {
    let static_dir = site_path.join(STATIC_DIR);
    if !fs.is_dir(&static_dir) {
        return Ok(ProcessedAssets::default());
    }

    let files = fs.walk_files(&static_dir)?;
    let assets: Vec<Asset> = files
        .par_iter()
        .map(|file| process_one(file, &static_dir, fs, crypto))
        .collect::<Result<_, _>>()?;

    let mappings = build_mappings(&assets);
    Ok(ProcessedAssets { assets, mappings })
}

fn process_one(
    path: &Path,
    static_dir: &Path,
    fs: &dyn FileSystem,
    crypto: &dyn Fingerprinter,
) -> Result<Asset, AssetError> {
    let bytes = fs.read(path).map_err(|e| AssetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let rel = path.strip_prefix(static_dir).unwrap_or(path);
    let kind = classify(path);

    match kind {
        AssetKind::Css | AssetKind::Js => {
            let text = String::from_utf8_lossy(&bytes);
            let minified = match kind {
                AssetKind::Css => minify_css(&text),
                _ => minify_js(&text),
            };
            let fingerprint = crypto.sha256(minified.as_bytes());
            Ok(Asset {
                original_path: path.to_path_buf(),
                output_path: fingerprinted_output(rel, &fingerprint),
                kind,
                content: minified.into_bytes(),
                fingerprint: Some(fingerprint),
            })
        }
        AssetKind::Binary => Ok(Asset {
            original_path: path.to_path_buf(),
            output_path: Path::new(STATIC_DIR).join(rel),
            kind,
            content: bytes,
            fingerprint: None,
        }),
    }
}

fn classify(path: &Path) -> AssetKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("css") => AssetKind::Css,
        Some(ext) if ext.eq_ignore_ascii_case("js") => AssetKind::Js,
        _ => AssetKind::Binary,
    }
}

/// `css/app.css` + fingerprint → `static/css/app.1a2b3c4d.css`.
fn fingerprinted_output(rel: &Path, fingerprint: &str) -> PathBuf {
    let short = &fingerprint[..8.min(fingerprint.len())];
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match rel.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{short}.{ext}"),
        None => format!("{stem}.{short}"),
    };
    let parent = rel.parent().unwrap_or_else(|| Path::new(""));
    Path::new(STATIC_DIR).join(parent).join(name)
}

/// Two entries per asset: the absolute source path keyed to the
/// output-root-relative output path, and the web path keyed to the web
/// output path.
fn build_mappings(assets: &[Asset]) -> HashMap<String, String> {
    let mut mappings = HashMap::with_capacity(assets.len() * 2);
    for asset in assets {
        let output = asset.output_path.to_string_lossy().replace('\\', "/");
        mappings.insert(
            asset.original_path.to_string_lossy().into_owned(),
            output.clone(),
        );
        mappings.insert(
            web_source_path(&asset.original_path.to_string_lossy()),
            web_output_path(&output, ""),
        );
    }
    mappings
}

/// Normalizes a source path to its site-root-relative web form: everything
/// up to and including a `/static/` segment (or a leading `static/`
/// prefix) is stripped and a `/` prepended.
pub fn web_source_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let rel = match normalized.rfind("/static/") {
        Some(i) => &normalized[i + "/static/".len()..],
        None => normalized.strip_prefix("static/").unwrap_or(&normalized),
    };
    format!("/{rel}")
}

/// Normalizes an output path to its web form: a leading output-root prefix
/// (e.g. `_site/`) is stripped and a `/` prepended.
pub fn web_output_path(path: &str, output_root: &str) -> String {
    let normalized = path.replace('\\', "/");
    let rel = if output_root.is_empty() {
        normalized.as_str()
    } else {
        normalized
            .strip_prefix(&format!("{output_root}/"))
            .unwrap_or(&normalized)
    };
    format!("/{}", rel.trim_start_matches('/'))
}

static CSS_COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static JS_LINE_COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Conservative CSS minifier: drop `/* ... */` comments, collapse
/// whitespace runs to single spaces, trim.
pub fn minify_css(src: &str) -> String {
    let stripped = CSS_COMMENTS.replace_all(src, "");
    WHITESPACE_RUNS.replace_all(&stripped, " ").trim().to_string()
}

/// Conservative JS minifier: drop `// ...` line comments, collapse
/// whitespace runs to single spaces, trim.
pub fn minify_js(src: &str) -> String {
    let stripped = JS_LINE_COMMENTS.replace_all(src, "");
    WHITESPACE_RUNS.replace_all(&stripped, " ").trim().to_string()
}
