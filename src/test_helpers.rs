//! Shared test utilities for the inkstone test suite.
//!
//! Provides canned [`Page`] constructors for the pure pipeline stages
//! (collections, pagination, feed) and a file-writing helper for tests that
//! assemble whole sites in a temp directory.

use crate::types::Page;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A plain page at `/{slug}` with layout `default`.
pub fn page(slug: &str, date: Option<&str>) -> Page {
    page_with(slug, date, "default", &[], None)
}

/// A blog post at `/posts/{slug}` with layout `post`.
pub fn post(slug: &str, date: &str) -> Page {
    let mut p = page_with(slug, Some(date), "post", &[], None);
    p.url = format!("/posts/{slug}");
    p
}

/// Fully parameterized page constructor.
pub fn page_with(
    slug: &str,
    date: Option<&str>,
    layout: &str,
    tags: &[&str],
    category: Option<&str>,
) -> Page {
    Page {
        slug: slug.to_string(),
        url: format!("/{slug}"),
        file_path: PathBuf::from(format!("/content/{slug}.md")),
        title: slug.to_string(),
        content: format!("<p>{slug}</p>"),
        frontmatter: BTreeMap::new(),
        date: date.map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").expect("test date must be YYYY-MM-DD")
        }),
        draft: false,
        layout: layout.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category: category.map(str::to_string),
    }
}

/// Write a file at `root/rel`, creating parent directories.
pub fn write_site_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
