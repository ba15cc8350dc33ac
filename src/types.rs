//! Shared types used across all pipeline stages.
//!
//! A [`Page`] is produced once per content file by the parse stage and is
//! immutable from then on; collections and pagination work on clones. A
//! [`Collection`] is a named, typed grouping of pages used to generate the
//! listing pages (tag indexes, category indexes, the posts feed).

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single content item, parsed from a markdown file under the content root.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL slug: filename stem with any `YYYY-MM-DD-` prefix stripped.
    pub slug: String,
    /// Absolute site path, derived from the file path relative to the
    /// content root (no `.html` suffix, e.g. `/posts/hello`).
    pub url: String,
    /// Absolute path of the source file.
    pub file_path: PathBuf,
    /// Title from frontmatter, falling back to the first `# heading`, then
    /// the slug.
    pub title: String,
    /// Rendered HTML body.
    pub content: String,
    /// The full frontmatter mapping, including keys the pipeline doesn't
    /// interpret itself. Templates can reach into this.
    pub frontmatter: BTreeMap<String, serde_yaml::Value>,
    /// Publish date, from frontmatter or a `YYYY-MM-DD-` filename prefix.
    pub date: Option<NaiveDate>,
    /// Draft pages are excluded from builds unless drafts are requested.
    pub draft: bool,
    /// Layout name. `"default"` when the frontmatter doesn't name one.
    pub layout: String,
    /// Tags in frontmatter order. May be empty.
    pub tags: Vec<String>,
    pub category: Option<String>,
}

impl Page {
    /// Orders pages by publish date descending; dateless pages sort after
    /// dated ones. The comparison is a total order suitable for a stable
    /// sort, so dateless pages keep their relative input order.
    pub fn by_date_desc(a: &Page, b: &Page) -> Ordering {
        match (a.date, b.date) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Discriminator for [`Collection`]. The set is open: anything beyond the
/// three built-in kinds goes through [`CollectionKind::Custom`], and every
/// match site carries a fallback arm for it rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionKind {
    Tag,
    Category,
    Posts,
    Custom(String),
}

impl CollectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            CollectionKind::Tag => "tag",
            CollectionKind::Category => "category",
            CollectionKind::Posts => "posts",
            CollectionKind::Custom(kind) => kind,
        }
    }

    /// URL of the collection's first page. Page 1 never carries a numeric
    /// suffix; it is the collection's own index.
    pub fn index_url(&self, name: &str) -> String {
        match self {
            CollectionKind::Tag => format!("/tags/{name}.html"),
            CollectionKind::Category => format!("/categories/{name}.html"),
            CollectionKind::Posts => "/posts/index.html".to_string(),
            CollectionKind::Custom(kind) => format!("/{kind}s/{name}.html"),
        }
    }

    /// URL template for pages 2 and up, with `{n}` standing in for the page
    /// number.
    pub fn numbered_url(&self, name: &str) -> String {
        match self {
            CollectionKind::Tag => format!("/tags/{name}/page/{{n}}.html"),
            CollectionKind::Category => format!("/categories/{name}/page/{{n}}.html"),
            CollectionKind::Posts => "/posts/page/{n}.html".to_string(),
            CollectionKind::Custom(kind) => format!("/{kind}s/{name}/page/{{n}}.html"),
        }
    }

    /// Human-facing heading for the collection's listing pages.
    pub fn display_title(&self, name: &str) -> String {
        match self {
            CollectionKind::Tag => format!("Tag: {name}"),
            CollectionKind::Category => format!("Category: {name}"),
            CollectionKind::Posts => "Posts".to_string(),
            CollectionKind::Custom(kind) => format!("{kind}: {name}"),
        }
    }
}

/// A named, typed grouping of pages, sorted by date descending.
#[derive(Debug, Clone)]
pub struct Collection {
    pub name: String,
    pub kind: CollectionKind,
    pub pages: Vec<Page>,
}
