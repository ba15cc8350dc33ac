//! Derived collections: grouping pages into tag, category, and posts lists.
//!
//! Collections are what the listing pages render from. Three groupings are
//! built, in a fixed order:
//!
//! 1. one `tag` collection per distinct tag value, in first-seen order
//! 2. one `category` collection per distinct category value
//! 3. at most one aggregate `posts` collection
//!
//! A page counts as a post when it either declares `layout: post`, or it
//! has a publish date and its layout isn't `page`. The posts collection is
//! omitted entirely when nothing qualifies, so a site of plain pages gets
//! no empty posts index.
//!
//! Every collection's pages are sorted by date descending with a stable
//! sort; dateless pages (possible in tag and category collections) keep
//! their relative input order at the end.

use crate::types::{Collection, CollectionKind, Page};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Empty {kind} name in {file_path}")]
    EmptyName { kind: &'static str, file_path: PathBuf },
}

/// Options for collection generation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionOptions {
    /// Include draft pages in the groupings. Off by default.
    pub include_drafts: bool,
}

/// Groups the page set into named, typed collections. Works on the full
/// page set it is handed; incremental filtering never applies here, since a
/// listing page has to show unrelated pages too.
pub fn build_collections(
    pages: &[Page],
    options: &CollectionOptions,
) -> Result<Vec<Collection>, CollectionError> {
    let visible: Vec<&Page> = pages
        .iter()
        .filter(|p| options.include_drafts || !p.draft)
        .collect();

    let mut collections = Vec::new();
    collections.extend(group_by_tag(&visible)?);
    collections.extend(group_by_category(&visible)?);
    if let Some(posts) = posts_collection(&visible) {
        collections.push(posts);
    }

    for collection in &mut collections {
        collection.pages.sort_by(Page::by_date_desc);
    }

    Ok(collections)
}

/// Whether a page belongs in the aggregate posts collection.
pub fn is_post(page: &Page) -> bool {
    page.layout == "post" || (page.date.is_some() && page.layout != "page")
}

fn group_by_tag(pages: &[&Page]) -> Result<Vec<Collection>, CollectionError> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Page>> = HashMap::new();

    for page in pages {
        for tag in &page.tags {
            if tag.trim().is_empty() {
                return Err(CollectionError::EmptyName {
                    kind: "tag",
                    file_path: page.file_path.clone(),
                });
            }
            let group = groups.entry(tag.clone()).or_insert_with(|| {
                order.push(tag.clone());
                Vec::new()
            });
            group.push((*page).clone());
        }
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let pages = groups.remove(&name).unwrap_or_default();
            Collection {
                name,
                kind: CollectionKind::Tag,
                pages,
            }
        })
        .collect())
}

fn group_by_category(pages: &[&Page]) -> Result<Vec<Collection>, CollectionError> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Page>> = HashMap::new();

    for page in pages {
        let Some(category) = &page.category else {
            continue;
        };
        if category.trim().is_empty() {
            return Err(CollectionError::EmptyName {
                kind: "category",
                file_path: page.file_path.clone(),
            });
        }
        let group = groups.entry(category.clone()).or_insert_with(|| {
            order.push(category.clone());
            Vec::new()
        });
        group.push((*page).clone());
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let pages = groups.remove(&name).unwrap_or_default();
            Collection {
                name,
                kind: CollectionKind::Category,
                pages,
            }
        })
        .collect())
}

fn posts_collection(pages: &[&Page]) -> Option<Collection> {
    let posts: Vec<Page> = pages
        .iter()
        .filter(|p| is_post(p))
        .map(|p| (*p).clone())
        .collect();
    if posts.is_empty() {
        return None;
    }
    Some(Collection {
        name: "posts".to_string(),
        kind: CollectionKind::Posts,
        pages: posts,
    })
}
