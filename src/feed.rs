//! RSS 2.0 feed generation.
//!
//! Serializes the most recent posts into an RSS 2.0 document with a
//! self-referencing `atom:link`. The XML is built by hand with explicit
//! escaping; the format is small and fixed, so a writer library would buy
//! nothing over direct string assembly.
//!
//! A page qualifies for the feed when it has a publish date, isn't a draft,
//! and its URL contains `/posts/`. Note the last clause: feed membership is
//! a *URL* test, while the posts collection membership is a *layout/date*
//! test. A dated page outside `posts/` can be in the collection but not the
//! feed, and vice versa. The two tests are intentionally independent.
//!
//! Item descriptions are the first 200 characters of the post's plain-text
//! content (HTML tags stripped), with an ellipsis when truncated. All text
//! fields are XML-escaped.

use crate::types::Page;
use chrono::{NaiveTime, TimeZone, Utc};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed generation requires a site_url")]
    MissingSiteUrl,
}

/// Channel metadata and limits for the feed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Public base URL of the site. Required.
    pub site_url: String,
    pub site_name: String,
    pub description: String,
    /// Maximum number of items emitted.
    pub max_items: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            site_name: String::new(),
            description: String::new(),
            max_items: 20,
        }
    }
}

/// Description length before the ellipsis kicks in.
const SUMMARY_CHARS: usize = 200;

/// Builds the RSS 2.0 document for the qualifying posts, newest first.
pub fn generate_feed(pages: &[Page], options: &FeedOptions) -> Result<String, FeedError> {
    if options.site_url.trim().is_empty() {
        return Err(FeedError::MissingSiteUrl);
    }
    let base_url = options.site_url.trim_end_matches('/');

    let mut posts: Vec<&Page> = pages
        .iter()
        .filter(|p| p.date.is_some() && !p.draft && p.url.contains("/posts/"))
        .collect();
    posts.sort_by(|a, b| Page::by_date_desc(a, b));
    posts.truncate(options.max_items);

    let mut xml = String::with_capacity(4096);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str("  <channel>\n");
    push_element(&mut xml, "    ", "title", &options.site_name);
    push_element(&mut xml, "    ", "link", base_url);
    push_element(&mut xml, "    ", "description", &options.description);
    xml.push_str(&format!(
        "    <atom:link href=\"{}/feed.xml\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_xml(base_url)
    ));
    push_element(&mut xml, "    ", "lastBuildDate", &Utc::now().to_rfc2822());

    for post in posts {
        let link = format!("{base_url}{}", post.url);
        xml.push_str("    <item>\n");
        push_element(&mut xml, "      ", "title", &post.title);
        push_element(&mut xml, "      ", "link", &link);
        push_element(&mut xml, "      ", "guid", &link);
        push_element(&mut xml, "      ", "pubDate", &pub_date(post));
        push_element(&mut xml, "      ", "description", &summarize(&post.content));
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");
    Ok(xml)
}

fn push_element(xml: &mut String, indent: &str, tag: &str, text: &str) {
    xml.push_str(indent);
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escape_xml(text));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

/// RFC 822 publication date: the post's date at midnight UTC.
fn pub_date(post: &Page) -> String {
    match post.date {
        Some(date) => Utc
            .from_utc_datetime(&date.and_time(NaiveTime::MIN))
            .to_rfc2822(),
        None => String::new(),
    }
}

/// First 200 characters of the tag-stripped content, with an ellipsis when
/// truncated.
fn summarize(html: &str) -> String {
    let plain = strip_tags(html);
    let mut chars = plain.chars();
    let summary: String = chars.by_ref().take(SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{summary}...")
    } else {
        summary
    }
}

/// Removes HTML tags by dropping everything between `<` and `>`. Good
/// enough for feed summaries; not an HTML parser.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::is_post;
    use crate::test_helpers::{page, post};

    fn options() -> FeedOptions {
        FeedOptions {
            site_url: "https://example.com".to_string(),
            site_name: "Example".to_string(),
            description: "A site".to_string(),
            ..FeedOptions::default()
        }
    }

    // =========================================================================
    // Qualification and ordering
    // =========================================================================

    #[test]
    fn missing_site_url_is_an_error() {
        let result = generate_feed(&[], &FeedOptions::default());
        assert!(matches!(result, Err(FeedError::MissingSiteUrl)));
    }

    #[test]
    fn items_ordered_newest_first_and_truncated() {
        let posts: Vec<_> = (1..=5)
            .map(|i| post(&format!("p{i}"), &format!("2024-0{i}-01")))
            .collect();
        let xml = generate_feed(
            &posts,
            &FeedOptions {
                max_items: 2,
                ..options()
            },
        )
        .unwrap();

        assert_eq!(xml.matches("<item>").count(), 2);
        let p5 = xml.find("/posts/p5").unwrap();
        let p4 = xml.find("/posts/p4").unwrap();
        assert!(p5 < p4);
        assert!(!xml.contains("/posts/p3"));
    }

    #[test]
    fn drafts_and_dateless_pages_excluded() {
        let mut draft = post("draft", "2024-01-01");
        draft.draft = true;
        let mut dateless = post("dateless", "2024-01-01");
        dateless.date = None;

        let xml = generate_feed(&[draft, dateless], &options()).unwrap();
        assert_eq!(xml.matches("<item>").count(), 0);
    }

    #[test]
    fn url_outside_posts_excluded() {
        let stray = page("note", Some("2024-01-01")); // url /note
        let xml = generate_feed(&[stray], &options()).unwrap();
        assert_eq!(xml.matches("<item>").count(), 0);
    }

    /// Feed membership is a URL test; collection membership is a
    /// layout/date test. They can disagree, and that asymmetry is part of
    /// the contract.
    #[test]
    fn post_heuristic_diverges_from_collections() {
        let mut in_feed_only = post("archived", "2024-01-01");
        in_feed_only.layout = "page".to_string(); // stays out of the posts collection
        assert!(!is_post(&in_feed_only));

        let in_collection_only = page("note", Some("2024-01-01")); // url /note
        assert!(is_post(&in_collection_only));

        let xml = generate_feed(
            &[in_feed_only, in_collection_only],
            &options(),
        )
        .unwrap();
        assert!(xml.contains("/posts/archived"));
        assert!(!xml.contains("https://example.com/note"));
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn channel_structure() {
        let xml = generate_feed(&[post("hello", "2024-01-01")], &options()).unwrap();
        assert!(xml.contains("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">"));
        assert!(xml.contains("<title>Example</title>"));
        assert!(xml.contains("<link>https://example.com</link>"));
        assert!(xml.contains(
            "<atom:link href=\"https://example.com/feed.xml\" rel=\"self\" type=\"application/rss+xml\"/>"
        ));
        assert!(xml.contains("<lastBuildDate>"));
    }

    #[test]
    fn item_link_and_guid_are_absolute() {
        let xml = generate_feed(&[post("hello", "2024-01-01")], &options()).unwrap();
        assert!(xml.contains("<link>https://example.com/posts/hello</link>"));
        assert!(xml.contains("<guid>https://example.com/posts/hello</guid>"));
    }

    #[test]
    fn pub_date_is_midnight_utc_rfc822() {
        let xml = generate_feed(&[post("hello", "2024-03-05")], &options()).unwrap();
        assert!(xml.contains("<pubDate>Tue, 5 Mar 2024 00:00:00 +0000</pubDate>"));
    }

    #[test]
    fn text_fields_escaped() {
        let mut p = post("amp", "2024-01-01");
        p.title = "Fish & <Chips>".to_string();
        let xml = generate_feed(&[p], &options()).unwrap();
        assert!(xml.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn description_strips_tags_and_truncates() {
        let mut p = post("long", "2024-01-01");
        p.content = format!("<p>{}</p>", "x".repeat(300));
        let xml = generate_feed(&[p], &options()).unwrap();

        let description = format!("{}...", "x".repeat(200));
        assert!(xml.contains(&format!("<description>{description}</description>")));
    }

    #[test]
    fn short_description_has_no_ellipsis() {
        let mut p = post("short", "2024-01-01");
        p.content = "<p>brief</p>".to_string();
        let xml = generate_feed(&[p], &options()).unwrap();
        assert!(xml.contains("<description>brief</description>"));
    }
}
