//! CLI output formatting.
//!
//! Summarizes a build run as a short, information-first report: what the
//! build produced, then how it got there (incremental skips, cache state).
//! Format functions are pure — they return `Vec<String>` so tests can
//! assert on lines — and each has a `print_*` wrapper that writes to
//! stdout.
//!
//! ```text
//! Pages
//!     12 parsed, 2 drafts excluded
//!     3 rendered, 7 skipped (unchanged)
//! Collections
//!     4 tag pages, 2 category pages, 3 posts pages
//! Assets
//!     7 written
//! Feed
//!     feed.xml written
//!
//! 19 files written
//! ```

use crate::build::BuildSummary;

/// Render a build summary as display lines.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let stats = &summary.stats;
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    let mut parsed = format!("    {} parsed", stats.total_pages);
    if stats.drafts_excluded > 0 {
        parsed.push_str(&format!(", {} drafts excluded", stats.drafts_excluded));
    }
    lines.push(parsed);
    if stats.incremental && stats.skipped > 0 {
        lines.push(format!(
            "    {} rendered, {} skipped (unchanged)",
            stats.pages_rendered, stats.skipped
        ));
    } else {
        lines.push(format!("    {} rendered", stats.pages_rendered));
    }

    if summary.collections > 0 {
        lines.push("Collections".to_string());
        let mut parts = Vec::new();
        if stats.tag_pages > 0 {
            parts.push(format!("{} tag pages", stats.tag_pages));
        }
        if stats.category_pages > 0 {
            parts.push(format!("{} category pages", stats.category_pages));
        }
        if stats.posts_pages > 0 {
            parts.push(format!("{} posts pages", stats.posts_pages));
        }
        if stats.other_pages > 0 {
            parts.push(format!("{} other pages", stats.other_pages));
        }
        lines.push(format!("    {}", parts.join(", ")));
    }

    if summary.assets > 0 {
        lines.push("Assets".to_string());
        lines.push(format!("    {} written", summary.assets));
    }

    if stats.rss_written > 0 {
        lines.push("Feed".to_string());
        lines.push("    feed.xml written".to_string());
    }

    lines.push(String::new());
    lines.push(format!("{} files written", summary.files_written));
    lines
}

/// Print a build summary to stdout.
pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{line}");
    }
}

/// Render a check run (parse + validate, no writes) as display lines.
pub fn format_check_output(pages: usize, drafts: usize) -> Vec<String> {
    vec![
        format!("{pages} pages parsed ({drafts} drafts)"),
        "Content is valid".to_string(),
    ]
}

/// Print a check report to stdout.
pub fn print_check_output(pages: usize, drafts: usize) {
    for line in format_check_output(pages, drafts) {
        println!("{line}");
    }
}
