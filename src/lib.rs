//! # Inkstone
//!
//! A minimal incremental static site generator. Markdown files under
//! `content/` become HTML pages, tags and categories become listing pages,
//! recent posts become an RSS feed, and files under `static/` are minified,
//! fingerprinted, and copied through — all from a single binary with no
//! runtime dependencies.
//!
//! # Architecture: One Pipeline, Narrow Seams
//!
//! A build is a single synchronous pass orchestrated by [`build::build_site`]:
//!
//! ```text
//! cache → config → parse → validate → partition → collections
//!       → feed → assets → render/write → persist cache → summary
//! ```
//!
//! The stages with real externalities — config loading, content parsing,
//! template rendering, the filesystem, content hashing — sit behind traits
//! bundled in [`build::Collaborators`]. Everything between the seams is a
//! pure function over in-memory data, which is where all the interesting
//! logic (staleness, grouping, pagination, fingerprinting) lives and where
//! the unit tests aim.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Orchestrator — sequences all stages, owns the error tiers and the build summary |
//! | [`cache`] | Content-addressed build cache driving incremental rebuilds |
//! | [`content`] | Frontmatter + markdown parsing into [`types::Page`], slug/URL derivation |
//! | [`collections`] | Tag / category / posts grouping with date-descending ordering |
//! | [`paginate`] | Fixed-size slicing with prev/next/page-number navigation |
//! | [`assets`] | Static file discovery, textual minification, fingerprinting, path mappings |
//! | [`feed`] | RSS 2.0 serialization |
//! | [`render`] | Layout resolution and the substitution template engine |
//! | [`config`] | `config.toml` loading and path resolution |
//! | [`fs`] | Filesystem trait + production implementation |
//! | [`output`] | CLI report formatting |
//! | [`types`] | Shared data model (`Page`, `Collection`) |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Caching
//!
//! Staleness is decided by SHA-256 over file bytes, never mtimes. Hashing
//! is deterministic across machines and survives `git checkout`, so CI
//! caches and local caches agree. The one coarse rule on top: any changed
//! layout file rebuilds every page, because a layout feeds all of them and
//! tracking which pages use which layout isn't worth the bookkeeping.
//!
//! ## Collections Never Go Incremental
//!
//! A tag index read by a human has to list unrelated pages too, so
//! collection pages are always rebuilt from the full page set even when
//! only one source file changed. Ordinary pages are the expensive, numerous
//! case; listing pages are few and cheap.
//!
//! ## Textual Minification
//!
//! The CSS/JS minifier strips comments and collapses whitespace — nothing
//! else. It never parses syntax, so it can't mis-parse, and its output is
//! stable enough to fingerprint. Sites that want aggressive minification
//! can run a real minifier before `static/`.
//!
//! ## Partial Failure, Deliberately Tiered
//!
//! Config, parse, validation, and render failures abort the build: they
//! mean the site is wrong. A feed that can't be generated and an individual
//! file that can't be written degrade instead: they mean one output is
//! missing, and the summary's counters say so.

pub mod assets;
pub mod build;
pub mod cache;
pub mod collections;
pub mod config;
pub mod content;
pub mod feed;
pub mod fs;
pub mod output;
pub mod paginate;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
