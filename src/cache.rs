//! Build cache for incremental rebuilds.
//!
//! Re-rendering every page on every build wastes most of the work: the
//! typical edit touches one source file. This module records a fingerprint
//! for every content and layout file seen by the last successful build, so
//! the next build can re-render only the pages whose sources changed.
//!
//! # Design
//!
//! The cache is **content-addressed**: each entry maps an absolute source
//! path to the SHA-256 of its last-seen bytes. Content hashes rather than
//! mtimes make staleness detection deterministic given identical bytes and
//! let the cache survive `git checkout` (which resets modification times).
//!
//! Layout files are cached alongside content files but checked differently:
//! a layout feeds every rendered page, so *any* stale layout invalidates the
//! whole page set rather than a subset.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<site>/.build-cache.json`. A missing,
//! corrupt, or version-mismatched manifest loads as empty, which simply
//! degrades the next build to a full rebuild. The manifest is rewritten only
//! after a build completes all of its writes.
//!
//! ## Bypassing the cache
//!
//! `inkstone build --full` skips both the load and the staleness check;
//! every page is treated as changed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the site directory.
const MANIFEST_FILENAME: &str = ".build-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// Persisted mapping from absolute source path to content fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCache {
    pub version: u32,
    entries: BTreeMap<String, String>,
}

impl BuildCache {
    /// Create an empty cache (used for `--full` or a first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the site directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(site_path: &Path) -> Self {
        let path = manifest_path(site_path);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Save to the site directory.
    pub fn save(&self, site_path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(site_path), json)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Last-seen fingerprint for a source path, if any.
    pub fn fingerprint(&self, path: &Path) -> Option<&str> {
        self.entries
            .get(&path.to_string_lossy().into_owned())
            .map(String::as_str)
    }

    /// Record the current fingerprint for a source path.
    pub fn record(&mut self, path: &Path, fingerprint: String) {
        self.entries
            .insert(path.to_string_lossy().into_owned(), fingerprint);
    }

    /// Whether a source file differs from its cached fingerprint. A path
    /// with no cache entry, or whose file can no longer be read, counts as
    /// stale.
    pub fn is_stale(&self, path: &Path) -> bool {
        let Some(cached) = self.fingerprint(path) else {
            return true;
        };
        match hash_file(path) {
            Ok(current) => current != cached,
            Err(_) => true,
        }
    }
}

/// Resolve the cache manifest path for a site directory.
pub fn manifest_path(site_path: &Path) -> PathBuf {
    site_path.join(MANIFEST_FILENAME)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 hash of a byte slice, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}

/// Content fingerprint service. The production implementation is SHA-256;
/// the seam exists so asset processing can be exercised with a stand-in.
pub trait Fingerprinter: Sync {
    fn sha256(&self, bytes: &[u8]) -> String;
}

/// Production fingerprinter.
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn sha256(&self, bytes: &[u8]) -> String {
        hash_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // BuildCache basics
    // =========================================================================

    #[test]
    fn empty_cache_has_no_entries() {
        let cache = BuildCache::empty();
        assert_eq!(cache.version, MANIFEST_VERSION);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn record_and_fingerprint_roundtrip() {
        let mut cache = BuildCache::empty();
        cache.record(Path::new("/site/content/a.md"), "abc123".into());
        assert_eq!(
            cache.fingerprint(Path::new("/site/content/a.md")),
            Some("abc123")
        );
        assert_eq!(cache.fingerprint(Path::new("/site/content/b.md")), None);
    }

    // =========================================================================
    // Staleness
    // =========================================================================

    #[test]
    fn unchanged_file_is_not_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.md");
        fs::write(&file, "hello").unwrap();

        let mut cache = BuildCache::empty();
        cache.record(&file, hash_file(&file).unwrap());
        assert!(!cache.is_stale(&file));
    }

    #[test]
    fn modified_file_is_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.md");
        fs::write(&file, "v1").unwrap();

        let mut cache = BuildCache::empty();
        cache.record(&file, hash_file(&file).unwrap());

        fs::write(&file, "v2").unwrap();
        assert!(cache.is_stale(&file));
    }

    #[test]
    fn uncached_file_is_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.md");
        fs::write(&file, "hello").unwrap();
        assert!(BuildCache::empty().is_stale(&file));
    }

    #[test]
    fn deleted_file_is_stale() {
        let mut cache = BuildCache::empty();
        let gone = Path::new("/definitely/not/here.md");
        cache.record(gone, "stale".into());
        assert!(cache.is_stale(gone));
    }

    // =========================================================================
    // Save / Load roundtrip
    // =========================================================================

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut cache = BuildCache::empty();
        cache.record(Path::new("/c/a.md"), "h1".into());
        cache.record(Path::new("/c/b.md"), "h2".into());

        cache.save(tmp.path()).unwrap();
        let loaded = BuildCache::load(tmp.path());

        assert_eq!(loaded.version, MANIFEST_VERSION);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.fingerprint(Path::new("/c/a.md")), Some("h1"));
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(BuildCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_corrupt_json_returns_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILENAME), "not json").unwrap();
        assert!(BuildCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "entries": {{"/a.md": "h"}}}}"#,
            MANIFEST_VERSION + 1
        );
        fs::write(tmp.path().join(MANIFEST_FILENAME), json).unwrap();
        assert!(BuildCache::load(tmp.path()).is_empty());
    }

    // =========================================================================
    // Hash functions
    // =========================================================================

    #[test]
    fn hash_file_deterministic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");
        fs::write(&path, b"hello world").unwrap();

        let h1 = hash_file(&path).unwrap();
        let h2 = hash_file(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 hex is 64 chars
    }

    #[test]
    fn hash_file_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");

        fs::write(&path, b"version 1").unwrap();
        let h1 = hash_file(&path).unwrap();

        fs::write(&path, b"version 2").unwrap();
        let h2 = hash_file(&path).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn fingerprinter_matches_hash_bytes() {
        assert_eq!(Sha256Fingerprinter.sha256(b"abc"), hash_bytes(b"abc"));
    }
}
