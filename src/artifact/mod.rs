//! Content-hash deduplicated artifact writes.
//!
//! [`ArtifactStore`] persists response artifacts (typically images pulled off
//! the wire) at most once per unique byte sequence for the process lifetime.
//! Dedup is purely content-based: the same bytes under a different suggested
//! name are still a cache hit. The fingerprint cache grows monotonically and
//! is never evicted.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use xxhash_rust::xxh64::xxh64;

use crate::error::Result;

/// File extensions recognized as image artifacts.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Fallback extension for synthesized filenames.
const DEFAULT_EXTENSION: &str = ".jpg";

/// 64-bit non-cryptographic content fingerprint.
pub fn fingerprint(data: &[u8]) -> u64 {
    xxh64(data, 0)
}

/// Writes artifacts into a destination directory, deduplicated by content
/// fingerprint. Lookups take a read lock; recording a new fingerprint takes
/// the write lock.
pub struct ArtifactStore {
    dir: PathBuf,
    seen: RwLock<HashSet<u64>>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seen: RwLock::new(HashSet::new()),
        }
    }

    /// Persist `data` at most once, deriving the filename from `source`
    /// (typically the response URL).
    ///
    /// Returns `Ok(Some(path))` when a file was written, `Ok(None)` when the
    /// content was already persisted. An I/O failure propagates without
    /// recording the fingerprint, so an identical later submission retries
    /// the write.
    pub fn save(&self, data: &[u8], source: &str) -> Result<Option<PathBuf>> {
        let hash = fingerprint(data);
        {
            let seen = self.seen.read().unwrap_or_else(PoisonError::into_inner);
            if seen.contains(&hash) {
                return Ok(None);
            }
        }

        let path = self.dir.join(destination_name(source));

        // An existing file with identical content short-circuits to a cache
        // update without a second write; different content is overwritten.
        if existing_content_matches(&path, data, hash) {
            self.record(hash);
            return Ok(None);
        }

        fs::write(&path, data)?;
        self.record(hash);
        Ok(Some(path))
    }

    fn record(&self, hash: u64) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash);
    }
}

/// Derive a destination filename from the source string's final path
/// segment; synthesize a timestamped name when nothing usable remains.
fn destination_name(source: &str) -> String {
    let base = source.rsplit('/').next().unwrap_or(source);
    let name = sanitize_file_name(base);
    if name.is_empty() || name == "." || !has_image_extension(&name) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("image_{}{}", nanos, extension_hint(source))
    } else {
        name
    }
}

/// True when a file already exists at `path` with the same length and the
/// same content fingerprint. A missing or unreadable file counts as absent.
fn existing_content_matches(path: &Path, data: &[u8], hash: u64) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if meta.len() != data.len() as u64 {
        return false;
    }
    let Ok(existing) = fs::read(path) else {
        return false;
    };
    fingerprint(&existing) == hash
}

/// Replace filesystem-invalid characters and whitespace with underscores,
/// collapse runs, and trim. Applies the Windows-superset invalid set on all
/// platforms so artifact names stay portable.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.chars() {
        let mapped = if is_invalid_file_char(c) || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        out.push(mapped);
    }
    out.trim_matches('_').to_string()
}

/// Remove filesystem-invalid characters and whitespace outright.
pub fn strip_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !is_invalid_file_char(*c) && !c.is_whitespace())
        .collect()
}

fn is_invalid_file_char(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// True if `name` carries a recognized image extension.
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Best-guess extension for a synthesized filename: the source's own
/// extension (query/fragment stripped), else the fixed fallback.
fn extension_hint(source: &str) -> String {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    match Path::new(trimmed).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{ext}"),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// True if a response looks like an image, by content type or by URL path
/// extension.
pub fn is_image_response(content_type: &str, url_path: &str) -> bool {
    content_type.starts_with("image/") || has_image_extension(url_path)
}
