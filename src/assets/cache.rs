use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;

use crate::config::CacheConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;

/// Outcome of a cache lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLookup {
    /// Deterministic location for the key, whether or not a file is there yet.
    pub path: PathBuf,
    /// `true` when a file already exists at `path`.
    pub hit: bool,
}

/// Filesystem cache for stock footage keyed by search query.
///
/// The cache never fetches anything: [`AssetCache::resolve`] only derives the slot for a key and
/// checks whether it is filled. Two concurrent renders asking for the same uncached key will
/// both see a miss; callers that need at most one fetch per key must serialize on the key
/// themselves.
#[derive(Clone, Debug)]
pub struct AssetCache {
    root: PathBuf,
    extension: String,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self::new(cfg.dir.clone(), cfg.extension.clone())
    }

    /// Deterministic file location for `key`. Pure; touches nothing on disk.
    pub fn path_for(&self, key: &str) -> ReelResult<PathBuf> {
        let norm = normalize_key(key)?;
        let mut hasher = Fnv1a64::new_default();
        hasher.write_bytes(norm.as_bytes());
        let file = format!("{norm}-{:016x}.{}", hasher.finish(), self.extension);
        Ok(self.root.join(file))
    }

    /// Derive the slot for `key`, creating the cache directory if needed, and report whether it
    /// already holds a file.
    pub fn resolve(&self, key: &str) -> ReelResult<CacheLookup> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create cache directory '{}'", self.root.display()))?;
        let hit = path.is_file();
        tracing::debug!(key, path = %path.display(), hit, "asset cache lookup");
        Ok(CacheLookup { path, hit })
    }

    /// Return the cached file for `key`, calling `fetch` to fill the slot on a miss.
    ///
    /// `fetch` receives a temporary sibling path of its own; it is renamed into place only after
    /// `fetch` returns `Ok`, so a failed download never becomes a cache entry. Concurrent misses
    /// on one key each fetch, and the last rename wins.
    pub fn resolve_or_fetch<F>(&self, key: &str, fetch: F) -> ReelResult<PathBuf>
    where
        F: FnOnce(&Path) -> ReelResult<()>,
    {
        let lookup = self.resolve(key)?;
        if lookup.hit {
            return Ok(lookup.path);
        }

        let partial = partial_path(&lookup.path);
        let _guard = PartialFileGuard(Some(partial.clone()));
        fetch(&partial)?;
        if !partial.is_file() {
            return Err(ReelError::asset_unavailable(format!(
                "fetch for '{key}' reported success but wrote no file"
            )));
        }
        std::fs::rename(&partial, &lookup.path).with_context(|| {
            format!(
                "move fetched asset into cache slot '{}'",
                lookup.path.display()
            )
        })?;
        tracing::info!(key, path = %lookup.path.display(), "cached new asset");
        Ok(lookup.path)
    }

    /// Copy a local file into the slot for `key`, replacing any previous entry.
    pub fn store(&self, key: &str, from: &Path) -> ReelResult<PathBuf> {
        if !from.is_file() {
            return Err(ReelError::asset_unavailable(format!(
                "'{}' is not a file",
                from.display()
            )));
        }
        let lookup = self.resolve(key)?;
        std::fs::copy(from, &lookup.path).with_context(|| {
            format!(
                "copy '{}' into cache slot '{}'",
                from.display(),
                lookup.path.display()
            )
        })?;
        Ok(lookup.path)
    }
}

/// Normalize a search key: trim, lowercase, collapse every run of non-alphanumerics to `_`.
pub fn normalize_key(key: &str) -> ReelResult<String> {
    let mut out = String::with_capacity(key.len());
    let mut pending_sep = false;
    for c in key.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        return Err(ReelError::validation(format!(
            "cache key '{key}' has no alphanumeric characters"
        )));
    }
    Ok(out)
}

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling of `path` unique to this call, even across threads of one process.
fn partial_path(path: &Path) -> PathBuf {
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".partial-{}-{seq}", std::process::id()));
    path.with_file_name(name)
}

struct PartialFileGuard(Option<PathBuf>);

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
