use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// A unique path in the system temp dir, e.g. `factreel_mix_<pid>_<nanos>_<seq>.f32le`.
pub(crate) fn scratch_path(prefix: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "factreel_{prefix}_{}_{}_{}.{extension}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Removes the guarded file when dropped.
pub(crate) struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/scratch.rs"]
mod tests;
