//! File-identity collaborator.
//!
//! A cloneable handle to "the currently open file". Each `open` bumps a
//! monotonic stamp; a completed async highlight compares its starting stamp
//! against the current one to decide whether its result still applies.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct ActiveFile {
    inner: Arc<State>,
}

#[derive(Debug, Default)]
struct State {
    stamp: AtomicU64,
    path: Mutex<Option<PathBuf>>,
}

impl ActiveFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly opened file (or an untitled buffer when `path` is
    /// None) and returns the new stamp.
    pub fn open(&self, path: Option<&Path>) -> u64 {
        let mut current = self
            .inner
            .path
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = path.map(Path::to_path_buf);
        self.inner.stamp.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The stamp of the currently open file.
    pub fn stamp(&self) -> u64 {
        self.inner.stamp.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.inner
            .path
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_bumps_stamp_and_is_shared_between_clones() {
        let identity = ActiveFile::new();
        let observer = identity.clone();
        assert_eq!(identity.stamp(), 0);
        let stamp = identity.open(Some(Path::new("main.cpp")));
        assert_eq!(stamp, 1);
        assert_eq!(observer.stamp(), 1);
        assert_eq!(observer.path(), Some(PathBuf::from("main.cpp")));
        identity.open(None);
        assert_eq!(observer.stamp(), 2);
        assert_eq!(observer.path(), None);
    }
}
