//! Process-wide reader/writer locks keyed by document path.
//!
//! Locks serialize transactions inside one process only; other processes
//! editing the same file are not excluded.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockWriteGuard};

static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>> = Lazy::new(Default::default);

/// Runs `f` while holding the shared lock for `path`.
pub(crate) fn with_shared<T>(path: &Path, f: impl FnOnce() -> T) -> T {
    let lock = path_lock(lock_key(path));
    let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);
    f()
}

/// Runs `f` while holding the exclusive locks for every path in `paths`.
///
/// Keys are taken in sorted order so two transactions over the same pair
/// of files cannot deadlock.
pub(crate) fn with_exclusive<T>(paths: &[&Path], f: impl FnOnce() -> T) -> T {
    let mut keys = paths.iter().map(|path| lock_key(path)).collect::<Vec<_>>();
    keys.sort();
    keys.dedup();
    let locks = keys.into_iter().map(path_lock).collect::<Vec<_>>();
    let _guards = locks
        .iter()
        .map(|lock| lock.write().unwrap_or_else(PoisonError::into_inner))
        .collect::<Vec<RwLockWriteGuard<'_, ()>>>();
    f()
}

/// Canonical form of `path`, also for files that do not exist yet.
pub(crate) fn lock_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

fn path_lock(key: PathBuf) -> Arc<RwLock<()>> {
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}
