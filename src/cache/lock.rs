use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock the in-process listing store, recovering from poisoning.
///
/// Entries left behind by a panicking holder are at worst stale.
pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(
            target = "pictura::cache",
            op, "memory cache lock was poisoned; continuing with recovered entries"
        );
        poisoned.into_inner()
    })
}
