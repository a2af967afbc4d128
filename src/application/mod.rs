// Application layer - Refresh use cases and the ports they depend on
pub mod error_banner;
pub mod refresh_controller;
pub mod stats_source;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Rendering state stays usable after a panic in a render pass, so a
/// poisoned lock is recovered rather than propagated.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
