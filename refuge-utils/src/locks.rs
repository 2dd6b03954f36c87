//! Lock aliases used across the workspace.
//!
//! The host loop and request tasks share the selector through these, so the
//! concrete lock type only has to change in one place.

/// A synchronous mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;
/// Guard returned by [`SyncMutex::lock`].
pub type SyncMutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
/// A synchronous reader-writer lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;
