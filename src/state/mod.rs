// src/state/mod.rs

//! Per-directory persisted state: the last fingerprint and the lock marker.

pub mod hash_store;
pub mod lock;

pub use hash_store::{FileHashStore, HashStore, MemoryHashStore};
pub use lock::LockGuard;
