//! # Disk Cache Module
//!
//! Expiry-based disk cache for remote texture blobs. Each entry is one
//! file in one directory; the filename encodes everything but the blob:
//! `"{fingerprint}_{expiresAt}_{width}_{height}"`.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Fingerprint`] | Stable cache-slot identifier derived from the key |
//! | [`EntryMeta`] | Decoded filename: fingerprint, expiry, dimensions |
//! | [`DiskStore`] | Directory-backed store with a lazy fingerprint index |
//! | [`CacheStats`] | Hit/miss/write/delete counters |
//!
//! Invalidation is purely expiry-based: an entry is stale once `now`
//! reaches its `expires_at` tick, and stale entries are deleted
//! opportunistically when looked up (or in bulk via
//! [`DiskStore::prune_expired`]). There is no LRU and no size bound.

pub mod expiry;
pub mod key;
pub mod store;

pub use expiry::{now_ticks, ttl_ticks, Ticks};
pub use key::{EntryMeta, Fingerprint, NameError};
pub use store::{CacheStats, DiskStore};
