//! Per-redraw orchestration.
//!
//! [`PreviewSession`] is what the widget layer drives: once per redraw it
//! calls [`resolve`](PreviewSession::resolve) with the current key text
//! and gets back something it can always render, even if that something
//! is nothing. All cache and session mutation happens on the calling
//! thread; no call here blocks on the network.

use bytes::Bytes;
use std::sync::Arc;
use tracing::warn;

use crate::cache::expiry::{ttl_ticks, Ticks};
use crate::cache::key::{EntryMeta, Fingerprint};
use crate::cache::store::DiskStore;
use crate::config::PreviewCacheConfig;
use crate::decode::ImageDecoder;
use crate::fetch::coordinator::{FetchCoordinator, FetchStatus, Fetched};
use crate::fetch::transport::Transport;
use crate::Result;

/// A renderable blob: the raw bytes, the dimensions the cache knows for
/// them (layout metadata for the renderer), and the decoded image.
///
/// `image` is `None` when the decoder rejected the bytes. The raw blob is
/// still exposed so the embedder can decide what to do with it; the
/// renderer simply has nothing to paint.
#[derive(Debug)]
pub struct Preview<I> {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub image: Option<I>,
}

/// What a single redraw gets back for a key.
#[derive(Debug)]
pub enum Resolution<I> {
    /// Served from a valid on-disk entry.
    Cached(Preview<I>),
    /// A transfer is running; paint a progress bar.
    InProgress(f32),
    /// A transfer just finished and the entry was persisted.
    Fetched(Preview<I>),
    /// Nothing to show: no valid entry and no usable transfer result.
    Empty,
}

/// Ties the store, the coordinator and the decoder together for one
/// widget. Owns every `FetchSession` (created on fetch start, removed on
/// resolution or [`invalidate`](Self::invalidate)).
pub struct PreviewSession<D: ImageDecoder> {
    config: PreviewCacheConfig,
    store: DiskStore,
    coordinator: FetchCoordinator,
    decoder: D,
    ttl: Ticks,
}

impl<D: ImageDecoder> PreviewSession<D> {
    pub fn new(
        config: PreviewCacheConfig,
        transport: Arc<dyn Transport>,
        decoder: D,
    ) -> Result<Self> {
        let store = DiskStore::open(&config.cache_dir)?;
        let ttl = ttl_ticks(config.ttl);
        Ok(Self {
            config,
            store,
            coordinator: FetchCoordinator::new(transport),
            decoder,
            ttl,
        })
    }

    /// Resolve `key` for the current redraw.
    ///
    /// Order of precedence: an active transfer for `key` wins over the
    /// disk; a valid disk entry wins over starting a transfer; an expired
    /// entry is deleted and a fresh transfer starts on the same call.
    pub fn resolve(&mut self, key: &str, now: Ticks) -> Resolution<D::Image> {
        let fingerprint = Fingerprint::of(key);

        if let Some(status) = self.coordinator.poll(key) {
            return match status {
                FetchStatus::Pending => Resolution::InProgress(0.0),
                FetchStatus::InProgress(progress) => Resolution::InProgress(progress),
                FetchStatus::Failed => Resolution::Empty,
                FetchStatus::Done(fetched) => self.persist(key, fingerprint, fetched, now),
            };
        }

        if let Some((path, meta)) = self.store.find_entry(fingerprint) {
            if meta.is_expired(now) {
                // Evict and refetch on the same redraw.
                self.store.delete(&path);
            } else {
                match self.store.read(&path) {
                    Ok(bytes) => {
                        let preview = self.preview(bytes, meta.width, meta.height);
                        if preview.image.is_none() {
                            // Undecodable entry: evict it so the next
                            // resolve fetches a replacement.
                            self.store.delete(&path);
                        }
                        return Resolution::Cached(preview);
                    }
                    Err(e) => {
                        warn!(key, error = %e, "cached entry unreadable");
                        self.store.delete(&path);
                    }
                }
            }
        }

        self.coordinator.start(key);
        Resolution::InProgress(0.0)
    }

    /// The key text changed: drop the in-flight session for the old key,
    /// if any. Its transfer result, should it still arrive, is ignored.
    pub fn invalidate(&mut self, key: &str) {
        self.coordinator.discard(key);
    }

    /// Whether a transfer is in flight for `key`.
    pub fn is_fetching(&self, key: &str) -> bool {
        self.coordinator.has_session(key)
    }

    /// Sweep expired entries. Returns the number removed.
    pub fn prune_expired(&self, now: Ticks) -> usize {
        self.store.prune_expired(now)
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    pub fn config(&self) -> &PreviewCacheConfig {
        &self.config
    }

    fn persist(
        &mut self,
        key: &str,
        fingerprint: Fingerprint,
        fetched: Fetched,
        now: Ticks,
    ) -> Resolution<D::Image> {
        let meta = EntryMeta {
            fingerprint,
            expires_at: now.saturating_add(self.ttl),
            width: fetched.width,
            height: fetched.height,
        };
        if let Err(e) = self.store.write(&meta, &fetched.bytes) {
            // The blob is still good for this redraw; only persistence
            // failed.
            warn!(key, error = %e, "failed to persist fetched entry");
        }
        Resolution::Fetched(self.preview(fetched.bytes, fetched.width, fetched.height))
    }

    fn preview(&self, bytes: Bytes, width: u32, height: u32) -> Preview<D::Image> {
        let image = match self.decoder.decode(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, "blob failed to decode");
                None
            }
        };
        Preview {
            bytes,
            width,
            height,
            image,
        }
    }
}
