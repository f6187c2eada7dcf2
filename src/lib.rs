//! # texcache
//!
//! Expiry-based disk cache and single-flight fetch coordination for
//! remote texture previews.
//!
//! ## Overview
//!
//! This library implements the non-GUI core of a "paste a URL, see the
//! image" inspector widget: it caches downloaded texture blobs on disk
//! with an expiration timestamp, decides whether a cached blob for a key
//! is still valid, and tracks at most one in-flight download per key so
//! that a UI redraw loop can poll as often as it likes without blocking
//! and without re-triggering transfers.
//!
//! Rendering, image decoding and the inspector binding stay with the
//! embedder; they are reached through small traits
//! ([`ImageDecoder`], [`Transport`]).
//!
//! ## Core Behavior
//!
//! - **One file per entry**, all metadata in the name:
//!   `"{fingerprint}_{expiresAt}_{width}_{height}"`, content = raw blob.
//! - **Expiry-only invalidation**: an entry is stale once `now` reaches
//!   its expiry tick; stale entries are evicted when touched. No LRU, no
//!   size bound.
//! - **Single-flight fetches**: repeated [`PreviewSession::resolve`]
//!   calls for a key share one transfer and observe its progress.
//! - **Absorbed failures**: malformed filenames, failed transfers and
//!   undecodable blobs all collapse into safe status values; the redraw
//!   loop always has something to paint, even if it is nothing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use texcache::{
//!     now_ticks, DecodeError, HttpTransport, ImageDecoder, PreviewCacheConfig,
//!     PreviewSession, Resolution,
//! };
//!
//! // The embedder owns real decoding; this one just keeps the bytes.
//! struct RawDecoder;
//! impl ImageDecoder for RawDecoder {
//!     type Image = Vec<u8>;
//!     fn decode(&self, bytes: &[u8]) -> Result<Self::Image, DecodeError> {
//!         Ok(bytes.to_vec())
//!     }
//! }
//!
//! fn main() -> texcache::Result<()> {
//!     let transport = Arc::new(HttpTransport::new()?);
//!     let config = PreviewCacheConfig::new().with_cache_dir("Temp");
//!     let mut session = PreviewSession::new(config, transport, RawDecoder)?;
//!
//!     // Once per redraw; never blocks.
//!     match session.resolve("https://example.com/img.png", now_ticks()) {
//!         Resolution::Cached(preview) | Resolution::Fetched(preview) => {
//!             // draw preview.image at preview.width x preview.height
//!             let _ = preview;
//!         }
//!         Resolution::InProgress(fraction) => {
//!             // draw a progress bar
//!             let _ = fraction;
//!         }
//!         Resolution::Empty => { /* draw nothing */ }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Entry naming, expiry policy and the disk store |
//! | [`fetch`] | Per-key transfer coordination and the HTTP transport |
//! | [`preview`] | Per-redraw orchestration over store + coordinator |
//! | [`decode`] | Decoder seam and header-level dimension probing |
//! | [`config`] | Cache directory and TTL knobs |

pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod preview;

// Re-export main types for convenience
pub use cache::{now_ticks, ttl_ticks, CacheStats, DiskStore, EntryMeta, Fingerprint, NameError, Ticks};
pub use config::PreviewCacheConfig;
pub use decode::{probe_dimensions, DecodeError, ImageDecoder};
pub use error::Error;
pub use fetch::{FetchCoordinator, FetchStatus, Fetched, HttpTransport, Transport, TransferHandle};
pub use preview::{Preview, PreviewSession, Resolution};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
