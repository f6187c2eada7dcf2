//! Per-key fetch session tracking.
//!
//! At most one transfer is ever in flight for a logical key. A session
//! moves `Pending -> InProgress -> {Done, Failed}` under repeated
//! non-blocking [`FetchCoordinator::poll`] calls; `Done` and `Failed`
//! are returned exactly once and resolve the session.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{TransferHandle, Transport};

/// Blob and probed dimensions of a successfully finished transfer.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Observable state of a key's fetch.
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// Session created but not yet observed by a poll.
    Pending,
    /// Transfer running. The fraction is in `[0, 1]` and never decreases.
    InProgress(f32),
    /// Transfer succeeded. The session is gone after this is returned.
    Done(Fetched),
    /// Transfer failed. The session is gone after this is returned; a
    /// later `start` for the same key is a fresh attempt.
    Failed,
}

struct FetchSession {
    handle: Box<dyn TransferHandle>,
    polled: bool,
    max_progress: f32,
}

/// Tracks at most one in-flight transfer per logical key.
pub struct FetchCoordinator {
    transport: Arc<dyn Transport>,
    sessions: HashMap<String, FetchSession>,
}

impl FetchCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sessions: HashMap::new(),
        }
    }

    /// Begin a transfer for `key`. A no-op while a session for `key`
    /// already exists, whatever state it is in.
    pub fn start(&mut self, key: &str) {
        if self.sessions.contains_key(key) {
            return;
        }
        debug!(key, "starting fetch");
        let handle = self.transport.begin(key);
        self.sessions.insert(
            key.to_string(),
            FetchSession {
                handle,
                polled: false,
                max_progress: 0.0,
            },
        );
    }

    pub fn has_session(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    /// Non-mutating view of a session's state. Never resolves a finished
    /// transfer; only [`poll`](Self::poll) does that.
    pub fn status(&self, key: &str) -> Option<FetchStatus> {
        let session = self.sessions.get(key)?;
        if session.polled {
            Some(FetchStatus::InProgress(session.max_progress))
        } else {
            Some(FetchStatus::Pending)
        }
    }

    /// Observe `key`'s transfer without blocking. `None` when no session
    /// exists for `key`.
    pub fn poll(&mut self, key: &str) -> Option<FetchStatus> {
        if self.sessions.get(key)?.handle.is_done() {
            let session = self.sessions.remove(key)?;
            if let Some(error) = session.handle.error() {
                warn!(key, error = %error, "fetch failed");
                return Some(FetchStatus::Failed);
            }
            let (width, height) = session.handle.decoded_size();
            return Some(FetchStatus::Done(Fetched {
                bytes: session.handle.bytes(),
                width,
                height,
            }));
        }

        let session = self.sessions.get_mut(key)?;
        session.polled = true;
        // Latch the maximum so a jittery handle still reads monotonic.
        let progress = session.handle.progress().clamp(0.0, 1.0);
        if progress > session.max_progress {
            session.max_progress = progress;
        }
        Some(FetchStatus::InProgress(session.max_progress))
    }

    /// Drop `key`'s session, aborting its transfer where possible. Used
    /// when the key text itself changes: whatever arrives is no longer
    /// the identity being displayed.
    pub fn discard(&mut self, key: &str) {
        if let Some(session) = self.sessions.remove(key) {
            debug!(key, "discarding fetch session");
            session.handle.abort();
        }
    }
}
