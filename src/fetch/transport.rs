//! Transfer transport seam and the HTTP implementation.
//!
//! The coordinator never touches the network itself; it consumes
//! [`Transport`]/[`TransferHandle`]. [`HttpTransport`] is the production
//! implementation: each transfer is a streamed `reqwest` download driven
//! by a background tokio task, observed through an atomic snapshot so the
//! polling side never blocks.

use bytes::Bytes;
use futures::TryStreamExt;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::decode::probe_dimensions;
use crate::{Error, Result};

/// One in-flight (or finished) transfer, observed by polling.
///
/// Every method returns immediately; none of them may perform I/O on the
/// calling thread.
pub trait TransferHandle: Send {
    /// Fraction of the transfer completed so far, in `[0, 1]`.
    fn progress(&self) -> f32;

    /// Whether the transfer has finished, successfully or not.
    fn is_done(&self) -> bool;

    /// Error description, present once the transfer finished unsuccessfully.
    fn error(&self) -> Option<String>;

    /// The transferred blob. Empty until the transfer is done.
    fn bytes(&self) -> Bytes;

    /// Pixel dimensions of the transferred image, `(0, 0)` when unknown.
    fn decoded_size(&self) -> (u32, u32);

    /// Best-effort cancellation. The transfer may still run to completion;
    /// callers stop observing the handle either way.
    fn abort(&self) {}
}

/// Begins transfers. `begin` must not fail: a transfer that cannot start
/// is returned as a handle that is already done with an error set.
pub trait Transport: Send + Sync {
    fn begin(&self, url: &str) -> Box<dyn TransferHandle>;
}

#[derive(Default)]
struct TransferState {
    received: AtomicU64,
    total: AtomicU64,
    done: AtomicBool,
    outcome: Mutex<Outcome>,
}

#[derive(Default)]
struct Outcome {
    bytes: Bytes,
    size: (u32, u32),
    error: Option<String>,
}

impl TransferState {
    fn finish(&self, result: std::result::Result<(Bytes, (u32, u32)), String>) {
        if let Ok(mut outcome) = self.outcome.lock() {
            match result {
                Ok((bytes, size)) => {
                    outcome.bytes = bytes;
                    outcome.size = size;
                }
                Err(message) => outcome.error = Some(message),
            }
        }
        // Publish after the outcome is in place; readers pair this with
        // an Acquire load in is_done.
        self.done.store(true, Ordering::Release);
    }

    fn failed(message: impl Into<String>) -> Arc<Self> {
        let state = Arc::new(Self::default());
        state.finish(Err(message.into()));
        state
    }
}

struct HttpHandle {
    state: Arc<TransferState>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TransferHandle for HttpHandle {
    fn progress(&self) -> f32 {
        if self.is_done() && self.error().is_none() {
            return 1.0;
        }
        let total = self.state.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        (self.state.received.load(Ordering::Relaxed) as f32 / total as f32).clamp(0.0, 1.0)
    }

    fn is_done(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }

    fn error(&self) -> Option<String> {
        if !self.is_done() {
            return None;
        }
        self.state.outcome.lock().ok()?.error.clone()
    }

    fn bytes(&self) -> Bytes {
        self.state
            .outcome
            .lock()
            .map(|o| o.bytes.clone())
            .unwrap_or_default()
    }

    fn decoded_size(&self) -> (u32, u32) {
        self.state
            .outcome
            .lock()
            .map(|o| o.size)
            .unwrap_or_default()
    }

    fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// `reqwest`-backed transport owning a small background runtime.
///
/// Request timeout defaults to 30s, overridable via
/// `TEXCACHE_HTTP_TIMEOUT_SECS`.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let timeout_secs = env::var("TEXCACHE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::transfer(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("texcache-transfer")
            .enable_all()
            .build()?;

        Ok(Self { client, runtime })
    }
}

impl Transport for HttpTransport {
    fn begin(&self, url: &str) -> Box<dyn TransferHandle> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Box::new(HttpHandle {
                    state: TransferState::failed(format!("invalid url: {e}")),
                    task: None,
                });
            }
        };

        debug!(url, "beginning transfer");
        let state = Arc::new(TransferState::default());
        let task_state = Arc::clone(&state);
        let client = self.client.clone();
        let task = self.runtime.spawn(async move {
            let result = run_transfer(&client, parsed, &task_state).await;
            task_state.finish(result);
        });

        Box::new(HttpHandle {
            state,
            task: Some(task),
        })
    }
}

async fn run_transfer(
    client: &reqwest::Client,
    url: Url,
    state: &TransferState,
) -> std::result::Result<(Bytes, (u32, u32)), String> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;

    if let Some(total) = response.content_length() {
        state.total.store(total, Ordering::Relaxed);
    }

    let mut stream = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.try_next().await.map_err(|e| e.to_string())? {
        buf.extend_from_slice(&chunk);
        state.received.store(buf.len() as u64, Ordering::Relaxed);
    }

    let bytes = Bytes::from(buf);
    let size = probe_dimensions(&bytes).unwrap_or((0, 0));
    Ok((bytes, size))
}
