//! # Fetch Module
//!
//! Single-flight download coordination, split in two:
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FetchCoordinator`] | Per-key session state machine, driven by `poll` |
//! | [`Transport`] / [`TransferHandle`] | Seam the coordinator consumes |
//! | [`HttpTransport`] | `reqwest`-backed production transport |
//!
//! The coordinator side is synchronous and non-blocking; the transfer
//! itself runs wherever the transport put it and is only ever observed.

pub mod coordinator;
pub mod transport;

pub use coordinator::{FetchCoordinator, FetchStatus, Fetched};
pub use transport::{HttpTransport, Transport, TransferHandle};
