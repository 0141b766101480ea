//! The byte-oriented request/response channel a session is driven over.

use std::time::Duration;

use thiserror::Error;

/// Failure modes a [`Transport`] implementation can report. The
/// orchestrator never inspects these beyond mapping them onto
/// [`cmp_types::CmpError`] — retries, if any, are the caller's concern;
/// this layer never retries on its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport timed out waiting for a response")]
    Timeout,
    #[error("transport I/O failure: {0}")]
    Io(String),
}

/// A round-trip request/response channel, blocking the calling thread
/// until a response arrives or `timeout` elapses.
///
/// `Send`, not `Sync` — a session drives its transport from a single
/// thread at a time.
pub trait Transport: Send {
    fn send_receive(&mut self, request: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError>;
}
