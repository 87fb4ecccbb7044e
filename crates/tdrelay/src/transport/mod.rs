//! Boundary to the native client.
//!
//! The native library exposes a blocking "send one / receive one" interface
//! and a synchronous execute primitive. [`Transport`] captures exactly that
//! surface so the engine can be driven by the real binding
//! (`NativeTransport`, behind the `tdjson` feature) or by in-memory doubles.
//! Creating the native client is the implementor's constructor and
//! destroying it is the implementor's `Drop`.

#[cfg(feature = "tdjson")]
mod native;

use std::fmt;
use std::time::Duration;

use crate::errors::TransportError;

#[cfg(feature = "tdjson")]
pub use native::NativeTransport;

/// Byte-level access to a native client instance.
///
/// Implementations must tolerate `send` and `execute` being called from many
/// threads while a single thread (the dispatch loop) calls `receive`.
pub trait Transport: Send + Sync + 'static {
    /// Hands one encoded request to the native client.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the client cannot accept the payload.
    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;

    /// Blocks for up to `timeout` waiting for the next message.
    ///
    /// `Ok(None)` means the wait elapsed without traffic.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the client can no longer produce
    /// messages.
    fn receive(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;

    /// Runs a request synchronously, bypassing the asynchronous pipeline.
    ///
    /// Only requests the library documents as synchronous may be used.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the request cannot be executed.
    fn execute(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, TransportError>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Transport")
    }
}
