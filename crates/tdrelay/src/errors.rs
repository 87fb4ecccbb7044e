//! Error types for the codec, transport and correlation layers.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while converting between wire bytes and [`crate::Message`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes were not valid UTF-8 JSON.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The JSON document was valid but not an object.
    #[error("message must be a JSON object, found {found}")]
    NotAnObject {
        /// Kind of JSON value that was found instead.
        found: &'static str,
    },

    /// Serialisation of an outgoing message failed.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures reported by a [`crate::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The native client has been destroyed or its connection closed.
    #[error("transport is closed")]
    Closed,

    /// The payload contained a NUL byte and cannot cross the C boundary.
    #[error("payload contains an interior NUL byte at offset {offset}")]
    InteriorNul {
        /// Position of the offending byte.
        offset: usize,
    },

    /// I/O error raised by the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The native layer reported an unrecoverable condition.
    #[error("native client failure: {message}")]
    Native {
        /// Description supplied by the native layer.
        message: String,
    },
}

/// Errors surfaced by [`crate::Client`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No correlated reply arrived in time. The pending entry has been removed.
    #[error("no reply for request {tag} within {}ms", .timeout.as_millis())]
    Timeout {
        /// Correlation tag of the abandoned request.
        tag: String,
        /// Wait that elapsed.
        timeout: Duration,
    },

    /// The transport failed; the engine does not retry.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A message could not be encoded or a synchronous reply decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The dispatch loop is no longer running, so no reply can be delivered.
    #[error("dispatch loop has stopped")]
    DispatcherStopped,

    /// The dispatch thread could not be started.
    #[error("failed to spawn dispatch thread: {0}")]
    Spawn(#[source] io::Error),
}

impl ClientError {
    /// Whether the error is a correlation timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
