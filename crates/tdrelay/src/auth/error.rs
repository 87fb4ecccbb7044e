//! Errors raised while driving the login handshake.

use std::io;

use thiserror::Error;

use super::credentials::Credential;
use crate::errors::ClientError;

/// Failures of a single authorization step.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The state is not one the driver knows how to answer.
    #[error("unexpected authorization state: {state}")]
    UnexpectedState {
        /// Identifier that was supplied.
        state: String,
    },

    /// The request for this step failed.
    #[error("authorization request failed: {0}")]
    Request(#[from] ClientError),

    /// The credential source could not supply a value.
    #[error("failed to read {credential}: {source}")]
    Input {
        /// Credential being read.
        credential: Credential,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
