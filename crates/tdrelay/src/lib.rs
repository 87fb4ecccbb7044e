//! Request correlation and event dispatch for the TDLib JSON client.
#![deny(missing_docs)]
//!
//! The native library exchanges JSON documents one at a time and mixes
//! replies to earlier requests with a continuous stream of unsolicited
//! updates. [`Client`] untangles the two: a dedicated dispatch thread polls
//! the [`Transport`], hands every reply carrying an `@extra` correlation tag
//! to the caller blocked in [`Client::send_and_await`], and pushes everything
//! else onto a bounded, ordered [`Events`] stream. The login handshake is
//! driven on top of both by [`AuthorizationDriver`].
//!
//! The transport is a trait so the engine runs equally against the native
//! binding (`NativeTransport`, behind the `tdjson` feature) and in-memory
//! doubles (`testing::ScriptedTransport`, behind `test-support`).

mod auth;
mod client;
mod dispatch;
mod errors;
mod events;
mod message;
mod native_log;
mod registry;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use auth::{
    AuthError, AuthStep, AuthorizationDriver, AuthorizationState, AuthorizationStateParseError,
    ConsoleCredentials, Credential, CredentialSource, UPDATE_AUTHORIZATION_STATE,
    authorization_state,
};
pub use client::{Client, ClientOptions, DISPATCH_THREAD_NAME};
pub use errors::{ClientError, CodecError, TransportError};
pub use events::{EventPoll, Events};
pub use message::{ERROR_TYPE, EXTRA_KEY, Message, TYPE_KEY};
pub use native_log::{
    DEFAULT_MAX_LOG_FILE_SIZE, NativeLogConfigurator, NativeLogError, NativeLogSettings,
    configure_native_logging,
};
pub use registry::{TAG_LENGTH, generate_tag};
pub use tdrelay_config::{Config, SessionOptions};
pub use transport::Transport;
#[cfg(feature = "tdjson")]
pub use transport::NativeTransport;
