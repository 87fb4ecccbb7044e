//! Authorization states the driver knows how to answer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::message::Message;

/// `@type` of the event that reports authorization progress.
pub const UPDATE_AUTHORIZATION_STATE: &str = "updateAuthorizationState";

/// Step of the login handshake, as reported by the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationState {
    /// Startup parameters are required.
    WaitTdlibParameters,
    /// The local database encryption key must be checked.
    WaitEncryptionKey,
    /// A phone number is required.
    WaitPhoneNumber,
    /// The confirmation code sent to the phone is required.
    WaitCode,
    /// The two-step verification password is required.
    WaitPassword,
    /// The session is authorised.
    Ready,
}

impl AuthorizationState {
    /// Returns the protocol identifier of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitTdlibParameters => "authorizationStateWaitTdlibParameters",
            Self::WaitEncryptionKey => "authorizationStateWaitEncryptionKey",
            Self::WaitPhoneNumber => "authorizationStateWaitPhoneNumber",
            Self::WaitCode => "authorizationStateWaitCode",
            Self::WaitPassword => "authorizationStateWaitPassword",
            Self::Ready => "authorizationStateReady",
        }
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raised for state identifiers the driver does not handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unexpected authorization state '{0}'")]
pub struct AuthorizationStateParseError(String);

impl AuthorizationStateParseError {
    /// Returns the identifier that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for AuthorizationState {
    type Err = AuthorizationStateParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "authorizationStateWaitTdlibParameters" => Ok(Self::WaitTdlibParameters),
            "authorizationStateWaitEncryptionKey" => Ok(Self::WaitEncryptionKey),
            "authorizationStateWaitPhoneNumber" => Ok(Self::WaitPhoneNumber),
            "authorizationStateWaitCode" => Ok(Self::WaitCode),
            "authorizationStateWaitPassword" => Ok(Self::WaitPassword),
            "authorizationStateReady" => Ok(Self::Ready),
            other => Err(AuthorizationStateParseError(other.to_owned())),
        }
    }
}

/// Extracts the state name from an `updateAuthorizationState` event.
///
/// Returns `None` for any other message.
#[must_use]
pub fn authorization_state(event: &Message) -> Option<&str> {
    if event.type_name() != Some(UPDATE_AUTHORIZATION_STATE) {
        return None;
    }
    event
        .get("authorization_state")?
        .get("@type")?
        .as_str()
        .filter(|name| !name.is_empty())
}
