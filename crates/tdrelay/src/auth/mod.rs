//! Interactive login handshake.
//!
//! The native library reports progress through `updateAuthorizationState`
//! events. For each reported state the [`AuthorizationDriver`] issues the one
//! request that answers it, reading a credential first when the step needs
//! user input. The driver is stateless: the caller feeds it each state as it
//! arrives on the event stream and stops once [`AuthStep::Ready`] comes back.

mod credentials;
mod error;
mod state;

use tracing::{debug, info};

use crate::client::Client;
use crate::errors::{ClientError, CodecError};
use crate::message::Message;
use crate::transport::Transport;

pub use credentials::{ConsoleCredentials, Credential, CredentialSource};
pub use error::AuthError;
pub use state::{
    AuthorizationState, AuthorizationStateParseError, UPDATE_AUTHORIZATION_STATE,
    authorization_state,
};

const AUTH_TARGET: &str = "tdrelay::auth";

/// Result of answering one authorization state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStep {
    /// A request was submitted; holds the library's reply, which may be an
    /// `error` object.
    Submitted(Message),
    /// The session is authorised and no request was needed.
    Ready,
}

/// Answers authorization states on behalf of a [`Client`].
#[derive(Debug)]
pub struct AuthorizationDriver<'c, T: Transport, C> {
    client: &'c Client<T>,
    credentials: C,
}

impl<'c, T: Transport, C: CredentialSource> AuthorizationDriver<'c, T, C> {
    /// Creates a driver that prompts through `credentials`.
    pub const fn new(client: &'c Client<T>, credentials: C) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Issues the request answering `state` and waits for its reply.
    ///
    /// The wait uses the client's configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnexpectedState`] for unknown identifiers,
    /// [`AuthError::Input`] when a credential cannot be read, and
    /// [`AuthError::Request`] when the request fails or times out.
    pub fn advance(&mut self, state: &str) -> Result<AuthStep, AuthError> {
        let parsed: AuthorizationState =
            state
                .parse()
                .map_err(|error: AuthorizationStateParseError| AuthError::UnexpectedState {
                    state: error.input().to_owned(),
                })?;
        debug!(target: AUTH_TARGET, state = parsed.as_str(), "advancing authorization");

        let request = match parsed {
            AuthorizationState::Ready => {
                info!(target: AUTH_TARGET, "authorization complete");
                return Ok(AuthStep::Ready);
            }
            AuthorizationState::WaitTdlibParameters => self.tdlib_parameters()?,
            AuthorizationState::WaitEncryptionKey => Message::new("checkDatabaseEncryptionKey"),
            AuthorizationState::WaitPhoneNumber => {
                let phone_number = match self.client.session().phone_number() {
                    Some(configured) => configured.to_owned(),
                    None => self.read(Credential::PhoneNumber)?,
                };
                Message::new("setAuthenticationPhoneNumber").with("phone_number", phone_number)
            }
            AuthorizationState::WaitCode => {
                Message::new("checkAuthenticationCode").with("code", self.read(Credential::Code)?)
            }
            AuthorizationState::WaitPassword => Message::new("checkAuthenticationPassword")
                .with("password", self.read(Credential::Password)?),
        };

        let reply = self.client.request(request)?;
        if let Some((code, message)) = reply.error_details() {
            info!(
                target: AUTH_TARGET,
                state = parsed.as_str(),
                code,
                message,
                "authorization step rejected"
            );
        }
        Ok(AuthStep::Submitted(reply))
    }

    fn tdlib_parameters(&self) -> Result<Message, AuthError> {
        let parameters = serde_json::to_value(self.client.session().tdlib_parameters())
            .map_err(|error| ClientError::Codec(CodecError::Encode(error)))?;
        Ok(Message::new("setTdlibParameters").with("parameters", parameters))
    }

    fn read(&mut self, credential: Credential) -> Result<String, AuthError> {
        self.credentials
            .read(credential)
            .map_err(|source| AuthError::Input { credential, source })
    }
}
