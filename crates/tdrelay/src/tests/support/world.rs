//! BDD test worlds wrapping a client and its scripted transport.

use std::collections::HashMap;
use std::time::Duration;

use tdrelay_config::SessionOptions;

use crate::auth::{AuthError, AuthStep, AuthorizationDriver};
use crate::client::{Client, ClientOptions};
use crate::errors::ClientError;
use crate::message::Message;
use crate::testing::ScriptedTransport;

use super::credentials::ScriptedCredentials;
use super::{fast_options, start_client};

/// Shared state for correlation scenarios.
pub struct EngineWorld {
    /// Test-side handle on the transport the client owns.
    pub transport: ScriptedTransport,
    client: Option<Client<ScriptedTransport>>,
    /// Results of finished requests keyed by request type.
    pub outcomes: HashMap<String, Result<Message, ClientError>>,
    /// Time taken by the most recent timed request.
    pub elapsed: Option<Duration>,
}

impl Default for EngineWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineWorld {
    /// Creates a world with no client running yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: ScriptedTransport::new(),
            client: None,
            outcomes: HashMap::new(),
            elapsed: None,
        }
    }

    /// Starts the client with `options`.
    pub fn start(&mut self, options: ClientOptions) {
        self.client = Some(start_client(
            &self.transport,
            SessionOptions::default(),
            options,
        ));
    }

    /// The running client.
    #[must_use]
    pub fn client(&self) -> &Client<ScriptedTransport> {
        self.client.as_ref().expect("client should be started")
    }

    /// Recorded outcome for the request of type `kind`.
    #[must_use]
    pub fn outcome(&self, kind: &str) -> &Result<Message, ClientError> {
        self.outcomes
            .get(kind)
            .unwrap_or_else(|| panic!("no outcome recorded for {kind}"))
    }
}

/// Shared state for authorization scenarios.
pub struct AuthWorld {
    /// Test-side handle on the transport the client owns.
    pub transport: ScriptedTransport,
    /// Session the client is started with.
    pub session: SessionOptions,
    /// Answers for interactive prompts.
    pub credentials: ScriptedCredentials,
    client: Option<Client<ScriptedTransport>>,
    /// Result of the last driver step.
    pub outcome: Option<Result<AuthStep, AuthError>>,
}

impl Default for AuthWorld {
    fn default() -> Self {
        Self {
            transport: ScriptedTransport::new(),
            session: SessionOptions::default(),
            credentials: ScriptedCredentials::default(),
            client: None,
            outcome: None,
        }
    }
}

impl AuthWorld {
    /// Feeds `state` to a driver, starting the client on first use.
    pub fn advance(&mut self, state: &str) {
        if self.client.is_none() {
            self.client = Some(start_client(
                &self.transport,
                self.session.clone(),
                fast_options(),
            ));
        }
        let client = self.client.as_ref().expect("client just started");
        let mut driver = AuthorizationDriver::new(client, &mut self.credentials);
        self.outcome = Some(driver.advance(state));
    }

    /// Result of the last driver step.
    #[must_use]
    pub fn outcome(&self) -> &Result<AuthStep, AuthError> {
        self.outcome.as_ref().expect("a state should have been handled")
    }
}
