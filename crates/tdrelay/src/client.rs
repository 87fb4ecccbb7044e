//! The correlation engine's public handle.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use tdrelay_config::{
    Config, DEFAULT_EVENT_CAPACITY, DEFAULT_RECEIVE_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    SessionOptions,
};
use tracing::{debug, error, trace, warn};

use crate::auth::{AuthError, AuthStep, AuthorizationDriver, CredentialSource};
use crate::dispatch::{Dispatcher, EngineState};
use crate::errors::ClientError;
use crate::events::Events;
use crate::message::Message;
use crate::transport::Transport;

const CLIENT_TARGET: &str = "tdrelay::client";

/// Name given to the dispatch thread.
pub const DISPATCH_THREAD_NAME: &str = "tdrelay-dispatch";

/// Tuning values for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    receive_timeout: Duration,
    request_timeout: Duration,
    event_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(DEFAULT_RECEIVE_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientOptions {
    /// Reads the engine tuning values from the runtime configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            receive_timeout: config.receive_timeout(),
            request_timeout: config.request_timeout(),
            event_capacity: config.event_capacity(),
        }
    }

    /// Sets how long a single receive poll blocks.
    #[must_use]
    pub const fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Sets the wait used by [`Client::request`].
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the event stream capacity. Zero is raised to one.
    #[must_use]
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Duration of a single receive poll.
    #[must_use]
    pub const fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Wait used by [`Client::request`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Capacity of the event stream.
    #[must_use]
    pub const fn event_capacity(&self) -> usize {
        if self.event_capacity == 0 {
            1
        } else {
            self.event_capacity
        }
    }
}

/// Multiplexes requests and events over one native client.
///
/// The client owns the transport and a dedicated dispatch thread. Requests
/// may be issued from any number of threads; each waiter receives only the
/// reply carrying its own correlation tag, and every untagged event lands on
/// the shared [`Events`] stream in arrival order.
///
/// Dropping the client stops and joins the dispatch thread before the
/// transport is released. Outstanding waits should have returned by then.
pub struct Client<T: Transport> {
    state: Arc<EngineState<T>>,
    events: Events,
    session: SessionOptions,
    options: ClientOptions,
    dispatcher: Option<JoinHandle<()>>,
}

impl<T: Transport> Client<T> {
    /// Takes ownership of `transport` and starts the dispatch loop.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Spawn`] if the dispatch thread cannot start.
    pub fn new(
        transport: T,
        session: SessionOptions,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let state = Arc::new(EngineState::new(transport));
        let (sender, receiver) = channel::bounded(options.event_capacity());
        let dispatcher = Dispatcher::new(Arc::clone(&state), sender, options.receive_timeout());

        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_owned())
            .spawn(move || dispatcher.run())
            .map_err(ClientError::Spawn)?;

        debug!(
            target: CLIENT_TARGET,
            event_capacity = options.event_capacity(),
            request_timeout_ms = options.request_timeout().as_millis(),
            "client started"
        );
        Ok(Self {
            state,
            events: Events::new(receiver),
            session,
            options,
            dispatcher: Some(handle),
        })
    }

    /// Sends `message` without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns an error when the message cannot be encoded or the transport
    /// refuses it.
    pub fn send(&self, message: &Message) -> Result<(), ClientError> {
        let payload = message.encode()?;
        self.state.transport.send(&payload)?;
        trace!(
            target: CLIENT_TARGET,
            kind = message.type_name().unwrap_or_default(),
            "message sent"
        );
        Ok(())
    }

    /// Sends `request` and blocks until its correlated reply arrives.
    ///
    /// A fresh correlation tag replaces any `@extra` the caller supplied.
    /// The reply is returned as-is, including `error` replies.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] when nothing arrives within `timeout`,
    /// [`ClientError::DispatcherStopped`] when the dispatch loop is gone, and
    /// transport or codec errors when the request cannot be sent.
    pub fn send_and_await(
        &self,
        mut request: Message,
        timeout: Duration,
    ) -> Result<Message, ClientError> {
        if !self.state.is_running() {
            return Err(ClientError::DispatcherStopped);
        }

        let (tag, receiver) = self.state.registry.register();
        if !self.state.is_running() {
            // The loop may have cleared the registry before this entry landed.
            self.state.registry.claim(&tag);
            return Err(ClientError::DispatcherStopped);
        }

        request.set_extra(tag.as_str());
        if let Err(error) = self.send(&request) {
            self.state.registry.claim(&tag);
            return Err(error);
        }

        match receiver.recv_timeout(timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Disconnected) => Err(ClientError::DispatcherStopped),
            Err(RecvTimeoutError::Timeout) => {
                if self.state.registry.claim(&tag).is_some() {
                    warn!(
                        target: CLIENT_TARGET,
                        tag = tag.as_str(),
                        kind = request.type_name().unwrap_or_default(),
                        timeout_ms = timeout.as_millis(),
                        "request timed out"
                    );
                    return Err(ClientError::Timeout { tag, timeout });
                }
                // The loop claimed the entry first, so its delivery wins.
                receiver.recv().map_err(|_| ClientError::DispatcherStopped)
            }
        }
    }

    /// [`Client::send_and_await`] with the configured request timeout.
    ///
    /// # Errors
    ///
    /// See [`Client::send_and_await`].
    pub fn request(&self, request: Message) -> Result<Message, ClientError> {
        self.send_and_await(request, self.options.request_timeout())
    }

    /// Runs `request` through the synchronous execute primitive.
    ///
    /// Correlation is bypassed. An absent result is an empty message.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be encoded, the transport
    /// fails or the result cannot be decoded.
    pub fn execute(&self, request: &Message) -> Result<Message, ClientError> {
        let payload = request.encode()?;
        match self.state.transport.execute(&payload)? {
            Some(bytes) => Ok(Message::decode(&bytes)?),
            None => Ok(Message::empty()),
        }
    }

    /// Handle on the event stream. Clones compete for events.
    #[must_use]
    pub fn events(&self) -> Events {
        self.events.clone()
    }

    /// Answers one authorization state using `credentials` for any prompt.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationDriver::advance`].
    pub fn advance_authorization<C>(
        &self,
        state: &str,
        credentials: &mut C,
    ) -> Result<AuthStep, AuthError>
    where
        C: CredentialSource + ?Sized,
    {
        AuthorizationDriver::new(self, credentials).advance(state)
    }

    /// Session options rendered during authorization.
    #[must_use]
    pub const fn session(&self) -> &SessionOptions {
        &self.session
    }

    /// Engine tuning values.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Number of requests awaiting a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.state.registry.len()
    }

    /// Whether the dispatch loop is still polling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Stops the dispatch loop and releases the transport.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.dispatcher.take() else {
            return;
        };
        self.state.request_stop();
        if handle.join().is_err() {
            error!(target: CLIENT_TARGET, "dispatch thread panicked");
        }
        debug!(target: CLIENT_TARGET, "client closed");
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("running", &self.is_running())
            .field("pending_requests", &self.pending_requests())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn options_default_to_engine_defaults() {
        let options = ClientOptions::default();

        assert_eq!(options.receive_timeout(), Duration::from_secs(1));
        assert_eq!(options.request_timeout(), Duration::from_secs(10));
        assert_eq!(options.event_capacity(), 100);
    }

    #[rstest]
    fn options_follow_runtime_config() {
        let config = Config {
            request_timeout_ms: 2_500,
            receive_timeout_ms: 50,
            event_capacity: 8,
            ..Config::default()
        };

        let options = ClientOptions::from_config(&config);

        assert_eq!(options.request_timeout(), Duration::from_millis(2_500));
        assert_eq!(options.receive_timeout(), Duration::from_millis(50));
        assert_eq!(options.event_capacity(), 8);
    }

    #[rstest]
    fn zero_capacity_is_raised_to_one() {
        let options = ClientOptions::default().with_event_capacity(0);

        assert_eq!(options.event_capacity(), 1);
    }
}
