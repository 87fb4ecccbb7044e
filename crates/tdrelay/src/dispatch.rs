//! Background loop that polls the transport and routes every message.
//!
//! Routing rules, applied to each received payload in arrival order:
//!
//! 1. Undecodable payloads are logged and discarded; empty ones are ignored.
//! 2. A message carrying `@extra` is correlation traffic. The matching
//!    registry entry is claimed and the message delivered to its waiter. With
//!    no entry the reply is stale and is dropped, never promoted to an event.
//! 3. An untagged message with a `@type` is pushed onto the event stream.
//!    When the stream is full the loop blocks until a consumer makes room,
//!    so events are never dropped; correlated replies queue up behind it.
//! 4. Anything else is noise and is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{SendTimeoutError, Sender};
use tracing::{debug, error, trace, warn};

use crate::message::Message;
use crate::registry::PendingRegistry;
use crate::transport::Transport;

/// Log target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = "tdrelay::dispatch";

/// How often a blocked publish re-checks for shutdown.
const BACKPRESSURE_RECHECK: Duration = Duration::from_millis(100);

/// State shared between the client handle and its dispatch loop.
pub(crate) struct EngineState<T> {
    pub(crate) transport: T,
    pub(crate) registry: PendingRegistry,
    running: AtomicBool,
}

impl<T> EngineState<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            transport,
            registry: PendingRegistry::new(),
            running: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Where a received payload ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    /// Handed to the waiting caller.
    Delivered,
    /// Tagged, but no caller is waiting for it any more.
    Stale,
    /// Queued on the event stream.
    Event,
    /// Not decodable.
    Malformed,
    /// Neither tagged nor typed.
    Noise,
    /// Abandoned because shutdown was requested while blocked.
    Abandoned,
}

pub(crate) struct Dispatcher<T> {
    state: Arc<EngineState<T>>,
    events: Sender<Message>,
    receive_timeout: Duration,
}

impl<T: Transport> Dispatcher<T> {
    pub(crate) const fn new(
        state: Arc<EngineState<T>>,
        events: Sender<Message>,
        receive_timeout: Duration,
    ) -> Self {
        Self {
            state,
            events,
            receive_timeout,
        }
    }

    /// Polls until shutdown is requested or the transport fails.
    pub(crate) fn run(self) {
        debug!(
            target: DISPATCH_TARGET,
            receive_timeout_ms = self.receive_timeout.as_millis(),
            "dispatch loop started"
        );

        while self.state.is_running() {
            match self.state.transport.receive(self.receive_timeout) {
                Ok(Some(payload)) => {
                    let route = self.route(&payload);
                    trace!(target: DISPATCH_TARGET, ?route, "payload routed");
                }
                Ok(None) => {}
                Err(error) => {
                    error!(
                        target: DISPATCH_TARGET,
                        %error,
                        "transport receive failed; stopping dispatch loop"
                    );
                    break;
                }
            }
        }

        self.state.request_stop();
        let abandoned = self.state.registry.len();
        self.state.registry.clear();
        debug!(
            target: DISPATCH_TARGET,
            abandoned_requests = abandoned,
            "dispatch loop stopped"
        );
    }

    pub(crate) fn route(&self, payload: &[u8]) -> Route {
        let message = match Message::decode(payload) {
            Ok(message) => message,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "discarding undecodable payload");
                return Route::Malformed;
            }
        };

        if let Some(tag) = message.extra().map(str::to_owned) {
            return self.deliver(&tag, message);
        }
        if message.type_name().is_some() {
            return self.publish(message);
        }

        trace!(target: DISPATCH_TARGET, "discarding untyped message");
        Route::Noise
    }

    fn deliver(&self, tag: &str, message: Message) -> Route {
        let Some(sender) = self.state.registry.claim(tag) else {
            debug!(
                target: DISPATCH_TARGET,
                tag,
                kind = message.type_name().unwrap_or_default(),
                "dropping reply for unknown or expired request"
            );
            return Route::Stale;
        };

        if sender.try_send(message).is_err() {
            debug!(target: DISPATCH_TARGET, tag, "waiter left before delivery");
        }
        // Dropping the sender closes the single-use channel.
        drop(sender);
        Route::Delivered
    }

    fn publish(&self, message: Message) -> Route {
        let mut pending = message;
        let mut reported_full = false;
        loop {
            match self.events.send_timeout(pending, BACKPRESSURE_RECHECK) {
                Ok(()) => return Route::Event,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if !self.state.is_running() {
                        return Route::Abandoned;
                    }
                    if !reported_full {
                        warn!(
                            target: DISPATCH_TARGET,
                            capacity = self.events.capacity().unwrap_or_default(),
                            "event stream full; dispatch blocked until a consumer catches up"
                        );
                        reported_full = true;
                    }
                    pending = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    debug!(target: DISPATCH_TARGET, "no event consumers remain");
                    return Route::Abandoned;
                }
            }
        }
    }
}
