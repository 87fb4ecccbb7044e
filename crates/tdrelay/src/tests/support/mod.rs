//! Shared fixtures and helpers for engine tests.

mod credentials;
mod world;

use std::time::{Duration, Instant};

use tdrelay_config::SessionOptions;

use crate::client::{Client, ClientOptions};
use crate::events::{EventPoll, Events};
use crate::message::Message;
use crate::testing::ScriptedTransport;

pub use credentials::ScriptedCredentials;
pub use world::{AuthWorld, EngineWorld};

/// Upper bound for anything the tests wait on.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// How long a quiet stream is watched before it is declared empty.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Options with a short poll so shutdown is quick.
#[must_use]
pub fn fast_options() -> ClientOptions {
    ClientOptions::default()
        .with_receive_timeout(Duration::from_millis(10))
        .with_request_timeout(PATIENCE)
}

/// Starts a client over a clone of `transport`.
#[must_use]
pub fn start_client(
    transport: &ScriptedTransport,
    session: SessionOptions,
    options: ClientOptions,
) -> Client<ScriptedTransport> {
    Client::new(transport.clone(), session, options).expect("dispatch thread should start")
}

/// Collects the next `count` events or panics after [`PATIENCE`].
#[must_use]
pub fn collect_events(events: &Events, count: usize) -> Vec<Message> {
    (0..count)
        .map(|index| match events.recv_timeout(PATIENCE) {
            EventPoll::Event(event) => event,
            other => panic!("expected event {index}, got {other:?}"),
        })
        .collect()
}

/// Polls `condition` until it holds or [`PATIENCE`] runs out.
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + PATIENCE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
