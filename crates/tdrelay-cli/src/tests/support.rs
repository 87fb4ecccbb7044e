//! Scripted library behaviours for login scenarios.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;
use tdrelay::testing::ScriptedTransport;
use tdrelay::{ConsoleCredentials, Message, TransportError, UPDATE_AUTHORIZATION_STATE};
use tdrelay_config::Config;

use crate::{AppError, StaticConfigLoader, run};

const PATIENCE: Duration = Duration::from_secs(5);

/// Builds an `updateAuthorizationState` event for `state`.
pub fn state_event(state: &str) -> Message {
    Message::new(UPDATE_AUTHORIZATION_STATE).with("authorization_state", json!({ "@type": state }))
}

fn ok() -> Message {
    Message::new("ok")
}

/// Shared state for login scenarios.
pub struct LoginWorld {
    pub transport: ScriptedTransport,
    pub input: String,
    pub prompts: Vec<u8>,
    pub output: Vec<u8>,
    pub outcome: Option<Result<(), AppError>>,
    ready: Option<Arc<AtomicBool>>,
}

impl Default for LoginWorld {
    fn default() -> Self {
        Self {
            transport: ScriptedTransport::new(),
            input: String::new(),
            prompts: Vec::new(),
            output: Vec::new(),
            outcome: None,
            ready: None,
        }
    }
}

impl LoginWorld {
    /// Scripts a library that accepts every answer. `rejected_codes` code
    /// attempts are refused before one is accepted.
    pub fn script_login(&mut self, rejected_codes: usize) {
        let library = self.transport.clone();
        let ready = Arc::new(AtomicBool::new(false));
        let signal = Arc::clone(&ready);
        let attempts = AtomicUsize::new(0);

        self.transport.set_responder(move |request| {
            match request.type_name() {
                Some("setTdlibParameters") => {
                    library.push(&state_event("authorizationStateWaitPhoneNumber"));
                }
                Some("setAuthenticationPhoneNumber") => {
                    library.push(&state_event("authorizationStateWaitCode"));
                }
                Some("checkAuthenticationCode") => {
                    if attempts.fetch_add(1, Ordering::SeqCst) < rejected_codes {
                        library.push(&state_event("authorizationStateWaitCode"));
                        return Some(
                            Message::new("error")
                                .with("code", 400)
                                .with("message", "PHONE_CODE_INVALID"),
                        );
                    }
                    // Queue the reply before the follow-up events so the
                    // connection is only closed once everything is queued.
                    library.reply_to(request, ok());
                    library.push(&state_event("authorizationStateReady"));
                    library.push(&Message::new("updateNewMessage").with("message", json!({ "id": 1 })));
                    signal.store(true, Ordering::SeqCst);
                    return None;
                }
                _ => {}
            }
            Some(ok())
        });

        self.transport
            .push(&state_event("authorizationStateWaitTdlibParameters"));
        self.transport
            .push(&Message::new("updateOption").with("name", "version"));
        self.ready = Some(ready);
    }

    /// Runs the login command, closing the connection once the scripted
    /// library has reported readiness and drained its queue.
    pub fn run(&mut self) {
        let config = Config {
            api_id: 1,
            api_hash: String::from("0123456789abcdef"),
            receive_timeout_ms: 10,
            request_timeout_ms: 5_000,
            ..Config::default()
        };
        let loader = StaticConfigLoader::new(config);
        let transport = self.transport.clone();
        let ready = self.ready.clone();
        let mut credentials =
            ConsoleCredentials::new(Cursor::new(self.input.clone()), &mut self.prompts);
        let output = &mut self.output;

        let outcome = thread::scope(|scope| {
            if let Some(ready) = ready {
                let library = transport.clone();
                scope.spawn(move || {
                    let deadline = Instant::now() + PATIENCE;
                    while Instant::now() < deadline {
                        if ready.load(Ordering::SeqCst) && library.queued() == 0 {
                            library.fail_receive(TransportError::Closed);
                            return;
                        }
                        thread::sleep(Duration::from_millis(5));
                    }
                });
            }
            run(&loader, || Ok(transport), &mut credentials, output)
        });
        self.outcome = Some(outcome);
    }

    /// Outcome of the last run.
    pub fn outcome(&self) -> &Result<(), AppError> {
        self.outcome.as_ref().expect("the login command should have run")
    }

    /// Forwarded events, one per output line.
    pub fn forwarded(&self) -> Vec<Message> {
        String::from_utf8_lossy(&self.output)
            .lines()
            .map(|line| line.parse().expect("each line is a JSON message"))
            .collect()
    }
}
