//! Interactive login loop and event forwarding.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use tdrelay::{AuthError, AuthStep, Client, CredentialSource, Events, Transport, authorization_state};

const LOGIN_TARGET: &str = "tdrelay_cli::login";

/// Failures of the login loop.
#[derive(Debug, Error)]
pub enum LoginError {
    /// A handshake step failed.
    #[error(transparent)]
    Authorization(#[from] AuthError),

    /// The event stream ended before the session was authorised.
    #[error("event stream closed before authorization completed")]
    StreamClosed,
}

/// Answers authorization states from the event stream until the session is
/// ready.
///
/// Events unrelated to authorization are logged and dropped. A rejected step
/// is logged; the library then repeats the state, which prompts again.
///
/// # Errors
///
/// Returns a [`LoginError`] when a step fails or the stream ends early.
pub fn login<T, C>(client: &Client<T>, credentials: &mut C) -> Result<(), LoginError>
where
    T: Transport,
    C: CredentialSource + ?Sized,
{
    for event in client.events().iter() {
        let Some(state) = authorization_state(&event) else {
            debug!(
                target: LOGIN_TARGET,
                kind = event.type_name().unwrap_or_default(),
                "ignoring event during login"
            );
            continue;
        };

        match client.advance_authorization(state, credentials)? {
            AuthStep::Ready => {
                info!(target: LOGIN_TARGET, "logged in");
                return Ok(());
            }
            AuthStep::Submitted(reply) => {
                if let Some((code, message)) = reply.error_details() {
                    warn!(target: LOGIN_TARGET, state, code, message, "step rejected");
                }
            }
        }
    }
    Err(LoginError::StreamClosed)
}

/// Writes every event to `output` as one JSON document per line until the
/// stream ends. Returns the number of events written.
///
/// # Errors
///
/// Returns the I/O error raised while writing.
pub fn pump_events<W>(events: &Events, output: &mut W) -> io::Result<u64>
where
    W: Write + ?Sized,
{
    let mut written = 0_u64;
    for event in events.iter() {
        writeln!(output, "{event}")?;
        output.flush()?;
        written += 1;
    }
    debug!(target: LOGIN_TARGET, written, "event stream ended");
    Ok(written)
}
