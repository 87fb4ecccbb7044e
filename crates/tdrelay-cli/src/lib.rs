//! Command-line front end for the tdrelay client.
//!
//! The `tdrelay-login` binary loads the runtime configuration, installs
//! structured telemetry, starts a client over the native library and walks
//! the user through the login handshake. Once authorised it forwards every
//! further event to stdout as JSON lines, leaving stderr for prompts and logs.
//!
//! [`run`] wires these stages together over injectable collaborators so the
//! whole flow can be exercised against the scripted transport.
#![deny(missing_docs)]

mod bootstrap;
mod login;
mod telemetry;

#[cfg(test)]
mod tests;

use std::io::{self, Write};

use thiserror::Error;

use tdrelay::{ClientError, CredentialSource, Transport, TransportError};

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use login::{LoginError, login, pump_events};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

/// Errors reported by the login command.
#[derive(Debug, Error)]
pub enum AppError {
    /// Start-up failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The native client could not be created.
    #[error("failed to create native client: {0}")]
    Transport(#[from] TransportError),

    /// The engine could not start.
    #[error("failed to start client: {0}")]
    Client(#[from] ClientError),

    /// Login did not complete.
    #[error("login failed: {0}")]
    Login(#[from] LoginError),

    /// Events could not be written out.
    #[error("failed to write events: {0}")]
    Output(#[from] io::Error),
}

/// Writes the one-line failure report shown to the user.
///
/// # Errors
///
/// Returns the I/O error raised while writing.
pub fn report_failure<W>(error: &AppError, sink: &mut W) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(sink, "tdrelay-login: {error}")?;
    sink.flush()
}

/// Runs the login command end to end.
///
/// `create_transport` is called after configuration and telemetry are in
/// place. Returns once the event stream ends.
///
/// # Errors
///
/// Returns an [`AppError`] naming the stage that failed.
pub fn run<T, F, C, W>(
    loader: &dyn ConfigLoader,
    create_transport: F,
    credentials: &mut C,
    output: &mut W,
) -> Result<(), AppError>
where
    T: Transport,
    F: FnOnce() -> Result<T, TransportError>,
    C: CredentialSource + ?Sized,
    W: Write + ?Sized,
{
    let bootstrapped = bootstrap_with(loader)?;
    let client = bootstrapped.start_client(create_transport()?)?;
    login(&client, credentials)?;
    pump_events(&client.events(), output)?;
    client.close();
    Ok(())
}
