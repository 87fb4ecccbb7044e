//! Log output for the login command.
//!
//! The login command owns stdout for its event stream and shares the
//! terminal with credential prompts, so every log line is written to stderr.
//! Colour is enabled only when stderr is a terminal, and timestamps are
//! RFC 3339 in UTC so JSON logs from several hosts sort together.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use tdrelay_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Proof that a subscriber is installed for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format of the subscriber that is actually installed.
    ///
    /// This is the format requested by the first successful call to
    /// [`initialise`]; later calls do not change it.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing log output.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already in place.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the process-wide subscriber described by `config`.
///
/// Only the first successful call installs anything. Later calls return a
/// handle describing the subscriber already in force, so behaviour suites may
/// bootstrap once per scenario.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the filter is invalid or a subscriber
/// was installed outside this function.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = INSTALLED_FORMAT.get_or_try_init(|| {
        let subscriber = build_subscriber(config)?;
        tracing::subscriber::set_global_default(subscriber)
            .map_err(TelemetryError::Subscriber)?;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format: *format })
}

fn build_subscriber(config: &Config) -> Result<BoxedSubscriber, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    })
}
