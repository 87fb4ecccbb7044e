//! Process-wide configuration of the native library's internal log.
//!
//! The native log is global to the process, so its settings are applied at
//! most once. [`NativeLogConfigurator`] holds that init-once state; the
//! process-wide instance is reached through [`configure_native_logging`].
//! Settings are applied with the synchronous execute primitive, which the
//! library allows before any client has been authorised.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::{CodecError, TransportError};
use crate::message::Message;
use crate::transport::Transport;

const NATIVE_LOG_TARGET: &str = "tdrelay::native_log";

/// Size at which the native library rotates its log file.
pub const DEFAULT_MAX_LOG_FILE_SIZE: i64 = 10 * 1024 * 1024;

static PROCESS_NATIVE_LOG: NativeLogConfigurator = NativeLogConfigurator::new();

/// Errors raised while applying native log settings.
#[derive(Debug, Error)]
pub enum NativeLogError {
    /// A settings request could not be encoded or its reply decoded.
    #[error("failed to encode native log request: {0}")]
    Codec(#[from] CodecError),

    /// The transport refused the request.
    #[error("failed to apply native log settings: {0}")]
    Transport(#[from] TransportError),

    /// The library answered with an `error` object.
    #[error("native library rejected {request}: {message} (code {code})")]
    Rejected {
        /// Request that was rejected.
        request: &'static str,
        /// Error code reported by the library.
        code: i64,
        /// Error text reported by the library.
        message: String,
    },
}

/// Where and how verbosely the native library logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLogSettings {
    file_path: Option<PathBuf>,
    max_file_size: i64,
    verbosity: i32,
}

impl Default for NativeLogSettings {
    fn default() -> Self {
        Self {
            file_path: None,
            max_file_size: DEFAULT_MAX_LOG_FILE_SIZE,
            verbosity: tdrelay_config::DEFAULT_NATIVE_LOG_VERBOSITY,
        }
    }
}

impl NativeLogSettings {
    /// Builds settings that log to the default stream at `verbosity`.
    #[must_use]
    pub fn new(verbosity: i32) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    /// Builds settings from the runtime configuration.
    #[must_use]
    pub fn from_config(config: &tdrelay_config::Config) -> Self {
        Self {
            file_path: config.native_log_file().map(Path::to_path_buf),
            ..Self::new(config.native_log_verbosity())
        }
    }

    /// Redirects the log to a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Overrides the rotation size of the log file.
    #[must_use]
    pub const fn with_max_file_size(mut self, bytes: i64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Log file, or `None` for the library's default stream.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Rotation size of the log file in bytes.
    #[must_use]
    pub const fn max_file_size(&self) -> i64 {
        self.max_file_size
    }

    /// Verbosity level handed to the library.
    #[must_use]
    pub const fn verbosity(&self) -> i32 {
        self.verbosity
    }

    fn stream_request(&self) -> Message {
        let stream = match &self.file_path {
            Some(path) => json!({
                "@type": "logStreamFile",
                "path": path.to_string_lossy(),
                "max_file_size": self.max_file_size,
                "redirect_stderr": false,
            }),
            None => json!({ "@type": "logStreamDefault" }),
        };
        Message::new("setLogStream").with("log_stream", stream)
    }

    fn verbosity_request(&self) -> Message {
        Message::new("setLogVerbosityLevel").with("new_verbosity_level", self.verbosity)
    }
}

/// Init-once holder for native log settings.
#[derive(Debug)]
pub struct NativeLogConfigurator {
    applied: OnceCell<NativeLogSettings>,
}

impl Default for NativeLogConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeLogConfigurator {
    /// Creates a configurator that has not applied anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            applied: OnceCell::new(),
        }
    }

    /// Applies `settings` unless settings were already applied.
    ///
    /// Returns the settings in force, which differ from `settings` when an
    /// earlier call won. A failed attempt leaves the configurator unset so a
    /// later call may retry.
    ///
    /// # Errors
    ///
    /// Returns a [`NativeLogError`] when a request cannot be executed or the
    /// library rejects it.
    pub fn configure<T>(
        &self,
        transport: &T,
        settings: NativeLogSettings,
    ) -> Result<&NativeLogSettings, NativeLogError>
    where
        T: Transport + ?Sized,
    {
        if let Some(existing) = self.applied.get() {
            debug!(
                target: NATIVE_LOG_TARGET,
                verbosity = existing.verbosity,
                "native logging already configured"
            );
            return Ok(existing);
        }

        self.applied.get_or_try_init(|| {
            apply(transport, "setLogStream", &settings.stream_request())?;
            apply(transport, "setLogVerbosityLevel", &settings.verbosity_request())?;
            info!(
                target: NATIVE_LOG_TARGET,
                verbosity = settings.verbosity,
                file = settings.file_path.as_ref().map(|path| path.display().to_string()),
                "native logging configured"
            );
            Ok(settings)
        })
    }

    /// Settings in force, if any were applied.
    #[must_use]
    pub fn settings(&self) -> Option<&NativeLogSettings> {
        self.applied.get()
    }
}

/// Applies `settings` through the process-wide configurator.
///
/// # Errors
///
/// See [`NativeLogConfigurator::configure`].
pub fn configure_native_logging<T>(
    transport: &T,
    settings: NativeLogSettings,
) -> Result<&'static NativeLogSettings, NativeLogError>
where
    T: Transport + ?Sized,
{
    PROCESS_NATIVE_LOG.configure(transport, settings)
}

fn apply<T>(transport: &T, request: &'static str, message: &Message) -> Result<(), NativeLogError>
where
    T: Transport + ?Sized,
{
    let reply = match transport.execute(&message.encode()?)? {
        Some(bytes) => Message::decode(&bytes)?,
        None => Message::empty(),
    };
    if let Some((code, text)) = reply.error_details() {
        return Err(NativeLogError::Rejected {
            request,
            code,
            message: text.to_owned(),
        });
    }
    Ok(())
}
