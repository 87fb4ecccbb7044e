//! Shared configuration for the tdrelay crates.
//!
//! Two layers live here. [`SessionOptions`] is the immutable value object the
//! client hands to the native library while authorising. [`Config`] is the
//! runtime configuration the binaries load through `ortho_config`, layering
//! defaults, a configuration file, `TDRELAY_*` environment variables and
//! command-line flags in that order of precedence. It carries logging and
//! engine tuning values alongside every session option.

mod defaults;
mod logging;
mod session;

use std::path::Path;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_APPLICATION_VERSION, DEFAULT_DEVICE_MODEL, DEFAULT_EVENT_CAPACITY, DEFAULT_LOG_FILTER,
    DEFAULT_NATIVE_LOG_VERBOSITY, DEFAULT_RECEIVE_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_SYSTEM_LANGUAGE_CODE, DEFAULT_SYSTEM_VERSION, default_application_version,
    default_device_model, default_event_capacity, default_log_filter, default_log_filter_string,
    default_log_format, default_native_log_verbosity, default_receive_timeout_ms,
    default_request_timeout_ms, default_system_language_code, default_system_version,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use session::{SessionOptions, TDLIB_PARAMETERS_TYPE, TdlibParameters};

/// Runtime configuration resolved from defaults, files, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TDRELAY")]
pub struct Config {
    /// `tracing` filter expression for the binaries.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for the binaries' logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Verbosity of the native library's internal log.
    #[serde(default = "default_native_log_verbosity")]
    pub native_log_verbosity: i32,
    /// File receiving the native library's internal log; stderr when unset.
    #[serde(default)]
    pub native_log_file: Option<String>,
    /// Default wait for correlated replies, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Duration of a single receive poll, in milliseconds.
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// Unsolicited events buffered before the dispatch loop blocks.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Use the test data centres.
    #[serde(default)]
    pub use_test_dc: bool,
    /// Persistent database directory.
    #[serde(default)]
    pub database_directory: Option<String>,
    /// Stored files directory.
    #[serde(default)]
    pub files_directory: Option<String>,
    /// Persist file metadata.
    #[serde(default)]
    pub use_file_database: bool,
    /// Cache chat metadata.
    #[serde(default)]
    pub use_chat_info_database: bool,
    /// Cache chats and messages.
    #[serde(default)]
    pub use_message_database: bool,
    /// Enable secret chats.
    #[serde(default)]
    pub use_secret_chats: bool,
    /// Application identifier.
    #[serde(default)]
    pub api_id: i32,
    /// Application identifier hash.
    #[serde(default)]
    pub api_hash: String,
    /// IETF language tag of the system language.
    #[serde(default = "default_system_language_code")]
    pub system_language_code: String,
    /// Device model.
    #[serde(default = "default_device_model")]
    pub device_model: String,
    /// Operating system version.
    #[serde(default = "default_system_version")]
    pub system_version: String,
    /// Application version.
    #[serde(default = "default_application_version")]
    pub application_version: String,
    /// Delete old files automatically.
    #[serde(default)]
    pub enable_storage_optimizer: bool,
    /// Ignore original file names.
    #[serde(default)]
    pub ignore_file_names: bool,
    /// Phone number submitted during authorisation.
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            native_log_verbosity: default_native_log_verbosity(),
            native_log_file: None,
            request_timeout_ms: default_request_timeout_ms(),
            receive_timeout_ms: default_receive_timeout_ms(),
            event_capacity: default_event_capacity(),
            use_test_dc: false,
            database_directory: None,
            files_directory: None,
            use_file_database: false,
            use_chat_info_database: false,
            use_message_database: false,
            use_secret_chats: false,
            api_id: 0,
            api_hash: String::new(),
            system_language_code: default_system_language_code(),
            device_model: default_device_model(),
            system_version: default_system_version(),
            application_version: default_application_version(),
            enable_storage_optimizer: false,
            ignore_file_names: false,
            phone_number: None,
        }
    }
}

impl Config {
    /// Filter expression handed to the log subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for the binaries' logs.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Verbosity of the native library's internal log.
    #[must_use]
    pub const fn native_log_verbosity(&self) -> i32 {
        self.native_log_verbosity
    }

    /// Destination file for the native library's internal log.
    #[must_use]
    pub fn native_log_file(&self) -> Option<&Path> {
        self.native_log_file.as_deref().map(Path::new)
    }

    /// Default wait for correlated replies.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Duration of a single receive poll.
    #[must_use]
    pub const fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Capacity of the unsolicited event stream.
    #[must_use]
    pub const fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Builds the immutable session options described by this configuration.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        let mut options = SessionOptions::default()
            .with_api_id(self.api_id)
            .with_api_hash(self.api_hash.as_str());

        // Blank identity strings keep the session defaults.
        if let Some(code) = non_blank(Some(self.system_language_code.as_str())) {
            options = options.with_system_language_code(code);
        }
        if let Some(model) = non_blank(Some(self.device_model.as_str())) {
            options = options.with_device_model(model);
        }
        if let Some(version) = non_blank(Some(self.system_version.as_str())) {
            options = options.with_system_version(version);
        }
        if let Some(version) = non_blank(Some(self.application_version.as_str())) {
            options = options.with_application_version(version);
        }
        if let Some(directory) = non_blank(self.database_directory.as_deref()) {
            options = options.with_database_directory(directory);
        }
        if let Some(directory) = non_blank(self.files_directory.as_deref()) {
            options = options.with_files_directory(directory);
        }
        if let Some(phone) = non_blank(self.phone_number.as_deref()) {
            options = options.with_phone_number(phone);
        }

        let flags: [(bool, fn(SessionOptions) -> SessionOptions); 7] = [
            (self.use_test_dc, SessionOptions::with_test_dc),
            (self.use_file_database, SessionOptions::with_file_database),
            (self.use_chat_info_database, SessionOptions::with_chat_info_database),
            (self.use_message_database, SessionOptions::with_message_database),
            (self.use_secret_chats, SessionOptions::with_secret_chats),
            (self.enable_storage_optimizer, SessionOptions::with_storage_optimizer),
            (self.ignore_file_names, SessionOptions::with_ignore_file_names),
        ];
        flags
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .fold(options, |current, (_, apply)| apply(current))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(|text| text.trim()).filter(|text| !text.is_empty())
}
