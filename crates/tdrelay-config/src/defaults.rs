//! Default values shared by the configuration layers and the binaries.

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// IETF language tag reported when none is configured.
pub const DEFAULT_SYSTEM_LANGUAGE_CODE: &str = "en";

/// Device model reported when none is configured.
pub const DEFAULT_DEVICE_MODEL: &str = "Unknown";

/// Operating system version reported when none is configured.
pub const DEFAULT_SYSTEM_VERSION: &str = "Unknown";

/// Application version reported when none is configured.
pub const DEFAULT_APPLICATION_VERSION: &str = "1.0";

/// Verbosity applied to the native library's internal log.
///
/// The library itself defaults to 5, which floods stderr with transport
/// chatter; 1 keeps errors and warnings only.
pub const DEFAULT_NATIVE_LOG_VERBOSITY: i32 = 1;

/// How long `request` waits for a correlated reply, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// How long a single receive poll blocks, in milliseconds.
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 1_000;

/// Number of unsolicited events buffered before the dispatch loop blocks.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned default for the system language code.
#[must_use]
pub fn default_system_language_code() -> String {
    DEFAULT_SYSTEM_LANGUAGE_CODE.to_owned()
}

/// Owned default for the device model.
#[must_use]
pub fn default_device_model() -> String {
    DEFAULT_DEVICE_MODEL.to_owned()
}

/// Owned default for the system version.
#[must_use]
pub fn default_system_version() -> String {
    DEFAULT_SYSTEM_VERSION.to_owned()
}

/// Owned default for the application version.
#[must_use]
pub fn default_application_version() -> String {
    DEFAULT_APPLICATION_VERSION.to_owned()
}

/// Default native log verbosity.
#[must_use]
pub const fn default_native_log_verbosity() -> i32 {
    DEFAULT_NATIVE_LOG_VERBOSITY
}

/// Default request timeout in milliseconds.
#[must_use]
pub const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default receive poll timeout in milliseconds.
#[must_use]
pub const fn default_receive_timeout_ms() -> u64 {
    DEFAULT_RECEIVE_TIMEOUT_MS
}

/// Default event stream capacity.
#[must_use]
pub const fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}
