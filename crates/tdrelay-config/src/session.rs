//! Session options answered during the `WaitTdlibParameters` handshake step.
//!
//! [`SessionOptions`] is assembled once, before the client starts, and is
//! rendered into a single `tdlibParameters` object on demand. The database
//! flags form a chain: the message database implies the chat-info database,
//! which in turn implies the file database. The chain is enforced when the
//! parameters are rendered, so options loaded from configuration files obey
//! it as well as options built in code.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::defaults::{
    DEFAULT_APPLICATION_VERSION, DEFAULT_DEVICE_MODEL, DEFAULT_SYSTEM_LANGUAGE_CODE,
    DEFAULT_SYSTEM_VERSION,
};

/// Discriminator of the rendered parameters object.
pub const TDLIB_PARAMETERS_TYPE: &str = "tdlibParameters";

/// Immutable description of how the native session should be initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    use_test_dc: bool,
    database_directory: Option<PathBuf>,
    files_directory: Option<PathBuf>,
    use_file_database: bool,
    use_chat_info_database: bool,
    use_message_database: bool,
    use_secret_chats: bool,
    api_id: i32,
    api_hash: String,
    system_language_code: String,
    device_model: String,
    system_version: String,
    application_version: String,
    enable_storage_optimizer: bool,
    ignore_file_names: bool,
    phone_number: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            use_test_dc: false,
            database_directory: None,
            files_directory: None,
            use_file_database: false,
            use_chat_info_database: false,
            use_message_database: false,
            use_secret_chats: false,
            api_id: 0,
            api_hash: String::new(),
            system_language_code: DEFAULT_SYSTEM_LANGUAGE_CODE.to_owned(),
            device_model: DEFAULT_DEVICE_MODEL.to_owned(),
            system_version: DEFAULT_SYSTEM_VERSION.to_owned(),
            application_version: DEFAULT_APPLICATION_VERSION.to_owned(),
            enable_storage_optimizer: false,
            ignore_file_names: false,
            phone_number: None,
        }
    }
}

impl SessionOptions {
    /// Uses the test data centres instead of production.
    #[must_use]
    pub const fn with_test_dc(mut self) -> Self {
        self.use_test_dc = true;
        self
    }

    /// Directory for the persistent database; the working directory when unset.
    #[must_use]
    pub fn with_database_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_directory = Some(path.into());
        self
    }

    /// Directory for stored files; the database directory when unset.
    #[must_use]
    pub fn with_files_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.files_directory = Some(path.into());
        self
    }

    /// Persists information about downloaded and uploaded files.
    #[must_use]
    pub const fn with_file_database(mut self) -> Self {
        self.use_file_database = true;
        self
    }

    /// Caches users, groups and secret chats. Implies the file database.
    #[must_use]
    pub const fn with_chat_info_database(mut self) -> Self {
        self.use_chat_info_database = true;
        self
    }

    /// Caches chats and messages. Implies the chat-info database.
    #[must_use]
    pub const fn with_message_database(mut self) -> Self {
        self.use_message_database = true;
        self
    }

    /// Enables secret chat support.
    #[must_use]
    pub const fn with_secret_chats(mut self) -> Self {
        self.use_secret_chats = true;
        self
    }

    /// Application identifier issued for API access.
    #[must_use]
    pub const fn with_api_id(mut self, api_id: i32) -> Self {
        self.api_id = api_id;
        self
    }

    /// Application identifier hash issued for API access.
    #[must_use]
    pub fn with_api_hash(mut self, api_hash: impl Into<String>) -> Self {
        self.api_hash = api_hash.into();
        self
    }

    /// IETF language tag of the user's operating system language.
    #[must_use]
    pub fn with_system_language_code(mut self, code: impl Into<String>) -> Self {
        self.system_language_code = code.into();
        self
    }

    /// Model of the device the application runs on.
    #[must_use]
    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = model.into();
        self
    }

    /// Version of the operating system the application runs on.
    #[must_use]
    pub fn with_system_version(mut self, version: impl Into<String>) -> Self {
        self.system_version = version.into();
        self
    }

    /// Version of the application.
    #[must_use]
    pub fn with_application_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = version.into();
        self
    }

    /// Lets the library delete old files automatically.
    #[must_use]
    pub const fn with_storage_optimizer(mut self) -> Self {
        self.enable_storage_optimizer = true;
        self
    }

    /// Ignores original file names when saving downloads.
    #[must_use]
    pub const fn with_ignore_file_names(mut self) -> Self {
        self.ignore_file_names = true;
        self
    }

    /// Phone number submitted when the handshake asks for one.
    #[must_use]
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Configured phone number, if any.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Configured database directory, if any.
    #[must_use]
    pub fn database_directory(&self) -> Option<&Path> {
        self.database_directory.as_deref()
    }

    /// Configured files directory, if any.
    #[must_use]
    pub fn files_directory(&self) -> Option<&Path> {
        self.files_directory.as_deref()
    }

    /// Renders the options as the `tdlibParameters` object.
    #[must_use]
    pub fn tdlib_parameters(&self) -> TdlibParameters {
        let use_message_database = self.use_message_database;
        let use_chat_info_database = self.use_chat_info_database || use_message_database;
        let use_file_database = self.use_file_database || use_chat_info_database;

        TdlibParameters {
            kind: TDLIB_PARAMETERS_TYPE,
            use_test_dc: self.use_test_dc,
            database_directory: path_text(self.database_directory.as_deref()),
            files_directory: path_text(self.files_directory.as_deref()),
            use_file_database,
            use_chat_info_database,
            use_message_database,
            use_secret_chats: self.use_secret_chats,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            system_language_code: self.system_language_code.clone(),
            device_model: self.device_model.clone(),
            system_version: self.system_version.clone(),
            application_version: self.application_version.clone(),
            enable_storage_optimizer: self.enable_storage_optimizer,
            ignore_file_names: self.ignore_file_names,
        }
    }
}

fn path_text(path: Option<&Path>) -> String {
    path.map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Wire form of the session options.
///
/// Empty directory strings ask the library to fall back to its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TdlibParameters {
    #[serde(rename = "@type")]
    kind: &'static str,
    /// Whether the test data centres are used.
    pub use_test_dc: bool,
    /// Persistent database directory.
    pub database_directory: String,
    /// Stored files directory.
    pub files_directory: String,
    /// Whether file metadata is persisted.
    pub use_file_database: bool,
    /// Whether chat metadata is cached.
    pub use_chat_info_database: bool,
    /// Whether chats and messages are cached.
    pub use_message_database: bool,
    /// Whether secret chats are supported.
    pub use_secret_chats: bool,
    /// Application identifier.
    pub api_id: i32,
    /// Application identifier hash.
    pub api_hash: String,
    /// IETF language tag of the system language.
    pub system_language_code: String,
    /// Device model.
    pub device_model: String,
    /// Operating system version.
    pub system_version: String,
    /// Application version.
    pub application_version: String,
    /// Whether old files are deleted automatically.
    pub enable_storage_optimizer: bool,
    /// Whether original file names are ignored.
    pub ignore_file_names: bool,
}

impl TdlibParameters {
    /// Value of the `@type` discriminator.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.kind
    }
}
