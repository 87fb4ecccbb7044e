//! Configuration loading, telemetry and client start-up.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{info, warn};

use tdrelay::{
    Client, ClientError, ClientOptions, NativeLogSettings, Transport, configure_native_logging,
};
use tdrelay_config::Config;

use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = "tdrelay_cli::bootstrap";

/// Abstracts configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when the configuration cannot be resolved.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader(Config);

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self(config)
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.0.clone())
    }
}

/// Errors surfaced while starting up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Resolved configuration with telemetry in place.
#[derive(Debug)]
pub struct Bootstrapped {
    config: Config,
    telemetry: TelemetryHandle,
}

impl Bootstrapped {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Configures native logging and starts a client over `transport`.
    ///
    /// Native logging is best effort: a rejected setting is logged and the
    /// client starts regardless.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the client cannot start.
    pub fn start_client<T: Transport>(&self, transport: T) -> Result<Client<T>, ClientError> {
        let settings = NativeLogSettings::from_config(&self.config);
        if let Err(error) = configure_native_logging(&transport, settings) {
            warn!(target: BOOTSTRAP_TARGET, %error, "native logging left unconfigured");
        }

        let client = Client::new(
            transport,
            self.config.session_options(),
            ClientOptions::from_config(&self.config),
        )?;
        info!(
            target: BOOTSTRAP_TARGET,
            api_id = self.config.api_id,
            test_dc = self.config.use_test_dc,
            "client started"
        );
        Ok(client)
    }
}

/// Loads configuration through `loader` and initialises telemetry.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the stage that failed.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Bootstrapped, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    info!(
        target: BOOTSTRAP_TARGET,
        log_filter = config.log_filter(),
        log_format = %config.log_format(),
        "configuration loaded"
    );
    Ok(Bootstrapped { config, telemetry })
}
