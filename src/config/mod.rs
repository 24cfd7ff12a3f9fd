use crate::error::{RegistrarError, RegistrarResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CSI_REGISTRAR";

/// Runtime tunables. The command line covers what the operator usually sets;
/// these cover timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often the driver object is re-asserted.
    pub registration_interval_secs: u64,
    /// Deadline for each startup call to the plugin.
    pub csi_timeout_ms: u64,
    pub retry: RetryConfig,
}

/// Backoff for the optimistic-concurrency retry around a single create or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registration_interval_secs: 120,
            csi_timeout_ms: 1000,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { initial_delay_ms: 10, multiplier: 2.0, max_delay_ms: 1000, max_attempts: 5 }
    }
}

impl Settings {
    /// Layers defaults, an optional file and `CSI_REGISTRAR_*` environment
    /// variables (nested keys use `__`, e.g. `CSI_REGISTRAR_RETRY__MAX_ATTEMPTS`).
    pub fn load(file: Option<&Path>) -> RegistrarResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| RegistrarError::Settings(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> RegistrarResult<()> {
        if self.registration_interval_secs == 0 {
            return Err(RegistrarError::Settings(
                "registration_interval_secs must be positive".to_string(),
            ));
        }
        if self.csi_timeout_ms == 0 {
            return Err(RegistrarError::Settings("csi_timeout_ms must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(RegistrarError::Settings("retry.max_attempts must be positive".to_string()));
        }
        if self.retry.multiplier < 1.0 {
            return Err(RegistrarError::Settings("retry.multiplier must be >= 1.0".to_string()));
        }
        Ok(())
    }

    pub fn registration_interval(&self) -> Duration {
        Duration::from_secs(self.registration_interval_secs)
    }

    pub fn csi_timeout(&self) -> Duration {
        Duration::from_millis(self.csi_timeout_ms)
    }
}
