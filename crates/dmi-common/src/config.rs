//! ---
//! dmi_section: "04-configuration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Configuration loading and tracing initialisation."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::{debug, warn};
use url::Url;

use crate::logging::{LogFormat, LogWriter};

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_response_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Controller endpoint used when the `service` section omits one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8081/";

static DEFAULT_ENDPOINT_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_ENDPOINT).expect("valid default controller endpoint"));

fn default_endpoint() -> Url {
    DEFAULT_ENDPOINT_URL.clone()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_queue_capacity() -> usize {
    64
}

fn default_max_in_flight() -> usize {
    16
}

fn default_notification_retention() -> usize {
    256
}

fn default_event_capacity() -> usize {
    64
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub invocation: InvocationConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults were used.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "DMI_CONFIG";

    /// Load configuration from disk, respecting the `DMI_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let loaded = Self::load_with_source(candidates)?;
        Ok(loaded.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Resolution order: `DMI_CONFIG`, then the first existing candidate.
    /// Fails when neither yields a file.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Some(loaded) = Self::resolve(candidates)? {
            return Ok(loaded);
        }
        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Like [`AppConfig::load_with_source`] but an explicit path wins and a
    /// missing file falls back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(
        explicit: Option<&Path>,
        candidates: &[P],
    ) -> Result<LoadedAppConfig> {
        if let Some(path) = explicit {
            let config = Self::from_path(path)?;
            return Ok(LoadedAppConfig {
                config,
                source: Some(path.to_path_buf()),
            });
        }
        match Self::resolve(candidates)? {
            Some(loaded) => Ok(loaded),
            None => {
                debug!("no configuration file found; using defaults");
                Ok(LoadedAppConfig {
                    config: AppConfig::default(),
                    source: None,
                })
            }
        }
    }

    fn resolve<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<LoadedAppConfig>> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path),
                }));
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                }));
            }
        }
        Ok(None)
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.invocation.validate()?;
        self.service.validate()?;
        self.runtime.validate()?;

        let round_trip = self.invocation.connect_timeout + self.invocation.response_timeout;
        if self.service.request_timeout <= round_trip {
            warn!(
                request_timeout_secs = self.service.request_timeout.as_secs(),
                device_budget_secs = round_trip.as_secs(),
                "service request timeout does not exceed the device timeouts; responses may be cut short"
            );
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Defaults applied to invocations built by the CLI.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationConfig {
    /// Hub connection string used when the caller does not pass one.
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    #[serde(default = "default_response_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub response_timeout: Duration,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            connect_timeout: default_connect_timeout(),
            response_timeout: default_response_timeout(),
        }
    }
}

impl InvocationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(anyhow!("invocation.connect_timeout must be positive"));
        }
        if self.response_timeout.is_zero() {
            return Err(anyhow!("invocation.response_timeout must be positive"));
        }
        Ok(())
    }
}

/// Location of the controller forwarding invocations to devices.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
    /// Timeout of the HTTP exchange with the controller itself.
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        match self.endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "service.endpoint must use http or https, got '{}'",
                    other
                ))
            }
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("service.request_timeout must be positive"));
        }
        Ok(())
    }
}

/// Sizing of the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Triggers buffered while `max_in_flight` invocations are running.
    /// Once full, `submit` waits and `try_submit` fails.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Invocations allowed to run at the same time.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Notifications kept by the in-memory sink.
    #[serde(default = "default_notification_retention")]
    pub notification_retention: usize,
    /// Actions buffered per lagging event bus subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_in_flight: default_max_in_flight(),
            notification_retention: default_notification_retention(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(anyhow!("runtime.queue_capacity must be at least 1"));
        }
        if self.max_in_flight == 0 {
            return Err(anyhow!("runtime.max_in_flight must be at least 1"));
        }
        if self.event_capacity == 0 {
            return Err(anyhow!("runtime.event_capacity must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log file. No file is written when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub writer: LogWriter,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: default_log_format(),
            writer: LogWriter::default(),
            file_prefix: None,
        }
    }
}
