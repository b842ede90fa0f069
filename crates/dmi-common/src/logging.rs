//! ---
//! dmi_section: "04-configuration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Configuration loading and tracing initialisation."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "DMI_LOG";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static CONSOLE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Available console log formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    StructuredJson,
    #[default]
    Pretty,
}

/// Console stream receiving log output.
///
/// The CLI logs to stderr so stdout stays reserved for its JSON lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogWriter {
    #[default]
    Stdout,
    Stderr,
}

impl LogWriter {
    fn non_blocking(self) -> (NonBlocking, WorkerGuard) {
        match self {
            LogWriter::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogWriter::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        }
    }
}

/// Initialize the tracing subscriber based on configuration and environment variables.
///
/// * `DMI_LOG` overrides the filter (e.g. `info`, `debug,dmi_core=trace`). When unset
///   the standard `RUST_LOG` variable is honoured, finally defaulting to `info`.
/// * A daily rolling JSON file is added when `config.directory` is set.
///
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); defaulting to info logging",
                LOG_ENV, err
            );
            EnvFilter::new("info")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let (console_writer, console_guard) = config.writer.non_blocking();
    let _ = CONSOLE_GUARD.set(console_guard);

    let console_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .with_writer(console_writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(console_writer)
            .boxed(),
    };

    let file_layer = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let prefix = config
                .file_prefix
                .clone()
                .unwrap_or_else(|| service_name.to_owned());
            let appender = daily(directory, format!("{}-{}.log", prefix, service_name));
            let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(file_guard);
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .json()
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok();

    info!(
        service = %service_name,
        log_dir = ?config.directory,
        format = ?config.format,
        "tracing initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_rolling_file_when_directory_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LoggingConfig {
            directory: Some(dir.path().join("logs")),
            writer: LogWriter::Stderr,
            ..LoggingConfig::default()
        };
        init_tracing("dmi-test", &config).expect("tracing init");
        assert!(dir.path().join("logs").is_dir());

        // A second initialisation is tolerated.
        init_tracing("dmi-test", &LoggingConfig::default()).expect("second init");
    }
}
