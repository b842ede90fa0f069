//! ---
//! dmi_section: "05-networking-external-interfaces"
//! dmi_subsection: "binary"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Control CLI invoking device methods."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use dmi_common::{AppConfig, InvocationConfig};
use dmi_core::{InvocationRuntime, SagaDriver};
use dmi_msg::{
    BroadcastEventBus, InMemoryNotificationSink, InvocationParameters, InvokeMethodAction,
};
use dmi_net::HttpMethodService;
use serde_json::{json, Value as JsonValue};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Exit code reported when the operator interrupts a pending invocation.
const INTERRUPTED: u8 = 130;

/// Options for a single invocation.
#[derive(Debug, Args)]
pub struct InvokeArgs {
    /// Target device identifier.
    #[arg(long)]
    pub device: String,
    /// Method to invoke on the device.
    #[arg(long)]
    pub method: String,
    /// JSON payload forwarded to the method.
    #[arg(long, value_name = "JSON", value_parser = parse_payload)]
    pub payload: Option<JsonValue>,
    /// Hub connection string; falls back to the configured default.
    #[arg(long, env = "DMI_CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: Option<String>,
    /// Seconds allowed for the device to connect.
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
    /// Seconds allowed for the device to answer.
    #[arg(long, value_name = "SECS")]
    pub response_timeout: Option<u64>,
}

fn parse_payload(raw: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(raw)
}

fn build_params(args: &InvokeArgs, defaults: &InvocationConfig) -> Result<InvocationParameters> {
    let connection_string = args
        .connection_string
        .clone()
        .or_else(|| defaults.connection_string.clone())
        .ok_or_else(|| {
            anyhow!("no connection string given; pass --connection-string or set invocation.connection_string")
        })?;
    let mut params = InvocationParameters::new(connection_string, &args.device, &args.method)
        .with_timeouts(
            args.connect_timeout
                .unwrap_or(defaults.connect_timeout.as_secs()),
            args.response_timeout
                .unwrap_or(defaults.response_timeout.as_secs()),
        );
    if let Some(payload) = &args.payload {
        params = params.with_payload(payload.clone());
    }
    Ok(params)
}

/// Run one invocation through the runtime and print its lifecycle.
pub async fn run(args: InvokeArgs, config: &AppConfig) -> Result<ExitCode> {
    let params = build_params(&args, &config.invocation)?;
    let service = HttpMethodService::from_config(&config.service)
        .context("failed to configure controller client")?;
    info!(endpoint = %service.invoke_url(), device = %params.device_id, method = %params.method_name, "invoking device method");

    let sink = Arc::new(InMemoryNotificationSink::with_retention(
        config.runtime.notification_retention,
    ));
    let bus = Arc::new(BroadcastEventBus::new(config.runtime.event_capacity));
    let mut events = bus.subscribe();
    let driver = SagaDriver::new(Arc::new(service), sink.clone(), bus);
    let runtime = InvocationRuntime::from_config(driver, &config.runtime);

    runtime.submit(params).await?;
    let actions = tokio::select! {
        collected = collect_until_terminal(&mut events) => collected?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted before the invocation finished");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };
    let summary = runtime.shutdown().await?;

    for notification in sink.drain() {
        println!("{}", json!({ "notification": notification }));
    }
    for action in &actions {
        println!("{}", json!({ "event": action }));
    }

    if summary.completed > 0 && summary.failed == 0 && summary.aborted == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn collect_until_terminal(
    events: &mut broadcast::Receiver<InvokeMethodAction>,
) -> Result<Vec<InvokeMethodAction>> {
    let mut actions = Vec::new();
    loop {
        match events.recv().await {
            Ok(action) => {
                let terminal = action.is_terminal();
                actions.push(action);
                if terminal {
                    return Ok(actions);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagged");
            }
            Err(RecvError::Closed) => {
                return Err(anyhow!("event bus closed before a terminal event"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn args() -> InvokeArgs {
        InvokeArgs {
            device: "device-1".into(),
            method: "reboot".into(),
            payload: None,
            connection_string: None,
            connect_timeout: None,
            response_timeout: None,
        }
    }

    #[test]
    fn configured_defaults_fill_missing_arguments() {
        let defaults = InvocationConfig {
            connection_string: Some("HostName=hub".into()),
            connect_timeout: Duration::from_secs(3),
            response_timeout: Duration::from_secs(7),
        };
        let params = build_params(&args(), &defaults).unwrap();
        assert_eq!(params.connection_string, "HostName=hub");
        assert_eq!(params.connect_timeout_in_seconds, 3);
        assert_eq!(params.response_timeout_in_seconds, 7);
        assert!(!params.has_payload());
    }

    #[test]
    fn arguments_override_configured_defaults() {
        let mut args = args();
        args.connection_string = Some("HostName=other".into());
        args.connect_timeout = Some(30);
        args.payload = Some(parse_payload(r#"{"delay":5}"#).unwrap());
        let params = build_params(&args, &InvocationConfig::default()).unwrap();
        assert_eq!(params.connection_string, "HostName=other");
        assert_eq!(params.connect_timeout_in_seconds, 30);
        assert_eq!(params.response_timeout_in_seconds, 10);
        assert_eq!(params.payload, Some(json!({"delay": 5})));
    }

    #[test]
    fn missing_connection_string_is_an_error() {
        let err = build_params(&args(), &InvocationConfig::default()).unwrap_err();
        assert!(err.to_string().contains("connection string"));
    }

    #[test]
    fn payload_argument_keeps_key_order() {
        let payload = parse_payload(r#"{"zeta":1,"alpha":2}"#).unwrap();
        assert_eq!(payload.to_string(), r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(parse_payload("{not json").is_err());
    }
}
