//! ---
//! dmi_section: "05-networking-external-interfaces"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Network adapters for the remote command service."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::time::Duration;

use async_trait::async_trait;
use dmi_common::ServiceConfig;
use dmi_msg::{DeviceMethodService, InvocationParameters, RemoteInvocationError};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use url::Url;

/// Path, relative to the controller endpoint, accepting invocation requests.
pub const INVOKE_PATH: &str = "api/DirectMethodInvoke";

/// Errors raised while building the adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpServiceError {
    /// The endpoint could not be combined with the invoke path.
    #[error("invalid controller endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    /// Only plain and TLS HTTP endpoints are supported.
    #[error("unsupported endpoint scheme `{0}`")]
    UnsupportedScheme(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Remote command service posting invocation parameters to a controller.
///
/// The body is the camelCase parameter document. Connect and response
/// timeouts travel in that body for the controller to honour; the only
/// deadline enforced here is the client-wide request timeout.
#[derive(Debug, Clone)]
pub struct HttpMethodService {
    client: Client,
    invoke_url: Url,
}

impl HttpMethodService {
    /// Build an adapter targeting `endpoint`.
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, HttpServiceError> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(HttpServiceError::UnsupportedScheme(other.to_owned())),
        }
        let invoke_url = as_directory(endpoint).join(INVOKE_PATH)?;
        let client = Client::builder().timeout(request_timeout).build()?;
        debug!(url = %invoke_url, "http method service configured");
        Ok(Self { client, invoke_url })
    }

    /// Build an adapter from the `service` configuration section.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, HttpServiceError> {
        Self::new(config.endpoint.clone(), config.request_timeout)
    }

    /// Fully resolved URL requests are posted to.
    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }
}

#[async_trait]
impl DeviceMethodService for HttpMethodService {
    async fn invoke(
        &self,
        params: &InvocationParameters,
    ) -> Result<JsonValue, RemoteInvocationError> {
        let response = self
            .client
            .post(self.invoke_url.clone())
            .json(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body = parse_body(&text);
        if status.is_success() {
            debug!(device = %params.device_id, status = status.as_u16(), "controller accepted invocation");
            Ok(body)
        } else {
            warn!(device = %params.device_id, status = status.as_u16(), "controller rejected invocation");
            Err(RemoteInvocationError::new(json!({
                "status": status.as_u16(),
                "body": body,
            })))
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Ensure relative joins append to the endpoint path instead of replacing its
/// last segment.
fn as_directory(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

fn parse_body(text: &str) -> JsonValue {
    if text.trim().is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_owned()))
}

fn transport_error(err: reqwest::Error) -> RemoteInvocationError {
    warn!(error = %err, "controller request failed");
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "transport"
    };
    RemoteInvocationError::new(json!({
        "kind": kind,
        "message": err.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_path_is_appended_to_endpoint_path() {
        let service = HttpMethodService::new(
            Url::parse("http://controller.local:8081/iot").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            service.invoke_url().as_str(),
            "http://controller.local:8081/iot/api/DirectMethodInvoke"
        );

        let root = HttpMethodService::new(
            Url::parse("https://controller.local/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            root.invoke_url().as_str(),
            "https://controller.local/api/DirectMethodInvoke"
        );
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        let err = HttpMethodService::new(
            Url::parse("ftp://controller.local/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, HttpServiceError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }

    #[test]
    fn bodies_fall_back_to_strings_and_null() {
        assert_eq!(parse_body(""), JsonValue::Null);
        assert_eq!(parse_body("  \n"), JsonValue::Null);
        assert_eq!(parse_body(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(parse_body("device offline"), json!("device offline"));
    }
}
