//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Connect timeout applied when the caller does not supply one.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Response timeout applied when the caller does not supply one.
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 10;

/// Numeric token tying every notification of one invocation together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl CorrelationId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything needed to invoke a named method on a remote device.
///
/// Serialized with camelCase keys, which is also the body shape forwarded to
/// the remote command service. The timeouts are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationParameters {
    /// Transport address and credentials for the hub owning the device.
    pub connection_string: String,
    /// Target device identifier.
    pub device_id: String,
    /// Method to invoke on the device.
    pub method_name: String,
    /// Optional structured payload. `None` and `Some(Value::Null)` are distinct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
    /// Seconds allowed for the device to connect.
    pub connect_timeout_in_seconds: u64,
    /// Seconds allowed for the device to answer.
    pub response_timeout_in_seconds: u64,
}

impl InvocationParameters {
    /// Parameters without payload using the default timeouts.
    pub fn new(
        connection_string: impl Into<String>,
        device_id: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            device_id: device_id.into(),
            method_name: method_name.into(),
            payload: None,
            connect_timeout_in_seconds: DEFAULT_CONNECT_TIMEOUT_SECS,
            response_timeout_in_seconds: DEFAULT_RESPONSE_TIMEOUT_SECS,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Override both timeouts.
    pub fn with_timeouts(mut self, connect_secs: u64, response_secs: u64) -> Self {
        self.connect_timeout_in_seconds = connect_secs;
        self.response_timeout_in_seconds = response_secs;
        self
    }

    /// Whether a payload was supplied.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// Opaque failure raised by the remote command service.
///
/// Nothing is assumed about the detail beyond it being JSON; notifications
/// carry it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("remote invocation failed: {detail}")]
pub struct RemoteInvocationError {
    detail: JsonValue,
}

impl RemoteInvocationError {
    /// Wrap an arbitrary detail value.
    pub fn new(detail: impl Into<JsonValue>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Borrow the raw detail.
    pub fn detail(&self) -> &JsonValue {
        &self.detail
    }

    /// Consume the error, returning the raw detail.
    pub fn into_detail(self) -> JsonValue {
        self.detail
    }
}

/// Published exactly once when the remote call resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Parameters of the originating trigger.
    pub params: InvocationParameters,
    /// Response returned by the device.
    pub result: JsonValue,
}

/// Published exactly once when the remote call raises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    /// Parameters of the originating trigger.
    pub params: InvocationParameters,
    /// Error raised by the remote command service.
    pub error: RemoteInvocationError,
}

/// Lifecycle actions of one invocation as seen on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "data", rename_all = "snake_case")]
pub enum InvokeMethodAction {
    /// The caller asked for an invocation; this is the trigger.
    Started(InvocationParameters),
    /// The invocation completed.
    Done(CompletionEvent),
    /// The invocation failed.
    Failed(FailureEvent),
}

impl InvokeMethodAction {
    /// Parameters of the trigger this action belongs to.
    pub fn params(&self) -> &InvocationParameters {
        match self {
            InvokeMethodAction::Started(params) => params,
            InvokeMethodAction::Done(event) => &event.params,
            InvokeMethodAction::Failed(event) => &event.params,
        }
    }

    /// Whether this action ends an invocation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvokeMethodAction::Started(_))
    }

    /// Static phase name used in logs.
    pub fn phase(&self) -> &'static str {
        match self {
            InvokeMethodAction::Started(_) => "started",
            InvokeMethodAction::Done(_) => "done",
            InvokeMethodAction::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameters_serialize_with_camel_case_keys() {
        let params = InvocationParameters::new("conn", "device_id", "reboot")
            .with_payload(json!({"delay": 5}))
            .with_timeouts(3, 7);
        let value = serde_json::to_value(&params).expect("serialize");
        assert_eq!(
            value,
            json!({
                "connectionString": "conn",
                "deviceId": "device_id",
                "methodName": "reboot",
                "payload": {"delay": 5},
                "connectTimeoutInSeconds": 3,
                "responseTimeoutInSeconds": 7,
            })
        );
    }

    #[test]
    fn absent_payload_is_omitted_and_restored_as_none() {
        let params = InvocationParameters::new("conn", "device_id", "reboot");
        let text = serde_json::to_string(&params).expect("serialize");
        assert!(!text.contains("payload"));
        let back: InvocationParameters = serde_json::from_str(&text).expect("deserialize");
        assert!(!back.has_payload());
    }

    #[test]
    fn remote_error_renders_detail_verbatim() {
        let error = RemoteInvocationError::new(json!({"code": -1}));
        assert_eq!(error.to_string(), r#"remote invocation failed: {"code":-1}"#);
        assert_eq!(serde_json::to_value(&error).expect("serialize"), json!({"code": -1}));
    }

    #[test]
    fn actions_expose_their_trigger_parameters() {
        let params = InvocationParameters::new("conn", "device_id", "reboot");
        let done = InvokeMethodAction::Done(CompletionEvent {
            params: params.clone(),
            result: json!("ok"),
        });
        assert_eq!(done.params(), &params);
        assert!(done.is_terminal());
        assert!(!InvokeMethodAction::Started(params).is_terminal());
        assert_eq!(done.phase(), "done");
    }
}
