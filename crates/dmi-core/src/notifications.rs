//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Builders for the notifications raised over an invocation's lifecycle.

use dmi_msg::{
    CorrelationId, InvocationParameters, Notification, NotificationText, NotificationType,
    RemoteInvocationError, TemplateKey,
};
use serde_json::Value as JsonValue;

/// Argument carrying the target device id.
pub const ARG_DEVICE_ID: &str = "deviceId";
/// Argument carrying the method name.
pub const ARG_METHOD_NAME: &str = "methodName";
/// Argument carrying the serialized payload.
pub const ARG_PAYLOAD: &str = "payload";
/// Argument carrying the device response.
pub const ARG_RESPONSE: &str = "response";
/// Argument carrying the raw remote error.
pub const ARG_ERROR: &str = "error";

/// Info notification announcing the invocation.
///
/// The payload, when present, is rendered as compact JSON text for display,
/// keeping the caller's key order.
pub fn invoking(id: CorrelationId, params: &InvocationParameters) -> Notification {
    let text = match &params.payload {
        Some(payload) => NotificationText::new(TemplateKey::InvokingWithPayload)
            .with_argument(ARG_DEVICE_ID, params.device_id.as_str())
            .with_argument(ARG_METHOD_NAME, params.method_name.as_str())
            .with_argument(ARG_PAYLOAD, payload.to_string()),
        None => NotificationText::new(TemplateKey::Invoking)
            .with_argument(ARG_DEVICE_ID, params.device_id.as_str())
            .with_argument(ARG_METHOD_NAME, params.method_name.as_str()),
    };
    Notification::new(id, text, NotificationType::Info)
}

/// Success notification carrying the device response.
pub fn succeeded(
    id: CorrelationId,
    params: &InvocationParameters,
    response: &JsonValue,
) -> Notification {
    let text = NotificationText::new(TemplateKey::Success)
        .with_argument(ARG_DEVICE_ID, params.device_id.as_str())
        .with_argument(ARG_METHOD_NAME, params.method_name.as_str())
        .with_argument(ARG_RESPONSE, response.clone());
    Notification::new(id, text, NotificationType::Success)
}

/// Error notification carrying the raw remote error.
pub fn failed(
    id: CorrelationId,
    params: &InvocationParameters,
    error: &RemoteInvocationError,
) -> Notification {
    let text = NotificationText::new(TemplateKey::Error)
        .with_argument(ARG_DEVICE_ID, params.device_id.as_str())
        .with_argument(ARG_ERROR, error.detail().clone());
    Notification::new(id, text, NotificationType::Error)
}
