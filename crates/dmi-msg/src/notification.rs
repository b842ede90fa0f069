//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::CorrelationId;

/// Arguments substituted into a notification template by the sink.
pub type TemplateArguments = BTreeMap<String, JsonValue>;

/// Fixed vocabulary of templates raised by the orchestration core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKey {
    /// Method invocation started without payload.
    Invoking,
    /// Method invocation started with a payload.
    InvokingWithPayload,
    /// Method invocation succeeded.
    Success,
    /// Method invocation failed.
    Error,
}

impl TemplateKey {
    /// Key as understood by the localization layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::Invoking => "invoking",
            TemplateKey::InvokingWithPayload => "invoking-with-payload",
            TemplateKey::Success => "success",
            TemplateKey::Error => "error",
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// Progress information.
    Info,
    /// Positive terminal outcome.
    Success,
    /// Not raised by the core; available to sinks.
    Warning,
    /// Negative terminal outcome.
    Error,
}

impl NotificationType {
    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Info => "info",
            NotificationType::Success => "success",
            NotificationType::Warning => "warning",
            NotificationType::Error => "error",
        }
    }
}

/// Template reference plus the arguments to render it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationText {
    /// Template to render.
    pub translation_key: TemplateKey,
    /// Values substituted into the template.
    #[serde(default)]
    pub translation_options: TemplateArguments,
}

impl NotificationText {
    /// Text with no arguments yet.
    pub fn new(translation_key: TemplateKey) -> Self {
        Self {
            translation_key,
            translation_options: TemplateArguments::new(),
        }
    }

    /// Add one argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.translation_options.insert(name.into(), value.into());
        self
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&JsonValue> {
        self.translation_options.get(name)
    }
}

/// A human readable progress message correlated to one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Correlation id of the owning invocation.
    pub id: CorrelationId,
    /// Template and arguments.
    pub text: NotificationText,
    /// Severity.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
}

impl Notification {
    /// Construct a notification.
    pub fn new(id: CorrelationId, text: NotificationText, notification_type: NotificationType) -> Self {
        Self {
            id,
            text,
            notification_type,
        }
    }

    /// Template key shortcut.
    pub fn template(&self) -> TemplateKey {
        self.text.translation_key
    }
}
