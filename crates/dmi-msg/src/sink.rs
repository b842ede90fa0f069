//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::notification::{Notification, NotificationType};
use crate::types::CorrelationId;

/// Receives notifications raised by the orchestration core.
///
/// Rendering and localization of the template are the sink's business.
pub trait NotificationSink: Send + Sync {
    /// Take ownership of a notification.
    fn add_notification(&self, notification: Notification);
    /// Human-readable sink name for logging.
    fn name(&self) -> &'static str;
}

/// Bounded in-memory sink that keeps the most recent notifications.
#[derive(Debug, Clone)]
pub struct InMemoryNotificationSink {
    retention: usize,
    entries: Arc<Mutex<VecDeque<Notification>>>,
}

impl InMemoryNotificationSink {
    /// Default number of notifications retained.
    pub const DEFAULT_RETENTION: usize = 256;

    /// Create a sink retaining at most `retention` notifications (minimum one).
    pub fn with_retention(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            entries: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Snapshot of retained notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Retained notifications belonging to one invocation.
    pub fn for_correlation(&self, id: CorrelationId) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|notification| notification.id == id)
            .cloned()
            .collect()
    }

    /// Remove and return every retained notification.
    pub fn drain(&self) -> Vec<Notification> {
        self.entries.lock().drain(..).collect()
    }
}

impl Default for InMemoryNotificationSink {
    fn default() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION)
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn add_notification(&self, notification: Notification) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.retention {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Sink that writes each notification to the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn add_notification(&self, notification: Notification) {
        let arguments = serde_json::to_string(&notification.text.translation_options)
            .unwrap_or_else(|err| format!("<unserializable: {err}>"));
        let id = notification.id.get();
        let template = notification.template().as_str();
        match notification.notification_type {
            NotificationType::Info | NotificationType::Success => {
                info!(id, template, %arguments, severity = notification.notification_type.as_str(), "notification");
            }
            NotificationType::Warning => warn!(id, template, %arguments, "notification"),
            NotificationType::Error => error!(id, template, %arguments, "notification"),
        }
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}
