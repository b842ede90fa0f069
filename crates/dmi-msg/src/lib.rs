//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Data model shared by the orchestration core and its collaborators.
//!
//! The core never talks to a transport, a UI or a localization table
//! directly. It hands [`Notification`]s to a [`NotificationSink`], terminal
//! [`InvokeMethodAction`]s to an [`EventBus`] and parameters to a
//! [`DeviceMethodService`].
#![warn(missing_docs)]

pub mod bus;
pub mod notification;
pub mod service;
pub mod sink;
pub mod types;

pub use bus::{BroadcastEventBus, EventBus, InMemoryEventBus};
pub use notification::{
    Notification, NotificationText, NotificationType, TemplateArguments, TemplateKey,
};
pub use service::DeviceMethodService;
pub use sink::{InMemoryNotificationSink, NotificationSink, TracingNotificationSink};
pub use types::{
    CompletionEvent, CorrelationId, FailureEvent, InvocationParameters, InvokeMethodAction,
    RemoteInvocationError,
};
