//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::types::{InvocationParameters, RemoteInvocationError};

/// Remote command service reaching the device.
///
/// Transport, retries and timeout enforcement all live behind this trait.
#[async_trait]
pub trait DeviceMethodService: Send + Sync + 'static {
    /// Invoke the method described by `params` and return the device response.
    async fn invoke(
        &self,
        params: &InvocationParameters,
    ) -> Result<JsonValue, RemoteInvocationError>;

    /// Human-readable service name for logging.
    fn name(&self) -> &'static str;
}
