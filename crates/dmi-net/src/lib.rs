//! ---
//! dmi_section: "05-networking-external-interfaces"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Network adapters for the remote command service."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Transport adapters implementing [`dmi_msg::DeviceMethodService`].
#![warn(missing_docs)]

pub mod http;

pub use http::{HttpMethodService, HttpServiceError, INVOKE_PATH};
