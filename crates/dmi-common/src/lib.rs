//! ---
//! dmi_section: "04-configuration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Configuration loading and tracing initialisation."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Shared primitives for the DMI workspace: configuration loading and the
//! tracing subscriber used by the binaries.

pub mod config;
pub mod logging;

pub use config::{AppConfig, InvocationConfig, LoggingConfig, RuntimeConfig, ServiceConfig};
pub use logging::{init_tracing, LogFormat, LogWriter};
