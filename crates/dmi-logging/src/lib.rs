//! ---
//! dmi_section: "03-logging"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Structured logging context and macros."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Target device identifier.
    pub device: Option<&'a str>,
    /// Method being invoked.
    pub method: Option<&'a str>,
    /// Correlation id of the invocation.
    pub correlation: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device identifier.
    pub fn with_device(mut self, device: &'a str) -> Self {
        self.device = Some(device);
        self
    }

    /// Attach a method name.
    pub fn with_method(mut self, method: &'a str) -> Self {
        self.method = Some(method);
        self
    }

    /// Attach a correlation id.
    pub fn with_correlation(mut self, correlation: u64) -> Self {
        self.correlation = Some(correlation);
        self
    }
}

/// Terminal outcome of an invocation for lifecycle logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcomeKind {
    /// The device answered.
    Completed,
    /// The remote call raised.
    Failed,
}

impl InvocationOutcomeKind {
    fn as_str(&self) -> &'static str {
        match self {
            InvocationOutcomeKind::Completed => "completed",
            InvocationOutcomeKind::Failed => "failed",
        }
    }
}

/// Emit a standardized lifecycle event for the end of an invocation.
pub fn log_invocation_outcome(context: &LogContext, outcome: InvocationOutcomeKind, detail: &str) {
    let device = context.device.unwrap_or("");
    let method = context.method.unwrap_or("");
    let correlation = context.correlation.unwrap_or_default();
    match outcome {
        InvocationOutcomeKind::Completed => tracing::event!(
            Level::INFO,
            event = "invocation.terminal",
            outcome = outcome.as_str(),
            device,
            method,
            correlation,
            detail = %detail
        ),
        InvocationOutcomeKind::Failed => tracing::event!(
            Level::WARN,
            event = "invocation.terminal",
            outcome = outcome.as_str(),
            device,
            method,
            correlation,
            detail = %detail
        ),
    }
}
