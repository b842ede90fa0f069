//! ---
//! dmi_section: "03-logging"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Structured logging context and macros."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Leveled macros stamping every event with the invocation context.

/// Internal: emit an event at `$level` with the context fields attached.
#[doc(hidden)]
#[macro_export]
macro_rules! __dmi_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            device = ctx.device.unwrap_or(""),
            method = ctx.method.unwrap_or(""),
            correlation = ctx.correlation.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with invocation context.
#[macro_export]
macro_rules! dmi_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with invocation context.
#[macro_export]
macro_rules! dmi_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with invocation context.
#[macro_export]
macro_rules! dmi_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with invocation context.
#[macro_export]
macro_rules! dmi_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dmi_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
