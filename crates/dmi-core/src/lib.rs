//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Orchestration of one remote method invocation from trigger to terminal
//! outcome.
//!
//! [`InvokeMethodSaga`] and [`NotifyMethodInvoked`] are pure steppers: they
//! never perform side effects, they yield [`Effect`] descriptions and wait to
//! be resumed. [`SagaDriver`] fulfils those effects against the collaborators
//! and [`InvocationRuntime`] runs one driver task per trigger.
#![warn(missing_docs)]

pub mod correlation;
pub mod driver;
pub mod notifications;
pub mod runtime;
pub mod saga;

pub use correlation::{CorrelationIdSource, FixedIdSource, RandomIdSource, SequentialIdSource};
pub use driver::SagaDriver;
pub use runtime::{InvocationRuntime, RuntimeError, RuntimeHandle, RuntimeSummary};
pub use saga::{
    Effect, InvocationOutcome, InvokeMethodSaga, NotifyMethodInvoked, Resume, SagaError, Step,
};
