//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Suspend-and-resume steppers for one invocation.
//!
//! A stepper is advanced with [`Resume`] values. Each call returns either the
//! next [`Effect`] it wants fulfilled or [`Step::Complete`]. The first call
//! is always `Resume::Next`.

use std::sync::Arc;

use dmi_msg::{
    CompletionEvent, CorrelationId, FailureEvent, InvocationParameters, InvokeMethodAction,
    Notification, RemoteInvocationError,
};
use serde_json::Value as JsonValue;

use crate::correlation::CorrelationIdSource;
use crate::notifications;

/// A side effect requested by a saga.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run [`NotifyMethodInvoked`] to completion, then resume with `Next`.
    Announce {
        /// Correlation id of the invocation.
        id: CorrelationId,
        /// Parameters being announced.
        params: InvocationParameters,
    },
    /// Invoke the remote method; resume with `Returned` or `Threw`.
    InvokeMethod(InvocationParameters),
    /// Hand a notification to the sink, then resume with `Next`.
    Notify(Notification),
    /// Publish an action on the event bus, then resume with `Next`.
    Publish(InvokeMethodAction),
}

impl Effect {
    /// Static effect name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Announce { .. } => "announce",
            Effect::InvokeMethod(_) => "invoke_method",
            Effect::Notify(_) => "notify",
            Effect::Publish(_) => "publish",
        }
    }

    /// The notification of a `Notify` effect.
    ///
    /// Sub-sagas fulfilled inline may only ask for notifications; any other
    /// effect is [`SagaError::UnsupportedEffect`].
    pub fn into_notification(self) -> Result<Notification, SagaError> {
        match self {
            Effect::Notify(notification) => Ok(notification),
            other => Err(SagaError::UnsupportedEffect {
                effect: other.name(),
            }),
        }
    }
}

/// Value a saga is resumed with.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// Start, or continue after an effect without a result.
    Next,
    /// The remote method produced a response.
    Returned(JsonValue),
    /// The remote method raised.
    Threw(RemoteInvocationError),
}

impl Resume {
    fn name(&self) -> &'static str {
        match self {
            Resume::Next => "next",
            Resume::Returned(_) => "returned",
            Resume::Threw(_) => "threw",
        }
    }
}

/// Result of advancing a saga.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The saga is suspended on this effect.
    Yield(Effect),
    /// The saga finished; it must not be resumed again.
    Complete,
}

/// Misuse of the stepper protocol by whoever drives the saga.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SagaError {
    /// The input does not fit the effect the saga is suspended on.
    #[error("saga suspended in `{state}` cannot be resumed with `{input}`")]
    UnexpectedResume {
        /// State the saga was in.
        state: &'static str,
        /// Input it was given.
        input: &'static str,
    },
    /// The saga already returned [`Step::Complete`].
    #[error("saga already completed")]
    AlreadyComplete,
    /// The driver cannot fulfil this effect in the current context.
    #[error("effect `{effect}` is not supported here")]
    UnsupportedEffect {
        /// Name of the rejected effect.
        effect: &'static str,
    },
    /// The saga was finished before it returned [`Step::Complete`].
    #[error("saga has not reached a terminal outcome")]
    Incomplete,
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    /// The device answered with this response.
    Completed(JsonValue),
    /// The remote call raised this error.
    Failed(RemoteInvocationError),
}

impl InvocationOutcome {
    /// Whether the invocation completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, InvocationOutcome::Completed(_))
    }
}

enum AnnounceState {
    Pending {
        id: CorrelationId,
        params: InvocationParameters,
    },
    Raised,
    Done,
}

/// Raises the "started" notification for an invocation.
pub struct NotifyMethodInvoked {
    state: AnnounceState,
}

impl NotifyMethodInvoked {
    /// Prepare the announcement for `id`.
    pub fn new(id: CorrelationId, params: InvocationParameters) -> Self {
        Self {
            state: AnnounceState::Pending { id, params },
        }
    }

    /// Advance the stepper.
    pub fn resume(&mut self, input: Resume) -> Result<Step, SagaError> {
        let state = std::mem::replace(&mut self.state, AnnounceState::Done);
        match (state, input) {
            (AnnounceState::Pending { id, params }, Resume::Next) => {
                self.state = AnnounceState::Raised;
                Ok(Step::Yield(Effect::Notify(notifications::invoking(
                    id, &params,
                ))))
            }
            (AnnounceState::Raised, Resume::Next) => Ok(Step::Complete),
            (AnnounceState::Done, _) => Err(SagaError::AlreadyComplete),
            (state, input) => {
                let name = match &state {
                    AnnounceState::Pending { .. } => "pending",
                    AnnounceState::Raised => "raised",
                    AnnounceState::Done => "done",
                };
                self.state = state;
                Err(SagaError::UnexpectedResume {
                    state: name,
                    input: input.name(),
                })
            }
        }
    }
}

enum SagaState {
    Start(InvocationParameters),
    Announcing {
        id: CorrelationId,
        params: InvocationParameters,
    },
    Invoking {
        id: CorrelationId,
        params: InvocationParameters,
    },
    Settling(InvokeMethodAction),
    Publishing,
    Done,
}

impl SagaState {
    fn name(&self) -> &'static str {
        match self {
            SagaState::Start(_) => "start",
            SagaState::Announcing { .. } => "announcing",
            SagaState::Invoking { .. } => "invoking",
            SagaState::Settling(_) => "settling",
            SagaState::Publishing => "publishing",
            SagaState::Done => "done",
        }
    }
}

/// Drives one remote method invocation from trigger to terminal event.
///
/// Effects are yielded in this order: `Announce`, `InvokeMethod`, one
/// terminal `Notify` (success or error), one terminal `Publish` (`Done` or
/// `Failed`). Remote errors never escape; they select the failure branch.
pub struct InvokeMethodSaga {
    ids: Arc<dyn CorrelationIdSource>,
    id: Option<CorrelationId>,
    state: SagaState,
    outcome: Option<InvocationOutcome>,
}

impl InvokeMethodSaga {
    /// Prepare a saga for the `Started` trigger carrying `params`.
    pub fn new(params: InvocationParameters, ids: Arc<dyn CorrelationIdSource>) -> Self {
        Self {
            ids,
            id: None,
            state: SagaState::Start(params),
            outcome: None,
        }
    }

    /// Correlation id, once drawn by the first step.
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.id
    }

    /// Terminal outcome, once the terminal event has been yielded.
    pub fn outcome(&self) -> Option<&InvocationOutcome> {
        self.outcome.as_ref()
    }

    /// Consume the saga, returning its terminal outcome if it reached one.
    pub fn into_outcome(self) -> Option<InvocationOutcome> {
        self.outcome
    }

    /// Whether [`Step::Complete`] has been returned.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SagaState::Done)
    }

    /// Consume a completed saga, returning its terminal outcome.
    pub fn finish(self) -> Result<InvocationOutcome, SagaError> {
        if !self.is_complete() {
            return Err(SagaError::Incomplete);
        }
        self.outcome.ok_or(SagaError::Incomplete)
    }

    /// Advance the saga.
    pub fn resume(&mut self, input: Resume) -> Result<Step, SagaError> {
        let state = std::mem::replace(&mut self.state, SagaState::Done);
        match (state, input) {
            (SagaState::Start(params), Resume::Next) => {
                let id = self.ids.next_id();
                self.id = Some(id);
                self.state = SagaState::Announcing {
                    id,
                    params: params.clone(),
                };
                Ok(Step::Yield(Effect::Announce { id, params }))
            }
            (SagaState::Announcing { id, params }, Resume::Next) => {
                self.state = SagaState::Invoking {
                    id,
                    params: params.clone(),
                };
                Ok(Step::Yield(Effect::InvokeMethod(params)))
            }
            (SagaState::Invoking { id, params }, Resume::Returned(response)) => {
                let notification = notifications::succeeded(id, &params, &response);
                self.state = SagaState::Settling(InvokeMethodAction::Done(CompletionEvent {
                    params,
                    result: response,
                }));
                Ok(Step::Yield(Effect::Notify(notification)))
            }
            (SagaState::Invoking { id, params }, Resume::Threw(error)) => {
                let notification = notifications::failed(id, &params, &error);
                self.state =
                    SagaState::Settling(InvokeMethodAction::Failed(FailureEvent { params, error }));
                Ok(Step::Yield(Effect::Notify(notification)))
            }
            (SagaState::Settling(action), Resume::Next) => {
                self.outcome = match &action {
                    InvokeMethodAction::Done(event) => {
                        Some(InvocationOutcome::Completed(event.result.clone()))
                    }
                    InvokeMethodAction::Failed(event) => {
                        Some(InvocationOutcome::Failed(event.error.clone()))
                    }
                    InvokeMethodAction::Started(_) => None,
                };
                self.state = SagaState::Publishing;
                Ok(Step::Yield(Effect::Publish(action)))
            }
            (SagaState::Publishing, Resume::Next) => Ok(Step::Complete),
            (SagaState::Done, _) => Err(SagaError::AlreadyComplete),
            (state, input) => {
                let name = state.name();
                self.state = state;
                Err(SagaError::UnexpectedResume {
                    state: name,
                    input: input.name(),
                })
            }
        }
    }
}
