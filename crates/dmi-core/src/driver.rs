//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::sync::Arc;

use dmi_logging::{dmi_debug, dmi_warn, log_invocation_outcome, InvocationOutcomeKind, LogContext};
use dmi_msg::{
    CorrelationId, DeviceMethodService, EventBus, InvocationParameters, NotificationSink,
};

use crate::correlation::{CorrelationIdSource, RandomIdSource};
use crate::saga::{
    Effect, InvocationOutcome, InvokeMethodSaga, NotifyMethodInvoked, Resume, SagaError, Step,
};

/// Fulfils saga effects against the collaborators, one at a time.
///
/// Each effect is awaited to completion before the saga is resumed, so the
/// announcement always lands before the remote call and the terminal
/// notification always lands before the terminal event.
#[derive(Clone)]
pub struct SagaDriver {
    service: Arc<dyn DeviceMethodService>,
    sink: Arc<dyn NotificationSink>,
    bus: Arc<dyn EventBus>,
    ids: Arc<dyn CorrelationIdSource>,
}

impl std::fmt::Debug for SagaDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaDriver")
            .field("service", &self.service.name())
            .field("sink", &self.sink.name())
            .field("bus", &self.bus.name())
            .finish()
    }
}

impl SagaDriver {
    /// Driver drawing random correlation ids.
    pub fn new(
        service: Arc<dyn DeviceMethodService>,
        sink: Arc<dyn NotificationSink>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            service,
            sink,
            bus,
            ids: Arc::new(RandomIdSource),
        }
    }

    /// Replace the correlation id source.
    pub fn with_id_source(mut self, ids: Arc<dyn CorrelationIdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Bus receiving the lifecycle actions.
    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// Run one invocation to its terminal outcome.
    ///
    /// A remote failure is an `Ok(InvocationOutcome::Failed(..))`; `Err` only
    /// signals a stepper protocol violation.
    pub async fn run(&self, params: InvocationParameters) -> Result<InvocationOutcome, SagaError> {
        let device = params.device_id.clone();
        let method = params.method_name.clone();
        let mut saga = InvokeMethodSaga::new(params, self.ids.clone());

        let mut input = Resume::Next;
        loop {
            let effect = match saga.resume(input)? {
                Step::Yield(effect) => effect,
                Step::Complete => break,
            };
            let correlation = saga.correlation_id().map(CorrelationId::get).unwrap_or_default();
            let ctx = LogContext::new()
                .with_device(&device)
                .with_method(&method)
                .with_correlation(correlation);
            dmi_debug!(context = ctx, "fulfilling {} effect", effect.name());
            input = self.fulfil(effect, &ctx).await?;
        }

        let correlation = saga.correlation_id().map(CorrelationId::get).unwrap_or_default();
        let outcome = saga.finish()?;
        let ctx = LogContext::new()
            .with_device(&device)
            .with_method(&method)
            .with_correlation(correlation);
        match &outcome {
            InvocationOutcome::Completed(response) => {
                log_invocation_outcome(&ctx, InvocationOutcomeKind::Completed, &response.to_string())
            }
            InvocationOutcome::Failed(error) => log_invocation_outcome(
                &ctx,
                InvocationOutcomeKind::Failed,
                &error.detail().to_string(),
            ),
        }
        Ok(outcome)
    }

    async fn fulfil(&self, effect: Effect, ctx: &LogContext<'_>) -> Result<Resume, SagaError> {
        match effect {
            Effect::Announce { id, params } => {
                self.announce(id, params)?;
                Ok(Resume::Next)
            }
            Effect::InvokeMethod(params) => match self.service.invoke(&params).await {
                Ok(response) => Ok(Resume::Returned(response)),
                Err(error) => {
                    dmi_warn!(
                        context = ctx.clone(),
                        "{} raised: {}",
                        self.service.name(),
                        error
                    );
                    Ok(Resume::Threw(error))
                }
            },
            Effect::Notify(notification) => {
                self.sink.add_notification(notification);
                Ok(Resume::Next)
            }
            Effect::Publish(action) => {
                self.bus.publish(action);
                Ok(Resume::Next)
            }
        }
    }

    fn announce(&self, id: CorrelationId, params: InvocationParameters) -> Result<(), SagaError> {
        let mut announce = NotifyMethodInvoked::new(id, params);
        while let Step::Yield(effect) = announce.resume(Resume::Next)? {
            self.sink.add_notification(effect.into_notification()?);
        }
        Ok(())
    }
}
