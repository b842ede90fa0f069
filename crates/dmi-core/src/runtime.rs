//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
//! Host runtime running one driver task per `Started` trigger.
//!
//! Invocations share nothing but the collaborators. At most `max_in_flight`
//! invocations run at once; further triggers wait in the bounded queue, and
//! a full queue makes submitters wait (`submit`) or fail (`try_submit`).
//! Shutdown stops intake, runs whatever was already queued and waits for
//! every invocation to reach its terminal event. Aborting the runtime instead (dropping the tokio
//! runtime) leaves suspended invocations without a terminal notification.

use std::sync::Arc;

use dmi_common::RuntimeConfig;
use dmi_msg::{EventBus, InvocationParameters, InvokeMethodAction};
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::driver::SagaDriver;
use crate::saga::{InvocationOutcome, SagaError};

/// Errors raised when handing triggers to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The runtime no longer accepts triggers.
    #[error("invocation runtime is shut down")]
    Closed,
    /// The trigger queue is at capacity.
    #[error("invocation queue is full")]
    QueueFull,
    /// The runtime loop itself panicked.
    #[error("invocation runtime task failed: {0}")]
    Join(String),
}

/// Tally of invocations handled by a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    /// Invocations that ended with a `Done` event.
    pub completed: u64,
    /// Invocations that ended with a `Failed` event.
    pub failed: u64,
    /// Invocations that never reached a terminal event.
    pub aborted: u64,
}

impl RuntimeSummary {
    fn record(&mut self, joined: Result<Result<InvocationOutcome, SagaError>, JoinError>) {
        match joined {
            Ok(Ok(InvocationOutcome::Completed(_))) => self.completed += 1,
            Ok(Ok(InvocationOutcome::Failed(_))) => self.failed += 1,
            Ok(Err(err)) => {
                error!(error = %err, "invocation saga protocol violation");
                self.aborted += 1;
            }
            Err(err) => {
                warn!(error = %err, "invocation task join error");
                self.aborted += 1;
            }
        }
    }

    /// Total invocations observed.
    pub fn total(&self) -> u64 {
        self.completed + self.failed + self.aborted
    }
}

/// Entrypoint spawning the runtime loop.
#[derive(Debug, Default)]
pub struct InvocationRuntime;

impl InvocationRuntime {
    /// Start a runtime buffering at most `queue_capacity` pending triggers
    /// and running as many invocations at once.
    pub fn start(driver: SagaDriver, queue_capacity: usize) -> RuntimeHandle {
        Self::with_limits(driver, queue_capacity, queue_capacity)
    }

    /// Start a runtime with separate queue and concurrency limits.
    pub fn with_limits(
        driver: SagaDriver,
        queue_capacity: usize,
        max_in_flight: usize,
    ) -> RuntimeHandle {
        let queue_capacity = queue_capacity.max(1);
        let max_in_flight = max_in_flight.max(1);
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let bus = driver.event_bus().clone();
        let task = tokio::spawn(run_loop(driver, receiver, shutdown_rx, max_in_flight));
        info!(queue_capacity, max_in_flight, "invocation runtime started");
        RuntimeHandle {
            sender,
            bus,
            shutdown,
            task,
        }
    }

    /// Start a runtime sized from configuration.
    pub fn from_config(driver: SagaDriver, config: &RuntimeConfig) -> RuntimeHandle {
        Self::with_limits(driver, config.queue_capacity, config.max_in_flight)
    }
}

/// Handle used to submit triggers and stop the runtime.
pub struct RuntimeHandle {
    sender: mpsc::Sender<InvocationParameters>,
    bus: Arc<dyn EventBus>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<RuntimeSummary>,
}

impl RuntimeHandle {
    /// Publish the `Started` trigger and queue the invocation, waiting for room.
    pub async fn submit(&self, params: InvocationParameters) -> Result<(), RuntimeError> {
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| RuntimeError::Closed)?;
        self.bus.publish(InvokeMethodAction::Started(params.clone()));
        permit.send(params);
        Ok(())
    }

    /// Like [`RuntimeHandle::submit`] but fails instead of waiting for room.
    pub fn try_submit(&self, params: InvocationParameters) -> Result<(), RuntimeError> {
        let permit = self.sender.try_reserve().map_err(|err| match err {
            mpsc::error::TrySendError::Full(()) => RuntimeError::QueueFull,
            mpsc::error::TrySendError::Closed(()) => RuntimeError::Closed,
        })?;
        self.bus.publish(InvokeMethodAction::Started(params.clone()));
        permit.send(params);
        Ok(())
    }

    /// Whether the runtime stopped accepting triggers.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Stop intake and wait for every accepted invocation to finish.
    pub async fn shutdown(self) -> Result<RuntimeSummary, RuntimeError> {
        let _ = self.shutdown.send(());
        drop(self.sender);
        let summary = self
            .task
            .await
            .map_err(|err| RuntimeError::Join(err.to_string()))?;
        info!(
            completed = summary.completed,
            failed = summary.failed,
            aborted = summary.aborted,
            "invocation runtime shutdown complete"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("bus", &self.bus.name())
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

type InvocationTasks = JoinSet<Result<InvocationOutcome, SagaError>>;

async fn run_loop(
    driver: SagaDriver,
    mut triggers: mpsc::Receiver<InvocationParameters>,
    mut shutdown: broadcast::Receiver<()>,
    max_in_flight: usize,
) -> RuntimeSummary {
    let mut tasks = InvocationTasks::new();
    let mut summary = RuntimeSummary::default();

    // Triggers stay queued while the in-flight limit is reached.
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("invocation runtime shutdown signal received");
                break;
            }
            next = triggers.recv(), if tasks.len() < max_in_flight => match next {
                Some(params) => spawn_invocation(&mut tasks, &driver, params),
                None => break,
            },
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => summary.record(joined),
        }
    }

    triggers.close();
    while let Some(params) = triggers.recv().await {
        while tasks.len() >= max_in_flight {
            match tasks.join_next().await {
                Some(joined) => summary.record(joined),
                None => break,
            }
        }
        spawn_invocation(&mut tasks, &driver, params);
    }
    while let Some(joined) = tasks.join_next().await {
        summary.record(joined);
    }
    summary
}

fn spawn_invocation(tasks: &mut InvocationTasks, driver: &SagaDriver, params: InvocationParameters) {
    debug!(device = %params.device_id, method = %params.method_name, "spawning invocation");
    let driver = driver.clone();
    tasks.spawn(async move { driver.run(params).await });
}
