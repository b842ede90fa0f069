//! ---
//! dmi_section: "02-messaging-data-model"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation data model and collaborator seams."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::InvokeMethodAction;

/// Event bus receiving lifecycle actions for downstream consumers.
pub trait EventBus: Send + Sync {
    /// Publish an action.
    fn publish(&self, action: InvokeMethodAction);
    /// Human-readable bus name for logging.
    fn name(&self) -> &'static str;
}

/// Bounded bus that records the most recent actions in publish order.
#[derive(Debug, Clone)]
pub struct InMemoryEventBus {
    retention: usize,
    actions: Arc<Mutex<VecDeque<InvokeMethodAction>>>,
}

impl InMemoryEventBus {
    /// Default number of actions retained.
    pub const DEFAULT_RETENTION: usize = 256;

    /// Create an empty bus with the default retention.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus retaining at most `retention` actions (minimum one).
    pub fn with_retention(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            actions: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Snapshot of retained actions, oldest first.
    pub fn actions(&self) -> Vec<InvokeMethodAction> {
        self.actions.lock().iter().cloned().collect()
    }

    /// Retained terminal actions only.
    pub fn terminal_actions(&self) -> Vec<InvokeMethodAction> {
        self.actions
            .lock()
            .iter()
            .filter(|action| action.is_terminal())
            .cloned()
            .collect()
    }

    /// Remove and return every retained action.
    pub fn drain(&self) -> Vec<InvokeMethodAction> {
        self.actions.lock().drain(..).collect()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, action: InvokeMethodAction) {
        let mut actions = self.actions.lock();
        while actions.len() >= self.retention {
            actions.pop_front();
        }
        actions.push_back(action);
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Fan-out bus backed by a tokio broadcast channel.
///
/// Publishing with no live subscriber drops the action.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<InvokeMethodAction>,
}

impl BroadcastEventBus {
    /// Create a bus buffering up to `capacity` actions per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to actions published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<InvokeMethodAction> {
        self.sender.subscribe()
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, action: InvokeMethodAction) {
        if self.sender.send(action).is_err() {
            debug!("no subscribers attached to broadcast event bus");
        }
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}
