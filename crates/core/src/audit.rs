use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::request::TaskId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalEventCategory {
    Routing,
    Escalation,
    Delegation,
    Completion,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalOutcome {
    Success,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub event_id: String,
    pub task_id: Option<TaskId>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: ApprovalEventCategory,
    pub actor: String,
    pub outcome: ApprovalOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl ApprovalEvent {
    pub fn new(
        task_id: Option<TaskId>,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        category: ApprovalEventCategory,
        actor: impl Into<String>,
        outcome: ApprovalOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            task_id,
            correlation_id: correlation_id.into(),
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Receives assignment, escalation and delegation events. Delivery and
/// message content are owned by the notification system; the engine only
/// emits.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: ApprovalEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationDispatcher {
    events: Arc<Mutex<Vec<ApprovalEvent>>>,
}

impl InMemoryNotificationDispatcher {
    pub fn events(&self) -> Vec<ApprovalEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationDispatcher for InMemoryNotificationDispatcher {
    fn dispatch(&self, event: ApprovalEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
