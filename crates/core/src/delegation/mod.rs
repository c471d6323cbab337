use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::normalize_key;
use crate::domain::request::TaskId;

/// Live delegation state for one task. `original_assignee` is fixed at the
/// first hand-off; `delegate_to` and `chain_position` move with every
/// re-delegation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub task_id: TaskId,
    pub original_assignee: String,
    pub delegate_to: String,
    pub delegation_reason: String,
    pub delegation_timestamp: DateTime<Utc>,
    pub chain_position: u32,
}

impl DelegationRecord {
    pub fn is_delegated(&self) -> bool {
        self.chain_position > 0
    }
}

/// Archived chain, written when the task completes. The completer is stored
/// separately from the chain so audits can compare the original assignee
/// against whoever actually finished the work item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedDelegation {
    pub record: DelegationRecord,
    pub completed_by: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DelegationError {
    #[error("task `{task_id}` cannot be delegated from `{user_id}` to themselves")]
    SelfDelegation { task_id: String, user_id: String },
    #[error("task `{task_id}` delegation chain would exceed the depth limit of {max_depth}")]
    ChainDepthExceeded { task_id: String, max_depth: u32 },
}

/// Tracks delegation chains per task. Callers must serialize `delegate` and
/// `complete` per task id; the surrounding workflow engine owns that
/// concurrency control.
#[derive(Clone, Debug, Default)]
pub struct DelegationTracker {
    records: HashMap<String, DelegationRecord>,
    completed: HashMap<String, CompletedDelegation>,
    max_chain_depth: Option<u32>,
}

impl DelegationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_chain_depth(max_chain_depth: Option<u32>) -> Self {
        Self { max_chain_depth, ..Self::default() }
    }

    pub fn delegate(
        &mut self,
        task_id: &TaskId,
        from: &str,
        to: &str,
        reason: &str,
    ) -> Result<DelegationRecord, DelegationError> {
        if normalize_key(from) == normalize_key(to) {
            return Err(DelegationError::SelfDelegation {
                task_id: task_id.0.clone(),
                user_id: from.to_string(),
            });
        }

        match self.records.get_mut(&task_id.0) {
            Some(record) => {
                if let Some(max_depth) = self.max_chain_depth {
                    if record.chain_position >= max_depth {
                        return Err(DelegationError::ChainDepthExceeded {
                            task_id: task_id.0.clone(),
                            max_depth,
                        });
                    }
                }

                record.delegate_to = to.to_string();
                record.delegation_reason = reason.to_string();
                record.delegation_timestamp = Utc::now();
                record.chain_position += 1;
                Ok(record.clone())
            }
            None => {
                let record = DelegationRecord {
                    task_id: task_id.clone(),
                    original_assignee: from.to_string(),
                    delegate_to: to.to_string(),
                    delegation_reason: reason.to_string(),
                    delegation_timestamp: Utc::now(),
                    chain_position: 1,
                };
                self.records.insert(task_id.0.clone(), record.clone());
                Ok(record)
            }
        }
    }

    /// Finalizes a task's chain. The upstream task system is authoritative on
    /// who completed the work item, so a completer that differs from the
    /// current delegate is logged and archived as-is, never rejected. Returns
    /// `None` for tasks that were never delegated.
    pub fn complete(&mut self, task_id: &TaskId, completed_by: &str) -> Option<CompletedDelegation> {
        let record = self.records.remove(&task_id.0)?;

        if normalize_key(&record.delegate_to) != normalize_key(completed_by) {
            warn!(
                event_name = "delegation.completer_mismatch",
                task_id = %task_id.0,
                current_delegate = %record.delegate_to,
                completed_by = %completed_by,
                "task completed by a user other than the current delegate"
            );
        }

        let completed = CompletedDelegation {
            record,
            completed_by: completed_by.to_string(),
            completed_at: Utc::now(),
        };
        self.completed.insert(task_id.0.clone(), completed.clone());
        Some(completed)
    }

    /// The exact field set persisted as task variables for compliance
    /// queries.
    pub fn audit_trail(&self, task_id: &TaskId) -> Option<&DelegationRecord> {
        self.records.get(&task_id.0)
    }

    pub fn completed(&self, task_id: &TaskId) -> Option<&CompletedDelegation> {
        self.completed.get(&task_id.0)
    }
}
