use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use mandate_core::domain::request::TaskId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("task `{task_id}` was not found in the task system")]
    TaskNotFound { task_id: String },
    #[error("task system rejected the operation: {0}")]
    Rejected(String),
    #[error("task system unavailable: {0}")]
    Unavailable(String),
}

/// Port to the workflow engine that owns task lifecycle. The approval engine
/// computes decisions; this trait is how a thin adapter applies them. The
/// engine never drives lifecycle transitions itself.
#[async_trait]
pub trait TaskAssignmentGateway: Send + Sync {
    async fn set_candidate_group(&self, task_id: &TaskId, group: &str)
        -> Result<(), GatewayError>;
    async fn set_assignee(&self, task_id: &TaskId, user_id: &str) -> Result<(), GatewayError>;
    async fn delegate_task(&self, task_id: &TaskId, user_id: &str) -> Result<(), GatewayError>;
    async fn set_variables(
        &self,
        task_id: &TaskId,
        variables: BTreeMap<String, Value>,
    ) -> Result<(), GatewayError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum GatewayOperation {
    CandidateGroupSet { task_id: String, group: String },
    AssigneeSet { task_id: String, user_id: String },
    TaskDelegated { task_id: String, user_id: String },
    VariablesSet { task_id: String, variables: BTreeMap<String, Value> },
}

#[derive(Clone, Default)]
pub struct InMemoryTaskGateway {
    operations: Arc<Mutex<Vec<GatewayOperation>>>,
}

impl InMemoryTaskGateway {
    pub fn operations(&self) -> Vec<GatewayOperation> {
        match self.operations.lock() {
            Ok(operations) => operations.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// All variables applied to a task so far, later writes winning.
    pub fn variables_for(&self, task_id: &TaskId) -> BTreeMap<String, Value> {
        let mut merged = BTreeMap::new();
        for operation in self.operations() {
            if let GatewayOperation::VariablesSet { task_id: id, variables } = operation {
                if id == task_id.0 {
                    merged.extend(variables);
                }
            }
        }
        merged
    }

    fn record(&self, operation: GatewayOperation) {
        match self.operations.lock() {
            Ok(mut operations) => operations.push(operation),
            Err(poisoned) => poisoned.into_inner().push(operation),
        }
    }
}

#[async_trait]
impl TaskAssignmentGateway for InMemoryTaskGateway {
    async fn set_candidate_group(
        &self,
        task_id: &TaskId,
        group: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayOperation::CandidateGroupSet {
            task_id: task_id.0.clone(),
            group: group.to_string(),
        });
        Ok(())
    }

    async fn set_assignee(&self, task_id: &TaskId, user_id: &str) -> Result<(), GatewayError> {
        self.record(GatewayOperation::AssigneeSet {
            task_id: task_id.0.clone(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn delegate_task(&self, task_id: &TaskId, user_id: &str) -> Result<(), GatewayError> {
        self.record(GatewayOperation::TaskDelegated {
            task_id: task_id.0.clone(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn set_variables(
        &self,
        task_id: &TaskId,
        variables: BTreeMap<String, Value>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayOperation::VariablesSet { task_id: task_id.0.clone(), variables });
        Ok(())
    }
}
