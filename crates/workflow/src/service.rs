use thiserror::Error;
use tracing::info;

use mandate_core::audit::{
    ApprovalEvent, ApprovalEventCategory, ApprovalOutcome, NotificationDispatcher,
};
use mandate_core::delegation::{
    CompletedDelegation, DelegationError, DelegationRecord, DelegationTracker,
};
use mandate_core::domain::approver::ApproverDirectory;
use mandate_core::domain::request::{MonetaryRequest, TaskId};
use mandate_core::routing::{ApprovalRouter, RoutingDecision};

use crate::gateway::{GatewayError, TaskAssignmentGateway};
use crate::variables;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Delegation(#[from] DelegationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Applies the engine's decisions to the external task system: routing
/// becomes candidate-group/assignee calls, delegation becomes a delegate call
/// plus audit variables, completion archives the chain. Lifecycle stays with
/// the task system.
pub struct ApprovalTaskService<D, G, N> {
    router: ApprovalRouter<D>,
    tracker: DelegationTracker,
    gateway: G,
    dispatcher: N,
}

impl<D, G, N> ApprovalTaskService<D, G, N>
where
    D: ApproverDirectory,
    G: TaskAssignmentGateway,
    N: NotificationDispatcher,
{
    pub fn new(
        router: ApprovalRouter<D>,
        tracker: DelegationTracker,
        gateway: G,
        dispatcher: N,
    ) -> Self {
        Self { router, tracker, gateway, dispatcher }
    }

    pub async fn assign(
        &self,
        task_id: &TaskId,
        request: &MonetaryRequest,
        current_approver_id: Option<&str>,
        current_approver_level: Option<u8>,
        correlation_id: &str,
    ) -> Result<RoutingDecision, ServiceError> {
        let decision = self.router.route(request, current_approver_id, current_approver_level);

        self.gateway.set_candidate_group(task_id, &decision.candidate_group).await?;
        if let Some(user_id) = &decision.assigned_user_id {
            self.gateway.set_assignee(task_id, user_id).await?;
        }
        self.gateway.set_variables(task_id, variables::routing_variables(&decision)).await?;

        info!(
            event_name = "routing.decision_applied",
            task_id = %task_id.0,
            required_tier = decision.required_tier,
            candidate_group = %decision.candidate_group,
            escalated = decision.escalated,
            "routing decision applied to task"
        );

        let (event_type, category) = if decision.escalated {
            ("routing.escalated", ApprovalEventCategory::Escalation)
        } else {
            ("routing.assigned", ApprovalEventCategory::Routing)
        };
        self.dispatcher.dispatch(
            ApprovalEvent::new(
                Some(task_id.clone()),
                correlation_id,
                event_type,
                category,
                "approval-router",
                ApprovalOutcome::Success,
            )
            .with_metadata("candidate_group", decision.candidate_group.clone())
            .with_metadata("required_tier", decision.required_tier.to_string())
            .with_metadata("reason", decision.reason.clone()),
        );

        Ok(decision)
    }

    pub async fn delegate(
        &mut self,
        task_id: &TaskId,
        from: &str,
        to: &str,
        reason: &str,
        correlation_id: &str,
    ) -> Result<DelegationRecord, ServiceError> {
        let record = match self.tracker.delegate(task_id, from, to, reason) {
            Ok(record) => record,
            Err(error) => {
                self.dispatcher.dispatch(
                    ApprovalEvent::new(
                        Some(task_id.clone()),
                        correlation_id,
                        "delegation.rejected",
                        ApprovalEventCategory::Delegation,
                        from,
                        ApprovalOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
                return Err(error.into());
            }
        };

        self.gateway.delegate_task(task_id, to).await?;
        self.gateway.set_variables(task_id, variables::delegation_variables(&record)).await?;

        self.dispatcher.dispatch(
            ApprovalEvent::new(
                Some(task_id.clone()),
                correlation_id,
                "delegation.recorded",
                ApprovalEventCategory::Delegation,
                from,
                ApprovalOutcome::Success,
            )
            .with_metadata("from", from)
            .with_metadata("to", to)
            .with_metadata("chain_position", record.chain_position.to_string()),
        );

        Ok(record)
    }

    pub async fn complete(
        &mut self,
        task_id: &TaskId,
        completed_by: &str,
        correlation_id: &str,
    ) -> Result<Option<CompletedDelegation>, ServiceError> {
        let completed = self.tracker.complete(task_id, completed_by);

        let task_variables = match &completed {
            Some(completed) => variables::completion_variables(completed),
            None => variables::undelegated_completion_variables(completed_by),
        };
        self.gateway.set_variables(task_id, task_variables).await?;

        self.dispatcher.dispatch(
            ApprovalEvent::new(
                Some(task_id.clone()),
                correlation_id,
                "delegation.completed",
                ApprovalEventCategory::Completion,
                completed_by,
                ApprovalOutcome::Success,
            )
            .with_metadata("was_delegated", completed.is_some().to_string()),
        );

        Ok(completed)
    }

    pub fn audit_trail(&self, task_id: &TaskId) -> Option<&DelegationRecord> {
        self.tracker.audit_trail(task_id)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn dispatcher(&self) -> &N {
        &self.dispatcher
    }
}
