use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use mandate_core::delegation::{CompletedDelegation, DelegationRecord};
use mandate_core::domain::request::TaskId;
use mandate_core::routing::RoutingDecision;

// Variable names are a compliance contract with downstream consumers; they
// must not be renamed.
pub const VAR_ORIGINAL_ASSIGNEE: &str = "originalAssignee";
pub const VAR_DELEGATE_TO: &str = "delegateTo";
pub const VAR_DELEGATION_REASON: &str = "delegationReason";
pub const VAR_DELEGATION_TIMESTAMP: &str = "delegationTimestamp";
pub const VAR_IS_DELEGATED: &str = "isDelegated";
pub const VAR_DELEGATION_CHAIN: &str = "delegationChain";
pub const VAR_ACTUAL_APPROVER: &str = "actualApprover";
pub const VAR_REQUIRED_TIER: &str = "requiredTier";
pub const VAR_CANDIDATE_GROUP: &str = "candidateGroup";
pub const VAR_ESCALATED: &str = "escalated";
pub const VAR_ESCALATION_REASON: &str = "escalationReason";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("task variable `{name}` is missing")]
    Missing { name: String },
    #[error("task variable `{name}` has an unexpected type")]
    InvalidType { name: String },
    #[error("task variable `{name}` holds an invalid timestamp: `{value}`")]
    InvalidTimestamp { name: String, value: String },
}

pub fn routing_variables(decision: &RoutingDecision) -> BTreeMap<String, Value> {
    let mut variables = BTreeMap::new();
    variables.insert(VAR_REQUIRED_TIER.to_string(), Value::from(decision.required_tier));
    variables.insert(
        VAR_CANDIDATE_GROUP.to_string(),
        Value::String(decision.candidate_group.clone()),
    );
    variables.insert(VAR_ESCALATED.to_string(), Value::Bool(decision.escalated));
    variables.insert(VAR_ESCALATION_REASON.to_string(), Value::String(decision.reason.clone()));
    variables
}

pub fn delegation_variables(record: &DelegationRecord) -> BTreeMap<String, Value> {
    let mut variables = BTreeMap::new();
    variables.insert(
        VAR_ORIGINAL_ASSIGNEE.to_string(),
        Value::String(record.original_assignee.clone()),
    );
    variables.insert(VAR_DELEGATE_TO.to_string(), Value::String(record.delegate_to.clone()));
    variables.insert(
        VAR_DELEGATION_REASON.to_string(),
        Value::String(record.delegation_reason.clone()),
    );
    variables.insert(
        VAR_DELEGATION_TIMESTAMP.to_string(),
        Value::String(record.delegation_timestamp.to_rfc3339()),
    );
    variables.insert(VAR_IS_DELEGATED.to_string(), Value::Bool(record.is_delegated()));
    variables.insert(VAR_DELEGATION_CHAIN.to_string(), Value::from(record.chain_position));
    variables
}

pub fn completion_variables(completed: &CompletedDelegation) -> BTreeMap<String, Value> {
    let mut variables = delegation_variables(&completed.record);
    variables.insert(
        VAR_ACTUAL_APPROVER.to_string(),
        Value::String(completed.completed_by.clone()),
    );
    variables
}

pub fn undelegated_completion_variables(completed_by: &str) -> BTreeMap<String, Value> {
    let mut variables = BTreeMap::new();
    variables.insert(VAR_ACTUAL_APPROVER.to_string(), Value::String(completed_by.to_string()));
    variables.insert(VAR_IS_DELEGATED.to_string(), Value::Bool(false));
    variables
}

/// Rebuilds a delegation record from task variables, e.g. when resuming an
/// in-flight approval from the workflow engine's state.
pub fn delegation_from_variables(
    task_id: &TaskId,
    variables: &BTreeMap<String, Value>,
) -> Result<DelegationRecord, VariableError> {
    let timestamp_raw = string_variable(variables, VAR_DELEGATION_TIMESTAMP)?;
    let delegation_timestamp = DateTime::parse_from_rfc3339(&timestamp_raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| VariableError::InvalidTimestamp {
            name: VAR_DELEGATION_TIMESTAMP.to_string(),
            value: timestamp_raw,
        })?;

    Ok(DelegationRecord {
        task_id: task_id.clone(),
        original_assignee: string_variable(variables, VAR_ORIGINAL_ASSIGNEE)?,
        delegate_to: string_variable(variables, VAR_DELEGATE_TO)?,
        delegation_reason: string_variable(variables, VAR_DELEGATION_REASON)?,
        delegation_timestamp,
        chain_position: integer_variable(variables, VAR_DELEGATION_CHAIN)?,
    })
}

fn string_variable(
    variables: &BTreeMap<String, Value>,
    name: &str,
) -> Result<String, VariableError> {
    let value = variables
        .get(name)
        .ok_or_else(|| VariableError::Missing { name: name.to_string() })?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| VariableError::InvalidType { name: name.to_string() })
}

fn integer_variable(
    variables: &BTreeMap<String, Value>,
    name: &str,
) -> Result<u32, VariableError> {
    let value = variables
        .get(name)
        .ok_or_else(|| VariableError::Missing { name: name.to_string() })?;
    value
        .as_u64()
        .and_then(|raw| u32::try_from(raw).ok())
        .ok_or_else(|| VariableError::InvalidType { name: name.to_string() })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Value;

    use super::{
        delegation_from_variables, delegation_variables, routing_variables, VariableError,
        VAR_CANDIDATE_GROUP, VAR_DELEGATE_TO, VAR_DELEGATION_CHAIN, VAR_DELEGATION_REASON,
        VAR_DELEGATION_TIMESTAMP, VAR_IS_DELEGATED, VAR_ORIGINAL_ASSIGNEE,
    };
    use mandate_core::delegation::DelegationRecord;
    use mandate_core::domain::request::TaskId;
    use mandate_core::routing::RoutingDecision;

    fn record() -> DelegationRecord {
        DelegationRecord {
            task_id: TaskId("task-9".to_string()),
            original_assignee: "user-a".to_string(),
            delegate_to: "user-b".to_string(),
            delegation_reason: "On vacation".to_string(),
            delegation_timestamp: Utc::now(),
            chain_position: 2,
        }
    }

    #[test]
    fn delegation_variables_use_compliance_names() {
        let variables = delegation_variables(&record());

        assert_eq!(
            variables.get(VAR_ORIGINAL_ASSIGNEE),
            Some(&Value::String("user-a".to_string()))
        );
        assert_eq!(variables.get(VAR_DELEGATE_TO), Some(&Value::String("user-b".to_string())));
        assert_eq!(
            variables.get(VAR_DELEGATION_REASON),
            Some(&Value::String("On vacation".to_string()))
        );
        assert_eq!(variables.get(VAR_IS_DELEGATED), Some(&Value::Bool(true)));
        assert_eq!(variables.get(VAR_DELEGATION_CHAIN), Some(&Value::from(2u32)));
        assert!(variables.contains_key(VAR_DELEGATION_TIMESTAMP));
    }

    #[test]
    fn delegation_round_trips_through_variables() {
        let original = record();
        let variables = delegation_variables(&original);
        let rebuilt = delegation_from_variables(&TaskId("task-9".to_string()), &variables)
            .expect("round trip should succeed");

        assert_eq!(rebuilt.original_assignee, original.original_assignee);
        assert_eq!(rebuilt.delegate_to, original.delegate_to);
        assert_eq!(rebuilt.chain_position, original.chain_position);
        assert_eq!(
            rebuilt.delegation_timestamp.timestamp(),
            original.delegation_timestamp.timestamp()
        );
    }

    #[test]
    fn missing_variable_is_reported_by_name() {
        let mut variables = delegation_variables(&record());
        variables.remove(VAR_DELEGATE_TO);

        let error = delegation_from_variables(&TaskId("task-9".to_string()), &variables)
            .expect_err("missing delegateTo must fail");
        assert_eq!(error, VariableError::Missing { name: VAR_DELEGATE_TO.to_string() });
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let mut variables = delegation_variables(&record());
        variables.insert(
            VAR_DELEGATION_TIMESTAMP.to_string(),
            Value::String("yesterday".to_string()),
        );

        let error = delegation_from_variables(&TaskId("task-9".to_string()), &variables)
            .expect_err("bad timestamp must fail");
        assert!(matches!(error, VariableError::InvalidTimestamp { .. }));
    }

    #[test]
    fn routing_variables_carry_decision_fields() {
        let decision = RoutingDecision {
            required_tier: 3,
            candidate_group: "finance_approvers".to_string(),
            assigned_user_id: None,
            escalated: true,
            reason: "authority gap".to_string(),
        };
        let variables = routing_variables(&decision);

        assert_eq!(variables.get("requiredTier"), Some(&Value::from(3u8)));
        assert_eq!(
            variables.get(VAR_CANDIDATE_GROUP),
            Some(&Value::String("finance_approvers".to_string()))
        );
        assert_eq!(variables.get("escalated"), Some(&Value::Bool(true)));
    }
}
