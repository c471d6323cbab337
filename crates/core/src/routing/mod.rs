use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::authority::{resolve_tier, tier_metadata, TIER_CEILING};
use crate::config::RoutingConfig;
use crate::domain::approver::ApproverDirectory;
use crate::domain::request::{MonetaryRequest, RequestCategory};

/// Group used whenever a tier or category cannot be mapped. Routing must
/// always produce a decision, so unmapped inputs land in the finance pool
/// instead of failing.
pub const FALLBACK_GROUP: &str = "finance_approvers";

/// The outcome of one routing call. Built fresh on every call and never
/// mutated; a later decision supersedes an earlier one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub required_tier: u8,
    pub candidate_group: String,
    pub assigned_user_id: Option<String>,
    pub escalated: bool,
    pub reason: String,
}

pub fn is_escalation_needed(amount: Option<Decimal>, assigned_level: Option<u8>) -> bool {
    match assigned_level {
        Some(level) => level < resolve_tier(amount),
        None => true,
    }
}

/// Next tier when walking up one step at a time rather than jumping straight
/// to the resolved tier. Capped at the top tier.
pub fn next_escalation_level(current_level: u8) -> u8 {
    current_level.saturating_add(1).min(TIER_CEILING)
}

#[derive(Clone, Debug)]
pub struct ApprovalRouter<D> {
    directory: D,
    overrides: RoutingConfig,
}

impl<D> ApprovalRouter<D>
where
    D: ApproverDirectory,
{
    pub fn new(directory: D) -> Self {
        Self { directory, overrides: RoutingConfig::default() }
    }

    pub fn with_overrides(directory: D, overrides: RoutingConfig) -> Self {
        Self { directory, overrides }
    }

    /// Routes a monetary request. With no candidate approver at all the task
    /// is assigned to the tier's candidate group for claiming. A present
    /// approver with sufficient authority keeps the task and still gets the
    /// group as a claim pool; a present approver whose authority is
    /// insufficient or unresolvable escalates. Never fails: unmapped inputs
    /// degrade to the fallback group.
    pub fn route(
        &self,
        request: &MonetaryRequest,
        current_approver_id: Option<&str>,
        current_approver_level: Option<u8>,
    ) -> RoutingDecision {
        let required_tier = resolve_tier(request.amount);
        let current_level = current_approver_level
            .or_else(|| current_approver_id.and_then(|user_id| self.directory.level_of(user_id)));
        let candidate_group = self.escalation_group_for(required_tier, request.category);

        if current_approver_id.is_none() && current_level.is_none() {
            return RoutingDecision {
                required_tier,
                candidate_group: candidate_group.clone(),
                assigned_user_id: None,
                escalated: false,
                reason: format!(
                    "no current approver, assigning candidate group `{candidate_group}` \
                     for required tier {required_tier}"
                ),
            };
        }

        match current_level {
            Some(level) if level >= required_tier => RoutingDecision {
                required_tier,
                candidate_group,
                assigned_user_id: current_approver_id.map(str::to_owned),
                escalated: false,
                reason: format!(
                    "approver authority level {level} satisfies required tier {required_tier}"
                ),
            },
            Some(level) => RoutingDecision {
                required_tier,
                candidate_group: candidate_group.clone(),
                assigned_user_id: None,
                escalated: true,
                reason: format!(
                    "approver authority level {level} is below required tier {required_tier}, \
                     escalating to `{candidate_group}`"
                ),
            },
            None => RoutingDecision {
                required_tier,
                candidate_group: candidate_group.clone(),
                assigned_user_id: None,
                escalated: true,
                reason: format!(
                    "current approver has no known authority level, \
                     escalating to `{candidate_group}` for required tier {required_tier}"
                ),
            },
        }
    }

    /// Candidate group for a tier and category. Category changes only the
    /// label through configured overrides; the tier thresholds are shared.
    pub fn escalation_group_for(&self, tier: u8, category: RequestCategory) -> String {
        if let Some(group) = self.overrides.overrides_for(category).group_for(tier) {
            return group.to_string();
        }
        tier_metadata(tier).default_group.clone()
    }

    /// Raw-string variant for callers at the workflow boundary, where the
    /// category arrives as an untyped task variable.
    pub fn escalation_group_for_raw(&self, tier: u8, raw_category: &str) -> String {
        match RequestCategory::parse(raw_category) {
            Some(category) => self.escalation_group_for(tier, category),
            None => {
                warn!(
                    event_name = "routing.unknown_category",
                    category = raw_category,
                    "unknown request category, using fallback group"
                );
                FALLBACK_GROUP.to_string()
            }
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{is_escalation_needed, next_escalation_level, ApprovalRouter, FALLBACK_GROUP};
    use crate::config::RoutingConfig;
    use crate::domain::approver::{ApproverProfile, InMemoryApproverDirectory};
    use crate::domain::request::{MonetaryRequest, RequestCategory};

    fn directory() -> InMemoryApproverDirectory {
        InMemoryApproverDirectory::new(vec![
            ApproverProfile {
                user_id: "u-head".to_string(),
                authority_level: 2,
                department: "IT".to_string(),
                groups: vec!["department_heads".to_string()],
            },
            ApproverProfile {
                user_id: "u-finance".to_string(),
                authority_level: 3,
                department: "Finance".to_string(),
                groups: vec!["finance_approvers".to_string()],
            },
        ])
    }

    fn request(amount: Option<Decimal>, category: RequestCategory) -> MonetaryRequest {
        MonetaryRequest {
            amount,
            category,
            department: "IT".to_string(),
            requester_id: "u-requester".to_string(),
        }
    }

    #[test]
    fn small_request_without_approver_routes_to_department_managers() {
        let router = ApprovalRouter::new(directory());
        let decision = router.route(
            &request(Some(Decimal::new(500_00, 2)), RequestCategory::CapitalExpenditure),
            None,
            None,
        );

        assert_eq!(decision.required_tier, 1);
        assert_eq!(decision.candidate_group, "department_managers");
        assert!(!decision.escalated);
        assert!(decision.assigned_user_id.is_none());
    }

    #[test]
    fn sufficient_approver_keeps_assignment_with_claim_pool() {
        let router = ApprovalRouter::new(directory());
        let decision = router.route(
            &request(Some(Decimal::new(7_500_00, 2)), RequestCategory::Procurement),
            Some("u-head"),
            Some(2),
        );

        assert_eq!(decision.required_tier, 2);
        assert_eq!(decision.candidate_group, "department_heads");
        assert_eq!(decision.assigned_user_id.as_deref(), Some("u-head"));
        assert!(!decision.escalated);
    }

    #[test]
    fn insufficient_approver_escalates_with_authority_gap_reason() {
        let router = ApprovalRouter::new(directory());
        let decision = router.route(
            &request(Some(Decimal::new(75_000_00, 2)), RequestCategory::Procurement),
            Some("u-head"),
            Some(2),
        );

        assert_eq!(decision.required_tier, 3);
        assert_eq!(decision.candidate_group, "finance_approvers");
        assert!(decision.escalated);
        assert!(decision.assigned_user_id.is_none());
        assert!(decision.reason.contains("below required tier 3"));
    }

    #[test]
    fn missing_level_is_resolved_through_the_directory() {
        let router = ApprovalRouter::new(directory());
        let decision = router.route(
            &request(Some(Decimal::new(75_000_00, 2)), RequestCategory::AssetTransfer),
            Some("u-finance"),
            None,
        );

        assert!(!decision.escalated);
        assert_eq!(decision.assigned_user_id.as_deref(), Some("u-finance"));
    }

    #[test]
    fn unknown_approver_degrades_to_escalation() {
        let router = ApprovalRouter::new(directory());
        let decision = router.route(
            &request(Some(Decimal::new(250_000_00, 2)), RequestCategory::CapitalExpenditure),
            Some("u-ghost"),
            None,
        );

        assert_eq!(decision.required_tier, 4);
        assert_eq!(decision.candidate_group, "executive_approvers");
        assert!(decision.escalated);
    }

    #[test]
    fn category_overrides_change_the_label_not_the_threshold() {
        let overrides: RoutingConfig = toml::from_str(
            r#"
            [procurement]
            tier_2 = "procurement_leads"
            "#,
        )
        .expect("overrides should parse");
        let router = ApprovalRouter::with_overrides(directory(), overrides);

        assert_eq!(
            router.escalation_group_for(2, RequestCategory::Procurement),
            "procurement_leads"
        );
        assert_eq!(
            router.escalation_group_for(2, RequestCategory::CapitalExpenditure),
            "department_heads"
        );
        let decision = router.route(
            &request(Some(Decimal::new(7_500_00, 2)), RequestCategory::Procurement),
            None,
            None,
        );
        assert_eq!(decision.required_tier, 2);
        assert_eq!(decision.candidate_group, "procurement_leads");
    }

    #[test]
    fn unknown_raw_category_falls_back_to_finance_pool() {
        let router = ApprovalRouter::new(directory());
        assert_eq!(router.escalation_group_for_raw(1, "travel_expense"), FALLBACK_GROUP);
        assert_eq!(router.escalation_group_for_raw(1, "capex"), "department_managers");
    }

    #[test]
    fn escalation_is_needed_without_an_assigned_level() {
        assert!(is_escalation_needed(Some(Decimal::new(500, 0)), None));
        assert!(is_escalation_needed(None, None));
    }

    #[test]
    fn escalation_follows_the_resolved_tier() {
        assert!(is_escalation_needed(Some(Decimal::new(10_000, 0)), Some(2)));
        assert!(!is_escalation_needed(Some(Decimal::new(10_000, 0)), Some(3)));
        assert!(!is_escalation_needed(Some(Decimal::new(999, 0)), Some(1)));
    }

    #[test]
    fn next_escalation_level_is_capped_at_the_top_tier() {
        assert_eq!(next_escalation_level(1), 2);
        assert_eq!(next_escalation_level(3), 4);
        assert_eq!(next_escalation_level(4), 4);
    }
}
