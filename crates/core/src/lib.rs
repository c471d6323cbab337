pub mod audit;
pub mod authority;
pub mod config;
pub mod delegation;
pub mod domain;
pub mod routing;

pub use audit::{
    ApprovalEvent, ApprovalEventCategory, ApprovalOutcome, InMemoryNotificationDispatcher,
    NotificationDispatcher,
};
pub use authority::{
    authority_tiers, can_approve, resolve_tier, tier_metadata, AuthorityTier, TIER_CEILING,
    TIER_FLOOR,
};
pub use config::{
    ConfigError, DelegationConfig, EngineConfig, LoadOptions, LogFormat, LoggingConfig,
    RoutingConfig, TierGroupOverrides,
};
pub use delegation::{CompletedDelegation, DelegationError, DelegationRecord, DelegationTracker};
pub use domain::approver::{ApproverDirectory, ApproverProfile, InMemoryApproverDirectory};
pub use domain::request::{MonetaryRequest, RequestCategory, TaskId};
pub use routing::{
    is_escalation_needed, next_escalation_level, ApprovalRouter, RoutingDecision, FALLBACK_GROUP,
};
