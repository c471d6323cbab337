use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TIER_FLOOR: u8 = 1;
pub const TIER_CEILING: u8 = 4;

/// One row of the delegation-of-authority table. Bounds are half-open:
/// `lower_bound` inclusive, `upper_bound` exclusive, open-ended for the top
/// tier. Defined once at startup and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityTier {
    pub level: u8,
    pub title: String,
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub default_group: String,
}

static TIERS: OnceLock<[AuthorityTier; 4]> = OnceLock::new();
static FALLBACK_TIER: OnceLock<AuthorityTier> = OnceLock::new();

pub fn authority_tiers() -> &'static [AuthorityTier; 4] {
    TIERS.get_or_init(|| {
        [
            AuthorityTier {
                level: 1,
                title: "Department Manager".to_string(),
                lower_bound: Decimal::ZERO,
                upper_bound: Some(Decimal::new(1_000, 0)),
                default_group: "department_managers".to_string(),
            },
            AuthorityTier {
                level: 2,
                title: "Department Head".to_string(),
                lower_bound: Decimal::new(1_000, 0),
                upper_bound: Some(Decimal::new(10_000, 0)),
                default_group: "department_heads".to_string(),
            },
            AuthorityTier {
                level: 3,
                title: "Finance Manager".to_string(),
                lower_bound: Decimal::new(10_000, 0),
                upper_bound: Some(Decimal::new(100_000, 0)),
                default_group: "finance_approvers".to_string(),
            },
            AuthorityTier {
                level: 4,
                title: "Executive/CFO".to_string(),
                lower_bound: Decimal::new(100_000, 0),
                upper_bound: None,
                default_group: "executive_approvers".to_string(),
            },
        ]
    })
}

fn fallback_tier() -> &'static AuthorityTier {
    FALLBACK_TIER.get_or_init(|| AuthorityTier {
        level: 0,
        title: "Unmapped Authority".to_string(),
        lower_bound: Decimal::ZERO,
        upper_bound: None,
        default_group: "finance_approvers".to_string(),
    })
}

/// Maps a requested amount to the minimum authority tier that may approve it.
/// Total over its whole input domain: a missing amount defaults to the lowest
/// tier, and negative amounts fall into the lowest tier through the same
/// comparisons as non-negative ones.
pub fn resolve_tier(amount: Option<Decimal>) -> u8 {
    let Some(amount) = amount else {
        return TIER_FLOOR;
    };

    for tier in authority_tiers() {
        match tier.upper_bound {
            Some(bound) if amount < bound => return tier.level,
            Some(_) => continue,
            None => return tier.level,
        }
    }

    TIER_FLOOR
}

pub fn tier_metadata(level: u8) -> &'static AuthorityTier {
    match authority_tiers().iter().find(|tier| tier.level == level) {
        Some(tier) => tier,
        None => {
            warn!(
                event_name = "authority.unknown_tier",
                tier = level,
                "unknown authority tier requested, using fallback metadata"
            );
            fallback_tier()
        }
    }
}

pub fn can_approve(approver_level: u8, amount: Option<Decimal>) -> bool {
    approver_level >= resolve_tier(amount)
}
