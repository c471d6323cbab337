use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::normalize_key;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    CapitalExpenditure,
    Procurement,
    AssetTransfer,
}

impl RequestCategory {
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::CapitalExpenditure => "capital_expenditure",
            Self::Procurement => "procurement",
            Self::AssetTransfer => "asset_transfer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_key(raw).as_str() {
            "capital_expenditure" | "capex" => Some(Self::CapitalExpenditure),
            "procurement" => Some(Self::Procurement),
            "asset_transfer" => Some(Self::AssetTransfer),
            _ => None,
        }
    }
}

/// Request context handed in by the calling workflow. The engine reads it to
/// compute decisions and never stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonetaryRequest {
    pub amount: Option<Decimal>,
    pub category: RequestCategory,
    pub department: String,
    pub requester_id: String,
}
