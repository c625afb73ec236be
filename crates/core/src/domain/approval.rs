use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::store::StoreId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalLevel {
    None,
    Manager,
    Admin,
}

impl ApprovalLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteApprovalStatus {
    AutoApproved,
    AwaitingApproval,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub requested_discount: Decimal,
    pub seller_limit: Decimal,
    pub manager_limit: Decimal,
    pub auto_approved: bool,
    pub requires_approval: bool,
    pub required_level: ApprovalLevel,
}

impl ApprovalOutcome {
    pub fn quote_status(&self) -> QuoteApprovalStatus {
        if self.requires_approval {
            QuoteApprovalStatus::AwaitingApproval
        } else {
            QuoteApprovalStatus::AutoApproved
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountApprovalRequest {
    pub store_id: StoreId,
    pub requested_by: String,
    pub requested_discount: Decimal,
    pub required_level: ApprovalLevel,
    pub justification: String,
}
