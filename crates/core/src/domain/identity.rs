use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalLevel;
use crate::domain::quote::SellerId;
use crate::domain::store::StoreId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerRole {
    Seller,
    Manager,
    AdminMaster,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "SELLER",
            Self::Manager => "MANAGER",
            Self::AdminMaster => "ADMIN_MASTER",
        }
    }

    pub fn can_approve(&self, level: ApprovalLevel) -> bool {
        match level {
            ApprovalLevel::None => true,
            ApprovalLevel::Manager => matches!(self, Self::Manager | Self::AdminMaster),
            ApprovalLevel::Admin => matches!(self, Self::AdminMaster),
        }
    }
}

impl std::str::FromStr for CallerRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SELLER" => Ok(Self::Seller),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN_MASTER" | "ADMIN" => Ok(Self::AdminMaster),
            other => Err(DomainError::invalid_input(
                "role",
                format!("unsupported caller role `{other}` (expected seller|manager|admin-master)"),
            )),
        }
    }
}

/// Identity handed over by the authentication layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub store_id: StoreId,
    pub user_id: SellerId,
    pub role: CallerRole,
}
