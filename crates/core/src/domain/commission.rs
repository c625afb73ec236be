use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionRole {
    Seller,
    Manager,
}

impl CommissionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "SELLER",
            Self::Manager => "MANAGER",
        }
    }
}

impl std::str::FromStr for CommissionRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SELLER" => Ok(Self::Seller),
            "MANAGER" => Ok(Self::Manager),
            other => Err(DomainError::invalid_input(
                "role",
                format!("unsupported commission role `{other}` (expected seller|manager)"),
            )),
        }
    }
}

/// One commission band. `max_value` of `None` is unbounded above.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub order: u32,
    pub min_value: Decimal,
    pub max_value: Option<Decimal>,
    pub rate: Decimal,
}

/// Commission bands for one (store, role) group, sorted by `order`.
///
/// Construction rejects structurally malformed bands. Overlap between
/// neighbouring bands is only checked by [`TierTable::ensure_non_overlapping`],
/// which configuration writes call before persisting a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TierTable {
    tiers: Vec<CommissionTier>,
}

impl TierTable {
    pub fn new(mut tiers: Vec<CommissionTier>) -> Result<Self, DomainError> {
        let mut seen_orders = HashSet::new();

        for tier in &tiers {
            if !seen_orders.insert(tier.order) {
                return Err(DomainError::InvalidTierTable(format!(
                    "duplicate tier order {}",
                    tier.order
                )));
            }
            if tier.min_value < Decimal::ZERO {
                return Err(DomainError::InvalidTierTable(format!(
                    "tier {} has negative min_value {}",
                    tier.order, tier.min_value
                )));
            }
            if tier.rate < Decimal::ZERO || tier.rate > Decimal::ONE {
                return Err(DomainError::InvalidTierTable(format!(
                    "tier {} rate {} is outside 0..=1",
                    tier.order, tier.rate
                )));
            }
            if let Some(max_value) = tier.max_value {
                if max_value <= tier.min_value {
                    return Err(DomainError::InvalidTierTable(format!(
                        "tier {} max_value {} must exceed min_value {}",
                        tier.order, max_value, tier.min_value
                    )));
                }
            }
        }

        tiers.sort_by_key(|tier| tier.order);
        Ok(Self { tiers })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tiers(&self) -> &[CommissionTier] {
        &self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Gaps between bands are allowed; overlaps are not, and only the last
    /// band may be unbounded.
    pub fn ensure_non_overlapping(&self) -> Result<(), DomainError> {
        for pair in self.tiers.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let Some(previous_max) = previous.max_value else {
                return Err(DomainError::InvalidTierTable(format!(
                    "tier {} is unbounded but is followed by tier {}",
                    previous.order, next.order
                )));
            };
            if next.min_value < previous_max {
                return Err(DomainError::InvalidTierTable(format!(
                    "tier {} starts at {} which overlaps tier {} ending at {}",
                    next.order, next.min_value, previous.order, previous_max
                )));
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierContribution {
    pub tier_order: u32,
    pub min_value: Decimal,
    pub max_value: Option<Decimal>,
    pub applicable_amount: Decimal,
    pub rate: Decimal,
    pub commission_amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionResult {
    pub total: Decimal,
    pub tier_breakdown: Vec<TierContribution>,
}
