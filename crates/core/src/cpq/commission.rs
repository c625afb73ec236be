use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::commission::{CommissionResult, TierContribution, TierTable};
use crate::errors::DomainError;

pub trait CommissionEngine: Send + Sync {
    fn calculate(
        &self,
        sale_value: Decimal,
        tiers: &TierTable,
    ) -> Result<CommissionResult, DomainError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ProgressiveCommissionEngine;

impl CommissionEngine for ProgressiveCommissionEngine {
    fn calculate(
        &self,
        sale_value: Decimal,
        tiers: &TierTable,
    ) -> Result<CommissionResult, DomainError> {
        calculate_progressive_commission(sale_value, tiers)
    }
}

/// Progressive (marginal) commission: each band pays its rate only on the
/// slice of `sale_value` that falls inside it.
///
/// A band is reached only when `sale_value` is strictly above its floor, so a
/// sale exactly on a floor contributes nothing to that band. Bands paying zero
/// are left out of the breakdown. Fails only when the running total leaves the
/// `Decimal` range, which a non-overlapping table cannot do.
pub fn calculate_progressive_commission(
    sale_value: Decimal,
    tiers: &TierTable,
) -> Result<CommissionResult, DomainError> {
    let mut result = CommissionResult::default();

    for tier in tiers.tiers() {
        if sale_value <= tier.min_value {
            continue;
        }

        let band_end = match tier.max_value {
            Some(max_value) => sale_value.min(max_value),
            None => sale_value,
        };
        let applicable_amount = (band_end - tier.min_value).max(Decimal::ZERO);
        let commission_amount = applicable_amount
            .checked_mul(tier.rate)
            .ok_or_else(|| DomainError::out_of_range("commission_amount"))?;

        if commission_amount <= Decimal::ZERO {
            continue;
        }

        debug!(
            event_name = "pricing.commission.tier_applied",
            tier_order = tier.order,
            applicable_amount = %applicable_amount,
            rate = %tier.rate,
            commission_amount = %commission_amount,
            "commission tier applied"
        );

        result.total = result
            .total
            .checked_add(commission_amount)
            .ok_or_else(|| DomainError::out_of_range("commission_total"))?;
        result.tier_breakdown.push(TierContribution {
            tier_order: tier.order,
            min_value: tier.min_value,
            max_value: tier.max_value,
            applicable_amount,
            rate: tier.rate,
            commission_amount,
        });
    }

    Ok(result)
}
