use rust_decimal::Decimal;

use crate::cpq::commission::CommissionEngine;
use crate::domain::commission::TierTable;
use crate::domain::quote::{CommissionDetail, CostAggregation, CostBreakdown, QuotePricingInput};
use crate::domain::store::StoreConfig;
use crate::errors::DomainError;

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

pub fn discounted_value(
    base_value: Decimal,
    discount_fraction: Decimal,
) -> Result<Decimal, DomainError> {
    Decimal::ONE
        .checked_sub(discount_fraction)
        .and_then(|remaining| base_value.checked_mul(remaining))
        .ok_or_else(|| DomainError::out_of_range("final_value"))
}

fn checked_sum<I>(field: &str, start: Decimal, amounts: I) -> Result<Decimal, DomainError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(start, |total, amount| {
        total.checked_add(amount).ok_or_else(|| DomainError::out_of_range(field))
    })
}

/// Builds the full cost breakdown and margin for one quote.
///
/// Factory cost is charged on the pre-discount base value. Commissions and
/// freight follow the discounted final value. Inputs are assumed to be
/// validated already; nothing here clamps values. Arithmetic is checked, and
/// an amount that leaves the `Decimal` range is reported as invalid input
/// instead of panicking.
pub fn aggregate_costs<E>(
    input: &QuotePricingInput,
    config: &StoreConfig,
    seller_tiers: &TierTable,
    manager_tiers: &TierTable,
    engine: &E,
) -> Result<CostAggregation, DomainError>
where
    E: CommissionEngine + ?Sized,
{
    let final_value = discounted_value(input.base_value, input.discount_fraction)?;
    let factory_cost = input
        .base_value
        .checked_mul(config.factory_cost_rate)
        .ok_or_else(|| DomainError::out_of_range("factory_cost"))?;

    let seller = engine.calculate(final_value, seller_tiers)?;
    let manager = engine.calculate(final_value, manager_tiers)?;

    let measurement_cost = config.fixed_measurement_cost;
    let freight_cost = final_value
        .checked_mul(config.freight_rate)
        .ok_or_else(|| DomainError::out_of_range("freight_cost"))?;
    let assembly_cost = input.assembly_cost;
    let additional_costs_total = checked_sum(
        "additional_costs_total",
        Decimal::ZERO,
        input.additional_costs.iter().map(|cost| cost.amount),
    )?;

    let total_costs = checked_sum(
        "total_costs",
        factory_cost,
        [
            seller.total,
            manager.total,
            measurement_cost,
            assembly_cost,
            freight_cost,
            additional_costs_total,
        ],
    )?;

    let margin = final_value
        .checked_sub(total_costs)
        .ok_or_else(|| DomainError::out_of_range("margin"))?;
    let margin_percent = if final_value > Decimal::ZERO {
        margin
            .checked_div(final_value)
            .and_then(|ratio| ratio.checked_mul(PERCENT))
            .ok_or_else(|| DomainError::out_of_range("margin_percent"))?
    } else {
        Decimal::ZERO
    };

    Ok(CostAggregation {
        base_value: input.base_value,
        discount_fraction: input.discount_fraction,
        final_value,
        costs: CostBreakdown {
            factory_cost,
            seller_commission: seller.total,
            manager_commission: manager.total,
            measurement_cost,
            assembly_cost,
            freight_cost,
            additional_costs_total,
            total_costs,
        },
        margin,
        margin_percent,
        commission_detail: CommissionDetail { seller, manager },
    })
}
