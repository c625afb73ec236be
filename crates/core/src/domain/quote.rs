use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalOutcome;
use crate::domain::commission::CommissionResult;
use crate::domain::store::{StoreConfig, StoreId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePricingInput {
    pub store_id: StoreId,
    pub seller_id: SellerId,
    pub base_value: Decimal,
    pub discount_fraction: Decimal,
    #[serde(default)]
    pub additional_costs: Vec<AdditionalCost>,
    #[serde(default)]
    pub assembly_cost: Decimal,
}

impl QuotePricingInput {
    pub fn new(store_id: StoreId, seller_id: SellerId, base_value: Decimal) -> Self {
        Self {
            store_id,
            seller_id,
            base_value,
            discount_fraction: Decimal::ZERO,
            additional_costs: Vec::new(),
            assembly_cost: Decimal::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.store_id.0.trim().is_empty() {
            return Err(DomainError::invalid_input("store_id", "must not be empty"));
        }
        if self.base_value < Decimal::ZERO {
            return Err(DomainError::invalid_input("base_value", "must not be negative"));
        }
        validate_discount_fraction(self.discount_fraction)?;
        if self.assembly_cost < Decimal::ZERO {
            return Err(DomainError::invalid_input("assembly_cost", "must not be negative"));
        }
        if let Some((index, _)) = self
            .additional_costs
            .iter()
            .enumerate()
            .find(|(_, cost)| cost.amount < Decimal::ZERO)
        {
            return Err(DomainError::invalid_input(
                format!("additional_costs[{index}].amount"),
                "must not be negative",
            ));
        }

        Ok(())
    }
}

pub fn validate_discount_fraction(discount_fraction: Decimal) -> Result<(), DomainError> {
    if discount_fraction < Decimal::ZERO || discount_fraction >= Decimal::ONE {
        return Err(DomainError::invalid_input(
            "discount_fraction",
            format!("must be in range [0, 1), got {discount_fraction}"),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub factory_cost: Decimal,
    pub seller_commission: Decimal,
    pub manager_commission: Decimal,
    pub measurement_cost: Decimal,
    pub assembly_cost: Decimal,
    pub freight_cost: Decimal,
    pub additional_costs_total: Decimal,
    pub total_costs: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDetail {
    pub seller: CommissionResult,
    pub manager: CommissionResult,
}

/// Everything the cost pipeline derives before an approval decision is attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostAggregation {
    pub base_value: Decimal,
    pub discount_fraction: Decimal,
    pub final_value: Decimal,
    pub costs: CostBreakdown,
    pub margin: Decimal,
    pub margin_percent: Decimal,
    pub commission_detail: CommissionDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_value: Decimal,
    pub discount_fraction: Decimal,
    pub final_value: Decimal,
    pub costs: CostBreakdown,
    pub margin: Decimal,
    pub margin_percent: Decimal,
    pub approval: ApprovalOutcome,
    pub config_snapshot: StoreConfig,
    pub commission_detail: CommissionDetail,
}

impl PricingResult {
    pub fn assemble(
        aggregation: CostAggregation,
        approval: ApprovalOutcome,
        config_snapshot: StoreConfig,
    ) -> Self {
        Self {
            base_value: aggregation.base_value,
            discount_fraction: aggregation.discount_fraction,
            final_value: aggregation.final_value,
            costs: aggregation.costs,
            margin: aggregation.margin,
            margin_percent: aggregation.margin_percent,
            approval,
            config_snapshot,
            commission_detail: aggregation.commission_detail,
        }
    }

    pub fn discount_amount(&self) -> Decimal {
        self.base_value * self.discount_fraction
    }
}
