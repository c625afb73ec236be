use rust_decimal::Decimal;

use crate::domain::approval::{ApprovalLevel, ApprovalOutcome, DiscountApprovalRequest};
use crate::domain::store::StoreId;
use crate::errors::DomainError;

pub trait DiscountPolicy: Send + Sync {
    fn evaluate(
        &self,
        discount_fraction: Decimal,
        seller_limit: Decimal,
        manager_limit: Decimal,
    ) -> ApprovalOutcome;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdDiscountPolicy;

impl DiscountPolicy for ThresholdDiscountPolicy {
    fn evaluate(
        &self,
        discount_fraction: Decimal,
        seller_limit: Decimal,
        manager_limit: Decimal,
    ) -> ApprovalOutcome {
        evaluate_discount(discount_fraction, seller_limit, manager_limit)
    }
}

/// Limits are inclusive and checked seller first, so an inverted pair of
/// limits still evaluates without error.
pub fn evaluate_discount(
    discount_fraction: Decimal,
    seller_limit: Decimal,
    manager_limit: Decimal,
) -> ApprovalOutcome {
    let required_level = if discount_fraction <= seller_limit {
        ApprovalLevel::None
    } else if discount_fraction <= manager_limit {
        ApprovalLevel::Manager
    } else {
        ApprovalLevel::Admin
    };

    ApprovalOutcome {
        requested_discount: discount_fraction,
        seller_limit,
        manager_limit,
        auto_approved: required_level == ApprovalLevel::None,
        requires_approval: required_level != ApprovalLevel::None,
        required_level,
    }
}

pub fn request_discount_approval(
    outcome: &ApprovalOutcome,
    store_id: StoreId,
    requested_by: impl Into<String>,
    justification: impl Into<String>,
) -> Result<DiscountApprovalRequest, DomainError> {
    if !outcome.requires_approval {
        return Err(DomainError::invalid_input(
            "requested_discount",
            format!(
                "discount {} is within the seller limit {} and can be applied directly",
                outcome.requested_discount, outcome.seller_limit
            ),
        ));
    }

    let justification = justification.into();
    if justification.trim().is_empty() {
        return Err(DomainError::invalid_input("justification", "must not be empty"));
    }

    Ok(DiscountApprovalRequest {
        store_id,
        requested_by: requested_by.into(),
        requested_discount: outcome.requested_discount,
        required_level: outcome.required_level,
        justification,
    })
}
