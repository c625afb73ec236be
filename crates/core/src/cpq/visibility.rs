use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalOutcome;
use crate::domain::identity::{CallerIdentity, CallerRole};
use crate::domain::quote::{CostBreakdown, PricingResult, SellerId};
use crate::domain::store::StoreId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub base_value: Decimal,
    pub discount_amount: Decimal,
    pub final_value: Decimal,
    pub approval: ApprovalOutcome,
}

/// Role-visible subset of a [`PricingResult`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PricingView {
    Summary {
        #[serde(flatten)]
        summary: FinancialSummary,
    },
    Detailed {
        #[serde(flatten)]
        summary: FinancialSummary,
        costs: CostBreakdown,
        margin: Decimal,
        margin_percent: Decimal,
    },
}

impl PricingView {
    pub fn summary(&self) -> &FinancialSummary {
        match self {
            Self::Summary { summary } | Self::Detailed { summary, .. } => summary,
        }
    }

    pub fn is_detailed(&self) -> bool {
        matches!(self, Self::Detailed { .. })
    }
}

/// Costs and margin are only exposed to ADMIN_MASTER.
pub fn project_for_role(result: &PricingResult, role: CallerRole) -> PricingView {
    let summary = FinancialSummary {
        base_value: result.base_value,
        discount_amount: result.discount_amount(),
        final_value: result.final_value,
        approval: result.approval.clone(),
    };

    match role {
        CallerRole::Seller | CallerRole::Manager => PricingView::Summary { summary },
        CallerRole::AdminMaster => PricingView::Detailed {
            summary,
            costs: result.costs.clone(),
            margin: result.margin,
            margin_percent: result.margin_percent,
        },
    }
}

pub fn can_access_quote(
    caller: &CallerIdentity,
    quote_store_id: &StoreId,
    quote_seller_id: &SellerId,
) -> bool {
    match caller.role {
        CallerRole::AdminMaster => true,
        CallerRole::Manager => &caller.store_id == quote_store_id,
        CallerRole::Seller => {
            &caller.store_id == quote_store_id && &caller.user_id == quote_seller_id
        }
    }
}
