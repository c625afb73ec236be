use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use joinery_core::cpq::policy::request_discount_approval;
use joinery_core::cpq::QuotePricer;
use joinery_core::domain::approval::{ApprovalOutcome, DiscountApprovalRequest, QuoteApprovalStatus};
use joinery_core::domain::store::StoreId;
use joinery_db::SqlPricingConfigSource;

use crate::commands::{
    bootstrap_for, build_runtime, load_config, open_database, to_data, CommandResult, Failure,
};

#[derive(Debug, Clone, Args)]
pub struct DiscountArgs {
    #[arg(long)]
    pub store: String,
    #[arg(long, help = "Requested discount as a fraction, e.g. 0.20")]
    pub discount: Decimal,
    #[arg(long, requires = "justification", help = "User asking for the escalation")]
    pub requested_by: Option<String>,
    #[arg(
        long,
        requires = "requested_by",
        help = "Build an approval request with this justification"
    )]
    pub justification: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiscountPreview {
    outcome: ApprovalOutcome,
    quote_status: QuoteApprovalStatus,
    request: Option<DiscountApprovalRequest>,
}

pub fn run(args: DiscountArgs) -> CommandResult {
    let config = match load_config("discount") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime("discount") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let store_id = StoreId(args.store.clone());
    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let source = SqlPricingConfigSource::from_pool(pool.clone(), bootstrap_for(&config));
        let outcome = QuotePricer::new(source).preview_discount(&store_id, args.discount).await;
        pool.close().await;
        Ok::<_, Failure>(outcome?)
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(failure) => return failure.into_result("discount"),
    };

    let request = match (&args.requested_by, &args.justification) {
        (Some(requested_by), Some(justification)) => {
            match request_discount_approval(
                &outcome,
                store_id,
                requested_by.as_str(),
                justification.as_str(),
            ) {
                Ok(request) => Some(request),
                Err(error) => return Failure::from(error).into_result("discount"),
            }
        }
        _ => None,
    };

    let message = if outcome.requires_approval {
        format!(
            "discount {} requires {} approval",
            outcome.requested_discount,
            outcome.required_level.as_str()
        )
    } else {
        format!("discount {} is within the seller limit", outcome.requested_discount)
    };
    let preview = DiscountPreview { quote_status: outcome.quote_status(), outcome, request };

    match to_data(&preview) {
        Ok(data) => CommandResult::success_with_data("discount", message, Some(data)),
        Err(failure) => failure.into_result("discount"),
    }
}
