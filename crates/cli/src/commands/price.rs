use std::str::FromStr;

use clap::Args;
use rust_decimal::Decimal;

use joinery_core::cpq::visibility::project_for_role;
use joinery_core::cpq::QuotePricer;
use joinery_core::domain::identity::CallerRole;
use joinery_core::domain::quote::{AdditionalCost, QuotePricingInput, SellerId};
use joinery_core::domain::store::StoreId;
use joinery_db::SqlPricingConfigSource;

use crate::commands::{
    bootstrap_for, build_runtime, load_config, open_database, to_data, CommandResult, Failure,
};

#[derive(Debug, Clone, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Store whose configuration and tiers are used")]
    pub store: String,
    #[arg(long, help = "Seller the quote is priced for")]
    pub seller: String,
    #[arg(long, help = "Pre-discount value of the selected work items")]
    pub base_value: Decimal,
    #[arg(long, default_value = "0", help = "Requested discount as a fraction, e.g. 0.15")]
    pub discount: Decimal,
    #[arg(long, default_value = "0")]
    pub assembly_cost: Decimal,
    #[arg(
        long = "additional-cost",
        value_parser = parse_additional_cost,
        help = "Ad-hoc cost as `description=amount`; repeatable"
    )]
    pub additional_costs: Vec<AdditionalCost>,
    #[arg(long, help = "Project the result for a caller role (seller|manager|admin-master)")]
    pub role: Option<CallerRole>,
}

impl PriceArgs {
    fn to_input(&self) -> QuotePricingInput {
        QuotePricingInput {
            store_id: StoreId(self.store.clone()),
            seller_id: SellerId(self.seller.clone()),
            base_value: self.base_value,
            discount_fraction: self.discount,
            additional_costs: self.additional_costs.clone(),
            assembly_cost: self.assembly_cost,
        }
    }
}

pub fn parse_additional_cost(raw: &str) -> Result<AdditionalCost, String> {
    let (description, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected `description=amount`, got `{raw}`"))?;
    let description = description.trim();
    if description.is_empty() {
        return Err("additional cost description must not be empty".to_string());
    }
    let amount = Decimal::from_str(amount.trim())
        .map_err(|error| format!("invalid amount `{}`: {error}", amount.trim()))?;

    Ok(AdditionalCost { description: description.to_string(), amount })
}

pub fn run(args: PriceArgs) -> CommandResult {
    let config = match load_config("price") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime("price") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let input = args.to_input();
    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let source = SqlPricingConfigSource::from_pool(pool.clone(), bootstrap_for(&config));
        let pricer = QuotePricer::new(source);

        let priced = pricer.price_quote(&input).await;
        pool.close().await;
        Ok::<_, Failure>(priced?)
    });

    let priced = match result {
        Ok(priced) => priced,
        Err(failure) => return failure.into_result("price"),
    };

    let data = match args.role {
        Some(role) => to_data(&project_for_role(&priced, role)),
        None => to_data(&priced),
    };

    match data {
        Ok(data) => CommandResult::success_with_data(
            "price",
            format!(
                "quote priced for store `{}`: final value {}, approval {}",
                args.store,
                priced.final_value,
                priced.approval.required_level.as_str()
            ),
            Some(data),
        ),
        Err(failure) => failure.into_result("price"),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::parse_additional_cost;

    #[test]
    fn additional_cost_parses_description_and_amount() {
        let cost = parse_additional_cost("Crane rental = 350.50").expect("valid cost");
        assert_eq!(cost.description, "Crane rental");
        assert_eq!(cost.amount, Decimal::new(35_050, 2));
    }

    #[test]
    fn additional_cost_requires_separator_and_decimal() {
        assert!(parse_additional_cost("Crane").is_err());
        assert!(parse_additional_cost("Crane=lots").is_err());
        assert!(parse_additional_cost("=10").is_err());
    }
}
