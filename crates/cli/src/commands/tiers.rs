use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use joinery_core::domain::commission::{CommissionRole, CommissionTier, TierTable};
use joinery_core::domain::store::StoreId;
use joinery_core::errors::ApplicationError;
use joinery_db::{CommissionTierRepository, SqlCommissionTierRepository};

use crate::commands::{build_runtime, load_config, open_database, to_data, CommandResult, Failure};

#[derive(Debug, Clone, Args)]
pub struct TiersArgs {
    #[arg(long)]
    pub store: String,
    #[arg(long, help = "Commission role the table applies to (seller|manager)")]
    pub role: CommissionRole,
    #[arg(long, help = "JSON array of {order, min_value, max_value, rate} objects")]
    pub file: PathBuf,
}

fn read_tiers(path: &Path) -> anyhow::Result<Vec<CommissionTier>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read tier file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse tier file `{}`", path.display()))
}

pub fn run(args: TiersArgs) -> CommandResult {
    let config = match load_config("tiers") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let tiers = match read_tiers(&args.file) {
        Ok(tiers) => tiers,
        Err(error) => return Failure::invalid_input(format!("{error:#}")).into_result("tiers"),
    };

    let table = match TierTable::new(tiers) {
        Ok(table) => table,
        Err(error) => return Failure::from(error).into_result("tiers"),
    };

    let runtime = match build_runtime("tiers") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let store_id = StoreId(args.store.clone());
    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let repository = SqlCommissionTierRepository::new(pool.clone());
        let replaced = repository.replace(&store_id, args.role, &table).await;
        pool.close().await;
        replaced.map_err(|error| Failure::from(ApplicationError::from(error)))
    });

    if let Err(failure) = result {
        return failure.into_result("tiers");
    }

    match to_data(table.tiers()) {
        Ok(data) => CommandResult::success_with_data(
            "tiers",
            format!(
                "imported {} {} tier(s) for store `{}`",
                table.len(),
                args.role.as_str(),
                args.store
            ),
            Some(data),
        ),
        Err(failure) => failure.into_result("tiers"),
    }
}
