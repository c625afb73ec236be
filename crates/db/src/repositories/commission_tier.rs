use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use joinery_core::domain::commission::{CommissionRole, CommissionTier, TierTable};
use joinery_core::domain::store::StoreId;

use super::{decode_err, CommissionTierRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCommissionTierRepository {
    pool: DbPool,
}

impl SqlCommissionTierRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_tier(row: &sqlx::sqlite::SqliteRow) -> Result<CommissionTier, RepositoryError> {
    let order: i64 = row.try_get("tier_order").map_err(decode_err)?;
    let min_value: String = row.try_get("min_value").map_err(decode_err)?;
    let max_value: Option<String> = row.try_get("max_value").map_err(decode_err)?;
    let rate: String = row.try_get("rate").map_err(decode_err)?;

    Ok(CommissionTier {
        order: u32::try_from(order).map_err(decode_err)?,
        min_value: parse_decimal("min_value", &min_value)?,
        max_value: max_value.as_deref().map(|raw| parse_decimal("max_value", raw)).transpose()?,
        rate: parse_decimal("rate", &rate)?,
    })
}

#[async_trait]
impl CommissionTierRepository for SqlCommissionTierRepository {
    async fn list(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<Vec<CommissionTier>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT tier_order, min_value, max_value, rate
             FROM commission_tier
             WHERE store_id = ? AND role = ?
             ORDER BY tier_order ASC",
        )
        .bind(&store_id.0)
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_tier).collect::<Result<Vec<_>, _>>()
    }

    async fn replace(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
        table: &TierTable,
    ) -> Result<(), RepositoryError> {
        table.ensure_non_overlapping()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM commission_tier WHERE store_id = ? AND role = ?")
            .bind(&store_id.0)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;

        for tier in table.tiers() {
            sqlx::query(
                "INSERT INTO commission_tier (store_id, role, tier_order, min_value, max_value, rate)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&store_id.0)
            .bind(role.as_str())
            .bind(i64::from(tier.order))
            .bind(tier.min_value.to_string())
            .bind(tier.max_value.map(|value| value.to_string()))
            .bind(tier.rate.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
