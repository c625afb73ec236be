use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::debug;

use joinery_core::cpq::numbering::format_quote_number;
use joinery_core::cpq::source::StoreConfigStore;
use joinery_core::domain::store::{NumberingFormat, StoreConfig, StoreId};
use joinery_core::errors::ApplicationError;

use super::{decode_err, RepositoryError, StoreConfigRepository};
use crate::DbPool;

const SELECT_COLUMNS: &str = "SELECT store_id, factory_cost_rate, fixed_measurement_cost, freight_rate,
        seller_discount_limit, manager_discount_limit, numbering_format,
        numbering_prefix, next_number
 FROM store_config";

pub struct SqlStoreConfigRepository {
    pool: DbPool,
}

impl SqlStoreConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decimal_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column).map_err(decode_err)?;
    Decimal::from_str(&raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_store_config(row: &sqlx::sqlite::SqliteRow) -> Result<StoreConfig, RepositoryError> {
    let store_id: String = row.try_get("store_id").map_err(decode_err)?;
    let numbering_format: String = row.try_get("numbering_format").map_err(decode_err)?;
    let numbering_prefix: String = row.try_get("numbering_prefix").map_err(decode_err)?;
    let next_number: i64 = row.try_get("next_number").map_err(decode_err)?;

    Ok(StoreConfig {
        store_id: StoreId(store_id),
        factory_cost_rate: decimal_column(row, "factory_cost_rate")?,
        fixed_measurement_cost: decimal_column(row, "fixed_measurement_cost")?,
        freight_rate: decimal_column(row, "freight_rate")?,
        seller_discount_limit: decimal_column(row, "seller_discount_limit")?,
        manager_discount_limit: decimal_column(row, "manager_discount_limit")?,
        numbering_format: NumberingFormat::from_str(&numbering_format).map_err(decode_err)?,
        numbering_prefix,
        next_number,
    })
}

#[async_trait]
impl StoreConfigRepository for SqlStoreConfigRepository {
    async fn find(&self, store_id: &StoreId) -> Result<Option<StoreConfig>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE store_id = ?"))
            .bind(&store_id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_store_config(r)?)),
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, config: &StoreConfig) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO store_config (store_id, factory_cost_rate, fixed_measurement_cost,
                                       freight_rate, seller_discount_limit, manager_discount_limit,
                                       numbering_format, numbering_prefix, next_number)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(store_id) DO NOTHING",
        )
        .bind(&config.store_id.0)
        .bind(config.factory_cost_rate.to_string())
        .bind(config.fixed_measurement_cost.to_string())
        .bind(config.freight_rate.to_string())
        .bind(config.seller_discount_limit.to_string())
        .bind(config.manager_discount_limit.to_string())
        .bind(config.numbering_format.as_str())
        .bind(&config.numbering_prefix)
        .bind(config.next_number)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, config: &StoreConfig) -> Result<(), RepositoryError> {
        config.validate()?;

        sqlx::query(
            "INSERT INTO store_config (store_id, factory_cost_rate, fixed_measurement_cost,
                                       freight_rate, seller_discount_limit, manager_discount_limit,
                                       numbering_format, numbering_prefix, next_number)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(store_id) DO UPDATE SET
                 factory_cost_rate = excluded.factory_cost_rate,
                 fixed_measurement_cost = excluded.fixed_measurement_cost,
                 freight_rate = excluded.freight_rate,
                 seller_discount_limit = excluded.seller_discount_limit,
                 manager_discount_limit = excluded.manager_discount_limit,
                 numbering_format = excluded.numbering_format,
                 numbering_prefix = excluded.numbering_prefix,
                 next_number = excluded.next_number,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(&config.store_id.0)
        .bind(config.factory_cost_rate.to_string())
        .bind(config.fixed_measurement_cost.to_string())
        .bind(config.freight_rate.to_string())
        .bind(config.seller_discount_limit.to_string())
        .bind(config.manager_discount_limit.to_string())
        .bind(config.numbering_format.as_str())
        .bind(&config.numbering_prefix)
        .bind(config.next_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reserve_quote_number(
        &self,
        store_id: &StoreId,
        year: i32,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query(
            "UPDATE store_config
             SET next_number = next_number + 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE store_id = ?
             RETURNING next_number - 1 AS reserved, numbering_format, numbering_prefix",
        )
        .bind(&store_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let reserved: i64 = row.try_get("reserved").map_err(decode_err)?;
        let format: String = row.try_get("numbering_format").map_err(decode_err)?;
        let prefix: String = row.try_get("numbering_prefix").map_err(decode_err)?;
        let format = NumberingFormat::from_str(&format).map_err(decode_err)?;

        debug!(
            event_name = "persistence.quote_number.reserved",
            store_id = %store_id,
            reserved,
            "quote number reserved"
        );

        Ok(Some(format_quote_number(format, &prefix, reserved, year)))
    }
}

#[async_trait]
impl StoreConfigStore for SqlStoreConfigRepository {
    async fn find_store_config(
        &self,
        store_id: &StoreId,
    ) -> Result<Option<StoreConfig>, ApplicationError> {
        Ok(self.find(store_id).await?)
    }

    async fn insert_store_config(&self, config: &StoreConfig) -> Result<(), ApplicationError> {
        if self.insert_if_absent(config).await? {
            Ok(())
        } else {
            Err(ApplicationError::ConcurrentConfigCreation { store_id: config.store_id.0.clone() })
        }
    }
}
