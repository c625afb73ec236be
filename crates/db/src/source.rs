use async_trait::async_trait;

use joinery_core::cpq::bootstrap::ConfigBootstrap;
use joinery_core::cpq::source::{PricingConfigSource, StoreConfigStore};
use joinery_core::domain::commission::{CommissionRole, CommissionTier};
use joinery_core::domain::store::{StoreConfig, StoreId};
use joinery_core::errors::ApplicationError;

use crate::repositories::{
    CommissionTierRepository, InMemoryCommissionTierRepository, InMemoryStoreConfigRepository,
    SqlCommissionTierRepository, SqlStoreConfigRepository,
};
use crate::DbPool;

/// [`PricingConfigSource`] backed by a store config repository and a tier
/// repository, with bootstrap on first read.
pub struct RepositoryConfigSource<S, T> {
    store_configs: S,
    tiers: T,
    bootstrap: ConfigBootstrap,
}

pub type SqlPricingConfigSource =
    RepositoryConfigSource<SqlStoreConfigRepository, SqlCommissionTierRepository>;

pub type InMemoryPricingConfigSource =
    RepositoryConfigSource<InMemoryStoreConfigRepository, InMemoryCommissionTierRepository>;

impl<S, T> RepositoryConfigSource<S, T> {
    pub fn new(store_configs: S, tiers: T, bootstrap: ConfigBootstrap) -> Self {
        Self { store_configs, tiers, bootstrap }
    }

    pub fn store_configs(&self) -> &S {
        &self.store_configs
    }

    pub fn tiers(&self) -> &T {
        &self.tiers
    }
}

impl SqlPricingConfigSource {
    pub fn from_pool(pool: DbPool, bootstrap: ConfigBootstrap) -> Self {
        Self::new(
            SqlStoreConfigRepository::new(pool.clone()),
            SqlCommissionTierRepository::new(pool),
            bootstrap,
        )
    }
}

impl InMemoryPricingConfigSource {
    pub fn in_memory(bootstrap: ConfigBootstrap) -> Self {
        Self::new(
            InMemoryStoreConfigRepository::default(),
            InMemoryCommissionTierRepository::default(),
            bootstrap,
        )
    }
}

#[async_trait]
impl<S, T> PricingConfigSource for RepositoryConfigSource<S, T>
where
    S: StoreConfigStore,
    T: CommissionTierRepository,
{
    async fn get_or_create_store_config(
        &self,
        store_id: &StoreId,
    ) -> Result<StoreConfig, ApplicationError> {
        self.bootstrap.resolve(&self.store_configs, store_id).await
    }

    async fn get_commission_tiers(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<Vec<CommissionTier>, ApplicationError> {
        Ok(self.tiers.list(store_id, role).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use sqlx::Row;

    use joinery_core::cpq::bootstrap::ConfigBootstrap;
    use joinery_core::cpq::source::PricingConfigSource;
    use joinery_core::cpq::QuotePricer;
    use joinery_core::domain::commission::{CommissionRole, CommissionTier, TierTable};
    use joinery_core::domain::quote::{QuotePricingInput, SellerId};
    use joinery_core::domain::store::{StoreDefaults, StoreId};
    use joinery_core::errors::ApplicationError;

    use super::{InMemoryPricingConfigSource, SqlPricingConfigSource};
    use crate::repositories::{CommissionTierRepository, StoreConfigRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn concurrent_first_access_creates_exactly_one_row() {
        let pool = pool().await;
        let source = Arc::new(SqlPricingConfigSource::from_pool(
            pool.clone(),
            ConfigBootstrap::default(),
        ));
        let store = StoreId("store-race".into());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let source = Arc::clone(&source);
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                source.get_or_create_store_config(&store).await
            }));
        }

        let mut configs = Vec::new();
        for handle in handles {
            configs.push(handle.await.expect("join").expect("config"));
        }

        assert!(configs.windows(2).all(|pair| pair[0] == pair[1]));
        let rows = sqlx::query("SELECT COUNT(*) AS count FROM store_config WHERE store_id = ?")
            .bind(&store.0)
            .fetch_one(&pool)
            .await
            .expect("count")
            .get::<i64, _>("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn in_memory_source_bootstraps_once_under_concurrency() {
        let source = Arc::new(InMemoryPricingConfigSource::in_memory(ConfigBootstrap::default()));
        let store = StoreId("store-1".into());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let source = Arc::clone(&source);
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                source.get_or_create_store_config(&store).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("config");
        }

        let found = source.store_configs().find(&store).await.expect("find");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn configured_defaults_are_used_for_new_stores() {
        let mut defaults = StoreDefaults::default();
        defaults.factory_cost_rate = Decimal::new(33, 2);
        let source =
            SqlPricingConfigSource::from_pool(pool().await, ConfigBootstrap::new(true, defaults));

        let config =
            source.get_or_create_store_config(&StoreId("store-1".into())).await.expect("config");

        assert_eq!(config.factory_cost_rate, Decimal::new(33, 2));
    }

    #[tokio::test]
    async fn disabled_bootstrap_reports_missing_config() {
        let source = SqlPricingConfigSource::from_pool(
            pool().await,
            ConfigBootstrap::new(false, StoreDefaults::default()),
        );

        let error = source
            .get_or_create_store_config(&StoreId("store-1".into()))
            .await
            .expect_err("no config");
        assert!(matches!(error, ApplicationError::ConfigurationMissing { .. }));
    }

    #[tokio::test]
    async fn pricing_through_sql_source_does_not_advance_numbering() {
        let source = SqlPricingConfigSource::from_pool(pool().await, ConfigBootstrap::default());
        let store = StoreId("store-1".into());
        let table = TierTable::new(vec![CommissionTier {
            order: 1,
            min_value: Decimal::ZERO,
            max_value: None,
            rate: Decimal::new(5, 2),
        }])
        .expect("valid");
        source.tiers().replace(&store, CommissionRole::Seller, &table).await.expect("tiers");

        let pricer = QuotePricer::new(source);
        let input =
            QuotePricingInput::new(store.clone(), SellerId("seller-1".into()), Decimal::from(10_000));

        let first = pricer.price_quote(&input).await.expect("price");
        let second = pricer.price_quote(&input).await.expect("price");

        assert_eq!(first, second);
        assert_eq!(first.costs.seller_commission, Decimal::from(500));
        let stored =
            pricer.source().store_configs().find(&store).await.expect("find").expect("exists");
        assert_eq!(stored.next_number, 1);
    }
}
