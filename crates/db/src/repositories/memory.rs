use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tokio::sync::RwLock;

use joinery_core::cpq::numbering::format_quote_number;
use joinery_core::cpq::source::StoreConfigStore;
use joinery_core::domain::commission::{CommissionRole, CommissionTier, TierTable};
use joinery_core::domain::store::{StoreConfig, StoreId};
use joinery_core::errors::ApplicationError;

use super::{CommissionTierRepository, RepositoryError, StoreConfigRepository};

#[derive(Default)]
pub struct InMemoryStoreConfigRepository {
    configs: RwLock<HashMap<String, StoreConfig>>,
}

#[async_trait::async_trait]
impl StoreConfigRepository for InMemoryStoreConfigRepository {
    async fn find(&self, store_id: &StoreId) -> Result<Option<StoreConfig>, RepositoryError> {
        let configs = self.configs.read().await;
        Ok(configs.get(&store_id.0).cloned())
    }

    async fn insert_if_absent(&self, config: &StoreConfig) -> Result<bool, RepositoryError> {
        let mut configs = self.configs.write().await;
        match configs.entry(config.store_id.0.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(config.clone());
                Ok(true)
            }
        }
    }

    async fn save(&self, config: &StoreConfig) -> Result<(), RepositoryError> {
        config.validate()?;
        let mut configs = self.configs.write().await;
        configs.insert(config.store_id.0.clone(), config.clone());
        Ok(())
    }

    async fn reserve_quote_number(
        &self,
        store_id: &StoreId,
        year: i32,
    ) -> Result<Option<String>, RepositoryError> {
        let mut configs = self.configs.write().await;
        let Some(config) = configs.get_mut(&store_id.0) else {
            return Ok(None);
        };

        let reserved = config.next_number;
        config.next_number += 1;
        Ok(Some(format_quote_number(
            config.numbering_format,
            &config.numbering_prefix,
            reserved,
            year,
        )))
    }
}

#[async_trait::async_trait]
impl StoreConfigStore for InMemoryStoreConfigRepository {
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

#[derive(Default)]
pub struct InMemoryCommissionTierRepository {
    tiers: RwLock<HashMap<(String, CommissionRole), Vec<CommissionTier>>>,
}

#[async_trait::async_trait]
impl CommissionTierRepository for InMemoryCommissionTierRepository {
    async fn list(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<Vec<CommissionTier>, RepositoryError> {
        let tiers = self.tiers.read().await;
        Ok(tiers.get(&(store_id.0.clone(), role)).cloned().unwrap_or_default())
    }

    async fn replace(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
        table: &TierTable,
    ) -> Result<(), RepositoryError> {
        table.ensure_non_overlapping()?;
        let mut tiers = self.tiers.write().await;
        tiers.insert((store_id.0.clone(), role), table.tiers().to_vec());
        Ok(())
    }
}
