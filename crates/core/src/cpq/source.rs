use async_trait::async_trait;

use crate::domain::commission::{CommissionRole, CommissionTier};
use crate::domain::store::{StoreConfig, StoreId};
use crate::errors::ApplicationError;

/// What the pricer needs from persistence.
#[async_trait]
pub trait PricingConfigSource: Send + Sync {
    /// Returns the live config, creating it from defaults when absent.
    async fn get_or_create_store_config(
        &self,
        store_id: &StoreId,
    ) -> Result<StoreConfig, ApplicationError>;

    /// Tiers ordered by `order`. An empty list is a valid answer.
    async fn get_commission_tiers(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<Vec<CommissionTier>, ApplicationError>;
}

/// Keyed store config storage used by [`crate::cpq::bootstrap::ConfigBootstrap`].
///
/// `insert_store_config` must report a lost create race as
/// [`ApplicationError::ConcurrentConfigCreation`] and must never overwrite an
/// existing row.
#[async_trait]
pub trait StoreConfigStore: Send + Sync {
    async fn find_store_config(
        &self,
        store_id: &StoreId,
    ) -> Result<Option<StoreConfig>, ApplicationError>;

    async fn insert_store_config(&self, config: &StoreConfig) -> Result<(), ApplicationError>;
}
