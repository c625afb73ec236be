use async_trait::async_trait;
use thiserror::Error;

use joinery_core::domain::commission::{CommissionRole, CommissionTier, TierTable};
use joinery_core::domain::store::{StoreConfig, StoreId};
use joinery_core::errors::{ApplicationError, DomainError};

pub mod commission_tier;
pub mod memory;
pub mod store_config;

pub use commission_tier::SqlCommissionTierRepository;
pub use memory::{InMemoryCommissionTierRepository, InMemoryStoreConfigRepository};
pub use store_config::SqlStoreConfigRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Validation(domain) => Self::Domain(domain),
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait StoreConfigRepository: Send + Sync {
    async fn find(&self, store_id: &StoreId) -> Result<Option<StoreConfig>, RepositoryError>;

    /// Returns `false` when a row for the store already exists. Never overwrites.
    async fn insert_if_absent(&self, config: &StoreConfig) -> Result<bool, RepositoryError>;

    /// Validated upsert for administrative edits.
    async fn save(&self, config: &StoreConfig) -> Result<(), RepositoryError>;

    /// Atomically advances `next_number` and returns the formatted number that
    /// was reserved, or `None` when the store has no configuration.
    async fn reserve_quote_number(
        &self,
        store_id: &StoreId,
        year: i32,
    ) -> Result<Option<String>, RepositoryError>;
}

#[async_trait]
pub trait CommissionTierRepository: Send + Sync {
    async fn list(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<Vec<CommissionTier>, RepositoryError>;

    /// Replaces the whole (store, role) table after the write-time overlap check.
    async fn replace(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
        table: &TierTable,
    ) -> Result<(), RepositoryError>;
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
