pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod source;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    CommissionTierRepository, InMemoryCommissionTierRepository, InMemoryStoreConfigRepository,
    RepositoryError, SqlCommissionTierRepository, SqlStoreConfigRepository, StoreConfigRepository,
};
pub use source::{InMemoryPricingConfigSource, RepositoryConfigSource, SqlPricingConfigSource};
