use tracing::{info, warn};

use crate::cpq::source::StoreConfigStore;
use crate::domain::store::{StoreConfig, StoreDefaults, StoreId};
use crate::errors::ApplicationError;

/// Create-if-absent, else fetch. A lost insert race is recovered by reading
/// the winner's row exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigBootstrap {
    pub enabled: bool,
    pub defaults: StoreDefaults,
}

impl Default for ConfigBootstrap {
    fn default() -> Self {
        Self { enabled: true, defaults: StoreDefaults::default() }
    }
}

impl ConfigBootstrap {
    pub fn new(enabled: bool, defaults: StoreDefaults) -> Self {
        Self { enabled, defaults }
    }

    pub async fn resolve<S>(
        &self,
        store: &S,
        store_id: &StoreId,
    ) -> Result<StoreConfig, ApplicationError>
    where
        S: StoreConfigStore + ?Sized,
    {
        if let Some(config) = store.find_store_config(store_id).await? {
            return Ok(config);
        }

        if !self.enabled {
            return Err(ApplicationError::ConfigurationMissing { store_id: store_id.0.clone() });
        }

        // Bad defaults are an operator fault, not a caller one.
        let config = StoreConfig::from_defaults(store_id.clone(), &self.defaults);
        config.validate().map_err(|error| {
            ApplicationError::Configuration(format!("store defaults rejected: {error}"))
        })?;

        match store.insert_store_config(&config).await {
            Ok(()) => {
                info!(
                    event_name = "pricing.store_config.bootstrapped",
                    store_id = %store_id,
                    "created default store configuration"
                );
                Ok(config)
            }
            Err(ApplicationError::ConcurrentConfigCreation { .. }) => {
                warn!(
                    event_name = "pricing.store_config.create_conflict",
                    store_id = %store_id,
                    "store configuration was created concurrently; re-reading"
                );
                store.find_store_config(store_id).await?.ok_or_else(|| {
                    ApplicationError::ConfigurationMissing { store_id: store_id.0.clone() }
                })
            }
            Err(error) => Err(error),
        }
    }
}
