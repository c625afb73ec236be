use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingFormat {
    Sequential,
    YearSequential,
    Custom,
}

impl NumberingFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::YearSequential => "year_sequential",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for NumberingFormat {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "year_sequential" => Ok(Self::YearSequential),
            "custom" => Ok(Self::Custom),
            other => Err(DomainError::InvalidStoreConfig(format!(
                "unsupported numbering format `{other}` (expected sequential|year_sequential|custom)"
            ))),
        }
    }
}

/// Values a store starts with when its configuration is created on first use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDefaults {
    pub factory_cost_rate: Decimal,
    pub fixed_measurement_cost: Decimal,
    pub freight_rate: Decimal,
    pub seller_discount_limit: Decimal,
    pub manager_discount_limit: Decimal,
    pub numbering_format: NumberingFormat,
    pub numbering_prefix: String,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            factory_cost_rate: Decimal::new(40, 2),
            fixed_measurement_cost: Decimal::new(20_000, 2),
            freight_rate: Decimal::new(2, 2),
            seller_discount_limit: Decimal::new(15, 2),
            manager_discount_limit: Decimal::new(25, 2),
            numbering_format: NumberingFormat::Sequential,
            numbering_prefix: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store_id: StoreId,
    pub factory_cost_rate: Decimal,
    pub fixed_measurement_cost: Decimal,
    pub freight_rate: Decimal,
    pub seller_discount_limit: Decimal,
    pub manager_discount_limit: Decimal,
    pub numbering_format: NumberingFormat,
    pub numbering_prefix: String,
    pub next_number: i64,
}

impl StoreConfig {
    pub fn from_defaults(store_id: StoreId, defaults: &StoreDefaults) -> Self {
        Self {
            store_id,
            factory_cost_rate: defaults.factory_cost_rate,
            fixed_measurement_cost: defaults.fixed_measurement_cost,
            freight_rate: defaults.freight_rate,
            seller_discount_limit: defaults.seller_discount_limit,
            manager_discount_limit: defaults.manager_discount_limit,
            numbering_format: defaults.numbering_format,
            numbering_prefix: defaults.numbering_prefix.clone(),
            next_number: 1,
        }
    }

    /// Write-time checks. Pricing itself never re-validates a stored config.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.store_id.0.trim().is_empty() {
            return Err(DomainError::InvalidStoreConfig("store_id must not be empty".to_string()));
        }

        let fractions = [
            ("factory_cost_rate", self.factory_cost_rate),
            ("freight_rate", self.freight_rate),
            ("seller_discount_limit", self.seller_discount_limit),
            ("manager_discount_limit", self.manager_discount_limit),
        ];
        for (field, value) in fractions {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(DomainError::InvalidStoreConfig(format!(
                    "{field} must be in range 0..=1, got {value}"
                )));
            }
        }

        if self.fixed_measurement_cost < Decimal::ZERO {
            return Err(DomainError::InvalidStoreConfig(
                "fixed_measurement_cost must not be negative".to_string(),
            ));
        }

        if self.manager_discount_limit < self.seller_discount_limit {
            return Err(DomainError::InvalidStoreConfig(format!(
                "manager_discount_limit ({}) must not be below seller_discount_limit ({})",
                self.manager_discount_limit, self.seller_discount_limit
            )));
        }

        if self.next_number < 1 {
            return Err(DomainError::InvalidStoreConfig(
                "next_number must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{NumberingFormat, StoreConfig, StoreDefaults, StoreId};
    use crate::errors::DomainError;

    #[test]
    fn documented_defaults_are_applied_to_new_store() {
        let config = StoreConfig::from_defaults(StoreId("store-1".into()), &StoreDefaults::default());

        assert_eq!(config.factory_cost_rate, Decimal::new(40, 2));
        assert_eq!(config.fixed_measurement_cost, Decimal::new(200, 0));
        assert_eq!(config.freight_rate, Decimal::new(2, 2));
        assert_eq!(config.seller_discount_limit, Decimal::new(15, 2));
        assert_eq!(config.manager_discount_limit, Decimal::new(25, 2));
        assert_eq!(config.numbering_format, NumberingFormat::Sequential);
        assert_eq!(config.next_number, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_inverted_discount_limits() {
        let mut config =
            StoreConfig::from_defaults(StoreId("store-1".into()), &StoreDefaults::default());
        config.manager_discount_limit = Decimal::new(10, 2);

        let error = config.validate().expect_err("manager below seller should fail");
        assert!(matches!(error, DomainError::InvalidStoreConfig(ref m) if m.contains("manager")));
    }

    #[test]
    fn validation_rejects_rates_outside_unit_interval() {
        let mut config =
            StoreConfig::from_defaults(StoreId("store-1".into()), &StoreDefaults::default());
        config.freight_rate = Decimal::new(150, 2);

        assert!(config.validate().is_err());
    }

    #[test]
    fn numbering_format_parses_case_insensitively() {
        assert_eq!("YEAR_SEQUENTIAL".parse::<NumberingFormat>(), Ok(NumberingFormat::YearSequential));
        assert!("weekly".parse::<NumberingFormat>().is_err());
    }
}
