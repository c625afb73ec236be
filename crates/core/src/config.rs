use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::store::{NumberingFormat, StoreConfig, StoreDefaults, StoreId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PricingConfig {
    /// Create a default store configuration the first time a store is priced.
    pub auto_create_store_config: bool,
    pub defaults: StoreDefaults,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub auto_create_store_config: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid decimal for `{key}`: `{value}`")]
    InvalidDecimal { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://joinery.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig {
                auto_create_store_config: true,
                defaults: StoreDefaults::default(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("joinery.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(auto_create) = pricing.auto_create_store_config {
                self.pricing.auto_create_store_config = auto_create;
            }
            if let Some(defaults) = pricing.defaults {
                let target = &mut self.pricing.defaults;
                if let Some(value) = defaults.factory_cost_rate {
                    target.factory_cost_rate =
                        parse_decimal("pricing.defaults.factory_cost_rate", &value)?;
                }
                if let Some(value) = defaults.fixed_measurement_cost {
                    target.fixed_measurement_cost =
                        parse_decimal("pricing.defaults.fixed_measurement_cost", &value)?;
                }
                if let Some(value) = defaults.freight_rate {
                    target.freight_rate = parse_decimal("pricing.defaults.freight_rate", &value)?;
                }
                if let Some(value) = defaults.seller_discount_limit {
                    target.seller_discount_limit =
                        parse_decimal("pricing.defaults.seller_discount_limit", &value)?;
                }
                if let Some(value) = defaults.manager_discount_limit {
                    target.manager_discount_limit =
                        parse_decimal("pricing.defaults.manager_discount_limit", &value)?;
                }
                if let Some(format) = defaults.numbering_format {
                    target.numbering_format = format;
                }
                if let Some(prefix) = defaults.numbering_prefix {
                    target.numbering_prefix = prefix;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("JOINERY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("JOINERY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("JOINERY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("JOINERY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("JOINERY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("JOINERY_PRICING_AUTO_CREATE_STORE_CONFIG") {
            self.pricing.auto_create_store_config =
                parse_bool("JOINERY_PRICING_AUTO_CREATE_STORE_CONFIG", &value)?;
        }
        let defaults = &mut self.pricing.defaults;
        if let Some(value) = read_env("JOINERY_PRICING_FACTORY_COST_RATE") {
            defaults.factory_cost_rate = parse_decimal("JOINERY_PRICING_FACTORY_COST_RATE", &value)?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_FIXED_MEASUREMENT_COST") {
            defaults.fixed_measurement_cost =
                parse_decimal("JOINERY_PRICING_FIXED_MEASUREMENT_COST", &value)?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_FREIGHT_RATE") {
            defaults.freight_rate = parse_decimal("JOINERY_PRICING_FREIGHT_RATE", &value)?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_SELLER_DISCOUNT_LIMIT") {
            defaults.seller_discount_limit =
                parse_decimal("JOINERY_PRICING_SELLER_DISCOUNT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_MANAGER_DISCOUNT_LIMIT") {
            defaults.manager_discount_limit =
                parse_decimal("JOINERY_PRICING_MANAGER_DISCOUNT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_NUMBERING_FORMAT") {
            defaults.numbering_format = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "JOINERY_PRICING_NUMBERING_FORMAT".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("JOINERY_PRICING_NUMBERING_PREFIX") {
            defaults.numbering_prefix = value;
        }

        let log_level =
            read_env("JOINERY_LOGGING_LEVEL").or_else(|| read_env("JOINERY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("JOINERY_LOGGING_FORMAT").or_else(|| read_env("JOINERY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(auto_create) = overrides.auto_create_store_config {
            self.pricing.auto_create_store_config = auto_create;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("joinery.toml"), PathBuf::from("config/joinery.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    // Defaults must produce a config that would pass write-time validation.
    StoreConfig::from_defaults(StoreId("defaults".to_string()), &pricing.defaults)
        .validate()
        .map_err(|error| ConfigError::Validation(format!("pricing.defaults: {error}")))
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidDecimal {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    auto_create_store_config: Option<bool>,
    defaults: Option<StoreDefaultsPatch>,
}

/// Decimal values are kept as strings so they parse exactly.
#[derive(Debug, Default, Deserialize)]
struct StoreDefaultsPatch {
    factory_cost_rate: Option<String>,
    fixed_measurement_cost: Option<String>,
    freight_rate: Option<String>,
    seller_discount_limit: Option<String>,
    manager_discount_limit: Option<String>,
    numbering_format: Option<NumberingFormat>,
    numbering_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::store::NumberingFormat;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_documented_store_defaults() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.auto_create_store_config, "bootstrap should be enabled by default")?;
        ensure(
            config.pricing.defaults.factory_cost_rate == Decimal::new(40, 2),
            "default factory rate should be 0.40",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_JOINERY_DB_PATH", "/tmp/joinery-interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("joinery.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://${TEST_JOINERY_DB_PATH}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite:///tmp/joinery-interpolated.db",
                "database url should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_JOINERY_DB_PATH"]);
        result
    }

    #[test]
    fn store_defaults_are_read_exactly_from_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("joinery.toml");
        fs::write(
            &path,
            r#"
[pricing]
auto_create_store_config = false

[pricing.defaults]
factory_cost_rate = "0.35"
fixed_measurement_cost = "150.50"
seller_discount_limit = "0.10"
manager_discount_limit = "0.30"
numbering_format = "year_sequential"
numbering_prefix = "ORC-"
"#,
        )
        .map_err(|err| err.to_string())?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;
        let defaults = &config.pricing.defaults;

        ensure(!config.pricing.auto_create_store_config, "bootstrap should be disabled by file")?;
        ensure(defaults.factory_cost_rate == Decimal::new(35, 2), "factory rate from file")?;
        ensure(defaults.fixed_measurement_cost == Decimal::new(15_050, 2), "measurement from file")?;
        ensure(defaults.freight_rate == Decimal::new(2, 2), "freight keeps default")?;
        ensure(
            defaults.numbering_format == NumberingFormat::YearSequential,
            "numbering format from file",
        )?;
        ensure(defaults.numbering_prefix == "ORC-", "numbering prefix from file")
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("JOINERY_LOG_LEVEL", "warn");
        env::set_var("JOINERY_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["JOINERY_LOG_LEVEL", "JOINERY_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("JOINERY_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("JOINERY_PRICING_FREIGHT_RATE", "0.03");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("joinery.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[pricing.defaults]
freight_rate = "0.05"
seller_discount_limit = "0.12"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.pricing.defaults.freight_rate == Decimal::new(3, 2),
                "env freight rate should win over file",
            )?;
            ensure(
                config.pricing.defaults.seller_discount_limit == Decimal::new(12, 2),
                "file seller limit should win over defaults",
            )
        })();

        clear_vars(&["JOINERY_DATABASE_URL", "JOINERY_PRICING_FREIGHT_RATE"]);
        result
    }

    #[test]
    fn validation_rejects_inverted_default_limits() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("JOINERY_PRICING_SELLER_DISCOUNT_LIMIT", "0.40");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("pricing.defaults")
            );
            ensure(has_message, "validation failure should mention pricing.defaults")
        })();

        clear_vars(&["JOINERY_PRICING_SELLER_DISCOUNT_LIMIT"]);
        result
    }

    #[test]
    fn malformed_decimal_env_value_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("JOINERY_PRICING_FACTORY_COST_RATE", "forty percent");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected decimal parse failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidDecimal { ref key, .. } if key == "JOINERY_PRICING_FACTORY_COST_RATE"),
                "decimal parse failure should name the variable",
            )
        })();

        clear_vars(&["JOINERY_PRICING_FACTORY_COST_RATE"]);
        result
    }

    #[test]
    fn required_missing_file_is_an_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
