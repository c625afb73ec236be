use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, to_data, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: String,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let defaults = &config.pricing.defaults;

    let fields: Vec<(&str, &str, String)> = vec![
        ("database.url", "JOINERY_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "JOINERY_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "JOINERY_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        (
            "pricing.auto_create_store_config",
            "JOINERY_PRICING_AUTO_CREATE_STORE_CONFIG",
            config.pricing.auto_create_store_config.to_string(),
        ),
        (
            "pricing.defaults.factory_cost_rate",
            "JOINERY_PRICING_FACTORY_COST_RATE",
            defaults.factory_cost_rate.to_string(),
        ),
        (
            "pricing.defaults.fixed_measurement_cost",
            "JOINERY_PRICING_FIXED_MEASUREMENT_COST",
            defaults.fixed_measurement_cost.to_string(),
        ),
        (
            "pricing.defaults.freight_rate",
            "JOINERY_PRICING_FREIGHT_RATE",
            defaults.freight_rate.to_string(),
        ),
        (
            "pricing.defaults.seller_discount_limit",
            "JOINERY_PRICING_SELLER_DISCOUNT_LIMIT",
            defaults.seller_discount_limit.to_string(),
        ),
        (
            "pricing.defaults.manager_discount_limit",
            "JOINERY_PRICING_MANAGER_DISCOUNT_LIMIT",
            defaults.manager_discount_limit.to_string(),
        ),
        (
            "pricing.defaults.numbering_format",
            "JOINERY_PRICING_NUMBERING_FORMAT",
            defaults.numbering_format.as_str().to_string(),
        ),
        (
            "pricing.defaults.numbering_prefix",
            "JOINERY_PRICING_NUMBERING_PREFIX",
            defaults.numbering_prefix.clone(),
        ),
        ("logging.level", "JOINERY_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "JOINERY_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let entries: Vec<ConfigEntry> = fields
        .into_iter()
        .map(|(key, env_key, value)| ConfigEntry {
            key: key.to_string(),
            value,
            source: field_source(
                key,
                Some(env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    match to_data(&entries) {
        Ok(data) => CommandResult::success_with_data(
            "config",
            "effective config (source precedence: env > file > default)",
            Some(data),
        ),
        Err(failure) => failure.into_result("config"),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("joinery.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/joinery.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false) {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source};

    #[test]
    fn nested_pricing_keys_are_attributed_to_file() {
        let doc: Value = "[pricing.defaults]\nfreight_rate = \"0.03\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.defaults.freight_rate"));
        assert!(!contains_path(&doc, "pricing.defaults.factory_cost_rate"));
        assert_eq!(
            field_source("pricing.defaults.freight_rate", None, Some(&doc), None),
            "file (config file)"
        );
        assert_eq!(field_source("logging.level", None, Some(&doc), None), "default");
    }
}
