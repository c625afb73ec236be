pub mod config;
pub mod discount;
pub mod migrate;
pub mod price;
pub mod tiers;

use serde::Serialize;
use serde_json::Value;

use joinery_core::config::{AppConfig, LoadOptions};
use joinery_core::cpq::bootstrap::ConfigBootstrap;
use joinery_core::errors::{ApplicationError, DomainError};
use joinery_db::{connect_with_settings, migrations, DbPool};

pub const EXIT_CONFIG_VALIDATION: u8 = 2;
pub const EXIT_RUNTIME_INIT: u8 = 3;
pub const EXIT_DB_CONNECTIVITY: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_INVALID_INPUT: u8 = 6;
pub const EXIT_PRICING_FAILURE: u8 = 7;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\",\"data\":null}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// A failed command step, carried out of the async block and rendered once.
#[derive(Debug)]
pub(crate) struct Failure {
    pub error_class: String,
    pub message: String,
    pub exit_code: u8,
}

impl Failure {
    pub fn new(error_class: &str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { error_class: error_class.to_string(), message: message.into(), exit_code }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message, EXIT_INVALID_INPUT)
    }

    pub fn into_result(self, command: &str) -> CommandResult {
        CommandResult::failure(command, &self.error_class, self.message, self.exit_code)
    }
}

impl From<ApplicationError> for Failure {
    fn from(error: ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Domain(_) => EXIT_INVALID_INPUT,
            _ => EXIT_PRICING_FAILURE,
        };
        Self::new(error.error_class(), error.to_string(), exit_code)
    }
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG_VALIDATION,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_INIT,
        )
    })
}

/// Connects and brings the schema up to date.
pub(crate) async fn open_database(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| Failure::new("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;

    migrations::run_pending(&pool)
        .await
        .map_err(|error| Failure::new("migration", error.to_string(), EXIT_MIGRATION))?;

    Ok(pool)
}

pub(crate) fn bootstrap_for(config: &AppConfig) -> ConfigBootstrap {
    ConfigBootstrap::new(config.pricing.auto_create_store_config, config.pricing.defaults.clone())
}

pub(crate) fn to_data<T>(value: &T) -> Result<Value, Failure>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value)
        .map_err(|error| Failure::new("serialization", error.to_string(), EXIT_PRICING_FAILURE))
}
