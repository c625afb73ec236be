use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("invalid commission tier table: {0}")]
    InvalidTierTable(String),
    #[error("invalid store configuration: {0}")]
    InvalidStoreConfig(String),
}

impl DomainError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), reason: reason.into() }
    }

    /// A derived amount that does not fit in a `Decimal`.
    pub fn out_of_range(field: impl Into<String>) -> Self {
        Self::invalid_input(field, "result exceeds the supported decimal range")
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("store configuration is missing for store `{store_id}`")]
    ConfigurationMissing { store_id: String },
    #[error("store configuration for `{store_id}` was created concurrently")]
    ConcurrentConfigCreation { store_id: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The quote could not be priced. Check the values and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "Store pricing data is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Short machine-readable class used in CLI payloads and log fields.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidInput { .. }) => "invalid_input",
            Self::Domain(DomainError::InvalidTierTable(_)) => "invalid_tier_table",
            Self::Domain(DomainError::InvalidStoreConfig(_)) => "invalid_store_config",
            Self::ConfigurationMissing { .. } => "configuration_missing",
            Self::ConcurrentConfigCreation { .. } => "concurrent_config_creation",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(_) => Self::BadRequest { message, correlation_id },
            ApplicationError::ConfigurationMissing { .. }
            | ApplicationError::ConcurrentConfigCreation { .. }
            | ApplicationError::Persistence(_) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(_) => Self::Internal { message, correlation_id },
        }
    }
}
