use figment::Error as ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum CoffeeShopError {
    #[error("Configuration Error: {source:#?}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Configuration has already been installed for this process")]
    ConfigAlreadyInstalled,

    #[error("Configuration was read before startup installed it")]
    ConfigNotInstalled,

    #[error("HTTP Error: {source:#?}")]
    HTTPError {
        #[from]
        source: reqwest::Error,
    },

    #[error("API Error ({status}): {message}")]
    ApiError { status: StatusCode, message: String },

    #[error("Unable to parse URL: {source}")]
    UrlError {
        #[from]
        source: url::ParseError,
    },

    #[error("Unable to deserialize JSON: {source:#?}")]
    SerdeJsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unable to decode base64: {source}")]
    Base64Error {
        #[from]
        source: base64::DecodeError,
    },

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Access token is missing the '{0}' permission")]
    MissingPermission(String),
}

impl CoffeeShopError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
