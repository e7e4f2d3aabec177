use std::{fmt::Display, path::PathBuf, str::FromStr};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::{auth::tenant_host, error::CoffeeShopError};

/// Default configuration file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Config.toml";

/// Prefix for environment variable overrides, e.g. `COFFEE_SHOP_AUTH0__CLIENT_ID`.
pub const ENV_PREFIX: &str = "COFFEE_SHOP_";

/// Selects the deployment mode (and the figment profile) when set.
pub const ENV_SELECTOR: &str = "COFFEE_SHOP_ENV";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CoffeeShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(CoffeeShopError::invalid_config(
                "environment",
                format!("'{other}' is not one of 'development' or 'production'"),
            )),
        }
    }
}

/// Identity provider settings for the Auth0 tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth0Config {
    /// Tenant identifier, either a bare prefix (`example.us`) or a full host.
    pub domain: String,

    /// Identifier of the protected API, checked against the token `aud` claim.
    pub audience: String,

    pub client_id: String,

    /// Where the identity provider sends the browser back after login.
    pub callback_url: String,
}

/// The immutable settings record for one running process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api_server_url: String,
    pub auth0: Auth0Config,
}

/// Where [`AppConfig::build`] looks for its values.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file. When set, the file must exist.
    pub config_path: Option<PathBuf>,

    /// Overrides the environment selected through `COFFEE_SHOP_ENV`.
    pub environment: Option<Environment>,
}

impl AppConfig {
    /// Build the configuration from compiled defaults, the config file and the
    /// process environment. `LoadOptions::default()` reads `Config.toml` if present.
    pub fn build(options: &LoadOptions) -> Result<Self, CoffeeShopError> {
        let environment = match options.environment {
            Some(environment) => environment,
            None => Env::var(ENV_SELECTOR)
                .map(|value| value.parse::<Environment>())
                .transpose()?
                .unwrap_or_default(),
        };
        info!("Loading {environment} configuration");

        let config: Self = Self::figment(options, environment)?.extract()?;
        config.validate()?;

        if config.is_production() && config.api_server_url.starts_with("http://") {
            warn!("Production API server {} is not using https", config.api_server_url);
        }

        debug!(
            "Configuration loaded: api_server_url={}, auth0.domain={}, auth0.client_id={}",
            config.api_server_url, config.auth0.domain, config.auth0.client_id
        );

        Ok(config)
    }

    fn figment(options: &LoadOptions, environment: Environment) -> Result<Figment, CoffeeShopError> {
        let mut figment = Figment::from(Serialized::defaults(Self::defaults_for(environment)));

        match &options.config_path {
            Some(path) if !path.exists() => {
                return Err(CoffeeShopError::invalid_config(
                    "config_path",
                    format!("file {} does not exist", path.display()),
                ));
            }
            Some(path) => {
                info!("Reading configuration file {}", path.display());
                figment = figment.merge(Toml::file(path).nested());
            }
            None => {
                figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE).nested());
            }
        }

        Ok(figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["env", "environment", "token"])
                    .split("__")
                    .global(),
            )
            .merge(Serialized::global("environment", environment))
            .select(environment.as_str()))
    }

    /// Compiled fallbacks. Only local development gets concrete values; the
    /// identity provider settings always have to be supplied.
    pub fn defaults_for(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                environment,
                api_server_url: "http://127.0.0.1:5000".into(),
                auth0: Auth0Config {
                    callback_url: "http://localhost:4200".into(),
                    ..Auth0Config::default()
                },
            },
            Environment::Production => Self {
                environment,
                ..Self::default()
            },
        }
    }

    /// Reject records with blank fields or unusable URLs.
    pub fn validate(&self) -> Result<(), CoffeeShopError> {
        let required = [
            ("api_server_url", &self.api_server_url),
            ("auth0.domain", &self.auth0.domain),
            ("auth0.audience", &self.auth0.audience),
            ("auth0.client_id", &self.auth0.client_id),
            ("auth0.callback_url", &self.auth0.callback_url),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoffeeShopError::invalid_config(field, "must not be empty"));
            }
        }

        let api_server_url = check_http_url("api_server_url", &self.api_server_url)?;
        if api_server_url.query().is_some() || api_server_url.fragment().is_some() {
            return Err(CoffeeShopError::invalid_config(
                "api_server_url",
                "must not carry a query or fragment",
            ));
        }
        check_http_url("auth0.callback_url", &self.auth0.callback_url)?;

        check_tenant(&self.auth0.domain)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<Url, CoffeeShopError> {
    let url = Url::parse(value)
        .map_err(|err| CoffeeShopError::invalid_config(field, format!("is not a valid URL: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(CoffeeShopError::invalid_config(
            field,
            format!("must use http or https, got '{scheme}'"),
        )),
    }
}

/// The tenant must turn into a bare host: no scheme, path, userinfo, query or fragment.
fn check_tenant(domain: &str) -> Result<(), CoffeeShopError> {
    if domain.contains("://") || domain.contains('/') {
        return Err(CoffeeShopError::invalid_config(
            "auth0.domain",
            "must be a tenant name or host, not a URL",
        ));
    }

    let host = tenant_host(domain);
    let url = Url::parse(&format!("https://{host}")).map_err(|err| {
        CoffeeShopError::invalid_config("auth0.domain", format!("is not a valid host: {err}"))
    })?;

    let bare = url.username().is_empty()
        && url.password().is_none()
        && url.port().is_none()
        && url.query().is_none()
        && url.fragment().is_none()
        && url
            .host_str()
            .is_some_and(|parsed| parsed.eq_ignore_ascii_case(&host));

    if bare {
        Ok(())
    } else {
        Err(CoffeeShopError::invalid_config(
            "auth0.domain",
            format!("'{domain}' does not name a single host"),
        ))
    }
}
