use once_cell::sync::OnceCell;

use crate::{app_config::AppConfig, error::CoffeeShopError};

/// The global, immutable application configuration. Written once at startup.
static APP_CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Install the process-wide configuration. Only the first call succeeds.
pub fn install_config(config: AppConfig) -> Result<(), CoffeeShopError> {
    config.validate()?;
    APP_CONFIG
        .set(config)
        .map_err(|_| CoffeeShopError::ConfigAlreadyInstalled)
}

/// The installed configuration. Errors until [`install_config`] has succeeded.
pub fn app_config() -> Result<&'static AppConfig, CoffeeShopError> {
    APP_CONFIG.get().ok_or(CoffeeShopError::ConfigNotInstalled)
}
