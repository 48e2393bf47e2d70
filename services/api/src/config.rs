//! Service configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::env;

/// Default listening address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
/// Legacy variable holding the listening address; wins over `CANTEEN_LISTEN_ADDR`
pub const LEGACY_LISTEN_ENV: &str = "CC_FOOD_API";
/// Catalog id of the product legacy imports are booked against
pub const DEFAULT_FALLBACK_PRODUCT_ID: i64 = 1;
pub const DEFAULT_FALLBACK_PRODUCT_NAME: &str = "其他";
/// Largest accepted import upload
pub const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 32 * 1024 * 1024;

/// API service configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Product id used for legacy lines without product identity
    pub fallback_product_id: i64,
    /// Name given to the fallback product when it has to be seeded
    pub fallback_product_name: String,
    /// Body limit of the import endpoint
    pub upload_limit_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            fallback_product_id: DEFAULT_FALLBACK_PRODUCT_ID,
            fallback_product_name: DEFAULT_FALLBACK_PRODUCT_NAME.to_string(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
        }
    }
}

impl AppConfig {
    /// Load the configuration from the environment
    ///
    /// # Environment Variables
    /// - `CANTEEN_LISTEN_ADDR` (default: `0.0.0.0:8080`)
    /// - `CANTEEN_FALLBACK_PRODUCT_ID` (default: 1)
    /// - `CANTEEN_FALLBACK_PRODUCT_NAME` (default: `其他`)
    /// - `CANTEEN_UPLOAD_LIMIT_BYTES` (default: 32 MiB)
    /// - `CC_FOOD_API`: overrides the listening address when set
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
            .set_default("fallback_product_id", DEFAULT_FALLBACK_PRODUCT_ID)?
            .set_default("fallback_product_name", DEFAULT_FALLBACK_PRODUCT_NAME)?
            .set_default("upload_limit_bytes", DEFAULT_UPLOAD_LIMIT_BYTES)?
            .add_source(Environment::with_prefix("CANTEEN").try_parsing(true))
            .set_override_option(
                "listen_addr",
                env::var(LEGACY_LISTEN_ENV).ok().filter(|addr| !addr.is_empty()),
            )?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var(LEGACY_LISTEN_ENV);
            env::remove_var("CANTEEN_LISTEN_ADDR");
            env::remove_var("CANTEEN_FALLBACK_PRODUCT_ID");
            env::remove_var("CANTEEN_FALLBACK_PRODUCT_NAME");
            env::remove_var("CANTEEN_UPLOAD_LIMIT_BYTES");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = AppConfig::load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    #[serial]
    fn test_prefixed_environment() {
        clear_env();
        unsafe {
            env::set_var("CANTEEN_LISTEN_ADDR", "127.0.0.1:9000");
            env::set_var("CANTEEN_FALLBACK_PRODUCT_ID", "3");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.fallback_product_id, 3);
        assert_eq!(config.fallback_product_name, DEFAULT_FALLBACK_PRODUCT_NAME);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_legacy_listen_variable_wins() {
        clear_env();
        unsafe {
            env::set_var("CANTEEN_LISTEN_ADDR", "127.0.0.1:9000");
            env::set_var(LEGACY_LISTEN_ENV, "127.0.0.1:7000");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:7000");

        clear_env();
    }
}
