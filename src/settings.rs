//! Cache subsystem settings with environment overrides.

use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

use crate::error::CacheError;

/// Prefix of the environment variables read by [`CacheSettings::from_env`].
pub const ENV_PREFIX: &str = "SLATE_CACHE";

const DEFAULT_STORES_CONFIG_PATH: &str = "slate.cache.stores";
const DEFAULT_OBSERVE_CONFIG: bool = true;
const DEFAULT_EXPIRATION_MS: u64 = 60_000;

/// Settings shared by the store pool and the built-in strategies.
///
/// | field                | env var                           | default              |
/// |----------------------|-----------------------------------|----------------------|
/// | `stores_config_path` | `SLATE_CACHE_STORES_CONFIG_PATH`  | `slate.cache.stores` |
/// | `observe_config`     | `SLATE_CACHE_OBSERVE_CONFIG`      | `true`               |
/// | `default_expiration` | `SLATE_CACHE_DEFAULT_EXPIRATION`  | `60000` (ms)         |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Configuration path holding one section per named store.
    pub stores_config_path: String,
    /// Reset the pool whenever the stores configuration changes.
    pub observe_config: bool,
    /// Fallback expiration in milliseconds for stores that don't set one.
    pub default_expiration: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            stores_config_path: DEFAULT_STORES_CONFIG_PATH.to_string(),
            observe_config: DEFAULT_OBSERVE_CONFIG,
            default_expiration: DEFAULT_EXPIRATION_MS,
        }
    }
}

impl CacheSettings {
    /// Defaults overridden by `SLATE_CACHE_*` environment variables.
    pub fn from_env() -> Result<Self, CacheError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults overridden by the given environment source.
    pub fn load(environment: Environment) -> Result<Self, CacheError> {
        let settings = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_expiration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::load(environment(&[])).unwrap();
        assert_eq!(settings, CacheSettings::default());
        assert_eq!(settings.stores_config_path, "slate.cache.stores");
        assert!(settings.observe_config);
        assert_eq!(settings.default_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_env_overrides() {
        let settings = CacheSettings::load(environment(&[
            ("SLATE_CACHE_STORES_CONFIG_PATH", "cache.stores"),
            ("SLATE_CACHE_OBSERVE_CONFIG", "false"),
            ("SLATE_CACHE_DEFAULT_EXPIRATION", "5000"),
        ]))
        .unwrap();

        assert_eq!(settings.stores_config_path, "cache.stores");
        assert!(!settings.observe_config);
        assert_eq!(settings.default_expiration, 5000);
    }

    #[test]
    fn test_unrelated_env_is_ignored() {
        let settings =
            CacheSettings::load(environment(&[("OTHER_DEFAULT_EXPIRATION", "1")])).unwrap();
        assert_eq!(settings.default_expiration, 60_000);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let err = CacheSettings::load(environment(&[(
            "SLATE_CACHE_DEFAULT_EXPIRATION",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }
}
