//! Base configuration shared by every service.
//!
//! Values come from an optional `configuration.*` file and `APP__*`
//! environment variables. Service-specific settings are read with
//! [`env_value`], which refuses defaults in production.

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(skip)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

impl Environment {
    /// Reads `ENVIRONMENT`; anything unrecognised is treated as dev.
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("prod") => Environment::Prod,
            Ok("test") => Environment::Test,
            _ => Environment::Dev,
        }
    }

    pub fn is_prod(self) -> bool {
        self == Environment::Prod
    }
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.environment = Environment::from_env();
        Ok(config)
    }
}

/// Look up `key`, falling back to `default` outside production.
pub fn env_value(key: &str, default: Option<&str>, environment: Environment) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if environment.is_prod() {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like [`env_value`] but parses the result, reporting unparsable values.
pub fn env_parsed<T>(key: &str, default: T, environment: Environment) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let raw = env_value(key, Some(&default.to_string()), environment)?;
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_used_outside_prod() {
        let value = env_value("SERVICE_CORE_TEST_UNSET_A", Some("fallback"), Environment::Dev)
            .expect("default should apply");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn default_rejected_in_prod() {
        let err = env_value("SERVICE_CORE_TEST_UNSET_B", Some("fallback"), Environment::Prod)
            .unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn missing_without_default_is_config_error() {
        let err = env_value("SERVICE_CORE_TEST_UNSET_C", None, Environment::Dev).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn parsed_value_reports_bad_input() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("SERVICE_CORE_TEST_BAD_NUMBER", "ten") };
        let err = env_parsed("SERVICE_CORE_TEST_BAD_NUMBER", 10u64, Environment::Dev).unwrap_err();
        assert!(err.to_string().contains("invalid value 'ten'"));
    }
}
