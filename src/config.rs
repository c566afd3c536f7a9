// Process configuration
// Read once at startup and handed to component constructors

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::auth::password::PasswordConfig;

/// Longest accepted token lifetime (ten years)
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors surfaced during startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; `None` selects the in-process store
    pub database_url: Option<String>,
    /// HMAC signing key shared by every token issued by this process
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub store_timeout: Duration,
    pub password: PasswordConfig,
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let defaults = PasswordConfig::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret,
            access_token_ttl_secs: ttl_or(&lookup, "ACCESS_TOKEN_TTL_SECS", 900)?,
            refresh_token_ttl_secs: ttl_or(&lookup, "REFRESH_TOKEN_TTL_SECS", 604_800)?,
            store_timeout: Duration::from_secs(positive_or(&lookup, "STORE_TIMEOUT_SECS", 30)?),
            password: PasswordConfig {
                memory_cost: parse_or(&lookup, "PASSWORD_MEMORY_KIB", defaults.memory_cost)?,
                time_cost: parse_or(&lookup, "PASSWORD_ITERATIONS", defaults.time_cost)?,
                parallelism: parse_or(&lookup, "PASSWORD_PARALLELISM", defaults.parallelism)?,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn positive_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let value = parse_or(lookup, name, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: lookup(name).unwrap_or_default(),
        });
    }
    Ok(value)
}

fn ttl_or<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = positive_or(lookup, name, default)?;
    if value > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert!(config.database_url.is_none());
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "   ")]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "9000"),
            ("DATABASE_URL", "postgresql://localhost/auth"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("STORE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgresql://localhost/auth"));
        assert_eq!(config.access_token_ttl_secs, 60);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));

        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("REFRESH_TOKEN_TTL_SECS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "REFRESH_TOKEN_TTL_SECS", .. })
        ));
    }

    #[test]
    fn test_token_lifetime_upper_bound() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "9223372036854775807"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "ACCESS_TOKEN_TTL_SECS", .. })
        ));

        let too_long = (MAX_TOKEN_TTL_SECS + 1).to_string();
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("REFRESH_TOKEN_TTL_SECS", too_long.as_str()),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "REFRESH_TOKEN_TTL_SECS", .. })
        ));

        let max = MAX_TOKEN_TTL_SECS.to_string();
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("REFRESH_TOKEN_TTL_SECS", max.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.refresh_token_ttl_secs, MAX_TOKEN_TTL_SECS);
    }
}
