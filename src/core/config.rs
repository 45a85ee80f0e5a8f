use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fapi.asterdex.com";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RECV_WINDOW_MS: u64 = 50_000;
pub const MAX_TIMEOUT_SECS: u64 = 120;
pub const MAX_RETRIES: u32 = 10;

/// Delegated-signer credentials for the EVM (v3) signing scheme.
///
/// `user` is the account owner; `signer` is the address whose key actually signs.
#[derive(Debug, Clone)]
pub struct EvmCredentials {
    pub user: String,
    pub signer: String,
    pub private_key: Secret<String>,
}

/// Authentication scheme implied by the configured credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Evm,
    Hmac,
    ReadOnly,
}

/// Process-wide settings, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub default_symbol: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub recv_window: u64,
    pub rate_limit: Option<NonZeroU32>,
    pub evm: Option<EvmCredentials>,
    pub api_key: Option<Secret<String>>,
    pub api_secret: Option<Secret<String>>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let redacted = |present: bool| present.then_some("[REDACTED]");

        let mut state = serializer.serialize_struct("ExchangeConfig", 10)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("default_symbol", &self.default_symbol)?;
        state.serialize_field("timeout_secs", &self.timeout.as_secs())?;
        state.serialize_field("max_retries", &self.max_retries)?;
        state.serialize_field("recv_window", &self.recv_window)?;
        state.serialize_field("rate_limit", &self.rate_limit.map(NonZeroU32::get))?;
        state.serialize_field("evm_user", &self.evm.as_ref().map(|c| c.user.as_str()))?;
        state.serialize_field("evm_signer", &self.evm.as_ref().map(|c| c.signer.as_str()))?;
        state.serialize_field("evm_private_key", &redacted(self.evm.is_some()))?;
        state.serialize_field("api_key", &redacted(self.api_key.is_some()))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            base_url: Option<String>,
            default_symbol: Option<String>,
            timeout_secs: Option<u64>,
            max_retries: Option<u32>,
            recv_window: Option<u64>,
            rate_limit: Option<NonZeroU32>,
            evm_user: Option<String>,
            evm_signer: Option<String>,
            evm_private_key: Option<String>,
            api_key: Option<String>,
            api_secret: Option<String>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        let evm = match (helper.evm_user, helper.evm_signer, helper.evm_private_key) {
            (Some(user), Some(signer), Some(key)) => Some(EvmCredentials {
                user,
                signer,
                private_key: Secret::new(key),
            }),
            (None, None, None) => None,
            _ => {
                return Err(serde::de::Error::custom(
                    "evm_user, evm_signer and evm_private_key must be set together",
                ))
            }
        };

        Ok(Self {
            base_url: helper
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_symbol: helper
                .default_symbol
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            timeout: Duration::from_secs(helper.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            max_retries: helper.max_retries.unwrap_or(DEFAULT_RETRIES),
            recv_window: helper.recv_window.unwrap_or(DEFAULT_RECV_WINDOW_MS),
            rate_limit: helper.rate_limit,
            evm,
            api_key: helper.api_key.map(Secret::new),
            api_secret: helper.api_secret.map(Secret::new),
        })
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::read_only()
    }
}

impl ExchangeConfig {
    /// Configuration signing with a delegated EVM signer key
    #[must_use]
    pub fn evm(user: String, signer: String, private_key: String) -> Self {
        Self {
            evm: Some(EvmCredentials {
                user,
                signer,
                private_key: Secret::new(private_key),
            }),
            ..Self::read_only()
        }
    }

    /// Configuration signing with a legacy API key / secret pair
    #[must_use]
    pub fn api_key(api_key: String, api_secret: String) -> Self {
        Self {
            api_key: Some(Secret::new(api_key)),
            api_secret: Some(Secret::new(api_secret)),
            ..Self::read_only()
        }
    }

    /// Create configuration for read-only operations (market data only)
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_symbol: DEFAULT_SYMBOL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_RETRIES,
            recv_window: DEFAULT_RECV_WINDOW_MS,
            rate_limit: None,
            evm: None,
            api_key: None,
            api_secret: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables (prefix `ASTER` shown):
    /// - `ASTER_EVM_USER`, `ASTER_EVM_SIGNER`, `ASTER_EVM_PRIVATE_KEY` (all or none)
    /// - `ASTER_API_KEY`, `ASTER_API_SECRET` (legacy HMAC scheme, optional)
    /// - `ASTER_API_BASE_URL` (optional)
    /// - `ASTER_TIMEOUT_SECONDS`, `ASTER_RETRIES`, `ASTER_RECV_WINDOW`, `ASTER_RATE_LIMIT` (optional)
    /// - `DEFAULT_SYMBOL` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(exchange_prefix, |name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading variables through `lookup`.
    pub fn from_lookup<F>(exchange_prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = exchange_prefix.to_uppercase();
        let var = |suffix: &str| -> (String, Option<String>) {
            let name = format!("{}_{}", prefix, suffix);
            let value = lookup(&name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            (name, value)
        };

        let (_, user) = var("EVM_USER");
        let (_, signer) = var("EVM_SIGNER");
        let (_, private_key) = var("EVM_PRIVATE_KEY");
        let evm = match (user, signer, private_key) {
            (Some(user), Some(signer), Some(key)) => Some(EvmCredentials {
                user,
                signer,
                private_key: Secret::new(key),
            }),
            (None, None, None) => None,
            (user, signer, _) => {
                let missing = if user.is_none() {
                    "EVM_USER"
                } else if signer.is_none() {
                    "EVM_SIGNER"
                } else {
                    "EVM_PRIVATE_KEY"
                };
                return Err(ConfigError::MissingEnvironmentVariable(format!(
                    "{}_{}",
                    prefix, missing
                )));
            }
        };

        let (_, api_key) = var("API_KEY");
        let (secret_name, api_secret) = var("API_SECRET");
        if api_key.is_some() && api_secret.is_none() {
            return Err(ConfigError::MissingEnvironmentVariable(secret_name));
        }

        let (_, base_url) = var("API_BASE_URL");
        let default_symbol = lookup("DEFAULT_SYMBOL")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let (name, raw) = var("TIMEOUT_SECONDS");
        let timeout_secs = parse_or(&name, raw, DEFAULT_TIMEOUT_SECS)?;
        if !(1..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::InvalidConfiguration(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_TIMEOUT_SECS, timeout_secs
            )));
        }
        let (name, raw) = var("RETRIES");
        let max_retries = parse_or(&name, raw, DEFAULT_RETRIES)?;
        if max_retries > MAX_RETRIES {
            return Err(ConfigError::InvalidConfiguration(format!(
                "{} must be at most {}, got {}",
                name, MAX_RETRIES, max_retries
            )));
        }
        let (name, raw) = var("RECV_WINDOW");
        let recv_window = parse_or(&name, raw, DEFAULT_RECV_WINDOW_MS)?;
        let (name, raw) = var("RATE_LIMIT");
        let rate_limit = raw
            .map(|v| {
                v.parse::<NonZeroU32>().map_err(|e| {
                    ConfigError::InvalidConfiguration(format!("{} = {:?}: {}", name, v, e))
                })
            })
            .transpose()?;

        Ok(Self {
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_symbol,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            recv_window,
            rate_limit,
            evm,
            api_key: api_key.map(Secret::new),
            api_secret: api_secret.map(Secret::new),
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // No .env file; system environment only
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        if self.evm.is_some() {
            AuthScheme::Evm
        } else if self.has_api_key() {
            AuthScheme::Hmac
        } else {
            AuthScheme::ReadOnly
        }
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.auth_scheme() != AuthScheme::ReadOnly
    }

    fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn default_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_symbol = symbol.into();
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    #[must_use]
    pub const fn rate_limit(mut self, per_second: Option<NonZeroU32>) -> Self {
        self.rate_limit = per_second;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key_str(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Get API secret (use carefully - exposes secret)
    pub fn api_secret_str(&self) -> Option<&str> {
        self.api_secret.as_ref().map(|k| k.expose_secret().as_str())
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |v| {
        v.parse::<T>()
            .map_err(|e| ConfigError::InvalidConfiguration(format!("{} = {:?}: {}", name, v, e)))
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_credentials() {
        let config = ExchangeConfig::from_lookup("ASTER", lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_symbol, "BTCUSDT");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.recv_window, 50_000);
        assert_eq!(config.auth_scheme(), AuthScheme::ReadOnly);
    }

    #[test]
    fn test_evm_credentials_take_precedence() {
        let config = ExchangeConfig::from_lookup(
            "aster",
            lookup(&[
                ("ASTER_EVM_USER", "0xabc"),
                ("ASTER_EVM_SIGNER", "0xdef"),
                ("ASTER_EVM_PRIVATE_KEY", "0x01"),
                ("ASTER_API_KEY", "key"),
                ("ASTER_API_SECRET", "secret"),
                ("ASTER_API_BASE_URL", "http://localhost:8080/"),
                ("ASTER_RETRIES", "3"),
                ("DEFAULT_SYMBOL", "ethusdt"),
            ]),
        )
        .unwrap();
        assert_eq!(config.auth_scheme(), AuthScheme::Evm);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.default_symbol, "ETHUSDT");
    }

    #[test]
    fn test_partial_evm_credentials_are_rejected() {
        let err = ExchangeConfig::from_lookup(
            "ASTER",
            lookup(&[("ASTER_EVM_USER", "0xabc"), ("ASTER_EVM_PRIVATE_KEY", "0x01")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironmentVariable(ref v) if v == "ASTER_EVM_SIGNER"));
    }

    #[test]
    fn test_malformed_numbers_are_config_errors() {
        let err = ExchangeConfig::from_lookup("ASTER", lookup(&[("ASTER_TIMEOUT_SECONDS", "five")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));

        let err = ExchangeConfig::from_lookup("ASTER", lookup(&[("ASTER_RATE_LIMIT", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_retry_and_timeout_bounds() {
        for vars in [
            [("ASTER_RETRIES", "4294967295")],
            [("ASTER_RETRIES", "11")],
            [("ASTER_TIMEOUT_SECONDS", "0")],
            [("ASTER_TIMEOUT_SECONDS", "18446744073709551615")],
        ] {
            let err = ExchangeConfig::from_lookup("ASTER", lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidConfiguration(_)), "{:?}", vars);
        }

        let config = ExchangeConfig::from_lookup(
            "ASTER",
            lookup(&[("ASTER_RETRIES", "10"), ("ASTER_TIMEOUT_SECONDS", "120")]),
        )
        .unwrap();
        assert_eq!(config.max_retries, MAX_RETRIES);
        assert_eq!(config.timeout, Duration::from_secs(MAX_TIMEOUT_SECS));
    }

    #[test]
    fn test_serialization_redacts_secrets() {
        let config = ExchangeConfig::evm(
            "0xuser".to_string(),
            "0xsigner".to_string(),
            "deadbeef".to_string(),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("[REDACTED]"));
        assert!(!format!("{:?}", config).contains("deadbeef"));
    }
}
