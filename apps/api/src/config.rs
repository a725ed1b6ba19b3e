use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::oracle::OracleTransport;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub oracle: OracleConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Everything needed to reach the scoring oracle. Injected into the adapter,
/// never read from process-wide state after startup.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub transport: OracleTransport,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub proxy_url: Option<String>,
}

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 120;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            oracle: OracleConfig::from_env()?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl OracleConfig {
    fn from_env() -> Result<Self> {
        Self::from_lookup(optional_env)
    }

    /// Builds the oracle settings from `lookup`, which returns a trimmed,
    /// non-empty value for a variable or `None`.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let transport = match lookup("ORACLE_TRANSPORT") {
            Some(raw) => OracleTransport::parse(&raw)
                .with_context(|| format!("Unknown ORACLE_TRANSPORT '{raw}'"))?,
            None => OracleTransport::Responses,
        };

        let timeout_secs = match lookup("ORACLE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("ORACLE_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_ORACLE_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("ORACLE_TIMEOUT_SECS must be greater than zero");
        }

        let api_key = lookup("ORACLE_API_KEY")
            .context("Required environment variable 'ORACLE_API_KEY' is not set")?;

        Ok(OracleConfig {
            transport,
            api_key,
            base_url: lookup("ORACLE_BASE_URL")
                .unwrap_or_else(|| transport.default_base_url().to_string()),
            model: lookup("ORACLE_MODEL").unwrap_or_else(|| transport.default_model().to_string()),
            timeout: Duration::from_secs(timeout_secs),
            proxy_url: lookup("ORACLE_PROXY_URL"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<OracleConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        OracleConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_follow_responses_transport() {
        let cfg = from_vars(&[("ORACLE_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.transport, OracleTransport::Responses);
        assert_eq!(cfg.base_url, "https://api.openai.com");
        assert_eq!(cfg.model, OracleTransport::Responses.default_model());
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS));
        assert!(cfg.proxy_url.is_none());
    }

    #[test]
    fn test_messages_transport_switches_defaults() {
        let cfg = from_vars(&[
            ("ORACLE_API_KEY", "sk-test"),
            ("ORACLE_TRANSPORT", "messages"),
        ])
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.anthropic.com");
        assert_eq!(cfg.model, OracleTransport::Messages.default_model());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let cfg = from_vars(&[
            ("ORACLE_API_KEY", "sk-test"),
            ("ORACLE_TRANSPORT", "chat"),
            ("ORACLE_BASE_URL", "http://scorer.internal:8000"),
            ("ORACLE_MODEL", "local-scorer"),
            ("ORACLE_TIMEOUT_SECS", "45"),
            ("ORACLE_PROXY_URL", "socks5://127.0.0.1:1080"),
        ])
        .unwrap();
        assert_eq!(cfg.transport, OracleTransport::Chat);
        assert_eq!(cfg.base_url, "http://scorer.internal:8000");
        assert_eq!(cfg.model, "local-scorer");
        assert_eq!(cfg.timeout, Duration::from_secs(45));
        assert_eq!(cfg.proxy_url.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = from_vars(&[("ORACLE_API_KEY", "sk-test"), ("ORACLE_TIMEOUT_SECS", "0")])
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_invalid_timeout_and_transport_rejected() {
        assert!(from_vars(&[("ORACLE_API_KEY", "k"), ("ORACLE_TIMEOUT_SECS", "soon")]).is_err());
        assert!(from_vars(&[("ORACLE_API_KEY", "k"), ("ORACLE_TRANSPORT", "assistants")]).is_err());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let err = from_vars(&[]).unwrap_err();
        assert!(err.to_string().contains("ORACLE_API_KEY"));
    }
}
