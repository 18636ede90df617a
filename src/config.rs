//! Process-wide configuration, collected once at start from `dotenv` + env
//! vars, matching the teacher's `AgencyConfig` struct in `main.rs`.

use crate::error::ConfigError;
use std::env;

/// Immutable configuration threaded through constructors. No global
/// singleton: callers build one `Config` and pass it down.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_provider: String,
    pub enable_fallback: bool,
    pub enable_quality_routing: bool,
    pub rejection_threshold: u8,
    pub hybrid_threshold: u8,
    pub validation_threshold: u8,
    pub max_retries: u32,
    pub context_target_tokens: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: "openai_compatible".to_string(),
            enable_fallback: true,
            enable_quality_routing: true,
            rejection_threshold: 60,
            hybrid_threshold: 80,
            validation_threshold: 80,
            max_retries: 2,
            context_target_tokens: 8000,
        }
    }
}

impl Config {
    /// Load `dotenv`, then overlay recognized environment variables on top
    /// of the defaults, matching §6's "Environment / configuration" list.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(v) = env::var("DEFAULT_PROVIDER") {
            config.default_provider = v;
        }
        if let Ok(v) = env::var("ENABLE_FALLBACK") {
            config.enable_fallback = parse_bool(&v);
        }
        if let Ok(v) = env::var("ENABLE_QUALITY_ROUTING") {
            config.enable_quality_routing = parse_bool(&v);
        }
        if let Ok(v) = env::var("REJECTION_THRESHOLD") {
            config.rejection_threshold = parse_threshold("rejection_threshold", &v)?;
        }
        if let Ok(v) = env::var("HYBRID_THRESHOLD") {
            config.hybrid_threshold = parse_threshold("hybrid_threshold", &v)?;
        }
        if let Ok(v) = env::var("VALIDATION_THRESHOLD") {
            config.validation_threshold = parse_threshold("validation_threshold", &v)?;
        }
        if let Ok(v) = env::var("MAX_RETRIES") {
            config.max_retries = v.parse().unwrap_or(config.max_retries);
        }
        if let Ok(v) = env::var("CONTEXT_TARGET_TOKENS") {
            config.context_target_tokens = v.parse().unwrap_or(config.context_target_tokens);
        }

        Ok(config)
    }

    /// First non-empty environment variable from `names` wins, matching
    /// "each provider declares a list of accepted variable names".
    pub fn first_credential(names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| {
            env::var(name).ok().filter(|v| !v.is_empty())
        })
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_threshold(name: &str, v: &str) -> Result<u8, ConfigError> {
    let parsed: i64 = v
        .parse()
        .map_err(|_| ConfigError::InvalidThreshold { name: name.to_string(), value: 0 })?;
    if !(0..=100).contains(&parsed) {
        return Err(ConfigError::InvalidThreshold { name: name.to_string(), value: parsed });
    }
    Ok(parsed as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.rejection_threshold, 60);
        assert_eq!(config.hybrid_threshold, 80);
        assert_eq!(config.validation_threshold, 80);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn first_credential_picks_first_nonempty() {
        env::remove_var("TEST_CRED_A");
        env::set_var("TEST_CRED_B", "secret");
        let found = Config::first_credential(&["TEST_CRED_A", "TEST_CRED_B"]);
        assert_eq!(found, Some("secret".to_string()));
        env::remove_var("TEST_CRED_B");
    }
}
