//! Client Configuration
//!
//! Endpoint and credential settings with local-development fallbacks.
//! The browser build reads `VAULT_*` values at compile time and hands them
//! to `ClientConfig::from_lookup`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUPABASE_URL: &str = "http://127.0.0.1:54321";
pub const DEFAULT_ANON_KEY: &str = "local-dev-anon-key";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MAX_RECORDING_SECS: u32 = 300;

/// Which backend implementation the app talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataBackend {
    /// Hosted tables/storage/auth service
    Hosted,
    /// Process-local tables, nothing persisted
    #[default]
    Memory,
}

impl DataBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" | "supabase" => Some(DataBackend::Hosted),
            "memory" => Some(DataBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub anon_key: String,
    /// Base URL of the internal `/api/v1` service, if deployed
    pub api_base_url: Option<String>,
    pub data_backend: DataBackend,
    pub log_level: String,
    pub max_recording_secs: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            anon_key: DEFAULT_ANON_KEY.to_string(),
            api_base_url: None,
            data_backend: DataBackend::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_recording_secs: DEFAULT_MAX_RECORDING_SECS,
        }
    }
}

impl ClientConfig {
    /// Build from a key lookup (`VAULT_SUPABASE_URL`, `VAULT_ANON_KEY`,
    /// `VAULT_API_BASE_URL`, `VAULT_DATA_BACKEND`, `VAULT_LOG_LEVEL`,
    /// `VAULT_MAX_RECORDING_SECS`). Blank or unparsable values fall back.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let supabase_url = get("VAULT_SUPABASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.supabase_url);
        // An explicit hosted URL without an explicit backend choice means hosted
        let data_backend = match get("VAULT_DATA_BACKEND") {
            Some(value) => DataBackend::from_str(&value).unwrap_or(defaults.data_backend),
            None if lookup("VAULT_SUPABASE_URL").is_some() => DataBackend::Hosted,
            None => defaults.data_backend,
        };

        Self {
            supabase_url,
            anon_key: get("VAULT_ANON_KEY").unwrap_or(defaults.anon_key),
            api_base_url: get("VAULT_API_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            data_backend,
            log_level: get("VAULT_LOG_LEVEL").unwrap_or(defaults.log_level),
            max_recording_secs: get("VAULT_MAX_RECORDING_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u32| *secs > 0)
                .unwrap_or(defaults.max_recording_secs),
        }
    }

    pub fn is_hosted(&self) -> bool {
        self.data_backend == DataBackend::Hosted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_fallbacks() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.data_backend, DataBackend::Memory);
    }

    #[test]
    fn test_hosted_url_implies_hosted_backend() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("VAULT_SUPABASE_URL", "https://abc.supabase.co/"),
            ("VAULT_ANON_KEY", "anon"),
        ]));
        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert!(config.is_hosted());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("VAULT_DATA_BACKEND", "sqlite"),
            ("VAULT_MAX_RECORDING_SECS", "0"),
            ("VAULT_LOG_LEVEL", "  "),
        ]));
        assert_eq!(config.data_backend, DataBackend::Memory);
        assert_eq!(config.max_recording_secs, DEFAULT_MAX_RECORDING_SECS);
        assert_eq!(config.log_level, "info");
    }
}
