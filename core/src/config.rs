//! Client configuration.
//!
//! A [`StorageConfig`] is built once and never changes afterwards; clients
//! share it freely across threads. It can be assembled in code or read from
//! the environment:
//!
//! - `STORAGE_URL`: base URL of the service, required
//! - `STORAGE_API_KEY`: bearer credential, optional
//! - `STORAGE_TIMEOUT_SECS`: whole-request timeout for the HTTP transport, optional

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_URL: &str = "STORAGE_URL";
pub const ENV_API_KEY: &str = "STORAGE_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "STORAGE_TIMEOUT_SECS";

/// Newtype around the bearer credential that keeps it out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        ApiKey(key.to_string())
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        ApiKey(key)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    base_url: String,
    api_key: Option<ApiKey>,
    timeout: Option<Duration>,
}

impl StorageConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: None,
        }
    }

    /// Configuration for a hosted project, reachable at `https://{project_id}.supabase.co`.
    pub fn for_project(project_id: &str, api_key: &str) -> Self {
        Self::new(&format!("https://{project_id}.supabase.co")).with_api_key(api_key)
    }

    pub fn with_api_key(mut self, api_key: impl Into<ApiKey>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_URL))?;
        let mut config = Self::new(base_url.trim());

        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.is_empty()) {
            config = config.with_api_key(key);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = StorageConfig::from_lookup(lookup(&[
            (ENV_URL, "http://localhost:5000/"),
            (ENV_API_KEY, "secret"),
            (ENV_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:5000");
        assert_eq!(config.api_key().map(ApiKey::expose), Some("secret"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn api_key_and_timeout_are_optional() {
        let config = StorageConfig::from_lookup(lookup(&[(ENV_URL, "http://localhost:5000")])).unwrap();
        assert!(config.api_key().is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = StorageConfig::from_lookup(lookup(&[(ENV_API_KEY, "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_URL)));
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let err = StorageConfig::from_lookup(lookup(&[
            (ENV_URL, "http://localhost:5000"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: ENV_TIMEOUT_SECS, .. }));
    }

    #[test]
    fn for_project_builds_hosted_url() {
        let config = StorageConfig::for_project("abcd", "key");
        assert_eq!(config.base_url(), "https://abcd.supabase.co");
        assert!(config.api_key().is_some());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = StorageConfig::new("http://localhost").with_api_key("hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
