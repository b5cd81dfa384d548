//! API configuration
//!
//! JSON file named by `IPAM_CONFIG` (default `ipam.json`), with
//! `IPAM_BIND_ADDR` and `IPAM_JWT_SECRET` taking precedence.

use serde::{Deserialize, Serialize};

use ipam_core::application::dto::PageRequest;

/// Hard ceiling on the available-address picker
pub const AVAILABLE_LIST_MAX: usize = 500;

const DEV_JWT_SECRET: &str = "opensase-ipam-dev-secret-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// Required `iss` claim, when set
    pub jwt_issuer: Option<String>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub available_list_limit: usize,
    pub cors_permissive: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            jwt_secret: DEV_JWT_SECRET.into(),
            jwt_issuer: None,
            default_page_size: 20,
            max_page_size: 100,
            available_list_limit: 50,
            cors_permissive: false,
        }
    }
}

impl ApiConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolve configuration for the running process
    pub fn from_env() -> Self {
        let path = std::env::var("IPAM_CONFIG").unwrap_or_else(|_| "ipam.json".into());
        let config = match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config ({}): {}", path, e);
                Self::default()
            }
        };
        config.with_overrides(
            std::env::var("IPAM_BIND_ADDR").ok(),
            std::env::var("IPAM_JWT_SECRET").ok(),
        )
    }

    fn with_overrides(mut self, bind_addr: Option<String>, jwt_secret: Option<String>) -> Self {
        if let Some(addr) = bind_addr.filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr;
        }
        if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
            self.jwt_secret = secret;
        }
        self
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Page request from query values, bounded by configuration
    pub fn page(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        PageRequest::new(
            page,
            Some(per_page.unwrap_or(self.default_page_size)),
            self.max_page_size,
        )
    }

    /// Picker limit, never above [`AVAILABLE_LIST_MAX`]
    pub fn available_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.available_list_limit)
            .clamp(1, AVAILABLE_LIST_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"max_page_size": 50}"#).unwrap();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides_win() {
        let config = ApiConfig::default().with_overrides(Some("127.0.0.1:9000".into()), Some("s3cret".into()));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert!(!config.uses_dev_secret());

        let config = ApiConfig::default().with_overrides(None, Some(String::new()));
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_limits_are_bounded() {
        let config = ApiConfig::default();
        assert_eq!(config.available_limit(None), 50);
        assert_eq!(config.available_limit(Some(10_000)), AVAILABLE_LIST_MAX);
        assert_eq!(config.page(None, Some(1_000)).per_page, 100);
        assert_eq!(config.page(Some(3), None).per_page, 20);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(ApiConfig::load("/nonexistent/ipam.json"), Err(ConfigError::Io(_))));
    }
}
