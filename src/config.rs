use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::util::is_local_endpoint_url;

const SERVER_URL_ENV: &str = "NEWSDESK_SERVER_URL";
const API_TOKEN_ENV: &str = "NEWSDESK_API_TOKEN";
const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub api_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let server_url =
            std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let api_token = std::env::var(API_TOKEN_ENV).ok().and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v.trim().to_string())
            }
        });

        Ok(Self {
            server_url: server_url.trim().to_string(),
            api_token,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            bail!(
                "Invalid {SERVER_URL_ENV} '{}': expected http:// or https:// URL",
                self.server_url
            );
        }

        // Local dev servers may run without auth; anything else needs a token
        // before we issue a single request.
        if !self.is_local_endpoint() && self.api_token.is_none() {
            bail!(
                "{API_TOKEN_ENV} must be set for non-local servers (url: '{}')",
                self.server_url
            );
        }

        Ok(())
    }

    fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.server_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = Config {
            server_url: "ftp://news.example.com".to_string(),
            api_token: Some("tok".to_string()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_token_for_remote_server() {
        let config = Config {
            server_url: "https://news.example.com".to_string(),
            api_token: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allows_tokenless_localhost() {
        let config = Config {
            server_url: "http://localhost:3000".to_string(),
            api_token: None,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_trims_blank_token_to_none() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(API_TOKEN_ENV, "   ");
        std::env::remove_var(SERVER_URL_ENV);
        let config = Config::load().expect("config should load");
        assert_eq!(config.api_token, None);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        std::env::remove_var(API_TOKEN_ENV);
    }
}
