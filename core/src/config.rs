//! Client configuration.
//!
//! Values can be loaded from environment variables:
//!
//! - `SCHOOLHUB_ENV`: `development` or `production` (default: development)
//! - `SCHOOLHUB_API_URL`: overrides the environment's base URL
//! - `SCHOOLHUB_REFRESH_PROFILE`: `true`/`1` to refresh the cached session
//!   after a successful profile update (default: false)

use std::env;

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:5000/api";
pub const PRODUCTION_BASE_URL: &str = "https://api.schoolhub.app/api";

/// Deployment target selecting the default base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }

    /// Unrecognized names fall back to development.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub environment: Environment,
    /// Rewrite the stored user snapshot with the server's reply after
    /// `update_profile` succeeds.
    pub refresh_session_on_profile_update: bool,
}

impl ClientConfig {
    /// Config pointing at an explicit base URL. A trailing `/` is stripped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            environment: Environment::default(),
            refresh_session_on_profile_update: false,
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::new(environment.base_url())
        }
    }

    pub fn from_env() -> Self {
        let environment = env::var("SCHOOLHUB_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();
        let mut config = Self::for_environment(environment);
        if let Ok(url) = env::var("SCHOOLHUB_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        config.refresh_session_on_profile_update = env::var("SCHOOLHUB_REFRESH_PROFILE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);
        config
    }

    pub fn with_profile_refresh(mut self, enabled: bool) -> Self {
        self.refresh_session_on_profile_update = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}
