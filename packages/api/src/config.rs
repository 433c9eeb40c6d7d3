//! Client configuration: public keys only.
//!
//! The browser tier never sees server secrets. What it needs is the BaaS project
//! URL, the project's anonymous key and the payment processor's publishable key.
//! Web builds bake them in at compile time ([`ClientConfig::from_build_env`]);
//! native builds and tests read them at runtime ([`ClientConfig::from_env`]).

use crate::error::{ApiError, Result};

/// Public client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub baas_url: String,
    pub anon_key: String,
    pub payment_publishable_key: Option<String>,
}

impl ClientConfig {
    pub fn new(baas_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            baas_url: baas_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            payment_publishable_key: None,
        }
    }

    /// Read configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let baas_url = std::env::var("BAAS_URL")
            .map_err(|_| ApiError::Config("BAAS_URL not set".to_string()))?;
        let anon_key = std::env::var("BAAS_ANON_KEY")
            .map_err(|_| ApiError::Config("BAAS_ANON_KEY not set".to_string()))?;

        let mut config = Self::new(baas_url, anon_key);
        config.payment_publishable_key = std::env::var("PAYMENT_PUBLISHABLE_KEY").ok();
        Ok(config)
    }

    /// Configuration captured from the environment of the build.
    pub fn from_build_env() -> Result<Self> {
        let baas_url = option_env!("BAAS_URL")
            .ok_or_else(|| ApiError::Config("BAAS_URL was not set at build time".to_string()))?;
        let anon_key = option_env!("BAAS_ANON_KEY").ok_or_else(|| {
            ApiError::Config("BAAS_ANON_KEY was not set at build time".to_string())
        })?;

        let mut config = Self::new(baas_url, anon_key);
        config.payment_publishable_key = option_env!("PAYMENT_PUBLISHABLE_KEY").map(str::to_string);
        Ok(config)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.baas_url, path)
    }
}
