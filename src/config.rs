// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! Endpoint locations and upload limits are provided by the environment,
//! never embedded in the core.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default maximum asset size (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default request timeout. Expiry is a transport error, never an auth error.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, without trailing slash
    pub api_base_url: String,
    /// Path suffix of the login endpoint
    pub login_path: String,
    /// Path suffix of the registration endpoint
    pub register_path: String,
    /// Path suffix of the token refresh endpoint
    pub refresh_path: String,
    /// Path suffix of the products collection
    pub products_path: String,
    /// Absolute URL of the upload-target endpoint
    pub upload_url_endpoint: String,
    /// Largest asset the upload pipeline accepts
    pub max_upload_bytes: usize,
    /// Fixed timeout applied to every request
    pub request_timeout: Duration,
    /// Profile directory holding the persisted session (memory-only if None)
    pub profile_dir: Option<PathBuf>,
}

impl Config {
    /// Build a config pointing at `api_base_url` with default paths and limits.
    pub fn for_base_url(api_base_url: &str, upload_url_endpoint: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            login_path: "/login".to_string(),
            register_path: "/register".to_string(),
            refresh_path: "/refresh".to_string(),
            products_path: "/products".to_string(),
            upload_url_endpoint: upload_url_endpoint.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            profile_dir: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url =
            env::var("CATALOG_API_URL").map_err(|_| ConfigError::Missing("CATALOG_API_URL"))?;
        let upload_url_endpoint = env::var("CATALOG_UPLOAD_URL_ENDPOINT")
            .map_err(|_| ConfigError::Missing("CATALOG_UPLOAD_URL_ENDPOINT"))?;

        let mut config = Self::for_base_url(api_base_url.trim(), upload_url_endpoint.trim());

        if let Ok(v) = env::var("CATALOG_LOGIN_PATH") {
            config.login_path = v;
        }
        if let Ok(v) = env::var("CATALOG_REGISTER_PATH") {
            config.register_path = v;
        }
        if let Ok(v) = env::var("CATALOG_REFRESH_PATH") {
            config.refresh_path = v;
        }
        if let Ok(v) = env::var("CATALOG_PRODUCTS_PATH") {
            config.products_path = v;
        }
        if let Some(max) = parse_var::<usize>("CATALOG_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = max;
        }
        if let Some(secs) = parse_var::<u64>("CATALOG_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.profile_dir = env::var("CATALOG_PROFILE_DIR").ok().map(PathBuf::from);

        Ok(config)
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.login_path)
    }

    pub fn register_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.register_path)
    }

    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.refresh_path)
    }

    pub fn products_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.products_path)
    }

    pub fn product_url(&self, id: u64) -> String {
        format!("{}/{}", self.products_url(), id)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
