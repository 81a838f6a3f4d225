// src/common/config.rs

use std::env;

/// Connection settings for the hosted backend.
///
/// All values can come from the environment; [`BackendConfig::from_env`]
/// loads a `.env` file first when one is present.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend, e.g. `https://abc.example.co`
    pub base_url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    /// Privileged key for admin operations (sign-up compensation).
    /// Absent in pure-client deployments; admin calls then fail cleanly.
    pub service_role_key: Option<String>,
    /// Where the OAuth provider should send the user back to
    pub oauth_redirect_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            service_role_key: None,
            oauth_redirect_url: "http://localhost:5173/auth/callback".to_string(),
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(url) = env::var("GALLERY_BACKEND_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(key) = env::var("GALLERY_BACKEND_ANON_KEY") {
            config.anon_key = key;
        }

        if let Ok(key) = env::var("GALLERY_BACKEND_SERVICE_ROLE_KEY") {
            if !key.is_empty() {
                config.service_role_key = Some(key);
            }
        }

        if let Ok(url) = env::var("GALLERY_OAUTH_REDIRECT_URL") {
            config.oauth_redirect_url = url;
        }

        config
    }
}
