// ABOUTME: Twitch identity provider endpoints and default scopes
// ABOUTME: Holds authorization, revocation, and Helix API URLs with overrides for testing

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthError, AuthResult};

pub const TWITCH_AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
pub const TWITCH_REVOKE_URL: &str = "https://id.twitch.tv/oauth2/revoke";
pub const TWITCH_API_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Scopes requested on every sign-in.
pub const DEFAULT_SCOPES: &[&str] = &["openid", "user:read:email", "user:read:follows"];

/// Endpoints used by the sign-in and sign-out flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchEndpoints {
    authorize_url: String,
    revoke_url: String,
    api_base_url: String,
}

impl Default for TwitchEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: TWITCH_AUTHORIZE_URL.to_string(),
            revoke_url: TWITCH_REVOKE_URL.to_string(),
            api_base_url: TWITCH_API_BASE_URL.to_string(),
        }
    }
}

impl TwitchEndpoints {
    /// Override the authorization endpoint
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Override the token revocation endpoint
    pub fn with_revoke_url(mut self, url: impl Into<String>) -> Self {
        self.revoke_url = url.into();
        self
    }

    /// Override the Helix API base URL (no trailing slash needed)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn revoke_url(&self) -> &str {
        &self.revoke_url
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// URL of the "current user" profile endpoint
    pub fn users_url(&self) -> String {
        format!("{}/users", self.api_base_url)
    }

    /// Check that every endpoint is an absolute http(s) URL
    pub fn validate(&self) -> AuthResult<()> {
        for (name, raw) in [
            ("authorize", &self.authorize_url),
            ("revoke", &self.revoke_url),
            ("api base", &self.api_base_url),
        ] {
            let url = Url::parse(raw).map_err(|e| {
                AuthError::Configuration(format!("Invalid {} URL '{}': {}", name, raw, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AuthError::Configuration(format!(
                    "Unsupported scheme for {} URL: {}",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}
