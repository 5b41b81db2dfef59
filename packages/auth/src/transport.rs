// ABOUTME: HTTP transport adapters used by the session manager
// ABOUTME: Helix API client with mutable default headers and the token revocation client

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use tracing::{debug, error};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        provider::TwitchEndpoints,
        types::{ProfileRecord, UsersResponse},
    },
};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CLIENT_ID_HEADER: &str = "Client-Id";

/// The application's shared API client, as seen by the session manager
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Set a header sent with every subsequent request
    fn set_header(&self, name: &str, value: &str) -> AuthResult<()>;

    /// Remove a default header; no-op when absent
    fn clear_header(&self, name: &str);

    /// Current value of a default header
    fn header(&self, name: &str) -> Option<String>;

    /// `GET /users` for the token holder
    async fn get_users(&self) -> AuthResult<Vec<ProfileRecord>>;
}

/// Revokes access tokens at the provider
#[async_trait]
pub trait TokenRevoker: Send + Sync {
    async fn revoke(&self, token: &str, client_id: &str) -> AuthResult<()>;
}

/// Twitch Helix API client
pub struct HelixClient {
    client: Client,
    users_url: String,
    headers: RwLock<HeaderMap>,
}

impl HelixClient {
    pub fn new(endpoints: &TwitchEndpoints, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(endpoints, client))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing)
    pub fn with_http_client(endpoints: &TwitchEndpoints, client: Client) -> Self {
        Self {
            client,
            users_url: endpoints.users_url(),
            headers: RwLock::new(HeaderMap::new()),
        }
    }

    fn default_headers(&self) -> HeaderMap {
        self.headers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ApiTransport for HelixClient {
    fn set_header(&self, name: &str, value: &str) -> AuthResult<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("Invalid header name {}: {}", name, e)))?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|_| AuthError::Configuration(format!("Invalid value for header {}", name)))?;
        if header_name == reqwest::header::AUTHORIZATION {
            header_value.set_sensitive(true);
        }

        self.headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(header_name, header_value);
        Ok(())
    }

    fn clear_header(&self, name: &str) {
        self.headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name);
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn get_users(&self) -> AuthResult<Vec<ProfileRecord>> {
        debug!("Fetching current user profile");
        let response = self
            .client
            .get(&self.users_url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Profile request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            // Don't leak full response body - only log status for security
            error!("Profile request failed with status {}", status);
            return Err(AuthError::Provider(format!(
                "Profile request failed with status {}",
                status
            )));
        }

        let users: UsersResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidProfile(format!("Failed to parse users: {}", e)))?;
        Ok(users.data)
    }
}

/// Posts tokens to the provider's revocation endpoint
pub struct HttpRevoker {
    client: Client,
    revoke_url: String,
}

impl HttpRevoker {
    pub fn new(endpoints: &TwitchEndpoints, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(endpoints, client))
    }

    pub fn with_http_client(endpoints: &TwitchEndpoints, client: Client) -> Self {
        Self {
            client,
            revoke_url: endpoints.revoke_url().to_string(),
        }
    }
}

#[async_trait]
impl TokenRevoker for HttpRevoker {
    async fn revoke(&self, token: &str, client_id: &str) -> AuthResult<()> {
        let params = [("client_id", client_id), ("token", token)];

        let response = self
            .client
            .post(&self.revoke_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Revocation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "Token revocation failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HelixClient {
        HelixClient::with_http_client(&TwitchEndpoints::default(), Client::new())
    }

    #[test]
    fn test_set_and_clear_header() {
        let helix = client();
        helix.set_header(CLIENT_ID_HEADER, "abc123").unwrap();
        helix.set_header(AUTHORIZATION_HEADER, "Bearer tok1").unwrap();

        assert_eq!(helix.header("client-id").as_deref(), Some("abc123"));
        assert_eq!(
            helix.header(AUTHORIZATION_HEADER).as_deref(),
            Some("Bearer tok1")
        );

        helix.clear_header(AUTHORIZATION_HEADER);
        assert!(helix.header(AUTHORIZATION_HEADER).is_none());
        assert!(helix.header(CLIENT_ID_HEADER).is_some());
    }

    #[test]
    fn test_clear_missing_header_is_noop() {
        let helix = client();
        helix.clear_header(AUTHORIZATION_HEADER);
        assert!(helix.header(AUTHORIZATION_HEADER).is_none());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let helix = client();
        let result = helix.set_header(AUTHORIZATION_HEADER, "Bearer bad\nvalue");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
