// ABOUTME: Core type definitions for the Twitch sign-in flow
// ABOUTME: Session configuration, user profile, authorization request, redirect outcome, and session views

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use streamline_config::{constants, env_parse_or, env_string};

use crate::{
    error::{AuthError, AuthResult},
    oauth::provider::{TwitchEndpoints, DEFAULT_SCOPES},
};

/// Path the loopback callback server answers on.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Configuration for a [`SessionManager`](crate::SessionManager)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Always re-prompt the user, even if they consented before
    pub force_verify: bool,
    pub endpoints: TwitchEndpoints,
    pub callback_port: u16,
    pub http_timeout: Duration,
}

impl SessionConfig {
    /// Create a configuration with Twitch defaults and a loopback redirect
    pub fn new(client_id: impl Into<String>) -> Self {
        let callback_port = constants::DEFAULT_CALLBACK_PORT;
        Self {
            client_id: client_id.into(),
            redirect_uri: loopback_redirect_uri(callback_port),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            force_verify: true,
            endpoints: TwitchEndpoints::default(),
            callback_port,
            http_timeout: Duration::from_secs(constants::DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> AuthResult<Self> {
        let client_id = env_string(constants::CLIENT_ID).ok_or_else(|| {
            AuthError::Configuration(format!("{} is not set", constants::CLIENT_ID))
        })?;

        let callback_port = env_parse_or(
            constants::STREAMLINE_CALLBACK_PORT,
            constants::DEFAULT_CALLBACK_PORT,
        )
        .map_err(|raw| {
            AuthError::Configuration(format!(
                "Invalid {}: {}",
                constants::STREAMLINE_CALLBACK_PORT,
                raw
            ))
        })?;
        if callback_port == 0 {
            return Err(AuthError::Configuration(
                "Callback port must be between 1 and 65535".to_string(),
            ));
        }

        let timeout_secs = env_parse_or(
            constants::STREAMLINE_HTTP_TIMEOUT_SECS,
            constants::DEFAULT_HTTP_TIMEOUT_SECS,
        )
        .map_err(|raw| {
            AuthError::Configuration(format!(
                "Invalid {}: {}",
                constants::STREAMLINE_HTTP_TIMEOUT_SECS,
                raw
            ))
        })?;

        let mut endpoints = TwitchEndpoints::default();
        if let Some(base) = env_string(constants::STREAMLINE_API_BASE_URL) {
            endpoints = endpoints.with_api_base_url(base);
        }
        endpoints.validate()?;

        Ok(Self {
            client_id,
            redirect_uri: loopback_redirect_uri(callback_port),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            force_verify: true,
            endpoints,
            callback_port,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_endpoints(mut self, endpoints: TwitchEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }
}

fn loopback_redirect_uri(port: u16) -> String {
    format!("http://localhost:{}{}", port, CALLBACK_PATH)
}

/// Opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// One record of the Helix `GET /users` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// Envelope of the Helix `GET /users` response
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<ProfileRecord>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

/// Authenticated Twitch identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    /// May be empty when the provider withholds it
    pub email: String,
    pub avatar_url: String,
}

impl From<ProfileRecord> for User {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name,
            email: record.email,
            avatar_url: record.profile_image_url,
        }
    }
}

/// A single implicit-grant authorization request
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub state: String,
    pub force_verify: bool,
}

impl AuthorizationRequest {
    /// Render the request against an authorization endpoint.
    ///
    /// Values are percent-encoded; spaces in the scope list become `%20`.
    pub fn to_url(&self, authorize_url: &str) -> String {
        let scope = self.scopes.join(" ");
        let force_verify = if self.force_verify { "true" } else { "false" };
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "token"),
            ("scope", scope.as_str()),
            ("force_verify", force_verify),
            ("state", self.state.as_str()),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if authorize_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", authorize_url, separator, query)
    }
}

/// Parameters the provider returned on the redirect
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub access_token: Option<AccessToken>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Parse an `application/x-www-form-urlencoded` query or fragment
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches(&['?', '#'][..]);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "access_token" => params.access_token = Some(AccessToken::new(value)),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                "error_description" => params.error_description = Some(value),
                _ => {}
            }
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.state.is_none()
            && self.error.is_none()
            && self.error_description.is_none()
    }

    /// The provider reported that the user refused consent
    pub fn is_access_denied(&self) -> bool {
        self.error.as_deref() == Some("access_denied")
    }
}

impl fmt::Debug for RedirectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectParams")
            .field("access_token", &self.access_token)
            .field("state", &self.state.as_ref().map(|_| "<present>"))
            .field("error", &self.error)
            .field("error_description", &self.error_description)
            .finish()
    }
}

/// Terminal result of an authorization launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The provider redirected back
    Success(RedirectParams),
    /// The user dismissed the flow
    Cancel,
    /// The launch context failed without a provider redirect
    Error { message: String },
}

/// Authentication state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    Revoking,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Revoking => write!(f, "revoking"),
        }
    }
}

/// Read-only view of the session handed to consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub is_signing_in: bool,
    pub is_signing_out: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            user: None,
            is_signing_in: false,
            is_signing_out: false,
        }
    }
}

/// How a sign-in attempt settled without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(User),
    /// The user dismissed or denied the prompt; nothing changed
    Cancelled,
}
