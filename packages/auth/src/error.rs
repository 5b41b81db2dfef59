// ABOUTME: Error types for the sign-in flow and its collaborators
// ABOUTME: Separates caller-facing outcomes from internal causes that are only logged

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The user dismissed or denied the authorization prompt.
    #[error("Authorization was cancelled by the user")]
    UserCancelled,

    #[error("State mismatch: CSRF protection failed")]
    InvalidState,

    /// Opaque sign-in failure. The cause is logged, never returned.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("A sign-in or sign-out is already in progress")]
    AlreadyInProgress,

    #[error("Already signed in; sign out first")]
    AlreadyAuthenticated,

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to open browser: {0}")]
    BrowserOpen(String),

    #[error("Callback server error: {0}")]
    CallbackServer(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid profile response: {0}")]
    InvalidProfile(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Whether this error may be shown to the caller of `sign_in` as-is.
    ///
    /// Everything else is collapsed into [`AuthError::AuthenticationFailed`].
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Self::UserCancelled
                | Self::InvalidState
                | Self::AuthenticationFailed
                | Self::AlreadyInProgress
                | Self::AlreadyAuthenticated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_not_caller_facing() {
        assert!(!AuthError::Network("timeout".into()).is_caller_facing());
        assert!(!AuthError::InvalidProfile("empty".into()).is_caller_facing());
        assert!(!AuthError::BrowserOpen("no display".into()).is_caller_facing());
    }

    #[test]
    fn test_opaque_failure_message_has_no_detail() {
        assert_eq!(
            AuthError::AuthenticationFailed.to_string(),
            "Authentication failed"
        );
        assert!(AuthError::InvalidState.is_caller_facing());
    }
}
