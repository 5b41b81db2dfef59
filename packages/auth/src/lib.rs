// ABOUTME: Streamline authentication library for signing in with Twitch
// ABOUTME: Implicit-grant OAuth flow with CSRF state checks, in-memory session, and token revocation

pub mod error;
pub mod oauth;
pub mod transport;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    AccessToken, AuthLauncher, AuthOutcome, AuthorizationRequest, BrowserLauncher,
    CallbackServer, ProfileRecord, RedirectParams, SessionConfig, SessionManager,
    SessionSnapshot, SessionStatus, SignInOutcome, TwitchEndpoints, User,
};
pub use transport::{ApiTransport, HelixClient, HttpRevoker, TokenRevoker};
