// ABOUTME: OAuth module providing the Twitch implicit-grant sign-in flow
// ABOUTME: Includes state nonces, launcher, callback server, provider endpoints, and the session manager

pub mod launcher;
pub mod manager;
pub mod nonce;
pub mod provider;
pub mod server;
pub mod types;

pub use launcher::{AuthLauncher, BrowserLauncher};
pub use manager::SessionManager;
pub use provider::{TwitchEndpoints, DEFAULT_SCOPES};
pub use server::CallbackServer;
pub use types::{
    AccessToken, AuthOutcome, AuthorizationRequest, ProfileRecord, RedirectParams,
    SessionConfig, SessionSnapshot, SessionStatus, SignInOutcome, User,
};
