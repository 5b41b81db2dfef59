// ABOUTME: Authorization launcher seam between the session manager and the user-facing browser
// ABOUTME: Default implementation opens the system browser and waits on the loopback callback server

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{server::CallbackServer, types::AuthOutcome},
};

/// Opens an authorization URL in a user-facing context and waits for the
/// terminal outcome.
#[async_trait]
pub trait AuthLauncher: Send + Sync {
    async fn launch(&self, auth_url: &str) -> AuthResult<AuthOutcome>;
}

/// Launches the system browser and captures the redirect on localhost
pub struct BrowserLauncher {
    server: CallbackServer,
}

impl BrowserLauncher {
    pub fn new(port: u16) -> Self {
        Self {
            server: CallbackServer::with_port(port),
        }
    }

    /// Redirect URI this launcher listens on
    pub fn redirect_uri(&self) -> String {
        self.server.callback_url()
    }
}

#[async_trait]
impl AuthLauncher for BrowserLauncher {
    async fn launch(&self, auth_url: &str) -> AuthResult<AuthOutcome> {
        // Bind before opening the browser so a fast redirect is not refused
        let listener = self.server.bind().await?;

        info!("Opening browser for Twitch sign-in");
        if let Err(e) = open::that(auth_url) {
            error!("Failed to open browser: {}", e);
            return Err(AuthError::BrowserOpen(format!(
                "Failed to open browser. Please manually visit: {}",
                auth_url
            )));
        }

        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            outcome = CallbackServer::serve(listener) => outcome,
            _ = interrupted => {
                info!("Sign-in dismissed from the terminal");
                Ok(AuthOutcome::Cancel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_uri_follows_port() {
        let launcher = BrowserLauncher::new(4545);
        assert_eq!(
            launcher.redirect_uri(),
            "http://localhost:4545/auth/callback"
        );
    }
}
