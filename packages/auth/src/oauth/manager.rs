// ABOUTME: Session manager orchestrating the Twitch implicit-grant sign-in and sign-out
// ABOUTME: Owns the session state machine and mediates launcher, API transport, and revocation

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        launcher::{AuthLauncher, BrowserLauncher},
        nonce::{generate_state, state_matches},
        types::{
            AccessToken, AuthOutcome, AuthorizationRequest, SessionConfig, SessionSnapshot,
            SessionStatus, SignInOutcome, User,
        },
    },
    transport::{
        ApiTransport, HelixClient, HttpRevoker, TokenRevoker, AUTHORIZATION_HEADER,
        CLIENT_ID_HEADER,
    },
};

/// Mutable session record. Guarded by the manager's mutex together with the
/// transport's default headers.
#[derive(Debug)]
struct Session {
    status: SessionStatus,
    user: Option<User>,
    access_token: Option<AccessToken>,
    pending_state: Option<String>,
    signing_in: bool,
    sign_outs_in_flight: usize,
    /// Bumped by every sign-in and sign-out; a sign-in only commits if it
    /// still holds the latest value.
    attempt: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            user: None,
            access_token: None,
            pending_state: None,
            signing_in: false,
            sign_outs_in_flight: 0,
            attempt: 0,
        }
    }
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            user: self.user.clone(),
            is_signing_in: self.signing_in,
            is_signing_out: self.sign_outs_in_flight > 0,
        }
    }

    fn clear_credentials(&mut self) {
        self.user = None;
        self.access_token = None;
        self.pending_state = None;
    }
}

/// Manages the single Twitch session of this process.
///
/// Share one instance as `Arc<SessionManager>`; consumers read
/// [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe) to changes.
pub struct SessionManager {
    config: SessionConfig,
    launcher: Arc<dyn AuthLauncher>,
    transport: Arc<dyn ApiTransport>,
    revoker: Arc<dyn TokenRevoker>,
    session: Mutex<Session>,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create a session manager from explicit collaborators.
    ///
    /// Attaches the `Client-Id` default header to the transport.
    pub fn new(
        config: SessionConfig,
        launcher: Arc<dyn AuthLauncher>,
        transport: Arc<dyn ApiTransport>,
        revoker: Arc<dyn TokenRevoker>,
    ) -> AuthResult<Self> {
        transport.set_header(CLIENT_ID_HEADER, &config.client_id)?;
        let (updates, _) = watch::channel(SessionSnapshot::default());

        Ok(Self {
            config,
            launcher,
            transport,
            revoker,
            session: Mutex::new(Session::default()),
            updates,
        })
    }

    /// Create a session manager wired to the system browser and Twitch
    pub fn from_config(config: SessionConfig) -> AuthResult<Self> {
        config.endpoints.validate()?;
        let launcher = Arc::new(BrowserLauncher::new(config.callback_port));
        let transport = Arc::new(HelixClient::new(&config.endpoints, config.http_timeout)?);
        let revoker = Arc::new(HttpRevoker::new(&config.endpoints, config.http_timeout)?);
        Self::new(config, launcher, transport, revoker)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build an authorization request with a fresh state nonce
    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            scopes: self.config.scopes.clone(),
            state: generate_state(),
            force_verify: self.config.force_verify,
        }
    }

    /// Sign in through the implicit-grant flow.
    ///
    /// A dismissed or denied prompt resolves to [`SignInOutcome::Cancelled`].
    /// A state mismatch fails with [`AuthError::InvalidState`]; every other
    /// failure is reported as [`AuthError::AuthenticationFailed`]. On any
    /// non-success the session is left Anonymous without token or user.
    pub async fn sign_in(&self) -> AuthResult<SignInOutcome> {
        let (attempt, request) = self.update(|session| {
            if session.signing_in || session.sign_outs_in_flight > 0 {
                return Err(AuthError::AlreadyInProgress);
            }
            if session.status == SessionStatus::Authenticated {
                return Err(AuthError::AlreadyAuthenticated);
            }

            let request = self.authorization_request();
            session.attempt += 1;
            session.status = SessionStatus::Authenticating;
            session.signing_in = true;
            session.pending_state = Some(request.state.clone());
            Ok((session.attempt, request))
        })?;

        info!("Starting Twitch sign-in");
        let result = self.authorize(attempt, &request).await;
        let (outcome, orphaned) = self.settle_sign_in(attempt, result);

        if let Some(token) = orphaned {
            self.revoke_quietly(&token).await;
        }
        outcome
    }

    /// Sign out, revoking the token at the provider on a best-effort basis.
    ///
    /// Always leaves the session Anonymous with no `Authorization` header.
    pub async fn sign_out(&self) {
        let token = self.update(|session| {
            session.attempt += 1;
            session.sign_outs_in_flight += 1;
            session.status = SessionStatus::Revoking;
            let token = session.access_token.take();
            session.clear_credentials();
            token
        });

        info!("Signing out");
        match token {
            Some(token) => self.revoke_quietly(&token).await,
            None => debug!("No token held; skipping revocation"),
        }

        self.update(|session| {
            self.transport.clear_header(AUTHORIZATION_HEADER);
            session.clear_credentials();
            session.sign_outs_in_flight = session.sign_outs_in_flight.saturating_sub(1);
            session.status = SessionStatus::Anonymous;
        });
        info!("✅ Signed out");
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn is_signing_in(&self) -> bool {
        self.lock().signing_in
    }

    pub fn is_signing_out(&self) -> bool {
        self.lock().sign_outs_in_flight > 0
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Launch the authorization request, validate the redirect, and fetch
    /// the profile. Touches the session only through `attempt` checks.
    async fn authorize(
        &self,
        attempt: u64,
        request: &AuthorizationRequest,
    ) -> AuthResult<(User, AccessToken)> {
        let auth_url = request.to_url(self.config.endpoints.authorize_url());
        let outcome = self.launcher.launch(&auth_url).await?;

        let params = match outcome {
            AuthOutcome::Success(params) if params.is_access_denied() => {
                info!("User denied access");
                return Err(AuthError::UserCancelled);
            }
            AuthOutcome::Success(params) => params,
            AuthOutcome::Cancel => {
                info!("Sign-in dismissed");
                return Err(AuthError::UserCancelled);
            }
            AuthOutcome::Error { message } => {
                warn!("Authorization ended without a redirect: {}", message);
                return Err(AuthError::UserCancelled);
            }
        };

        if !state_matches(&request.state, params.state.as_deref()) {
            error!("State mismatch on OAuth redirect");
            return Err(AuthError::InvalidState);
        }
        debug!("State validated successfully");

        if let Some(error) = params.error {
            return Err(AuthError::Provider(format!(
                "Authorization error: {} ({})",
                error,
                params.error_description.unwrap_or_default()
            )));
        }

        let token = params
            .access_token
            .filter(|t| !t.secret().is_empty())
            .ok_or_else(|| AuthError::Provider("Redirect carried no access token".to_string()))?;

        let attached = self.update(|session| {
            if session.attempt != attempt {
                return Ok(false);
            }
            session.pending_state = None;
            self.transport
                .set_header(AUTHORIZATION_HEADER, &token.bearer())
                .map(|_| true)
        })?;
        if !attached {
            warn!("Sign-in was superseded by a sign-out");
            return Err(AuthError::AuthenticationFailed);
        }

        let users = self.transport.get_users().await?;
        let record = users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::InvalidProfile("Profile list was empty".to_string()))?;

        Ok((User::from(record), token))
    }

    /// Commit or roll back a finished attempt.
    ///
    /// Returns the caller-facing result and, for a superseded attempt that
    /// still obtained a token, that token so it can be revoked.
    fn settle_sign_in(
        &self,
        attempt: u64,
        result: AuthResult<(User, AccessToken)>,
    ) -> (AuthResult<SignInOutcome>, Option<AccessToken>) {
        self.update(|session| {
            session.signing_in = false;

            if session.attempt != attempt {
                warn!("Discarding result of superseded sign-in");
                return match result {
                    Ok((_, token)) => (Err(AuthError::AuthenticationFailed), Some(token)),
                    Err(AuthError::UserCancelled) => (Ok(SignInOutcome::Cancelled), None),
                    Err(AuthError::InvalidState) => (Err(AuthError::InvalidState), None),
                    Err(AuthError::AuthenticationFailed) => {
                        (Err(AuthError::AuthenticationFailed), None)
                    }
                    Err(e) => {
                        error!("Superseded sign-in failed: {}", e);
                        (Err(AuthError::AuthenticationFailed), None)
                    }
                };
            }

            session.pending_state = None;
            match result {
                Ok((user, token)) => {
                    session.user = Some(user.clone());
                    session.access_token = Some(token);
                    session.status = SessionStatus::Authenticated;
                    info!("✅ Signed in as {}", user.display_name);
                    (Ok(SignInOutcome::SignedIn(user)), None)
                }
                Err(AuthError::UserCancelled) => {
                    session.clear_credentials();
                    session.status = SessionStatus::Anonymous;
                    (Ok(SignInOutcome::Cancelled), None)
                }
                Err(AuthError::InvalidState) => {
                    session.clear_credentials();
                    session.status = SessionStatus::Anonymous;
                    (Err(AuthError::InvalidState), None)
                }
                Err(e) => {
                    error!("Sign-in failed: {}", e);
                    self.transport.clear_header(AUTHORIZATION_HEADER);
                    session.clear_credentials();
                    session.status = SessionStatus::Anonymous;
                    (Err(AuthError::AuthenticationFailed), None)
                }
            }
        })
    }

    async fn revoke_quietly(&self, token: &AccessToken) {
        match self
            .revoker
            .revoke(token.secret(), &self.config.client_id)
            .await
        {
            Ok(()) => info!("Access token revoked"),
            Err(e) => warn!("Token revocation failed, continuing: {}", e),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mutate the session under the lock and publish the new snapshot
    fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.lock();
        let result = f(&mut session);
        self.updates.send_replace(session.snapshot());
        result
    }
}
