//! Principal handling on top of `tower-sessions`.
//!
//! The session carries only the user id; the record itself is reloaded from
//! the credential store on every protected request, so a deleted user or a
//! flushed session both read back as anonymous.

use thiserror::Error;
use time::Duration;
use tower_sessions::cookie::Key;
use tower_sessions::cookie::SameSite;
use tower_sessions::service::SignedCookie;
use tower_sessions::session;
use tower_sessions::Expiry;
use tower_sessions::Session;
use tower_sessions::SessionManagerLayer;
use tower_sessions::SessionStore;

use crate::config::SessionConfig;
use crate::domain::user::models::AuthorizationRequest;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserServicePort;
use crate::user::errors::UserError;

pub const SESSION_COOKIE_NAME: &str = "secrets.sid";
pub const USER_ID_KEY: &str = "user_id";
pub const OAUTH_STATE_KEY: &str = "oauth_state";
pub const OAUTH_PKCE_VERIFIER_KEY: &str = "oauth_pkce_verifier";

/// Minimum signing key length accepted by the cookie signer.
const MIN_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionSettingsError {
    #[error("Session secret must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("Session inactivity period must be positive, got {0} days")]
    InvalidInactivity(i64),
}

/// Cookie and expiry settings for the session layer.
#[derive(Clone)]
pub struct SessionSettings {
    key: Key,
    secure: bool,
    inactivity: Duration,
}

impl SessionSettings {
    /// # Errors
    /// * `SecretTooShort` - Signing secret under 64 bytes
    /// * `InvalidInactivity` - Inactivity period is zero or negative
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionSettingsError> {
        let secret = config.secret.as_bytes();
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionSettingsError::SecretTooShort {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        if config.inactivity_days <= 0 {
            return Err(SessionSettingsError::InvalidInactivity(
                config.inactivity_days,
            ));
        }

        Ok(Self {
            key: Key::from(secret),
            secure: config.secure_cookie,
            inactivity: Duration::days(config.inactivity_days),
        })
    }

    /// Session layer over `store` with signed, HTTP-only cookies.
    ///
    /// `SameSite=Lax` so the cookie survives the top-level redirect back from
    /// the identity provider.
    pub fn layer<S>(&self, store: S) -> SessionManagerLayer<S, SignedCookie>
    where
        S: SessionStore + Clone,
    {
        SessionManagerLayer::new(store)
            .with_name(SESSION_COOKIE_NAME)
            .with_http_only(true)
            .with_secure(self.secure)
            .with_same_site(SameSite::Lax)
            .with_expiry(Expiry::OnInactivity(self.inactivity))
            .with_signed(self.key.clone())
    }
}

/// Bind `user` to the session, issuing a fresh session id first.
pub async fn log_in(session: &Session, user: &User) -> Result<(), session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id.to_string()).await?;
    tracing::debug!(user_id = %user.id, "Session established");
    Ok(())
}

/// Resolve the session's principal.
///
/// Missing or unparsable ids, users that no longer exist, and store failures
/// all yield `None`.
pub async fn current_user(session: &Session, users: &dyn UserServicePort) -> Option<User> {
    let raw_id = match session.get::<String>(USER_ID_KEY).await {
        Ok(Some(raw_id)) => raw_id,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            return None;
        }
    };

    let id = match UserId::from_string(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed session user id");
            return None;
        }
    };

    match users.get_user(&id).await {
        Ok(user) => Some(user),
        Err(UserError::NotFound(_)) => {
            tracing::debug!(user_id = %id, "Session refers to a missing user");
            None
        }
        Err(e) => {
            tracing::error!(user_id = %id, error = %e, "Failed to load session user");
            None
        }
    }
}

pub async fn is_authenticated(session: &Session, users: &dyn UserServicePort) -> bool {
    current_user(session, users).await.is_some()
}

/// Delete the session from the store and expire its cookie.
pub async fn log_out(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

/// Keep the CSRF state and PKCE verifier until the provider calls back.
pub async fn store_federation_request(
    session: &Session,
    request: &AuthorizationRequest,
) -> Result<(), session::Error> {
    session
        .insert(OAUTH_STATE_KEY, request.csrf_state.clone())
        .await?;
    session
        .insert(OAUTH_PKCE_VERIFIER_KEY, request.pkce_verifier.clone())
        .await
}

/// Consume the pending federation request as `(csrf_state, pkce_verifier)`.
///
/// Both keys are removed whatever the outcome, so a state value is usable once.
pub async fn take_federation_request(
    session: &Session,
) -> Result<Option<(String, String)>, session::Error> {
    let state = session.remove::<String>(OAUTH_STATE_KEY).await?;
    let verifier = session.remove::<String>(OAUTH_PKCE_VERIFIER_KEY).await?;
    Ok(state.zip(verifier))
}
