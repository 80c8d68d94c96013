use axum::extract::Query;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;
use tower_sessions::Session;

use crate::domain::user::models::Credentials;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session;

/// Query parameters of the provider's redirect back to us.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Send the user agent to Google's consent screen.
pub async fn begin(State(state): State<AppState>, session: Session) -> Redirect {
    let request = match state.user_service.begin_federated_login() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot start Google sign-in");
            return Redirect::to("/login");
        }
    };

    if let Err(e) = session::store_federation_request(&session, &request).await {
        tracing::error!(error = %e, "Failed to store OAuth state");
        return Redirect::to("/login");
    }

    Redirect::to(&request.url)
}

/// Complete Google sign-in. Any failure lands on `/login`.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    // Consumed up front so a state value never survives a failed attempt.
    let pending = match session::take_federation_request(&session).await {
        Ok(pending) => pending,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read OAuth state");
            return Redirect::to("/login");
        }
    };

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Google returned an error");
        return Redirect::to("/login");
    }

    let (Some(code), Some(returned_state)) = (params.code, params.state) else {
        tracing::warn!("Google callback missing code or state");
        return Redirect::to("/login");
    };

    let Some((expected_state, pkce_verifier)) = pending else {
        tracing::warn!("Google callback without a pending sign-in");
        return Redirect::to("/login");
    };

    if returned_state != expected_state {
        tracing::warn!("Google callback state mismatch");
        return Redirect::to("/login");
    }

    let credentials = Credentials::Google {
        code,
        pkce_verifier,
    };

    let user = match state.user_service.authenticate(credentials).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            return Redirect::to("/login");
        }
    };

    if let Err(e) = session::log_in(&session, &user).await {
        tracing::error!(user_id = %user.id, error = %e, "Failed to establish session");
        return Redirect::to("/login");
    }

    Redirect::to("/secrets")
}
