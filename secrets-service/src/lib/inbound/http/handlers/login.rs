use axum::extract::State;
use axum::response::Html;
use axum::response::Redirect;
use axum::Form;
use tower_sessions::Session;

use super::CredentialsForm;
use crate::domain::user::models::Credentials;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session;
use crate::inbound::http::views;

pub async fn login_page() -> Html<String> {
    Html(views::login())
}

/// Local strategy sign-in.
///
/// Unknown users and wrong passwords are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Redirect {
    let credentials = Credentials::Local {
        username: form.username.trim().to_string(),
        password: form.password,
    };

    let user = match state.user_service.authenticate(credentials).await {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(error = %e, "Local sign-in rejected");
            return Redirect::to("/login");
        }
    };

    if let Err(e) = session::log_in(&session, &user).await {
        tracing::error!(user_id = %user.id, error = %e, "Failed to establish session");
        return Redirect::to("/login");
    }

    Redirect::to("/secrets")
}
