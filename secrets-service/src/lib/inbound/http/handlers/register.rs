use axum::extract::State;
use axum::response::Html;
use axum::response::Redirect;
use axum::Form;
use tower_sessions::Session;

use super::CredentialsForm;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session;
use crate::inbound::http::views;
use crate::user::errors::UserError;

pub async fn register_page() -> Html<String> {
    Html(views::register())
}

/// Create a local account and sign it in.
///
/// Every failure, including a taken username, sends the user back to the
/// form without a message.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Redirect {
    if form.password.is_empty() {
        tracing::warn!("Registration rejected: empty password");
        return Redirect::to("/register");
    }

    let user = match create_local_user(&state, form).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            return Redirect::to("/register");
        }
    };

    if let Err(e) = session::log_in(&session, &user).await {
        tracing::error!(user_id = %user.id, error = %e, "Failed to establish session");
        return Redirect::to("/register");
    }

    Redirect::to("/secrets")
}

async fn create_local_user(state: &AppState, form: CredentialsForm) -> Result<User, UserError> {
    let command = RegisterCommand::from_email(form.username.trim(), form.password)?;
    state.user_service.register(command).await
}
