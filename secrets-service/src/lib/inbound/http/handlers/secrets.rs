use axum::extract::State;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use tower_sessions::Session;

use super::PageError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session;
use crate::inbound::http::views;

/// Protected page; anonymous visitors are sent to `/login`.
pub async fn secrets(State(state): State<AppState>, session: Session) -> Response {
    if session::is_authenticated(&session, state.user_service.as_ref()).await {
        Html(views::secrets()).into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// End the session. Store failures surface as an error page.
pub async fn logout(session: Session) -> Result<Redirect, PageError> {
    session::log_out(&session).await?;
    Ok(Redirect::to("/"))
}
