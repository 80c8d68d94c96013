use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use tower_sessions::session;

use super::views;

pub mod google;
pub mod home;
pub mod login;
pub mod register;
pub mod secrets;

/// Form body shared by `/register` and `/login`.
///
/// Missing fields read as empty strings and are rejected downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Failure rendered as an HTML error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    InternalServerError(String),
    NotFound(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            PageError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
            PageError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Html(views::error(status.as_u16(), &message))).into_response()
    }
}

impl From<session::Error> for PageError {
    fn from(err: session::Error) -> Self {
        PageError::InternalServerError(format!("Session error: {}", err))
    }
}

/// Fallback for unrouted paths.
pub async fn not_found() -> PageError {
    PageError::NotFound("Page not found.".to_string())
}
