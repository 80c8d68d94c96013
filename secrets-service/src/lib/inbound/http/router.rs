use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::Request;
use axum::http::Response;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;
use tracing::Span;

use super::handlers::google;
use super::handlers::home::home;
use super::handlers::login::login;
use super::handlers::login::login_page;
use super::handlers::not_found;
use super::handlers::register::register;
use super::handlers::register::register_page;
use super::handlers::secrets::logout;
use super::handlers::secrets::secrets;
use super::session::SessionSettings;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
}

pub fn create_router<S>(
    user_service: Arc<dyn UserServicePort>,
    session_store: S,
    session_settings: &SessionSettings,
) -> Router
where
    S: SessionStore + Clone,
{
    let state = AppState { user_service };

    let public_routes = Router::new()
        .route("/", get(home))
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/auth/google", get(google::begin))
        .route("/auth/google/secrets", get(google::callback));

    // Protected responses, and the redirect away from them, must not be
    // served from any cache after logout.
    let no_cache = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("private, no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("-1"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ));

    let protected_routes = Router::new()
        .route("/secrets", get(secrets).post(logout))
        .layer(no_cache);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(session_settings.layer(session_store))
        .layer(trace_layer)
        .with_state(state)
}
