use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use secrets_service::config::Config;
use secrets_service::domain::user::service::UserService;
use secrets_service::identity::GoogleIdentityProvider;
use secrets_service::inbound::http::router::create_router;
use secrets_service::inbound::http::session::SessionSettings;
use secrets_service::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secrets_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "secrets-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        password_scheme = %config.password.scheme,
        google_enabled = !config.google.client_id.trim().is_empty(),
        "Configuration loaded"
    );

    let session_settings = SessionSettings::from_config(&config.session)?;
    let authenticator = Arc::new(Authenticator::for_scheme(
        config.password.scheme,
        config.password.encryption_key(),
    )?);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to connect to database"))?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let session_store = PostgresStore::new(pg_pool.clone());
    session_store.migrate().await?;
    let expiry_task = spawn_expired_session_sweep(session_store.clone());

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let identity_provider = Arc::new(GoogleIdentityProvider::new(&config.google)?);
    let user_service = Arc::new(UserService::new(
        user_repository,
        identity_provider,
        authenticator,
    ));

    let http_application = create_router(user_service, session_store, &session_settings);

    let http_address = format!("{}:{}", config.server.host, config.server.port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.port,
        protocol = "http",
        "Http server listening"
    );

    let result = axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    expiry_task.abort();
    pg_pool.close().await;

    match result {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(ref e) => tracing::error!(error = %e, "Server error"),
    }

    result?;
    Ok(())
}

fn spawn_expired_session_sweep(store: PostgresStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EXPIRED_SESSION_SWEEP);
        loop {
            interval.tick().await;
            if let Err(e) = store.delete_expired().await {
                tracing::warn!(error = %e, "Failed to delete expired sessions");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Gracefully shutting down");
}
