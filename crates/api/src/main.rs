use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_db::{AuthStore, MemoryAuthStore, PgAuthStore};

use warden_api::config::{AuthConfig, ServerConfig};
use warden_api::{routes, state::AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Logging ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warden_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Server configuration loaded");

    let auth_config = AuthConfig::from_env();
    if let Err(err) = auth_config.validate() {
        for violation in &err.violations {
            tracing::error!(%violation, "Invalid auth configuration");
        }
        tracing::error!("Refusing to start with invalid auth configuration");
        std::process::exit(1);
    }
    auth_config.log_summary();

    // --- Store ---
    let store: Arc<dyn AuthStore> = match std::env::var("AUTH_STORE").as_deref() {
        Ok("memory") => {
            tracing::warn!("Using the in-memory auth store; all data is lost on restart");
            Arc::new(MemoryAuthStore::new())
        }
        _ => {
            let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

            let pool = warden_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            warden_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            warden_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database pool ready, migrations applied");

            Arc::new(PgAuthStore::new(pool))
        }
    };

    // --- App state and background cleanup ---
    let state = AppState::new(store, auth_config);
    state.cleanup.start();

    // --- Routes and middleware ---
    let cors = build_cors_layer(&config);
    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
        // Health probe stays outside the versioned API.
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        // Layers apply bottom-up on the request path: the request id is
        // stamped first, the panic guard unwinds last.
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    // --- Serve ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Server listening");

    // ConnectInfo gives the rate limiter a peer address to key on when no
    // proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Drain background work ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if tokio::time::timeout(Duration::from_secs(5), state.cleanup.stop())
        .await
        .is_err()
    {
        tracing::warn!("Session cleanup did not stop within 5s");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Resolves when SIGINT (Ctrl-C) or, on Unix, SIGTERM arrives.
///
/// Listening for both covers interactive runs and process managers like
/// systemd or Kubernetes.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let signal = tokio::select! {
        s = interrupt => s,
        s = terminate => s,
    };
    tracing::info!(signal, "Shutdown signal received, draining connections");
}

/// CORS layer for the configured browser origins.
///
/// An origin that fails to parse aborts startup before the server accepts
/// a single request.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
