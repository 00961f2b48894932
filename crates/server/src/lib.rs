//! HTTP JSON API for the Abacus calculator service.
//!
//! Built on `axum` + `tokio`. The router owns no business logic: handlers
//! authenticate, call into `abacus-core` for evaluation, statistics and
//! CSV rendering, and persist through a [`CalculationStore`].
//!
//! Endpoints:
//! - GET    /health                    - Server status (no auth)
//! - POST   /auth/register             - Create an account
//! - POST   /auth/login                - Exchange credentials for tokens
//! - POST   /auth/refresh              - Exchange a refresh token for an access token
//! - POST   /calculations              - Evaluate and store a calculation
//! - GET    /calculations              - List own calculations, oldest first
//! - GET    /calculations/stats        - Usage statistics
//! - GET    /calculations/export       - CSV export (alias: /calculations/report.csv)
//! - GET    /calculations/{id}         - One calculation
//! - PUT    /calculations/{id}         - Replace inputs and recompute
//! - DELETE /calculations/{id}         - Delete
//!
//! Errors are `{"error": "<message>"}` with an appropriate status code.
//!
//! [`CalculationStore`]: abacus_storage::CalculationStore

mod accounts;
pub mod auth;
mod calculations;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use abacus_storage::CalculationStore;

pub use self::auth::{TokenIssuer, TokenKind};
pub use self::error::ApiError;
pub use self::state::{AppState, ServerConfig};

use self::accounts::{handle_login, handle_refresh, handle_register};
use self::calculations::{
    handle_create, handle_delete, handle_export, handle_get, handle_list, handle_stats,
    handle_update,
};
use self::handlers::{handle_health, handle_not_found};
use self::middleware::require_user;

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
pub(crate) fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the full application router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/calculations", get(handle_list).post(handle_create))
        .route("/calculations/stats", get(handle_stats))
        .route("/calculations/export", get(handle_export))
        .route("/calculations/report.csv", get(handle_export))
        .route(
            "/calculations/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    Router::new()
        .route("/health", get(handle_health))
        .route("/auth/register", post(handle_register))
        .route("/auth/login", post(handle_login))
        .route("/auth/refresh", post(handle_refresh))
        .merge(protected)
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server with the given store and configuration.
///
/// When TLS cert/key paths are provided (and the `tls` feature is enabled),
/// the server listens over HTTPS using `axum-server` with rustls. Otherwise
/// it uses plain HTTP and shuts down gracefully on Ctrl+C or SIGTERM.
pub async fn start_server(
    store: Arc<dyn CalculationStore>,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    );
    let state = Arc::new(AppState::new(store, tokens));
    let app = build_router(state);
    let addr = config.bind_addr();

    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&config.tls_cert, &config.tls_key) {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: std::net::SocketAddr = addr.parse()?;
        info!("abacus listening on https://{}", addr);
        axum_server::bind_rustls(socket_addr, tls)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    #[cfg(not(feature = "tls"))]
    if config.tls_cert.is_some() || config.tls_key.is_some() {
        warn!("TLS requested but this build lacks the `tls` feature; serving plain HTTP");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("abacus listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
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
                warn!(error = %e, "failed to listen for SIGTERM");
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
    info!("received shutdown signal");
}
