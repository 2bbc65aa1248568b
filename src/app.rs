//! Application state and router assembly.
//!
//! The same router serves both backends and is also what the integration
//! tests drive directly, without a listening socket.

use crate::backend::WalletBackend;
use crate::handlers;
use crate::middleware;
use crate::session::SessionHub;
use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state injected into handlers and middleware.
///
/// Both fields are cheap clones; the state itself is cloned per request by
/// axum.
#[derive(Clone)]
pub struct AppState {
    /// The one backend adapter chosen at startup
    pub backend: Arc<dyn WalletBackend>,
    /// All live sessions, keyed by bearer token
    pub sessions: Arc<SessionHub>,
}

impl AppState {
    pub fn new(backend: Arc<dyn WalletBackend>) -> Self {
        Self {
            backend,
            sessions: Arc::new(SessionHub::new()),
        }
    }
}

/// Build the application router.
///
/// Public routes handle the auth lifecycle and health; everything else
/// sits behind the bearer-token session middleware.
pub fn router(state: AppState) -> Router {
    // Session-protected API endpoints
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        // Session state
        .route("/api/v1/session", get(handlers::session::snapshot))
        .route("/api/v1/session/events", get(handlers::session::events))
        // Wallet operations
        .route("/api/v1/wallet/balance", get(handlers::wallet::balance))
        .route("/api/v1/wallet/topup", post(handlers::wallet::topup))
        .route("/api/v1/wallet/nfc/pay", post(handlers::payments::nfc_pay))
        .route(
            "/api/v1/wallet/qr/generate",
            post(handlers::payments::qr_generate),
        )
        .route(
            "/api/v1/wallet/qr/decode",
            post(handlers::payments::qr_decode),
        )
        .route("/api/v1/wallet/qr/pay", post(handlers::payments::qr_pay))
        .route(
            "/api/v1/wallet/transactions",
            get(handlers::history::list),
        )
        // Apply session authentication to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ));

    Router::new()
        // Public routes (no session required)
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/restore", post(handlers::auth::restore))
        .merge(authenticated_routes)
        // Request tracing for observability
        .layer(TraceLayer::new_for_http())
        // The wallet UI is a browser client on another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
