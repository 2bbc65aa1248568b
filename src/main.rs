//! E-wallet server binary.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Construct the configured backend (mock by default, Postgres when
//!    `BACKEND=postgres`; migrations run automatically for Postgres)
//! 3. Build the HTTP router with routes and middleware
//! 4. Start serving on the configured port

use anyhow::Context;
use ewallet_server::app::{self, AppState};
use ewallet_server::backend::{LocalStore, MockBackend, PgBackend, WalletBackend};
use ewallet_server::config::{BackendKind, Config};
use ewallet_server::db;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Select the single backend adapter for this process
    let backend: Arc<dyn WalletBackend> = match config.backend {
        BackendKind::Mock => {
            let store = LocalStore::new(config.data_dir.clone());
            Arc::new(MockBackend::new(
                store,
                Duration::from_millis(config.mock_latency_ms),
                config.seed_demo_data,
            ))
        }
        BackendKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required when BACKEND=postgres")?;
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");
            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");
            Arc::new(PgBackend::new(pool))
        }
    };
    tracing::info!(backend = backend.name(), "Backend ready");

    let app = app::router(AppState::new(backend));

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
