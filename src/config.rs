//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::path::PathBuf;

/// Which backend adapter the service runs against.
///
/// Chosen once at startup; every wallet operation goes through the same
/// adapter for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory accounts with a local file mirror and simulated latency.
    Mock,
    /// PostgreSQL-backed accounts and transactions.
    Postgres,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `BACKEND` (optional): `mock` or `postgres`, defaults to `mock`
/// - `DATABASE_URL` (required in `postgres` mode): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATA_DIR` (optional): directory for the mock backend's persisted
///   session mirror, defaults to `./data`
/// - `MOCK_LATENCY_MS` (optional): simulated network latency applied by the
///   mock backend, defaults to 250
/// - `SEED_DEMO_DATA` (optional): whether the mock backend seeds the demo
///   accounts and their history, defaults to true
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_mock_latency_ms")]
    pub mock_latency_ms: u64,

    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

/// Default backend if BACKEND environment variable is not set.
fn default_backend() -> BackendKind {
    BackendKind::Mock
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

/// Default directory for the mock backend's persisted files.
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Default simulated latency for the mock backend, in milliseconds.
fn default_mock_latency_ms() -> u64 {
    250
}

/// Demo fixtures are seeded unless explicitly disabled.
fn default_seed_demo_data() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into
    /// expected types (e.g., a non-numeric SERVER_PORT). The `postgres`
    /// backend's DATABASE_URL requirement is checked at startup, not here.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
