//! E-wallet ledger server.
//!
//! An axum HTTP server over a pluggable wallet backend: a seeded in-memory
//! mock with a JSON file mirror for local development, or Postgres via sqlx
//! for real deployments. Session state lives in this process and fans out
//! change events to subscribers over SSE.

pub mod app;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
