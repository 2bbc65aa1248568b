//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, query params, extensions)
//! 2. Performs business logic through the ledger rules and the backend
//! 3. Returns an HTTP response (JSON, status code)

/// Registration, login, restore, logout
pub mod auth;
/// Service health endpoint
pub mod health;
/// Transaction history with filters
pub mod history;
/// NFC and QR payment flows
pub mod payments;
/// Session snapshot and event stream
pub mod session;
/// Balance and top-up
pub mod wallet;
