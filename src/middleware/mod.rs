//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers. They can
//! authenticate requests, attach context, or short-circuit with an error
//! response.

/// Bearer-token session middleware
pub mod auth;
