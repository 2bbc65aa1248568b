//! Session authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the bearer token from the Authorization header
//! 2. Resolve it to a live session in the hub
//! 3. Inject the session into the request for handlers to use
//! 4. Reject unknown or logged-out tokens with HTTP 401

use crate::{app::AppState, error::AppError, session::Session};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The resolved session attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<CurrentSession>`. The token is carried along so logout can
/// close exactly the session that made the call.
#[derive(Clone)]
pub struct CurrentSession {
    pub token: String,
    pub session: Arc<Session>,
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from the request
/// 2. Look the token up in the session hub
/// 3. If found: inject [`CurrentSession`], call the next handler
/// 4. If not: return 401 with the standard error envelope
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer 3f7c...64 hex chars...
/// ```
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidSession)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidSession)?
        .to_string();

    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or(AppError::InvalidSession)?;

    request.extensions_mut().insert(CurrentSession { token, session });

    Ok(next.run(request).await)
}
