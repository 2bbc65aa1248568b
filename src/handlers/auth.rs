//! Authentication HTTP handlers.
//!
//! This module implements the auth lifecycle endpoints:
//! - POST /api/v1/auth/register - Create an account and sign it in
//! - POST /api/v1/auth/login - Sign in with email and password
//! - POST /api/v1/auth/restore - Reopen a backend-persisted session
//! - POST /api/v1/auth/logout - Close the calling session

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::CurrentSession,
    models::{Account, SignInData, TransactionRecord},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Request body for registration.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "new.user@ewallet.com",
///   "password": "secret99",
///   "display_name": "New User"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for every endpoint that opens a session.
///
/// The token authenticates all subsequent calls as
/// `Authorization: Bearer <token>`; account and history let the client
/// render the wallet without another round trip.
///
/// # JSON Example
///
/// ```json
/// {
///   "token": "3f7c...",
///   "account": {
///     "id": "00000000-0000-0000-0000-0000000000d1",
///     "email": "demo.user@ewallet.com",
///     "display_name": "Người dùng Demo",
///     "balance": 500000,
///     "created_at": "2025-12-20T10:00:00Z"
///   },
///   "transactions": []
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: Account,
    pub transactions: Vec<TransactionRecord>,
}

async fn open_session(state: &AppState, data: SignInData) -> AuthResponse {
    let (token, session) = state.sessions.open(data).await;
    let snapshot = session.snapshot().await;
    AuthResponse {
        token,
        account: snapshot.account,
        transactions: snapshot.transactions,
    }
}

/// Register a new account.
///
/// # Validation
///
/// - `email` must look like an address (contains `@`)
/// - `password` must be at least 6 characters
/// - `display_name` must not be blank
///
/// The new account starts with a zero balance and an empty history.
///
/// # Response
///
/// - **Success (201 Created)**: [`AuthResponse`] with a fresh token
/// - **Error (409)**: email already has an account
/// - **Error (400)**: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(AppError::InvalidRequest(
            "email must be a valid address".to_string(),
        ));
    }
    if request.password.chars().count() < 6 {
        return Err(AppError::InvalidRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::InvalidRequest(
            "display name must not be blank".to_string(),
        ));
    }

    let data = state
        .backend
        .create_account(email, &request.password, display_name)
        .await?;
    let response = open_session(&state, data).await;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Sign in with email and password.
///
/// # Response
///
/// - **Success (200 OK)**: [`AuthResponse`] with the account and its
///   history, newest first
/// - **Error (401)**: email or password is incorrect
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let data = state
        .backend
        .sign_in(request.email.trim(), &request.password)
        .await?;
    Ok(Json(open_session(&state, data).await))
}

/// Reopen a session the backend persisted across restarts.
///
/// The mock backend mirrors the signed-in account to disk; if a mirror
/// exists this rehydrates it and issues a fresh token. Backends without
/// persisted sessions (postgres) always report 401 here.
pub async fn restore(
    State(state): State<AppState>,
) -> Result<Json<AuthResponse>, AppError> {
    let data = state
        .backend
        .restore_session()
        .await?
        .ok_or(AppError::InvalidSession)?;
    Ok(Json(open_session(&state, data).await))
}

/// Close the calling session.
///
/// Signs the account out of the backend (clearing any persisted mirror),
/// notifies the session's watchers, and invalidates the token.
///
/// # Response
///
/// - **Success (204 No Content)**
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<StatusCode, AppError> {
    state
        .backend
        .sign_out(current.session.account_id())
        .await?;
    state.sessions.close(&current.token).await;
    Ok(StatusCode::NO_CONTENT)
}
