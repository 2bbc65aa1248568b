//! Wallet HTTP handlers.
//!
//! This module implements the core wallet endpoints:
//! - GET /api/v1/wallet/balance - Current balance
//! - POST /api/v1/wallet/topup - Load money into the wallet

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::CurrentSession,
    models::{Account, PaymentMethod, TransactionRecord},
    services::ledger,
};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

/// Response body for the balance endpoint.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance in whole VND
    pub balance: i64,
}

/// Response returned by every endpoint that moves money.
///
/// Carries the post-mutation account (authoritative balance) and the
/// completed transaction record, so clients update without a second
/// request.
///
/// # JSON Example
///
/// ```json
/// {
///   "account": { "id": "...", "balance": 1000000, ... },
///   "transaction": {
///     "kind": "topup",
///     "direction": "credit",
///     "amount": 500000,
///     "status": "completed",
///     ...
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct WalletChangeResponse {
    pub account: Account,
    pub transaction: TransactionRecord,
}

/// Request body for top-ups.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 500000,
///   "method": "bank"
/// }
/// ```
///
/// # Validation
///
/// - `amount`: integer VND between 10 000 and 10 000 000
/// - `method`: one of `bank`, `card`, `ewallet`
#[derive(Debug, Deserialize)]
pub struct TopupRequest {
    pub amount: i64,
    pub method: PaymentMethod,
}

/// Current wallet balance.
pub async fn balance(Extension(current): Extension<CurrentSession>) -> Json<BalanceResponse> {
    let snapshot = current.session.snapshot().await;
    Json(BalanceResponse {
        balance: snapshot.account.balance,
    })
}

/// Load money into the wallet.
///
/// The credit and its history record are applied atomically by the
/// backend; session watchers are notified with the new state.
///
/// # Response
///
/// - **Success (200 OK)**: [`WalletChangeResponse`]
/// - **Error (400)**: amount outside the accepted top-up range
pub async fn topup(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(request): Json<TopupRequest>,
) -> Result<Json<WalletChangeResponse>, AppError> {
    let entry = ledger::topup_entry(request.amount, request.method)?;
    let (account, transaction) = current
        .session
        .record(state.backend.as_ref(), entry)
        .await?;
    Ok(Json(WalletChangeResponse {
        account,
        transaction,
    }))
}
