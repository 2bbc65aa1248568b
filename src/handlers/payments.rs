//! Payment HTTP handlers.
//!
//! This module implements the payment endpoints:
//! - POST /api/v1/wallet/nfc/pay - Contactless payment at a terminal
//! - POST /api/v1/wallet/qr/generate - Build a payment request QR payload
//! - POST /api/v1/wallet/qr/decode - Parse a scanned payload for review
//! - POST /api/v1/wallet/qr/pay - Execute a reviewed payment request
//!
//! Device concerns (card detection, QR rendering, animations) live in the
//! client; these endpoints only validate and execute the ledger contract.

use crate::{
    app::AppState,
    error::AppError,
    handlers::wallet::WalletChangeResponse,
    middleware::auth::CurrentSession,
    models::PaymentRequest,
    services::ledger,
};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

/// Request body for NFC payments.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 150000,
///   "merchant": "Nhà hàng XYZ"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct NfcPayRequest {
    pub amount: i64,
    pub merchant: String,
}

/// Request body for generating a payment request.
#[derive(Debug, Deserialize)]
pub struct QrGenerateRequest {
    pub amount: i64,
    pub description: String,
}

/// Response carrying a freshly generated payment request.
///
/// `payload` is the exact string to render as a QR image; `request` is the
/// structured form for display next to it.
#[derive(Debug, Serialize)]
pub struct QrGenerateResponse {
    pub payload: String,
    pub request: PaymentRequest,
}

/// Request body for decode and pay: the scanned QR payload verbatim.
///
/// # JSON Example
///
/// ```json
/// { "payload": "{\"type\":\"payment_request\",...}" }
/// ```
#[derive(Debug, Deserialize)]
pub struct QrPayloadRequest {
    pub payload: String,
}

/// Pay a merchant over NFC.
///
/// # Response
///
/// - **Success (200 OK)**: [`WalletChangeResponse`] with the debit applied
/// - **Error (400)**: non-positive amount or blank merchant
/// - **Error (422)**: insufficient balance (nothing is changed)
pub async fn nfc_pay(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(request): Json<NfcPayRequest>,
) -> Result<Json<WalletChangeResponse>, AppError> {
    let entry = ledger::nfc_entry(request.amount, &request.merchant)?;
    let (account, transaction) = current
        .session
        .record(state.backend.as_ref(), entry)
        .await?;
    Ok(Json(WalletChangeResponse {
        account,
        transaction,
    }))
}

/// Generate a payment request for the signed-in account.
///
/// The merchant name on the request is the caller's display name, and the
/// recipient id is the caller's account id; whoever scans the code pays
/// this account.
pub async fn qr_generate(
    Extension(current): Extension<CurrentSession>,
    Json(request): Json<QrGenerateRequest>,
) -> Result<Json<QrGenerateResponse>, AppError> {
    let snapshot = current.session.snapshot().await;
    let payment_request = ledger::generate_payment_request(
        request.amount,
        &request.description,
        &snapshot.account.display_name,
        snapshot.account.id,
    )?;
    let payload = payment_request
        .encode()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
    Ok(Json(QrGenerateResponse {
        payload,
        request: payment_request,
    }))
}

/// Parse a scanned payload so the client can show its confirmation
/// dialog.
///
/// Nothing is charged here; calling [`qr_pay`] afterwards is the
/// confirmation.
///
/// # Response
///
/// - **Success (200 OK)**: the structured [`PaymentRequest`]
/// - **Error (400)**: malformed or tampered payload
pub async fn qr_decode(
    Extension(_current): Extension<CurrentSession>,
    Json(request): Json<QrPayloadRequest>,
) -> Result<Json<PaymentRequest>, AppError> {
    let payment_request = ledger::decode_payment_request(&request.payload)?;
    Ok(Json(payment_request))
}

/// Execute a payment request the user has confirmed.
///
/// The payload is decoded and checked again server-side; the debit and
/// its record are applied atomically to the payer. The recipient is
/// recorded as the counterparty only, no second account is touched.
///
/// # Response
///
/// - **Success (200 OK)**: [`WalletChangeResponse`] with the debit applied
/// - **Error (400)**: malformed or tampered payload
/// - **Error (422)**: insufficient balance (nothing is changed)
pub async fn qr_pay(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(request): Json<QrPayloadRequest>,
) -> Result<Json<WalletChangeResponse>, AppError> {
    let payment_request = ledger::decode_payment_request(&request.payload)?;
    let entry = ledger::qr_entry(&payment_request);
    let (account, transaction) = current
        .session
        .record(state.backend.as_ref(), entry)
        .await?;
    Ok(Json(WalletChangeResponse {
        account,
        transaction,
    }))
}
