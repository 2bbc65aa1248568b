//! Ledger rules - validation and entry construction for every money flow.
//!
//! Handlers never assemble a [`LedgerEntry`] by hand; they go through the
//! builders here so bounds checks and description wording stay in one
//! place. Validation always happens before any backend call: a rejected
//! flow leaves balance and history untouched.
//!
//! Sufficiency for debits is deliberately NOT checked here. That check
//! belongs inside the backend's atomic `record_entry`, where it still
//! holds when the entry is applied.

use crate::error::AppError;
use crate::models::{Direction, LedgerEntry, PaymentMethod, PaymentRequest, TransactionKind};
use uuid::Uuid;

/// Smallest accepted top-up, in whole VND.
pub const TOPUP_MIN: i64 = 10_000;
/// Largest accepted top-up, in whole VND.
pub const TOPUP_MAX: i64 = 10_000_000;

/// Human-readable funding source, used in generated descriptions.
fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Bank => "bank transfer",
        PaymentMethod::Card => "credit card",
        PaymentMethod::Ewallet => "e-wallet",
    }
}

/// Build a top-up credit.
///
/// # Errors
///
/// `InvalidAmount` when the amount is outside the accepted
/// [`TOPUP_MIN`]..=[`TOPUP_MAX`] range.
pub fn topup_entry(amount: i64, method: PaymentMethod) -> Result<LedgerEntry, AppError> {
    if amount < TOPUP_MIN || amount > TOPUP_MAX {
        return Err(AppError::InvalidAmount(format!(
            "top-up must be between {TOPUP_MIN} and {TOPUP_MAX} VND"
        )));
    }
    Ok(LedgerEntry {
        kind: TransactionKind::Topup,
        direction: Direction::Credit,
        amount,
        description: format!("Top-up via {}", method_label(method)),
        counterparty: None,
        payment_method: Some(method),
        reference: None,
    })
}

/// Build a contactless payment debit.
///
/// # Errors
///
/// - `InvalidAmount` when the amount is not positive
/// - `InvalidRequest` when the merchant name is blank
pub fn nfc_entry(amount: i64, merchant: &str) -> Result<LedgerEntry, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount("amount must be positive".to_string()));
    }
    let merchant = merchant.trim();
    if merchant.is_empty() {
        return Err(AppError::InvalidRequest("merchant must not be blank".to_string()));
    }
    Ok(LedgerEntry {
        kind: TransactionKind::Nfc,
        direction: Direction::Debit,
        amount,
        description: format!("NFC payment at {merchant}"),
        counterparty: Some(merchant.to_string()),
        payment_method: None,
        reference: None,
    })
}

/// Parse a scanned QR payload into a payment request.
///
/// Checks the `payment_request` discriminator and that the requested
/// amount is positive; the returned request is what the client shows in
/// its confirmation dialog.
///
/// # Errors
///
/// `InvalidPayload` for anything that is not a well-formed payment
/// request.
pub fn decode_payment_request(payload: &str) -> Result<PaymentRequest, AppError> {
    let request = PaymentRequest::decode(payload).map_err(AppError::InvalidPayload)?;
    if request.amount <= 0 {
        return Err(AppError::InvalidPayload(
            "amount must be positive".to_string(),
        ));
    }
    Ok(request)
}

/// Build the payer-side debit for a decoded payment request.
///
/// The payload's `transaction_id` is carried along as the record's
/// reference; the recipient is only recorded as the counterparty, no
/// second account is touched.
pub fn qr_entry(request: &PaymentRequest) -> LedgerEntry {
    LedgerEntry {
        kind: TransactionKind::Qr,
        direction: Direction::Debit,
        amount: request.amount,
        description: format!("QR payment: {}", request.description),
        counterparty: Some(request.merchant.clone()),
        payment_method: None,
        reference: Some(request.transaction_id.clone()),
    }
}

/// Build a payment request for the signed-in account to display as a QR
/// code.
///
/// # Errors
///
/// - `InvalidAmount` when the amount is not positive
/// - `InvalidRequest` when the description is blank
pub fn generate_payment_request(
    amount: i64,
    description: &str,
    merchant: &str,
    recipient_id: Uuid,
) -> Result<PaymentRequest, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount("amount must be positive".to_string()));
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::InvalidRequest(
            "description must not be blank".to_string(),
        ));
    }
    Ok(PaymentRequest::new(
        amount,
        description.to_string(),
        merchant.to_string(),
        recipient_id,
    ))
}
