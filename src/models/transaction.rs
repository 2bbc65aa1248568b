//! Transaction data models.
//!
//! This module defines:
//! - `TransactionKind`, `Direction`, `TransactionStatus`, `PaymentMethod`:
//!   closed enums for every categorical field (no stringly-typed values)
//! - `TransactionRecord`: One completed ledger movement
//! - `LedgerEntry`: The caller-supplied part of a movement, before the
//!   backend applies and completes it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What produced a ledger movement.
///
/// Closed set; anything else is rejected at the edge rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Balance loaded into the wallet
    Topup,
    /// Generic outgoing payment
    Payment,
    /// Contactless payment at a terminal
    Nfc,
    /// Payment initiated by scanning a QR payload
    Qr,
}

impl TransactionKind {
    /// Wire/database representation, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Topup => "topup",
            TransactionKind::Payment => "payment",
            TransactionKind::Nfc => "nfc",
            TransactionKind::Qr => "qr",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topup" => Ok(TransactionKind::Topup),
            "payment" => Ok(TransactionKind::Payment),
            "nfc" => Ok(TransactionKind::Nfc),
            "qr" => Ok(TransactionKind::Qr),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Whether a movement increases or decreases the balance.
///
/// Amounts are always positive magnitudes; the direction carries the sign.
/// Display code that wants a signed number derives it at the edge via
/// [`TransactionRecord::signed_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money in (balance increases)
    Credit,
    /// Money out (balance decreases)
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Direction::Credit),
            "debit" => Ok(Direction::Debit),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Lifecycle state of a movement.
///
/// The backends only ever store `completed` records (a movement is written
/// together with its balance change or not at all); `pending` and `failed`
/// exist for histories imported from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Funding source for a top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank transfer
    Bank,
    /// Credit card
    Card,
    /// Another e-wallet
    Ewallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bank => "bank",
            PaymentMethod::Card => "card",
            PaymentMethod::Ewallet => "ewallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank" => Ok(PaymentMethod::Bank),
            "card" => Ok(PaymentMethod::Card),
            "ewallet" => Ok(PaymentMethod::Ewallet),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// One completed ledger movement on an account.
///
/// # Amount Convention
///
/// `amount` is a positive magnitude in whole VND; `direction` says which
/// way the money moved. Nothing downstream branches on the sign of a
/// stored number.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "account_id": "00000000-0000-0000-0000-0000000000d1",
///   "kind": "qr",
///   "direction": "debit",
///   "amount": 75000,
///   "description": "QR payment: Lunch order",
///   "status": "completed",
///   "counterparty": "Coffee House",
///   "payment_method": null,
///   "reference": "qr_1766311200000",
///   "created_at": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier for this movement
    pub id: Uuid,

    /// Account this movement belongs to
    pub account_id: Uuid,

    /// What produced the movement
    pub kind: TransactionKind,

    /// Credit or debit
    pub direction: Direction,

    /// Positive magnitude in whole VND
    ///
    /// Must be > 0 (backstopped by a database CHECK constraint in
    /// postgres mode).
    pub amount: i64,

    /// Human-readable description
    pub description: String,

    /// Lifecycle state (stored records are always `completed`)
    pub status: TransactionStatus,

    /// The other party, e.g. the merchant paid
    pub counterparty: Option<String>,

    /// Funding source, set on top-ups
    pub payment_method: Option<PaymentMethod>,

    /// External reference, e.g. the QR payload's transaction id
    pub reference: Option<String>,

    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Signed amount for display: credits positive, debits negative.
    pub fn signed_amount(&self) -> i64 {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

/// The caller-supplied part of a movement.
///
/// A backend turns this into a [`TransactionRecord`] by applying the
/// balance delta and filling in `id`, `account_id`, `created_at`, and
/// `status` in one atomic step: the record exists only if the balance
/// changed, and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    pub direction: Direction,
    pub amount: i64,
    pub description: String,
    pub counterparty: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub reference: Option<String>,
}

impl LedgerEntry {
    /// Signed balance delta this entry applies when recorded.
    pub fn delta(&self) -> i64 {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(direction: Direction, amount: i64) -> TransactionRecord {
        TransactionRecord {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            kind: TransactionKind::Payment,
            direction,
            amount,
            description: "test".to_string(),
            status: TransactionStatus::Completed,
            counterparty: None,
            payment_method: None,
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(Direction::Credit, 500_000, 500_000)]
    #[case(Direction::Debit, 75_000, -75_000)]
    fn signed_amount_follows_direction(
        #[case] direction: Direction,
        #[case] amount: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(record(direction, amount).signed_amount(), expected);
    }

    #[rstest]
    #[case(Direction::Credit, 10_000, 10_000)]
    #[case(Direction::Debit, 10_000, -10_000)]
    fn entry_delta_follows_direction(
        #[case] direction: Direction,
        #[case] amount: i64,
        #[case] expected: i64,
    ) {
        let entry = LedgerEntry {
            kind: TransactionKind::Topup,
            direction,
            amount,
            description: "test".to_string(),
            counterparty: None,
            payment_method: None,
            reference: None,
        };
        assert_eq!(entry.delta(), expected);
    }

    #[rstest]
    #[case(TransactionKind::Topup, "topup")]
    #[case(TransactionKind::Payment, "payment")]
    #[case(TransactionKind::Nfc, "nfc")]
    #[case(TransactionKind::Qr, "qr")]
    fn kind_wire_names_round_trip(#[case] kind: TransactionKind, #[case] wire: &str) {
        assert_eq!(kind.as_str(), wire);
        assert_eq!(wire.parse::<TransactionKind>().unwrap(), kind);
        assert_eq!(serde_json::to_value(kind).unwrap(), wire);
    }

    #[rstest]
    #[case(PaymentMethod::Bank, "bank")]
    #[case(PaymentMethod::Card, "card")]
    #[case(PaymentMethod::Ewallet, "ewallet")]
    fn payment_method_wire_names_round_trip(#[case] method: PaymentMethod, #[case] wire: &str) {
        assert_eq!(method.as_str(), wire);
        assert_eq!(wire.parse::<PaymentMethod>().unwrap(), method);
        assert_eq!(serde_json::to_value(method).unwrap(), wire);
    }

    #[test]
    fn unknown_wire_names_are_rejected() {
        assert!("withdrawal".parse::<TransactionKind>().is_err());
        assert!("sideways".parse::<Direction>().is_err());
        assert!("done".parse::<TransactionStatus>().is_err());
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn record_serializes_with_lowercase_enums() {
        let mut r = record(Direction::Debit, 150_000);
        r.kind = TransactionKind::Nfc;
        r.payment_method = Some(PaymentMethod::Card);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["kind"], "nfc");
        assert_eq!(json["direction"], "debit");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["payment_method"], "card");
        assert_eq!(json["amount"], 150_000);
    }
}
