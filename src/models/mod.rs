//! Data models shared across backends, services, and handlers.

/// Wallet account model
pub mod account;
/// QR payment request payload
pub mod payment_request;
/// Ledger movement models and their closed enums
pub mod transaction;

pub use account::{Account, AccountProfile, SignInData};
pub use payment_request::{PaymentRequest, PAYMENT_REQUEST_TYPE};
pub use transaction::{
    Direction, LedgerEntry, PaymentMethod, TransactionKind, TransactionRecord, TransactionStatus,
};
