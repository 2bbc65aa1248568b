//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: The wallet account entity shared by every backend
//! - `AccountProfile`: The identity slice persisted by the mock backend
//! - `SignInData`: What a successful sign-in or registration hands back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::transaction::TransactionRecord;

/// Represents a wallet account.
///
/// The same shape is stored by both backends and returned to API clients.
/// Credentials are deliberately absent: password hashes live beside the
/// account inside each backend's store and are never serialized out.
///
/// # Balance Storage
///
/// Balances are whole VND stored as `i64` to avoid floating-point precision
/// issues. The balance is never negative; debits that would overdraw are
/// rejected before any mutation.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "00000000-0000-0000-0000-0000000000d1",
///   "email": "demo.user@ewallet.com",
///   "display_name": "Người dùng Demo",
///   "balance": 500000,
///   "created_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Login email, unique across the backend
    pub email: String,

    /// Human-readable name shown in the client
    pub display_name: String,

    /// Current balance in whole VND
    ///
    /// Must be >= 0 (backstopped by a database CHECK constraint in
    /// postgres mode).
    pub balance: i64,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The identity slice of this account, without the balance.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Identity-only view of an account.
///
/// The mock backend mirrors this under its `current_profile` key so a
/// restarted process can greet the user before the full ledger snapshot
/// is rehydrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Payload handed back by sign-in, registration, and session restore.
///
/// Bundles the account with its transaction history (newest first) so the
/// client renders a complete wallet from one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInData {
    pub account: Account,
    pub transactions: Vec<TransactionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: Uuid::from_u128(0xd1),
            email: "demo.user@ewallet.com".to_string(),
            display_name: "Người dùng Demo".to_string(),
            balance: 500_000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profile_drops_the_balance() {
        let account = sample_account();
        let profile = account.profile();
        assert_eq!(profile.id, account.id);
        assert_eq!(profile.email, account.email);
        assert_eq!(profile.display_name, account.display_name);

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("balance").is_none());
    }

    #[test]
    fn account_serializes_without_credential_fields() {
        let json = serde_json::to_value(sample_account()).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["balance"], 500_000);
    }
}
