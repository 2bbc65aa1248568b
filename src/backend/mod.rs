//! Wallet storage backends.
//!
//! The service talks to exactly one [`WalletBackend`] implementation for
//! its whole lifetime, chosen at startup from [`Config::backend`]:
//!
//! - [`mock::MockBackend`]: in-memory accounts with simulated latency and a
//!   local file mirror, for demos and tests
//! - [`postgres::PgBackend`]: PostgreSQL-backed accounts and transactions
//!
//! Handlers and sessions only ever see `Arc<dyn WalletBackend>`; nothing
//! outside this module branches on which adapter is active.
//!
//! [`Config::backend`]: crate::config::Config

/// File-per-key JSON store used by the mock backend's session mirror
pub mod local_store;
/// In-memory demo backend
pub mod mock;
/// PostgreSQL backend
pub mod postgres;

pub use local_store::LocalStore;
pub use mock::MockBackend;
pub use postgres::PgBackend;

use crate::error::{AppError, BackendError};
use crate::models::{Account, LedgerEntry, SignInData, TransactionRecord};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Capability interface every wallet backend provides.
///
/// All money movement goes through [`record_entry`], which applies the
/// balance change and writes the matching transaction record as one atomic
/// step. There is deliberately no separate "update balance" operation: a
/// balance that changed without a record (or the reverse) cannot be
/// expressed through this interface.
///
/// [`record_entry`]: WalletBackend::record_entry
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Short adapter name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Cheap liveness probe of the underlying store.
    async fn ping(&self) -> Result<(), BackendError>;

    /// Verify credentials and return the account with its full history
    /// (newest first).
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` when the email/password pair matches no account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInData, AppError>;

    /// End the account's backend-side session state.
    ///
    /// For the mock backend this clears the persisted mirror; for postgres
    /// it is a no-op (sessions live entirely in the server process).
    async fn sign_out(&self, account_id: Uuid) -> Result<(), AppError>;

    /// Create a fresh account with zero balance and empty history, and
    /// sign it in.
    ///
    /// # Errors
    ///
    /// `EmailAlreadyInUse` when an account with this email exists.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignInData, AppError>;

    /// Current state of one account.
    async fn get_account(&self, account_id: Uuid) -> Result<Account, AppError>;

    /// The account's transaction history, newest first.
    async fn get_transactions(&self, account_id: Uuid)
    -> Result<Vec<TransactionRecord>, AppError>;

    /// Atomically apply a ledger entry: mutate the balance and write the
    /// completed record together, or do neither.
    ///
    /// Debits are checked for sufficiency before any mutation; a failed
    /// entry leaves balance and history untouched.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` when the account does not exist
    /// - `InvalidAmount` when the entry's amount is not positive
    /// - `InsufficientBalance` when a debit would overdraw
    async fn record_entry(
        &self,
        account_id: Uuid,
        entry: LedgerEntry,
    ) -> Result<(Account, TransactionRecord), AppError>;

    /// Rehydrate a previously signed-in account, if the backend persisted
    /// one. Postgres has no such notion and always returns `None`.
    async fn restore_session(&self) -> Result<Option<SignInData>, AppError>;
}

/// SHA-256 password digest, hex-encoded.
///
/// Both backends store this instead of the raw password. Matching is a
/// straight hash comparison on sign-in.
pub(crate) fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_stable_sha256_hex() {
        let hash = hash_password("demo123456");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_password("demo123456"));
        assert_ne!(hash, hash_password("demo123457"));
    }
}
