//! In-memory demo backend.
//!
//! Behaves like the real thing from the outside: simulated network latency,
//! the same error taxonomy, and a persisted session that survives process
//! restarts through a [`LocalStore`] mirror. Used for demos and for the
//! end-to-end tests.
//!
//! When seeding is enabled the store starts with two well-known accounts
//! (`demo.user@ewallet.com` / `demo123456` and `admin@ewallet.com` /
//! `admin123456`); the demo user comes with a short transaction history so
//! a fresh sign-in already has something to show.

use crate::backend::{LocalStore, WalletBackend, hash_password};
use crate::error::{AppError, BackendError};
use crate::models::{
    Account, Direction, LedgerEntry, PaymentMethod, SignInData, TransactionKind,
    TransactionRecord, TransactionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// Mirror keys, one file per key under the data directory.
const PROFILE_KEY: &str = "current_profile";
const ACCOUNT_KEY: &str = "current_account";
const TRANSACTIONS_KEY: &str = "transactions";

/// Fixed id of the seeded demo account, addressable from tests.
pub const DEMO_ACCOUNT_ID: Uuid = Uuid::from_u128(0xd1);
/// Fixed id of the seeded admin account.
pub const ADMIN_ACCOUNT_ID: Uuid = Uuid::from_u128(0xa1);

/// Seeded demo credentials.
pub const DEMO_EMAIL: &str = "demo.user@ewallet.com";
pub const DEMO_PASSWORD: &str = "demo123456";
/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "admin@ewallet.com";
pub const ADMIN_PASSWORD: &str = "admin123456";

/// Login credential held beside an account, never serialized out.
struct Credential {
    account_id: Uuid,
    password_hash: String,
}

/// Everything behind the mock's single lock.
#[derive(Default)]
struct MockState {
    accounts: HashMap<Uuid, Account>,
    /// Keyed by email.
    credentials: HashMap<String, Credential>,
    /// Per-account history, newest first.
    transactions: HashMap<Uuid, Vec<TransactionRecord>>,
    /// The one signed-in account this backend tracks, mirrored to disk.
    current: Option<Uuid>,
}

/// In-memory [`WalletBackend`] with a local file mirror.
///
/// All mutation happens inside one lock scope, so a ledger entry's balance
/// change and its history record land together or not at all.
pub struct MockBackend {
    state: Mutex<MockState>,
    store: LocalStore,
    latency: Duration,
}

impl MockBackend {
    /// Build a mock backend over `store`.
    ///
    /// `latency` is slept at the top of sign-in, registration, and ledger
    /// writes to behave like a remote call. Pass `Duration::ZERO` in tests.
    pub fn new(store: LocalStore, latency: Duration, seed_demo_data: bool) -> Self {
        let mut state = MockState::default();
        if seed_demo_data {
            seed_demo_fixtures(&mut state);
        }
        Self {
            state: Mutex::new(state),
            store,
            latency,
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Write all three mirror keys for the signed-in account.
    fn write_mirror(
        &self,
        account: &Account,
        transactions: &[TransactionRecord],
    ) -> Result<(), BackendError> {
        self.store.put(PROFILE_KEY, &account.profile())?;
        self.store.put(ACCOUNT_KEY, account)?;
        self.store.put(TRANSACTIONS_KEY, &transactions)?;
        Ok(())
    }

    fn clear_mirror(&self) -> Result<(), BackendError> {
        self.store.remove(PROFILE_KEY)?;
        self.store.remove(ACCOUNT_KEY)?;
        self.store.remove(TRANSACTIONS_KEY)?;
        Ok(())
    }

    /// Read the persisted session, if any. A corrupt key surfaces as
    /// [`BackendError::Corrupt`] for the caller to handle.
    fn load_mirror(&self) -> Result<Option<(Account, Vec<TransactionRecord>)>, BackendError> {
        let Some(account) = self.store.get::<Account>(ACCOUNT_KEY)? else {
            return Ok(None);
        };
        let transactions = self
            .store
            .get::<Vec<TransactionRecord>>(TRANSACTIONS_KEY)?
            .unwrap_or_default();
        Ok(Some((account, transactions)))
    }
}

#[async_trait]
impl WalletBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInData, AppError> {
        self.simulate_latency().await;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let credential = state
            .credentials
            .get(email)
            .ok_or(AppError::InvalidCredentials)?;
        if credential.password_hash != hash_password(password) {
            return Err(AppError::InvalidCredentials);
        }
        let account_id = credential.account_id;

        let account = state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(AppError::AccountNotFound)?;
        let transactions = state
            .transactions
            .get(&account_id)
            .cloned()
            .unwrap_or_default();

        state.current = Some(account_id);
        self.write_mirror(&account, &transactions)?;

        Ok(SignInData {
            account,
            transactions,
        })
    }

    async fn sign_out(&self, account_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.current == Some(account_id) {
            state.current = None;
            self.clear_mirror()?;
        }
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignInData, AppError> {
        self.simulate_latency().await;

        let mut state = self.state.lock().await;
        if state.credentials.contains_key(email) {
            return Err(AppError::EmailAlreadyInUse);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            balance: 0,
            created_at: Utc::now(),
        };
        state.credentials.insert(
            email.to_string(),
            Credential {
                account_id: account.id,
                password_hash: hash_password(password),
            },
        );
        state.accounts.insert(account.id, account.clone());
        state.transactions.insert(account.id, Vec::new());
        state.current = Some(account.id);
        self.write_mirror(&account, &[])?;

        Ok(SignInData {
            account,
            transactions: Vec::new(),
        })
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Account, AppError> {
        let state = self.state.lock().await;
        state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(AppError::AccountNotFound)
    }

    async fn get_transactions(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let state = self.state.lock().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(AppError::AccountNotFound);
        }
        Ok(state
            .transactions
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_entry(
        &self,
        account_id: Uuid,
        entry: LedgerEntry,
    ) -> Result<(Account, TransactionRecord), AppError> {
        self.simulate_latency().await;

        if entry.amount <= 0 {
            return Err(AppError::InvalidAmount("amount must be positive".to_string()));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(AppError::AccountNotFound)?;

        // Sufficiency check before any mutation.
        if entry.direction == Direction::Debit && account.balance < entry.amount {
            return Err(AppError::InsufficientBalance);
        }

        account.balance += entry.delta();
        let account = account.clone();

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            account_id,
            kind: entry.kind,
            direction: entry.direction,
            amount: entry.amount,
            description: entry.description,
            status: TransactionStatus::Completed,
            counterparty: entry.counterparty,
            payment_method: entry.payment_method,
            reference: entry.reference,
            created_at: Utc::now(),
        };

        let history = state.transactions.entry(account_id).or_default();
        history.insert(0, record.clone());

        if state.current == Some(account_id) {
            self.write_mirror(&account, history)?;
        }

        Ok((account, record))
    }

    async fn restore_session(&self) -> Result<Option<SignInData>, AppError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // A live in-memory session wins over the mirror.
        if let Some(account_id) = state.current {
            let account = state
                .accounts
                .get(&account_id)
                .cloned()
                .ok_or(AppError::AccountNotFound)?;
            let transactions = state
                .transactions
                .get(&account_id)
                .cloned()
                .unwrap_or_default();
            return Ok(Some(SignInData {
                account,
                transactions,
            }));
        }

        match self.load_mirror() {
            Ok(Some((account, transactions))) => {
                // Adopt the restored account as the live one.
                state.current = Some(account.id);
                state.accounts.insert(account.id, account.clone());
                state.transactions.insert(account.id, transactions.clone());
                Ok(Some(SignInData {
                    account,
                    transactions,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_retryable() => Err(AppError::Backend(e)),
            Err(e) => {
                // Corrupt mirror: recoverable by treating it as signed out.
                warn!(error = %e, "clearing corrupt session mirror");
                self.clear_mirror()?;
                Ok(None)
            }
        }
    }
}

/// Seed the two demo accounts and the demo user's history.
fn seed_demo_fixtures(state: &mut MockState) {
    let now = Utc::now();

    let demo = Account {
        id: DEMO_ACCOUNT_ID,
        email: DEMO_EMAIL.to_string(),
        display_name: "Người dùng Demo".to_string(),
        balance: 500_000,
        created_at: now - chrono::Duration::days(30),
    };
    let admin = Account {
        id: ADMIN_ACCOUNT_ID,
        email: ADMIN_EMAIL.to_string(),
        display_name: "Admin User".to_string(),
        balance: 1_000_000,
        created_at: now - chrono::Duration::days(90),
    };

    // Newest first, spanning the last week.
    let demo_history = vec![
        seeded_record(
            TransactionKind::Topup,
            Direction::Credit,
            300_000,
            "Top-up via credit card",
            None,
            Some(PaymentMethod::Card),
            now - chrono::Duration::hours(12),
        ),
        seeded_record(
            TransactionKind::Nfc,
            Direction::Debit,
            150_000,
            "NFC payment at Nhà hàng XYZ",
            Some("Nhà hàng XYZ"),
            None,
            now - chrono::Duration::days(1),
        ),
        seeded_record(
            TransactionKind::Qr,
            Direction::Debit,
            250_000,
            "QR payment: Cửa hàng ABC",
            Some("Cửa hàng ABC"),
            None,
            now - chrono::Duration::days(3),
        ),
        seeded_record(
            TransactionKind::Topup,
            Direction::Credit,
            1_000_000,
            "Top-up via bank transfer",
            None,
            Some(PaymentMethod::Bank),
            now - chrono::Duration::days(7),
        ),
    ];

    state.credentials.insert(
        demo.email.clone(),
        Credential {
            account_id: demo.id,
            password_hash: hash_password(DEMO_PASSWORD),
        },
    );
    state.credentials.insert(
        admin.email.clone(),
        Credential {
            account_id: admin.id,
            password_hash: hash_password(ADMIN_PASSWORD),
        },
    );
    state.transactions.insert(demo.id, demo_history);
    state.transactions.insert(admin.id, Vec::new());
    state.accounts.insert(demo.id, demo);
    state.accounts.insert(admin.id, admin);
}

fn seeded_record(
    kind: TransactionKind,
    direction: Direction,
    amount: i64,
    description: &str,
    counterparty: Option<&str>,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
) -> TransactionRecord {
    TransactionRecord {
        id: Uuid::new_v4(),
        account_id: DEMO_ACCOUNT_ID,
        kind,
        direction,
        amount,
        description: description.to_string(),
        status: TransactionStatus::Completed,
        counterparty: counterparty.map(str::to_string),
        payment_method,
        reference: None,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_in(dir: &tempfile::TempDir, seed: bool) -> MockBackend {
        let store = LocalStore::new(dir.path().join("data"));
        MockBackend::new(store, Duration::ZERO, seed)
    }

    fn credit(amount: i64) -> LedgerEntry {
        LedgerEntry {
            kind: TransactionKind::Topup,
            direction: Direction::Credit,
            amount,
            description: "Top-up via bank transfer".to_string(),
            counterparty: None,
            payment_method: Some(PaymentMethod::Bank),
            reference: None,
        }
    }

    fn debit(amount: i64) -> LedgerEntry {
        LedgerEntry {
            kind: TransactionKind::Nfc,
            direction: Direction::Debit,
            amount,
            description: "NFC payment at Test Shop".to_string(),
            counterparty: Some("Test Shop".to_string()),
            payment_method: None,
            reference: None,
        }
    }

    #[tokio::test]
    async fn demo_sign_in_returns_seeded_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let data = backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert_eq!(data.account.id, DEMO_ACCOUNT_ID);
        assert_eq!(data.account.balance, 500_000);
        assert_eq!(data.transactions.len(), 4);

        // Newest first: the half-day-old card top-up leads.
        assert_eq!(data.transactions[0].amount, 300_000);
        assert_eq!(data.transactions[0].payment_method, Some(PaymentMethod::Card));
        assert_eq!(data.transactions[3].amount, 1_000_000);
        for pair in data.transactions.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let wrong_password = backend.sign_in(DEMO_EMAIL, "wrong123456").await;
        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));

        let unknown_email = backend.sign_in("nobody@ewallet.com", DEMO_PASSWORD).await;
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn credit_updates_balance_and_prepends_record() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);
        backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        let (account, record) = backend
            .record_entry(DEMO_ACCOUNT_ID, credit(500_000))
            .await
            .unwrap();
        assert_eq!(account.balance, 1_000_000);
        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(record.signed_amount(), 500_000);

        let history = backend.get_transactions(DEMO_ACCOUNT_ID).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].id, record.id);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let result = backend
            .record_entry(ADMIN_ACCOUNT_ID, debit(2_000_000))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientBalance)));

        let account = backend.get_account(ADMIN_ACCOUNT_ID).await.unwrap();
        assert_eq!(account.balance, 1_000_000);
        assert!(backend
            .get_transactions(ADMIN_ACCOUNT_ID)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn paying_ten_with_a_balance_of_five_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, false);

        let data = backend
            .create_account("five@ewallet.com", "password1", "Five")
            .await
            .unwrap();
        backend.record_entry(data.account.id, credit(5)).await.unwrap();

        let result = backend.record_entry(data.account.id, debit(10)).await;
        assert!(matches!(result, Err(AppError::InsufficientBalance)));
        let account = backend.get_account(data.account.id).await.unwrap();
        assert_eq!(account.balance, 5);
    }

    #[tokio::test]
    async fn zero_and_negative_amounts_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let zero = backend.record_entry(DEMO_ACCOUNT_ID, credit(0)).await;
        assert!(matches!(zero, Err(AppError::InvalidAmount(_))));
        let negative = backend.record_entry(DEMO_ACCOUNT_ID, credit(-5)).await;
        assert!(matches!(negative, Err(AppError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn registration_starts_empty_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let data = backend
            .create_account("new.user@ewallet.com", "secret99", "New User")
            .await
            .unwrap();
        assert_eq!(data.account.balance, 0);
        assert!(data.transactions.is_empty());

        let duplicate = backend
            .create_account("new.user@ewallet.com", "other123", "Other")
            .await;
        assert!(matches!(duplicate, Err(AppError::EmailAlreadyInUse)));

        let seeded = backend
            .create_account(DEMO_EMAIL, "whatever99", "Imposter")
            .await;
        assert!(matches!(seeded, Err(AppError::EmailAlreadyInUse)));
    }

    #[tokio::test]
    async fn reads_do_not_change_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);

        let first = backend.get_account(DEMO_ACCOUNT_ID).await.unwrap();
        let second = backend.get_account(DEMO_ACCOUNT_ID).await.unwrap();
        assert_eq!(first, second);

        let history_a = backend.get_transactions(DEMO_ACCOUNT_ID).await.unwrap();
        let history_b = backend.get_transactions(DEMO_ACCOUNT_ID).await.unwrap();
        assert_eq!(history_a, history_b);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);
        let missing = Uuid::new_v4();

        assert!(matches!(
            backend.get_account(missing).await,
            Err(AppError::AccountNotFound)
        ));
        assert!(matches!(
            backend.get_transactions(missing).await,
            Err(AppError::AccountNotFound)
        ));
        assert!(matches!(
            backend.record_entry(missing, credit(10_000)).await,
            Err(AppError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn session_survives_a_restart_through_the_mirror() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = backend_in(&dir, true);
            backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
            backend
                .record_entry(DEMO_ACCOUNT_ID, credit(500_000))
                .await
                .unwrap();
        }

        // A new process over the same directory, without fixtures.
        let backend = backend_in(&dir, false);
        let restored = backend.restore_session().await.unwrap().unwrap();
        assert_eq!(restored.account.id, DEMO_ACCOUNT_ID);
        assert_eq!(restored.account.balance, 1_000_000);
        assert_eq!(restored.transactions.len(), 5);
    }

    #[tokio::test]
    async fn restore_without_a_persisted_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);
        assert!(backend.restore_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_mirror_is_cleared_and_treated_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = backend_in(&dir, true);
            backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        }
        let account_file = dir.path().join("data").join("current_account.json");
        std::fs::write(&account_file, "{definitely not an account").unwrap();

        let backend = backend_in(&dir, false);
        assert!(backend.restore_session().await.unwrap().is_none());
        // The bad state is gone, so the next restore is a clean miss too.
        assert!(!account_file.exists());
        assert!(backend.restore_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_the_mirror_and_the_live_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);
        backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        backend.sign_out(DEMO_ACCOUNT_ID).await.unwrap();

        assert!(backend.restore_session().await.unwrap().is_none());
        let fresh = backend_in(&dir, false);
        assert!(fresh.restore_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signing_out_someone_else_keeps_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_in(&dir, true);
        backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        backend.sign_out(ADMIN_ACCOUNT_ID).await.unwrap();
        assert!(backend.restore_session().await.unwrap().is_some());
    }
}
