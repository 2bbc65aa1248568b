//! PostgreSQL backend.
//!
//! Accounts and transactions live in two tables (see `migrations/`). Every
//! ledger entry is applied inside a single database transaction: the row
//! lock, the balance update, and the history insert commit together or not
//! at all. Categorical columns are stored as TEXT and parsed back into the
//! closed enums on the way out; a value that no longer parses is surfaced
//! as corrupt state rather than skipped.

use crate::backend::{WalletBackend, hash_password};
use crate::db::DbPool;
use crate::error::{AppError, BackendError};
use crate::models::{Account, Direction, LedgerEntry, SignInData, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// [`WalletBackend`] over a PostgreSQL pool.
///
/// The process keeps no wallet state of its own; per-account serialization
/// comes from row locks (`SELECT ... FOR UPDATE`) and the database's atomic
/// increment.
pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_history(&self, account_id: Uuid) -> Result<Vec<TransactionRecord>, AppError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, account_id, kind, direction, amount, description, status,
                   counterparty, payment_method, reference, created_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| TransactionRecord::try_from(row).map_err(AppError::Backend))
            .collect()
    }
}

#[async_trait]
impl WalletBackend for PgBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), BackendError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInData, AppError> {
        let row = sqlx::query_as::<_, AccountAuthRow>(
            "SELECT id, email, display_name, balance, created_at, password_hash
             FROM accounts
             WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if row.password_hash != hash_password(password) {
            return Err(AppError::InvalidCredentials);
        }

        let account = row.into_account();
        let transactions = self.fetch_history(account.id).await?;
        Ok(SignInData {
            account,
            transactions,
        })
    }

    async fn sign_out(&self, _account_id: Uuid) -> Result<(), AppError> {
        // Sessions live entirely in the server process; nothing to clear here.
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignInData, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, display_name, password_hash, balance)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING id, email, display_name, balance, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(display_name)
        .bind(hash_password(password))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::EmailAlreadyInUse,
            _ => AppError::from(e),
        })?;

        Ok(SignInData {
            account,
            transactions: Vec::new(),
        })
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, email, display_name, balance, created_at
             FROM accounts
             WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AccountNotFound)
    }

    async fn get_transactions(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::AccountNotFound);
        }
        self.fetch_history(account_id).await
    }

    async fn record_entry(
        &self,
        account_id: Uuid,
        entry: LedgerEntry,
    ) -> Result<(Account, TransactionRecord), AppError> {
        if entry.amount <= 0 {
            return Err(AppError::InvalidAmount("amount must be positive".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        if entry.direction == Direction::Debit {
            // Lock the row and check sufficiency before touching anything.
            let balance: i64 =
                sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
                    .bind(account_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(AppError::AccountNotFound)?;

            if balance < entry.amount {
                tx.rollback().await?;
                return Err(AppError::InsufficientBalance);
            }
        }

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $1
            WHERE id = $2
            RETURNING id, email, display_name, balance, created_at
            "#,
        )
        .bind(entry.delta())
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::AccountNotFound)?;

        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id,
                account_id,
                kind,
                direction,
                amount,
                description,
                status,
                counterparty,
                payment_method,
                reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8, $9)
            RETURNING id, account_id, kind, direction, amount, description, status,
                      counterparty, payment_method, reference, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(entry.kind.as_str())
        .bind(entry.direction.as_str())
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(&entry.counterparty)
        .bind(entry.payment_method.map(|m| m.as_str()))
        .bind(&entry.reference)
        .fetch_one(&mut *tx)
        .await?;

        let record = TransactionRecord::try_from(row).map_err(AppError::Backend)?;

        // Commit balance change and record together.
        tx.commit().await?;

        Ok((account, record))
    }

    async fn restore_session(&self) -> Result<Option<SignInData>, AppError> {
        // No client-side mirror to restore from in this mode.
        Ok(None)
    }
}

/// Account row plus its credential hash; only `sign_in` reads this shape.
#[derive(sqlx::FromRow)]
struct AccountAuthRow {
    id: Uuid,
    email: String,
    display_name: String,
    balance: i64,
    created_at: DateTime<Utc>,
    password_hash: String,
}

impl AccountAuthRow {
    fn into_account(self) -> Account {
        Account {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Raw transaction row as stored; categorical columns are TEXT.
#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    account_id: Uuid,
    kind: String,
    direction: String,
    amount: i64,
    description: String,
    status: String,
    counterparty: Option<String>,
    payment_method: Option<String>,
    reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = BackendError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(TransactionRecord {
            id: row.id,
            account_id: row.account_id,
            kind: row.kind.parse().map_err(BackendError::Corrupt)?,
            direction: row.direction.parse().map_err(BackendError::Corrupt)?,
            amount: row.amount,
            description: row.description,
            status: row.status.parse().map_err(BackendError::Corrupt)?,
            counterparty: row.counterparty,
            payment_method: row
                .payment_method
                .map(|m| m.parse())
                .transpose()
                .map_err(BackendError::Corrupt)?,
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}
