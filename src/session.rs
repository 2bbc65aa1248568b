//! Sessions and the session hub.
//!
//! A [`Session`] wraps exactly one signed-in account together with a cached
//! copy of its transaction history. The [`SessionHub`] owns every live
//! session, keyed by bearer token; there is deliberately no process-wide
//! "current account" anywhere.
//!
//! Interested parties subscribe to a session and receive [`SessionEvent`]s
//! over a channel: a snapshot immediately on subscribing, a fresh snapshot
//! whenever the cached state changes, and a final signed-out notice when
//! the session closes. Events reach watchers in the order they subscribed;
//! a watcher whose channel is gone is pruned on the next send.

use crate::backend::WalletBackend;
use crate::error::AppError;
use crate::models::{Account, LedgerEntry, SignInData, TransactionRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::warn;
use uuid::Uuid;

/// Point-in-time view of a session: the account plus its history,
/// newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub account: Account,
    pub transactions: Vec<TransactionRecord>,
}

/// Notification delivered to session watchers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Current state, sent on subscribe and after every observed change.
    Snapshot(SessionSnapshot),
    /// The session was closed; no further events will follow.
    SignedOut,
}

/// Receiving end of a session subscription.
///
/// Dropping the watcher ends the subscription implicitly (it is pruned on
/// the next send); [`Session::unsubscribe`] ends it immediately.
pub struct SessionWatcher {
    id: u64,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionWatcher {
    /// Next event, or `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant used by tests.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}

struct Watcher {
    id: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

struct SessionState {
    account: Account,
    transactions: Vec<TransactionRecord>,
    /// Registration order. Surviving watchers keep their position when
    /// dead ones are pruned.
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            account: self.account.clone(),
            transactions: self.transactions.clone(),
        }
    }

    fn notify(&mut self, event: &SessionEvent) {
        self.watchers.retain(|w| w.tx.send(event.clone()).is_ok());
    }
}

/// One signed-in account and its cached wallet state.
///
/// The cache is only ever written by the session's own methods, so watchers
/// observe a consistent sequence of snapshots.
pub struct Session {
    account_id: Uuid,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(data: SignInData) -> Self {
        let account_id = data.account.id;
        Self {
            account_id,
            state: Mutex::new(SessionState {
                account: data.account,
                transactions: data.transactions,
                watchers: Vec::new(),
                next_watcher_id: 0,
            }),
        }
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    /// Current cached state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Register a watcher. The current state is delivered to it
    /// immediately as a [`SessionEvent::Snapshot`].
    pub async fn subscribe(&self) -> SessionWatcher {
        let mut state = self.state.lock().await;
        let id = state.next_watcher_id;
        state.next_watcher_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        let snapshot = SessionEvent::Snapshot(state.snapshot());
        // Cannot fail: we still hold the receiver.
        let _ = tx.send(snapshot);
        state.watchers.push(Watcher { id, tx });

        SessionWatcher { id, rx }
    }

    /// Remove a watcher right away instead of waiting for pruning.
    pub async fn unsubscribe(&self, watcher: SessionWatcher) {
        let mut state = self.state.lock().await;
        state.watchers.retain(|w| w.id != watcher.id);
    }

    /// Re-read account and history from the backend and swap the cache.
    ///
    /// Watchers are notified only when something actually changed; the
    /// return value says whether it did.
    pub async fn refresh(&self, backend: &dyn WalletBackend) -> Result<bool, AppError> {
        let account = backend.get_account(self.account_id).await?;
        let transactions = backend.get_transactions(self.account_id).await?;

        let mut state = self.state.lock().await;
        if state.account == account && state.transactions == transactions {
            return Ok(false);
        }
        state.account = account;
        state.transactions = transactions;
        let event = SessionEvent::Snapshot(state.snapshot());
        state.notify(&event);
        Ok(true)
    }

    /// Apply a ledger entry through the backend and bring the cache up to
    /// date.
    ///
    /// The entry lands atomically in the backend. The follow-up refresh is
    /// best effort: if it fails the cache is patched from the atomic
    /// result instead, so watchers still see the movement.
    pub async fn record(
        &self,
        backend: &dyn WalletBackend,
        entry: LedgerEntry,
    ) -> Result<(Account, TransactionRecord), AppError> {
        let (account, record) = backend.record_entry(self.account_id, entry).await?;

        if let Err(e) = self.refresh(backend).await {
            warn!(error = %e, "refresh after ledger write failed; patching cached state");
            let mut state = self.state.lock().await;
            state.account = account.clone();
            state.transactions.insert(0, record.clone());
            let event = SessionEvent::Snapshot(state.snapshot());
            state.notify(&event);
        }

        Ok((account, record))
    }

    /// Tell every watcher the session is over. Called by the hub.
    async fn close(&self) {
        let mut state = self.state.lock().await;
        state.notify(&SessionEvent::SignedOut);
        state.watchers.clear();
    }

    #[cfg(test)]
    async fn watcher_count(&self) -> usize {
        self.state.lock().await.watchers.len()
    }
}

/// Owner of all live sessions, keyed by bearer token.
#[derive(Default)]
pub struct SessionHub {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a signed-in account and hand out its token.
    pub async fn open(&self, data: SignInData) -> (String, Arc<Session>) {
        let token = generate_token();
        let session = Arc::new(Session::new(data));
        self.sessions
            .lock()
            .await
            .insert(token.clone(), session.clone());
        (token, session)
    }

    /// Resolve a bearer token to its session.
    pub async fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(token).cloned()
    }

    /// Close a session: remove it and notify its watchers.
    ///
    /// Returns the closed session so the caller can finish backend-side
    /// sign-out; `None` if the token was already invalid.
    pub async fn close(&self, token: &str) -> Option<Arc<Session>> {
        let session = self.sessions.lock().await.remove(token)?;
        session.close().await;
        Some(session)
    }
}

/// 32 random bytes, hex-encoded: the bearer token clients present.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{DEMO_ACCOUNT_ID, DEMO_EMAIL, DEMO_PASSWORD};
    use crate::backend::{LocalStore, MockBackend};
    use crate::models::{Direction, PaymentMethod, TransactionKind};
    use std::time::Duration;

    async fn demo_session() -> (tempfile::TempDir, MockBackend, Session) {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new(
            LocalStore::new(dir.path().join("data")),
            Duration::ZERO,
            true,
        );
        let data = backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        let session = Session::new(data);
        (dir, backend, session)
    }

    fn topup(amount: i64) -> LedgerEntry {
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

    #[tokio::test]
    async fn subscribing_delivers_the_current_state_immediately() {
        let (_dir, _backend, session) = demo_session().await;
        let mut watcher = session.subscribe().await;

        match watcher.try_recv() {
            Some(SessionEvent::Snapshot(snapshot)) => {
                assert_eq!(snapshot.account.id, DEMO_ACCOUNT_ID);
                assert_eq!(snapshot.account.balance, 500_000);
                assert_eq!(snapshot.transactions.len(), 4);
            }
            other => panic!("expected immediate snapshot, got {other:?}"),
        }
        assert!(watcher.try_recv().is_none());
    }

    #[tokio::test]
    async fn recording_notifies_watchers_with_the_new_state() {
        let (_dir, backend, session) = demo_session().await;
        let mut watcher = session.subscribe().await;
        watcher.try_recv();

        let (account, record) = session.record(&backend, topup(500_000)).await.unwrap();
        assert_eq!(account.balance, 1_000_000);

        match watcher.try_recv() {
            Some(SessionEvent::Snapshot(snapshot)) => {
                assert_eq!(snapshot.account.balance, 1_000_000);
                assert_eq!(snapshot.transactions[0].id, record.id);
            }
            other => panic!("expected snapshot after record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_is_silent_when_nothing_changed() {
        let (_dir, backend, session) = demo_session().await;
        let mut watcher = session.subscribe().await;
        watcher.try_recv();

        let changed = session.refresh(&backend).await.unwrap();
        assert!(!changed);
        assert!(watcher.try_recv().is_none());
    }

    #[tokio::test]
    async fn refresh_picks_up_out_of_band_changes() {
        let (_dir, backend, session) = demo_session().await;
        let mut watcher = session.subscribe().await;
        watcher.try_recv();

        // Mutation bypassing the session, as another session would.
        backend
            .record_entry(DEMO_ACCOUNT_ID, topup(100_000))
            .await
            .unwrap();

        let changed = session.refresh(&backend).await.unwrap();
        assert!(changed);
        match watcher.try_recv() {
            Some(SessionEvent::Snapshot(snapshot)) => {
                assert_eq!(snapshot.account.balance, 600_000)
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_watchers_are_pruned_and_the_rest_keep_their_order() {
        let (_dir, backend, session) = demo_session().await;
        let mut first = session.subscribe().await;
        let second = session.subscribe().await;
        let mut third = session.subscribe().await;
        assert_eq!(session.watcher_count().await, 3);

        drop(second);
        session.record(&backend, topup(50_000)).await.unwrap();
        assert_eq!(session.watcher_count().await, 2);

        session.record(&backend, topup(50_000)).await.unwrap();
        // Initial snapshot plus two change snapshots each.
        for watcher in [&mut first, &mut third] {
            let mut seen = 0;
            while watcher.try_recv().is_some() {
                seen += 1;
            }
            assert_eq!(seen, 3);
        }
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_watcher_at_once() {
        let (_dir, _backend, session) = demo_session().await;
        let watcher = session.subscribe().await;
        assert_eq!(session.watcher_count().await, 1);

        session.unsubscribe(watcher).await;
        assert_eq!(session.watcher_count().await, 0);
    }

    #[tokio::test]
    async fn closing_the_session_signs_watchers_out() {
        let (_dir, _backend, session) = demo_session().await;
        let mut watcher = session.subscribe().await;
        watcher.try_recv();

        session.close().await;
        assert_eq!(watcher.try_recv(), Some(SessionEvent::SignedOut));
        // Channel is gone afterwards.
        assert_eq!(watcher.recv().await, None);
    }

    #[tokio::test]
    async fn hub_tokens_open_resolve_and_close() {
        let (_dir, backend, _session) = demo_session().await;
        let data = backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        let hub = SessionHub::new();
        let (token, session) = hub.open(data).await;
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let resolved = hub.get(&token).await.expect("token resolves");
        assert_eq!(resolved.account_id(), session.account_id());
        assert!(hub.get("not-a-token").await.is_none());

        let closed = hub.close(&token).await.expect("session closes");
        assert_eq!(closed.account_id(), session.account_id());
        assert!(hub.get(&token).await.is_none());
        assert!(hub.close(&token).await.is_none());
    }

    #[tokio::test]
    async fn two_sessions_for_one_account_are_independent() {
        let (_dir, backend, _session) = demo_session().await;
        let hub = SessionHub::new();
        let (token_a, _) = hub
            .open(backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap())
            .await;
        let (token_b, _) = hub
            .open(backend.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap())
            .await;

        assert_ne!(token_a, token_b);
        hub.close(&token_a).await.unwrap();
        assert!(hub.get(&token_b).await.is_some());
    }
}
