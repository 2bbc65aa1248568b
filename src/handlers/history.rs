//! Transaction history HTTP handler.
//!
//! This module implements:
//! - GET /api/v1/wallet/transactions - History with optional filters
//!
//! Filters combine with AND semantics:
//! - `kind`: one of the transaction kinds (`topup`, `payment`, `nfc`, `qr`)
//! - `q`: case-insensitive substring over description and counterparty
//! - `range`: `today`, `week`, or `month`, measured from UTC midnight

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::CurrentSession,
    models::{TransactionKind, TransactionRecord},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

/// Raw query parameters; values are validated in [`HistoryFilter`].
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub kind: Option<String>,
    pub q: Option<String>,
    pub range: Option<String>,
}

/// How far back a `range` filter reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateRange {
    Today,
    Week,
    Month,
}

impl DateRange {
    /// Inclusive lower bound, anchored at UTC midnight so "today" means
    /// the calendar day, not the last 24 hours.
    fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            DateRange::Today => midnight,
            DateRange::Week => midnight - Duration::days(7),
            DateRange::Month => midnight - Duration::days(30),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            other => Err(format!("unknown range: {other}")),
        }
    }
}

/// Validated filter set.
#[derive(Debug, Default)]
struct HistoryFilter {
    kind: Option<TransactionKind>,
    q: Option<String>,
    range: Option<DateRange>,
}

impl HistoryFilter {
    fn from_query(query: &HistoryQuery) -> Result<Self, AppError> {
        let kind = query
            .kind
            .as_deref()
            .map(TransactionKind::from_str)
            .transpose()
            .map_err(AppError::InvalidRequest)?;
        let range = query
            .range
            .as_deref()
            .map(DateRange::from_str)
            .transpose()
            .map_err(AppError::InvalidRequest)?;
        Ok(Self {
            kind,
            q: query.q.clone(),
            range,
        })
    }

    fn matches(&self, record: &TransactionRecord, now: DateTime<Utc>) -> bool {
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let needle = q.trim().to_lowercase();
            if !needle.is_empty() {
                let in_description = record.description.to_lowercase().contains(&needle);
                let in_counterparty = record
                    .counterparty
                    .as_ref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle));
                if !in_description && !in_counterparty {
                    return false;
                }
            }
        }
        if let Some(range) = self.range {
            if record.created_at < range.cutoff(now) {
                return false;
            }
        }
        true
    }
}

fn filter_history(
    records: Vec<TransactionRecord>,
    filter: &HistoryFilter,
    now: DateTime<Utc>,
) -> Vec<TransactionRecord> {
    records
        .into_iter()
        .filter(|record| filter.matches(record, now))
        .collect()
}

/// Transaction history for the signed-in account, newest first.
///
/// The session is refreshed from the backend first, so entries written by
/// other sessions of the same account show up here.
///
/// # Response
///
/// - **Success (200 OK)**: filtered list, newest first (may be empty)
/// - **Error (400)**: unknown `kind` or `range` value
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TransactionRecord>>, AppError> {
    let filter = HistoryFilter::from_query(&query)?;
    current.session.refresh(state.backend.as_ref()).await?;
    let snapshot = current.session.snapshot().await;
    Ok(Json(filter_history(
        snapshot.transactions,
        &filter,
        Utc::now(),
    )))
}
