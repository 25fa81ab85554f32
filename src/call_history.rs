//! Call history store.
//!
//! Owns the durable list of call records, newest first. Every append
//! prepends, so stored order is also recency order.

use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, TimeZone};

use crate::clock::{Clock, IdGenerator};
use crate::collection::JsonCollection;
use crate::error::DialerResult;
use crate::models::{CallId, CallRecord, NewCallRecord};
use crate::persistence::{KeyValuePersistence, LoadOutcome};
use crate::phone::format_phone_number;

/// Storage key used when none is configured.
pub const DEFAULT_CALL_HISTORY_KEY: &str = "call-history-store";

/// Number of calls returned by [`CallHistoryStore::recent`] without an explicit limit.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Date format for calls older than a week (`3/14/2025`).
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Caller name written by older releases when no name was known.
pub const UNKNOWN_CALLER_NAME: &str = "Unknown";

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Bring one stored record up to the current conventions. Returns whether
/// anything changed.
fn repair_record(call: &mut CallRecord) -> bool {
    let mut changed = false;
    if !call.number.contains('-') {
        let formatted = format_phone_number(&call.number);
        if formatted != call.number {
            call.number = formatted;
            changed = true;
        }
    }
    if call.name == UNKNOWN_CALLER_NAME {
        call.name = call.number.clone();
        changed = true;
    }
    changed
}

/// True when `format` is a usable strftime pattern.
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn format_local_date(timestamp: i64, date_format: &str) -> String {
    let Some(when) = Local.timestamp_millis_opt(timestamp).single() else {
        return timestamp.to_string();
    };
    let pattern = if is_valid_date_format(date_format) {
        date_format
    } else {
        DEFAULT_DATE_FORMAT
    };
    when.format(pattern).to_string()
}

fn plural(count: i64, unit: &str) -> String {
    format!("{} {}{} ago", count, unit, if count > 1 { "s" } else { "" })
}

/// Describe `timestamp` relative to `now` (both in epoch milliseconds).
///
/// Buckets, first match wins, all using floor division:
/// under a minute is "Just now", then minutes, hours and days ("1 minute ago",
/// "2 hours ago"), and from seven days on the local date in `date_format`.
pub fn format_relative_time(timestamp: i64, now: i64, date_format: &str) -> String {
    let diff = now.saturating_sub(timestamp);
    let minutes = diff.div_euclid(MINUTE_MS);
    let hours = diff.div_euclid(HOUR_MS);
    let days = diff.div_euclid(DAY_MS);

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        format_local_date(timestamp, date_format)
    }
}

pub struct CallHistoryStore<P> {
    collection: JsonCollection<P, CallRecord>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
    recent_limit: usize,
    date_format: String,
}

impl<P: KeyValuePersistence> CallHistoryStore<P> {
    pub fn new(persistence: Arc<P>, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            collection: JsonCollection::new(persistence, key),
            clock,
            ids: IdGenerator::new(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn key(&self) -> &str {
        self.collection.key()
    }

    /// All calls, newest first. Empty on a read fault.
    pub async fn list(&self) -> Vec<CallRecord> {
        self.collection.load().await.into_items()
    }

    /// Like [`list`](Self::list) but reports whether a read fault was recovered.
    pub async fn list_outcome(&self) -> LoadOutcome<CallRecord> {
        self.collection.load().await
    }

    /// The newest `limit` calls (the configured default when `None`).
    pub async fn recent(&self, limit: Option<usize>) -> Vec<CallRecord> {
        let mut calls = self.list().await;
        calls.truncate(limit.unwrap_or(self.recent_limit));
        calls
    }

    /// Repair legacy records in place and return the whole history.
    ///
    /// Callers stored as `"Unknown"` are labelled with their number, and
    /// undashed ten-digit numbers are rewritten in canonical form. Order, ids
    /// and timestamps are kept. Nothing is written unless a record changed.
    pub async fn normalize(&self) -> DialerResult<Vec<CallRecord>> {
        let _guard = self.collection.lock().await;
        let mut calls = self.collection.load_for_update().await?;

        let repaired = calls
            .iter_mut()
            .map(repair_record)
            .filter(|changed| *changed)
            .count();
        if repaired > 0 {
            self.collection.store(&calls).await?;
            tracing::info!(key = %self.key(), repaired, "Repaired legacy call records");
        }
        Ok(calls)
    }

    /// Record a call at the front of the history.
    ///
    /// The stored record always gets a fresh id and the current time; any
    /// id or timestamp carried by the input is discarded.
    pub async fn append(&self, record: impl Into<NewCallRecord>) -> DialerResult<CallRecord> {
        let record = record.into();

        let _guard = self.collection.lock().await;
        let mut calls = self.collection.load_for_update().await?;

        let now = self.clock.now_millis();
        let floor = calls.iter().map(|c| c.id).max();
        let stored = CallRecord {
            id: self.ids.next_id(now, floor),
            name: record.name,
            number: record.number,
            timestamp: now,
            call_type: record.call_type,
            duration: None,
            ai_prompt: record.ai_prompt,
        };

        calls.insert(0, stored.clone());
        self.collection.store(&calls).await?;

        tracing::info!(
            id = stored.id,
            call_type = %stored.call_type,
            number = %stored.number,
            "Call recorded"
        );
        Ok(stored)
    }

    /// Set the duration of a finished call.
    ///
    /// Returns `false` (and writes nothing) when no call has that id.
    pub async fn update_duration(&self, id: CallId, seconds: u64) -> DialerResult<bool> {
        let _guard = self.collection.lock().await;
        let mut calls = self.collection.load_for_update().await?;

        let Some(call) = calls.iter_mut().find(|c| c.id == id) else {
            tracing::debug!(id, "Duration update skipped, call not found");
            return Ok(false);
        };
        call.duration = Some(seconds);

        self.collection.store(&calls).await?;
        Ok(true)
    }

    /// Remove the call with `id`.
    ///
    /// Returns `false` (and writes nothing) when no call has that id.
    pub async fn delete(&self, id: CallId) -> DialerResult<bool> {
        let _guard = self.collection.lock().await;
        let mut calls = self.collection.load_for_update().await?;

        let before = calls.len();
        calls.retain(|c| c.id != id);
        if calls.len() == before {
            return Ok(false);
        }

        self.collection.store(&calls).await?;
        tracing::info!(id, "Call deleted");
        Ok(true)
    }

    /// Remove the whole history by deleting the stored key.
    pub async fn clear_all(&self) -> DialerResult<()> {
        let _guard = self.collection.lock().await;
        self.collection.remove().await
    }

    /// [`format_relative_time`] against this store's clock and date format.
    pub fn format_relative_time(&self, timestamp: i64) -> String {
        format_relative_time(timestamp, self.clock.now_millis(), &self.date_format)
    }
}
