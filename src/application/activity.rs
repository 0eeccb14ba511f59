//! Time-windowed log of operator actions.
//!
//! Entries are kept most-recent-first and aged out after the retention
//! window. Identifiers come from a monotonic counter persisted next to the
//! log, so entries appended in the same millisecond and entries restored
//! from storage never collide.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::application::schedule::ScheduledTask;
use crate::application::storage::{KeyValueStore, StoreError, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Create,
    Edit,
    Delete,
    Post,
    Bulk,
    Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub details: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<ActivityEntry>,
    next_id: u64,
}

pub struct ActivityLog {
    store: Arc<dyn KeyValueStore>,
    retention: Duration,
    state: Mutex<LogState>,
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl ActivityLog {
    /// Open the log persisted in `store`, discarding expired entries.
    pub fn load(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self::load_at(store, retention, OffsetDateTime::now_utc())
    }

    pub fn load_at(store: Arc<dyn KeyValueStore>, retention: Duration, now: OffsetDateTime) -> Self {
        let log = Self {
            store,
            retention,
            state: Mutex::new(LogState::default()),
        };
        log.load_from_storage(now);
        log
    }

    fn load_from_storage(&self, now: OffsetDateTime) {
        let stored_seq = match self.store.get(keys::ACTIVITY_SEQ) {
            Ok(raw) => raw.and_then(|value| value.trim().parse::<u64>().ok()).unwrap_or(0),
            Err(err) => {
                warn!(error = %err, "failed to read activity log counter");
                0
            }
        };

        let entries = match self.store.get(keys::ACTIVITY_LOG) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ActivityEntry>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(error = %err, "discarding unreadable activity log");
                    if let Err(err) = self.store.clear(keys::ACTIVITY_LOG) {
                        warn!(error = %err, "failed to clear unreadable activity log");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read activity log");
                Vec::new()
            }
        };

        let max_id = entries.iter().map(|entry| entry.id).max().unwrap_or(0);
        let mut next_id = stored_seq.max(max_id.saturating_add(1)).max(1);

        let mut seen = HashSet::with_capacity(entries.len());
        let mut restored = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if entry.id == 0 || !seen.insert(entry.id) {
                entry.id = next_id;
                seen.insert(next_id);
                next_id += 1;
            }
            restored.push(entry);
        }
        retain_recent(&mut restored, now, self.retention);
        restored.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Ok(mut state) = self.state.lock() {
            state.entries = restored;
            state.next_id = next_id;
        }
    }

    pub fn append(
        &self,
        kind: ActivityKind,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<ActivityEntry, StoreError> {
        self.append_at(kind, message, details, OffsetDateTime::now_utc())
    }

    /// Prepend an entry stamped `now` and drop entries older than the window.
    ///
    /// Memory is only updated once the new log has been persisted.
    pub fn append_at(
        &self,
        kind: ActivityKind,
        message: impl Into<String>,
        details: impl Into<String>,
        now: OffsetDateTime,
    ) -> Result<ActivityEntry, StoreError> {
        let mut state = self.lock()?;
        let entry = ActivityEntry {
            id: state.next_id,
            kind,
            message: message.into(),
            details: details.into(),
            timestamp: now,
        };
        let next_id = state.next_id + 1;

        let mut entries = state.entries.clone();
        retain_recent(&mut entries, now, self.retention);
        entries.insert(0, entry.clone());
        self.persist(&entries, next_id)?;

        state.entries = entries;
        state.next_id = next_id;
        Ok(entry)
    }

    /// Re-apply the retention window. Returns how many entries aged out.
    pub fn sweep(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let mut entries = state.entries.clone();
        retain_recent(&mut entries, now, self.retention);
        let removed = state.entries.len() - entries.len();
        if removed > 0 {
            self.persist(&entries, state.next_id)?;
            state.entries = entries;
        }
        Ok(removed)
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.state
            .lock()
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry. The id counter keeps counting.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        self.persist(&[], state.next_id)?;
        state.entries.clear();
        Ok(())
    }

    /// Sweep on a fixed period while the returned task is alive.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> ScheduledTask {
        let log = Arc::clone(self);
        ScheduledTask::every(period, move || {
            let log = Arc::clone(&log);
            async move {
                match log.sweep(OffsetDateTime::now_utc()) {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "aged out activity log entries"),
                    Err(err) => warn!(error = %err, "activity log sweep failed"),
                }
            }
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LogState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, entries: &[ActivityEntry], next_id: u64) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(entries).map_err(|err| StoreError::Corrupt {
            path: keys::ACTIVITY_LOG.to_string(),
            message: err.to_string(),
        })?;
        self.store.set(keys::ACTIVITY_LOG, &encoded)?;
        self.store
            .set(keys::ACTIVITY_SEQ, &next_id.to_string())
    }
}

fn retain_recent(entries: &mut Vec<ActivityEntry>, now: OffsetDateTime, retention: Duration) {
    let cutoff = now - retention;
    entries.retain(|entry| entry.timestamp > cutoff);
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::application::storage::MemoryStore;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn log_with(store: Arc<MemoryStore>, now: OffsetDateTime) -> ActivityLog {
        ActivityLog::load_at(store, DAY, now)
    }

    #[test]
    fn same_instant_appends_get_distinct_ids() -> Result<(), StoreError> {
        let now = datetime!(2024-06-01 12:00 UTC);
        let log = log_with(Arc::new(MemoryStore::new()), now);

        let first = log.append_at(ActivityKind::Create, "Post created", "a", now)?;
        let second = log.append_at(ActivityKind::Create, "Post created", "b", now)?;

        assert_ne!(first.id, second.id);
        assert_eq!(log.entries()[0].id, second.id, "most recent first");
        Ok(())
    }

    #[test]
    fn append_drops_entries_older_than_window() -> Result<(), StoreError> {
        let start = datetime!(2024-06-01 12:00 UTC);
        let log = log_with(Arc::new(MemoryStore::new()), start);
        log.append_at(ActivityKind::Delete, "Post deleted", "old", start)?;

        let later = start + time::Duration::hours(25);
        log.append_at(ActivityKind::Post, "Posting initiated", "new", later)?;

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details, "new");
        Ok(())
    }

    #[test]
    fn sweep_ages_out_without_new_activity() -> Result<(), StoreError> {
        let start = datetime!(2024-06-01 12:00 UTC);
        let store = Arc::new(MemoryStore::new());
        let log = log_with(store.clone(), start);
        log.append_at(ActivityKind::Edit, "Post updated", "x", start)?;

        assert_eq!(log.sweep(start + time::Duration::hours(23))?, 0);
        assert_eq!(log.sweep(start + time::Duration::hours(24))?, 1);
        assert!(log.is_empty());
        assert_eq!(store.get(keys::ACTIVITY_LOG)?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn reload_keeps_ids_unique_and_counter_monotonic() -> Result<(), StoreError> {
        let now = datetime!(2024-06-01 12:00 UTC);
        let store = Arc::new(MemoryStore::new());
        let first = log_with(store.clone(), now);
        let a = first.append_at(ActivityKind::Bulk, "Bulk upload", "a", now)?;

        let second = log_with(store.clone(), now);
        let b = second.append_at(ActivityKind::Bulk, "Bulk upload", "b", now)?;

        assert!(b.id > a.id);
        assert_eq!(second.len(), 2);
        Ok(())
    }

    #[test]
    fn duplicate_stored_ids_are_reassigned() -> Result<(), StoreError> {
        let now = datetime!(2024-06-01 12:00 UTC);
        let raw = r#"[
            {"id":5,"type":"post","message":"m1","details":"d1","timestamp":"2024-06-01T11:00:00Z"},
            {"id":5,"type":"post","message":"m2","details":"d2","timestamp":"2024-06-01T10:00:00Z"}
        ]"#;
        let store = Arc::new(MemoryStore::with_entries([(keys::ACTIVITY_LOG, raw)]));

        let log = log_with(store, now);
        let ids: HashSet<u64> = log.entries().iter().map(|entry| entry.id).collect();
        assert_eq!(ids.len(), 2);

        let next = log.append_at(ActivityKind::Post, "m3", "d3", now)?;
        assert!(!ids.contains(&next.id));
        Ok(())
    }

    #[test]
    fn load_discards_expired_entries() {
        let now = datetime!(2024-06-02 12:00 UTC);
        let raw = r#"[
            {"id":1,"type":"account","message":"fresh","details":"","timestamp":"2024-06-02T11:00:00Z"},
            {"id":2,"type":"account","message":"stale","details":"","timestamp":"2024-06-01T11:00:00Z"}
        ]"#;
        let store = Arc::new(MemoryStore::with_entries([(keys::ACTIVITY_LOG, raw)]));

        let log = log_with(store, now);
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "fresh");
    }

    #[test]
    fn corrupted_storage_is_treated_as_empty() -> Result<(), StoreError> {
        let store = Arc::new(MemoryStore::with_entries([(keys::ACTIVITY_LOG, "{not json")]));

        let log = log_with(store.clone(), datetime!(2024-06-01 12:00 UTC));
        assert!(log.is_empty());
        assert_eq!(store.get(keys::ACTIVITY_LOG)?, None);
        Ok(())
    }

    /// Reads succeed, writes always fail.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }

        fn clear(&self, key: &str) -> Result<(), StoreError> {
            self.set(key, "")
        }
    }

    #[test]
    fn failed_write_leaves_log_unchanged() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let raw = r#"[
            {"id":1,"type":"post","message":"fresh","details":"","timestamp":"2024-06-01T11:00:00Z"},
            {"id":2,"type":"post","message":"stale","details":"","timestamp":"2024-05-31T09:00:00Z"}
        ]"#;
        let store = Arc::new(ReadOnlyStore(MemoryStore::with_entries([(
            keys::ACTIVITY_LOG,
            raw,
        )])));
        let log = ActivityLog::load_at(store, DAY, datetime!(2024-05-31 12:00 UTC));
        assert_eq!(log.len(), 2);

        assert!(log.append_at(ActivityKind::Post, "m", "d", now).is_err());
        assert_eq!(log.len(), 2);
        assert!(log.sweep(now).is_err());
        assert_eq!(log.len(), 2);
        assert!(log.clear().is_err());
        assert_eq!(log.len(), 2);

        let ids: Vec<u64> = log.entries().iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_ages_out_entries_periodically() -> Result<(), StoreError> {
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(ActivityLog::load(store, DAY));
        let stale = OffsetDateTime::now_utc() - time::Duration::hours(25);
        log.append_at(ActivityKind::Account, "Account deleted", "old", stale)?;
        assert_eq!(log.len(), 1);

        let sweeper = log.spawn_sweeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(log.is_empty());
        sweeper.cancel();
        Ok(())
    }
}
