//! In-memory store implementation

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use timeclock_util::UserId;
use tracing::debug;

use crate::traits::{check_same_key, check_writable};
use crate::{AttendanceRecord, AuditEvent, RecordKey, RecordStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<RecordKey, AttendanceRecord>,
    audit: Vec<AuditEvent>,
}

/// Map-backed store, for tests and throwaway sessions.
///
/// `set_available(false)` makes every operation fail with
/// [`StoreError::Unavailable`], which is how callers exercise their
/// storage-failure paths.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self.lock()?.records.get(key).cloned())
    }

    fn put(&self, record: &AttendanceRecord) -> StoreResult<()> {
        check_writable(record)?;
        let mut inner = self.lock()?;
        inner.records.insert(record.key(), record.clone());
        debug!(key = %record.key(), "Record written");
        Ok(())
    }

    fn insert_if_absent(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        check_writable(record)?;
        let mut inner = self.lock()?;
        let key = record.key();
        if inner.records.contains_key(&key) {
            return Ok(false);
        }
        inner.records.insert(key, record.clone());
        debug!(key = %record.key(), "Record inserted");
        Ok(true)
    }

    fn compare_and_swap(
        &self,
        expected: &AttendanceRecord,
        new: &AttendanceRecord,
    ) -> StoreResult<bool> {
        check_same_key(expected, new)?;
        check_writable(new)?;
        let mut inner = self.lock()?;
        match inner.records.get_mut(&new.key()) {
            Some(current) if current == expected => {
                *current = new.clone();
                debug!(key = %new.key(), "Record swapped");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn list_for_user(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let inner = self.lock()?;
        let range = RecordKey::new(user_id.clone(), from)..=RecordKey::new(user_id.clone(), to);
        Ok(inner.records.range(range).map(|(_, r)| r.clone()).collect())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let mut inner = self.lock()?;
        event.id = inner.audit.len() as i64 + 1;
        debug!(event_id = event.id, "Audit event appended");
        inner.audit.push(event);
        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let inner = self.lock()?;
        Ok(inner.audit.iter().rev().take(limit).cloned().collect())
    }

    fn is_healthy(&self) -> bool {
        self.lock().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArrivalStatus, AuditEventType};
    use chrono::{DateTime, Local, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, day, hour, minute, 0).unwrap()
    }

    fn checked_in(user: &str, day: u32) -> AttendanceRecord {
        AttendanceRecord::checked_in(UserId::new(user), at(day, 8, 10), ArrivalStatus::OnTime, None)
    }

    #[test]
    fn test_insert_if_absent_only_once() {
        let store = MemoryStore::new();
        let first = checked_in("admin", 29);

        assert!(store.insert_if_absent(&first).unwrap());

        let mut second = first.clone();
        second.check_in_time = Some(at(29, 8, 20));
        assert!(!store.insert_if_absent(&second).unwrap());

        assert_eq!(store.get(&first.key()).unwrap(), Some(first));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_compare_and_swap() {
        let store = MemoryStore::new();
        let record = checked_in("admin", 29);
        store.put(&record).unwrap();

        let done = record.with_check_out(at(29, 16, 45));
        assert!(store.compare_and_swap(&record, &done).unwrap());

        // Stale expectation loses
        let again = record.with_check_out(at(29, 16, 50));
        assert!(!store.compare_and_swap(&record, &again).unwrap());
        assert_eq!(store.get(&record.key()).unwrap(), Some(done));
    }

    #[test]
    fn test_compare_and_swap_rejects_key_change() {
        let store = MemoryStore::new();
        let record = checked_in("admin", 29);
        store.put(&record).unwrap();

        let other = checked_in("someone-else", 29);
        assert!(matches!(
            store.compare_and_swap(&record, &other),
            Err(StoreError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_invalid_record_not_written() {
        let store = MemoryStore::new();
        let late_without_reason =
            AttendanceRecord::checked_in(UserId::new("admin"), at(29, 9, 0), ArrivalStatus::Late, None);

        assert!(matches!(
            store.put(&late_without_reason),
            Err(StoreError::InvalidRecord { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_for_user_is_scoped_and_sorted() {
        let store = MemoryStore::new();
        store.put(&checked_in("admin", 30)).unwrap();
        store.put(&checked_in("admin", 26)).unwrap();
        store.put(&checked_in("admin", 29)).unwrap();
        store.put(&checked_in("another", 29)).unwrap();

        let from = at(26, 0, 0).date_naive();
        let to = at(29, 0, 0).date_naive();
        let records = store.list_for_user(&UserId::new("admin"), from, to).unwrap();

        let days: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(days, vec![from, to]);
    }

    #[test]
    fn test_unavailable_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_available(false);

        let record = checked_in("admin", 29);
        assert!(matches!(store.get(&record.key()), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.insert_if_absent(&record),
            Err(StoreError::Unavailable(_))
        ));
        assert!(!store.is_healthy());

        store.set_available(true);
        assert!(store.is_empty());
        assert!(store.is_healthy());
    }

    #[test]
    fn test_audit_log_newest_first() {
        let store = MemoryStore::new();
        store
            .append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
                source: "defaults".into(),
            }))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::CheckInRejected {
                user_id: UserId::new("admin"),
                reason: "outside window".into(),
            }))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 2);
        assert!(matches!(events[0].event, AuditEventType::CheckInRejected { .. }));
    }
}
