//! Store trait definitions

use chrono::NaiveDate;
use timeclock_util::UserId;

use crate::{AttendanceRecord, AuditEvent, RecordKey, StoreResult};

/// Main store trait
///
/// Writes are atomic per key: `insert_if_absent` and `compare_and_swap`
/// read and write under the same lock (or transaction), so two clients
/// racing on the same (user, day) cannot both win.
pub trait RecordStore: Send + Sync {
    // Attendance records

    /// Get the record for a (user, day), if any
    fn get(&self, key: &RecordKey) -> StoreResult<Option<AttendanceRecord>>;

    /// Unconditionally write a record, replacing any existing one for its key
    fn put(&self, record: &AttendanceRecord) -> StoreResult<()>;

    /// Write a record only if none exists for its key.
    ///
    /// Returns `false` (and writes nothing) if a record is already there.
    fn insert_if_absent(&self, record: &AttendanceRecord) -> StoreResult<bool>;

    /// Replace `expected` with `new` only if the stored record still equals `expected`.
    ///
    /// Returns `false` (and writes nothing) if the stored record changed.
    fn compare_and_swap(
        &self,
        expected: &AttendanceRecord,
        new: &AttendanceRecord,
    ) -> StoreResult<bool>;

    /// All records of a user with `from <= date <= to`, ascending by date
    fn list_for_user(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// Shared precondition for every record write
pub(crate) fn check_writable(record: &AttendanceRecord) -> StoreResult<()> {
    record
        .validate()
        .map_err(|message| crate::StoreError::InvalidRecord {
            key: record.key(),
            message,
        })
}

/// Shared precondition for compare-and-swap
pub(crate) fn check_same_key(expected: &AttendanceRecord, new: &AttendanceRecord) -> StoreResult<()> {
    if expected.key() != new.key() {
        return Err(crate::StoreError::InvalidRecord {
            key: new.key(),
            message: format!("cannot swap a record for {}", expected.key()),
        });
    }
    Ok(())
}
