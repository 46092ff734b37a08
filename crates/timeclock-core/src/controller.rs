//! Attendance session controller
//!
//! The only component that writes attendance records. Each operation reads
//! today's record, evaluates the policy and, if allowed, writes through one
//! of the store's atomic primitives.

use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;
use timeclock_config::AttendancePolicy;
use timeclock_store::{
    ArrivalStatus, AttendanceRecord, AuditEvent, AuditEventType, RecordKey, RecordStore,
};
use timeclock_util::{UserId, WallClock};
use tracing::{debug, info, warn};

use crate::{
    evaluate, month_bounds, Action, AttendanceError, DayState, DecisionTag, MonthlySummary,
    TodayStatus,
};

/// Drives the per-day `NotCheckedIn -> CheckedIn -> CheckedOut` progression
pub struct AttendanceController {
    policy: AttendancePolicy,
    store: Arc<dyn RecordStore>,
}

impl AttendanceController {
    pub fn new(policy: AttendancePolicy, store: Arc<dyn RecordStore>) -> Self {
        info!(
            on_time = %policy.on_time,
            late = %policy.late,
            check_out = %policy.check_out,
            "Attendance controller initialized"
        );

        Self { policy, store }
    }

    /// Record today's check-in.
    ///
    /// `reason_if_late` is only consulted (and only stored) when the
    /// check-in falls in the late window.
    pub fn request_check_in(
        &self,
        user_id: &UserId,
        now: DateTime<Local>,
        reason_if_late: Option<&str>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = self.try_check_in(user_id, now, reason_if_late);

        match &result {
            Ok(record) => {
                info!(
                    user = %user_id,
                    date = %record.date,
                    status = %record.arrival_status,
                    "Check-in recorded"
                );
                self.audit(
                    now,
                    AuditEventType::CheckedIn {
                        user_id: user_id.clone(),
                        date: record.date,
                        arrival_status: record.arrival_status,
                    },
                );
            }
            Err(e) => {
                info!(user = %user_id, reason = e.kind(), "Check-in rejected");
                self.audit(
                    now,
                    AuditEventType::CheckInRejected {
                        user_id: user_id.clone(),
                        reason: e.kind().to_string(),
                    },
                );
            }
        }

        result
    }

    fn try_check_in(
        &self,
        user_id: &UserId,
        now: DateTime<Local>,
        reason_if_late: Option<&str>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let key = RecordKey::for_day(user_id, &now);
        let existing = self.store.get(&key)?;

        if existing.as_ref().is_some_and(AttendanceRecord::is_checked_in) {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        let decision = evaluate(&self.policy, WallClock::from_datetime(&now), false, false);
        if decision.action != Action::AllowCheckIn {
            return Err(AttendanceError::OutsideWindow { tag: decision.tag });
        }

        let (status, reason) = if decision.tag == DecisionTag::Late {
            let reason = reason_if_late
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(AttendanceError::ReasonRequired)?;
            (ArrivalStatus::Late, Some(reason.to_string()))
        } else {
            (ArrivalStatus::OnTime, None)
        };

        let record = AttendanceRecord::checked_in(user_id.clone(), now, status, reason);

        // A record without a check-in should not exist; replace it rather
        // than wedging the user's day.
        let written = match existing {
            Some(stale) => self.store.compare_and_swap(&stale, &record)?,
            None => self.store.insert_if_absent(&record)?,
        };
        if !written {
            debug!(key = %key, "Lost check-in race");
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        Ok(record)
    }

    /// Record today's check-out
    pub fn request_check_out(
        &self,
        user_id: &UserId,
        now: DateTime<Local>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = self.try_check_out(user_id, now);

        match &result {
            Ok(record) => {
                let worked_minutes = record
                    .worked_duration()
                    .map(|d| d.num_minutes())
                    .unwrap_or_default();
                info!(
                    user = %user_id,
                    date = %record.date,
                    worked_minutes,
                    "Check-out recorded"
                );
                self.audit(
                    now,
                    AuditEventType::CheckedOut {
                        user_id: user_id.clone(),
                        date: record.date,
                        worked_minutes,
                    },
                );
            }
            Err(e) => {
                info!(user = %user_id, reason = e.kind(), "Check-out rejected");
                self.audit(
                    now,
                    AuditEventType::CheckOutRejected {
                        user_id: user_id.clone(),
                        reason: e.kind().to_string(),
                    },
                );
            }
        }

        result
    }

    fn try_check_out(
        &self,
        user_id: &UserId,
        now: DateTime<Local>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let key = RecordKey::for_day(user_id, &now);
        let current = match self.store.get(&key)? {
            Some(record) if record.is_checked_in() => record,
            _ => return Err(AttendanceError::NotCheckedIn),
        };

        if current.is_checked_out() {
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        let decision = evaluate(&self.policy, WallClock::from_datetime(&now), true, false);
        if decision.action != Action::AllowCheckOut {
            return Err(AttendanceError::OutsideWindow { tag: decision.tag });
        }

        // Only reachable if the clock went backwards since check-in
        if current.check_in_time.is_some_and(|check_in| now < check_in) {
            return Err(AttendanceError::OutsideWindow {
                tag: DecisionTag::TooEarly,
            });
        }

        let updated = current.with_check_out(now);
        if !self.store.compare_and_swap(&current, &updated)? {
            debug!(key = %key, "Lost check-out race");
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        Ok(updated)
    }

    /// Read-only view of today's record and what the user may do next
    pub fn get_today_status(
        &self,
        user_id: &UserId,
        now: DateTime<Local>,
    ) -> Result<TodayStatus, AttendanceError> {
        let key = RecordKey::for_day(user_id, &now);
        let record = self.store.get(&key)?;
        let state = DayState::from_record(record.as_ref());

        let decision = evaluate(
            &self.policy,
            WallClock::from_datetime(&now),
            state != DayState::NotCheckedIn,
            state == DayState::CheckedOut,
        );

        Ok(TodayStatus {
            date: key.date,
            record,
            state,
            decision,
        })
    }

    /// Records of `user_id` with `from <= date <= to`, oldest first
    pub fn history(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.store.list_for_user(user_id, from, to)?)
    }

    /// Summary of a month as of `now`.
    ///
    /// Today only counts once its check-out window has closed; before that
    /// the summary runs through yesterday.
    pub fn monthly_summary(
        &self,
        user_id: &UserId,
        year: i32,
        month: u32,
        now: DateTime<Local>,
    ) -> Result<Option<MonthlySummary>, AttendanceError> {
        let Some((first, last)) = month_bounds(year, month) else {
            return Ok(None);
        };

        let today = now.date_naive();
        let until = if self.policy.check_out.ended_before(WallClock::from_datetime(&now)) {
            Some(today)
        } else {
            today.pred_opt()
        };
        let Some(until) = until else {
            return Ok(None);
        };

        let records = self.history(user_id, first, last)?;
        Ok(MonthlySummary::from_records(
            year,
            month,
            &records,
            self.policy.workdays,
            until,
        ))
    }

    fn audit(&self, now: DateTime<Local>, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::at(now, event)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use timeclock_store::{MemoryStore, SqliteStore};

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 4, hour, minute, 0).unwrap()
    }

    fn setup() -> (AttendanceController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let controller = AttendanceController::new(AttendancePolicy::default(), store.clone());
        (controller, store)
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn test_on_time_check_in() {
        let (controller, store) = setup();

        let record = controller.request_check_in(&alice(), at(8, 15), None).unwrap();
        assert_eq!(record.arrival_status, ArrivalStatus::OnTime);
        assert_eq!(record.late_reason, None);
        assert_eq!(record.check_in_time, Some(at(8, 15)));

        let stored = store.get(&RecordKey::for_day(&alice(), &at(8, 15))).unwrap();
        assert_eq!(stored, Some(record));
    }

    #[test]
    fn test_reason_ignored_when_on_time() {
        let (controller, _) = setup();

        let record = controller
            .request_check_in(&alice(), at(8, 0), Some("bus"))
            .unwrap();
        assert_eq!(record.arrival_status, ArrivalStatus::OnTime);
        assert_eq!(record.late_reason, None);
    }

    #[test]
    fn test_late_check_in_requires_reason() {
        let (controller, store) = setup();

        for reason in [None, Some(""), Some("   ")] {
            let err = controller.request_check_in(&alice(), at(9, 0), reason).unwrap_err();
            assert_eq!(err, AttendanceError::ReasonRequired);
        }
        assert!(store.is_empty());

        let record = controller
            .request_check_in(&alice(), at(9, 0), Some("  traffic "))
            .unwrap();
        assert_eq!(record.arrival_status, ArrivalStatus::Late);
        assert_eq!(record.late_reason.as_deref(), Some("traffic"));
    }

    #[test]
    fn test_check_in_outside_window() {
        let (controller, store) = setup();

        for now in [at(7, 59), at(9, 31), at(16, 45)] {
            let err = controller.request_check_in(&alice(), now, Some("x")).unwrap_err();
            assert_eq!(err, AttendanceError::OutsideWindow { tag: DecisionTag::OutsideWindow });
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_double_check_in_keeps_first_record() {
        let (controller, store) = setup();

        let first = controller.request_check_in(&alice(), at(8, 5), None).unwrap();
        let err = controller.request_check_in(&alice(), at(8, 20), None).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyCheckedIn);

        let stored = store.get(&first.key()).unwrap();
        assert_eq!(stored, Some(first));
    }

    #[test]
    fn test_check_out_without_check_in() {
        let (controller, store) = setup();

        let err = controller.request_check_out(&alice(), at(16, 40)).unwrap_err();
        assert_eq!(err, AttendanceError::NotCheckedIn);
        assert!(store.is_empty());
    }

    #[test]
    fn test_full_day() {
        let (controller, _) = setup();

        controller.request_check_in(&alice(), at(8, 15), None).unwrap();
        let record = controller.request_check_out(&alice(), at(16, 40)).unwrap();

        assert_eq!(record.check_out_time, Some(at(16, 40)));
        assert!(record.check_out_time >= record.check_in_time);
        assert_eq!(record.worked_duration(), Some(chrono::Duration::minutes(505)));

        let err = controller.request_check_out(&alice(), at(16, 50)).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyCheckedOut);

        let err = controller.request_check_in(&alice(), at(16, 55), None).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyCheckedIn);
    }

    #[test]
    fn test_check_out_outside_window() {
        let (controller, _) = setup();
        controller.request_check_in(&alice(), at(8, 0), None).unwrap();

        let err = controller.request_check_out(&alice(), at(16, 29)).unwrap_err();
        assert_eq!(err, AttendanceError::OutsideWindow { tag: DecisionTag::TooEarly });

        let err = controller.request_check_out(&alice(), at(17, 1)).unwrap_err();
        assert_eq!(err, AttendanceError::OutsideWindow { tag: DecisionTag::OutsideWindow });

        let status = controller.get_today_status(&alice(), at(17, 1)).unwrap();
        assert_eq!(status.state, DayState::CheckedIn);
    }

    #[test]
    fn test_check_out_window_edges() {
        let (controller, _) = setup();
        controller.request_check_in(&alice(), at(8, 0), None).unwrap();
        assert!(controller.request_check_out(&alice(), at(16, 30)).is_ok());

        let (controller, _) = setup();
        controller.request_check_in(&alice(), at(8, 0), None).unwrap();
        assert!(controller.request_check_out(&alice(), at(17, 0)).is_ok());
    }

    #[test]
    fn test_today_status_progression() {
        let (controller, _) = setup();

        let status = controller.get_today_status(&alice(), at(8, 10)).unwrap();
        assert_eq!(status.state, DayState::NotCheckedIn);
        assert_eq!(status.decision.action, Action::AllowCheckIn);
        assert!(status.record.is_none());
        assert_eq!(status.worked_hours_display(), "--h");

        controller.request_check_in(&alice(), at(8, 10), None).unwrap();
        let status = controller.get_today_status(&alice(), at(12, 0)).unwrap();
        assert_eq!(status.state, DayState::CheckedIn);
        assert_eq!(status.decision.tag, DecisionTag::TooEarly);

        controller.request_check_out(&alice(), at(16, 30)).unwrap();
        let status = controller.get_today_status(&alice(), at(16, 30)).unwrap();
        assert_eq!(status.state, DayState::CheckedOut);
        assert_eq!(status.decision.tag, DecisionTag::Complete);
        assert_eq!(status.worked_hours_display(), "8.3h");
    }

    #[test]
    fn test_today_status_is_idempotent() {
        let (controller, _) = setup();
        controller.request_check_in(&alice(), at(9, 10), Some("dentist")).unwrap();

        let first = controller.get_today_status(&alice(), at(10, 0)).unwrap();
        let second = controller.get_today_status(&alice(), at(10, 0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_users_are_independent() {
        let (controller, _) = setup();
        let bob = UserId::new("bob");

        controller.request_check_in(&alice(), at(8, 0), None).unwrap();
        assert!(controller.request_check_in(&bob, at(8, 1), None).is_ok());
        assert_eq!(
            controller.request_check_out(&bob, at(16, 0)).unwrap_err(),
            AttendanceError::OutsideWindow { tag: DecisionTag::TooEarly }
        );
    }

    #[test]
    fn test_new_day_starts_fresh() {
        let (controller, _) = setup();
        controller.request_check_in(&alice(), at(8, 0), None).unwrap();

        let tomorrow = Local.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap();
        let status = controller.get_today_status(&alice(), tomorrow).unwrap();
        assert_eq!(status.state, DayState::NotCheckedIn);
        assert!(controller.request_check_in(&alice(), tomorrow, None).is_ok());
    }

    #[test]
    fn test_storage_unavailable() {
        let (controller, store) = setup();
        store.set_available(false);

        let err = controller.request_check_in(&alice(), at(8, 0), None).unwrap_err();
        assert!(matches!(err, AttendanceError::StorageUnavailable(_)));
        assert!(controller.get_today_status(&alice(), at(8, 0)).is_err());

        store.set_available(true);
        assert!(store.is_empty());
        assert!(controller.request_check_in(&alice(), at(8, 0), None).is_ok());
    }

    #[test]
    fn test_audit_trail() {
        let (controller, store) = setup();

        controller.request_check_in(&alice(), at(7, 0), None).unwrap_err();
        controller.request_check_in(&alice(), at(8, 0), None).unwrap();

        let audits = store.get_recent_audits(10).unwrap();
        assert_eq!(audits.len(), 2);
        assert!(matches!(
            audits[0].event,
            AuditEventType::CheckedIn { arrival_status: ArrivalStatus::OnTime, .. }
        ));
        assert!(matches!(
            &audits[1].event,
            AuditEventType::CheckInRejected { reason, .. } if reason == "outside_window"
        ));
    }

    #[test]
    fn test_history_and_summary_with_sqlite() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let controller = AttendanceController::new(AttendancePolicy::default(), store);

        // Mon 3 on time, Tue 4 late, Wed 5 absent
        let monday = Local.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap();
        controller.request_check_in(&alice(), monday, None).unwrap();
        controller
            .request_check_out(&alice(), Local.with_ymd_and_hms(2025, 3, 3, 16, 30, 0).unwrap())
            .unwrap();
        controller.request_check_in(&alice(), at(9, 0), Some("rain")).unwrap();

        let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let history = controller.history(&alice(), first, last).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].date < history[1].date);

        let thursday_morning = Local.with_ymd_and_hms(2025, 3, 6, 9, 0, 0).unwrap();
        let summary = controller
            .monthly_summary(&alice(), 2025, 3, thursday_morning)
            .unwrap()
            .unwrap();
        assert_eq!(summary.work_days, 2);
        assert_eq!(summary.late_days, 1);
        assert_eq!(summary.incomplete_days, 1);
        assert_eq!(summary.absent_days, 1);
    }
}
