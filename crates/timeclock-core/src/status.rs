//! Today's attendance state as shown to the user

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use timeclock_store::AttendanceRecord;

use crate::Decision;

/// Per-user, per-day progression. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

impl DayState {
    pub fn from_record(record: Option<&AttendanceRecord>) -> Self {
        match record {
            Some(r) if r.is_checked_out() => DayState::CheckedOut,
            Some(r) if r.is_checked_in() => DayState::CheckedIn,
            _ => DayState::NotCheckedIn,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayState::NotCheckedIn => "Not checked in",
            DayState::CheckedIn => "Checked in",
            DayState::CheckedOut => "Checked out",
        }
    }
}

/// Snapshot returned by `get_today_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStatus {
    pub date: NaiveDate,
    pub record: Option<AttendanceRecord>,
    pub state: DayState,
    pub decision: Decision,
}

impl TodayStatus {
    /// Check-out minus check-in, once both happened
    pub fn worked_duration(&self) -> Option<chrono::Duration> {
        self.record.as_ref().and_then(AttendanceRecord::worked_duration)
    }

    pub fn worked_hours_display(&self) -> String {
        format_worked_hours(self.worked_duration())
    }
}

/// Hours rounded to one decimal ("8.3h"), or "--h" when unknown
pub fn format_worked_hours(worked: Option<chrono::Duration>) -> String {
    match worked {
        Some(d) => {
            let hours = d.num_seconds() as f64 / 3600.0;
            format!("{:.1}h", (hours * 10.0).round() / 10.0)
        }
        None => "--h".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};
    use timeclock_store::ArrivalStatus;
    use timeclock_util::UserId;

    fn record() -> AttendanceRecord {
        let at = Local.with_ymd_and_hms(2025, 3, 3, 8, 10, 0).unwrap();
        AttendanceRecord::checked_in(UserId::new("alice"), at, ArrivalStatus::OnTime, None)
    }

    #[test]
    fn test_state_from_record() {
        let checked_in = record();
        let out = Local.with_ymd_and_hms(2025, 3, 3, 16, 45, 0).unwrap();
        let checked_out = checked_in.with_check_out(out);

        assert_eq!(DayState::from_record(None), DayState::NotCheckedIn);
        assert_eq!(DayState::from_record(Some(&checked_in)), DayState::CheckedIn);
        assert_eq!(DayState::from_record(Some(&checked_out)), DayState::CheckedOut);
    }

    #[test]
    fn test_json_shape() {
        let status = TodayStatus {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            record: Some(record()),
            state: DayState::CheckedIn,
            decision: crate::evaluate(
                &timeclock_config::AttendancePolicy::default(),
                timeclock_util::WallClock::new(12, 0).unwrap(),
                true,
                false,
            ),
        };

        let json: serde_json::Value = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "checked_in");
        assert_eq!(json["decision"]["tag"], "too_early");
        assert_eq!(json["record"]["arrival_status"], "on_time");
    }

    #[test]
    fn test_format_worked_hours() {
        assert_eq!(format_worked_hours(None), "--h");
        assert_eq!(format_worked_hours(Some(Duration::minutes(8 * 60 + 20))), "8.3h");
        assert_eq!(format_worked_hours(Some(Duration::minutes(8 * 60 + 35))), "8.6h");
        assert_eq!(format_worked_hours(Some(Duration::hours(8))), "8.0h");
        assert_eq!(format_worked_hours(Some(Duration::zero())), "0.0h");
    }
}
