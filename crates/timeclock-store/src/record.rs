//! Daily attendance record types

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use timeclock_util::UserId;

/// How a check-in was classified when it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalStatus {
    OnTime,
    Late,
    #[default]
    None,
}

impl ArrivalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrivalStatus::OnTime => "on_time",
            ArrivalStatus::Late => "late",
            ArrivalStatus::None => "none",
        }
    }
}

impl fmt::Display for ArrivalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrivalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_time" => Ok(ArrivalStatus::OnTime),
            "late" => Ok(ArrivalStatus::Late),
            "none" => Ok(ArrivalStatus::None),
            other => Err(format!("Unknown arrival status: {}", other)),
        }
    }
}

/// Identity of a daily record: one per user per local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub user_id: UserId,
    pub date: NaiveDate,
}

impl RecordKey {
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self { user_id, date }
    }

    /// Key for the local calendar day containing `now`
    pub fn for_day(user_id: &UserId, now: &DateTime<Local>) -> Self {
        Self::new(user_id.clone(), now.date_naive())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.date.format("%Y-%m-%d"))
    }
}

/// Attendance for one user on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Local>>,
    pub check_out_time: Option<DateTime<Local>>,
    pub arrival_status: ArrivalStatus,
    pub late_reason: Option<String>,
}

impl AttendanceRecord {
    /// A fresh record for a check-in at `at`
    pub fn checked_in(
        user_id: UserId,
        at: DateTime<Local>,
        arrival_status: ArrivalStatus,
        late_reason: Option<String>,
    ) -> Self {
        Self {
            user_id,
            date: at.date_naive(),
            check_in_time: Some(at),
            check_out_time: None,
            arrival_status,
            late_reason,
        }
    }

    /// Copy of this record with the check-out set
    pub fn with_check_out(&self, at: DateTime<Local>) -> Self {
        Self {
            check_out_time: Some(at),
            ..self.clone()
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.user_id.clone(), self.date)
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }

    /// Time between check-in and check-out, once both happened
    pub fn worked_duration(&self) -> Option<chrono::Duration> {
        match (self.check_in_time, self.check_out_time) {
            (Some(check_in), Some(check_out)) => Some(check_out - check_in),
            _ => None,
        }
    }

    /// Check the record invariants. Both backends call this before writing.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.is_blank() {
            return Err("user_id cannot be empty".into());
        }

        if let Some(check_in) = self.check_in_time
            && check_in.date_naive() != self.date
        {
            return Err(format!(
                "check-in on {} does not belong to {}",
                check_in.date_naive(),
                self.date
            ));
        }

        match (self.check_in_time, self.check_out_time) {
            (None, Some(_)) => return Err("check-out without check-in".into()),
            (Some(check_in), Some(check_out)) if check_out < check_in => {
                return Err("check-out is earlier than check-in".into());
            }
            _ => {}
        }

        let has_reason = self
            .late_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        match (self.arrival_status, has_reason) {
            (ArrivalStatus::Late, false) => Err("late arrival requires a reason".into()),
            (ArrivalStatus::OnTime | ArrivalStatus::None, true) => {
                Err("only late arrivals carry a reason".into())
            }
            _ => Ok(()),
        }
    }
}
