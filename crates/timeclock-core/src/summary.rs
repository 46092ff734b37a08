//! Monthly attendance summary

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use timeclock_store::{ArrivalStatus, AttendanceRecord};
use timeclock_util::DaysOfWeek;

/// Attendance counts for one user over one calendar month
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    /// Days with a check-in
    pub work_days: u32,
    pub on_time_days: u32,
    pub late_days: u32,
    /// Configured workdays without a check-in
    pub absent_days: u32,
    /// The dates counted in `absent_days`, oldest first
    #[serde(default)]
    pub absent_dates: Vec<NaiveDate>,
    /// Checked in but never checked out
    pub incomplete_days: u32,
    pub worked_minutes: i64,
}

impl MonthlySummary {
    /// Summarize `records` for `year`-`month`.
    ///
    /// Only days up to and including `until` are counted; later days of the
    /// month have not happened yet. Records outside the month are ignored.
    /// Returns `None` for an invalid month.
    pub fn from_records(
        year: i32,
        month: u32,
        records: &[AttendanceRecord],
        workdays: DaysOfWeek,
        until: NaiveDate,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let by_day: HashMap<NaiveDate, &AttendanceRecord> = records
            .iter()
            .filter(|r| r.date.year() == year && r.date.month() == month)
            .map(|r| (r.date, r))
            .collect();

        let mut summary = Self {
            year,
            month,
            ..Default::default()
        };

        for day in first.iter_days().take_while(|d| d.month() == month && *d <= until) {
            match by_day.get(&day) {
                Some(record) if record.is_checked_in() => {
                    summary.work_days += 1;
                    match record.arrival_status {
                        ArrivalStatus::OnTime => summary.on_time_days += 1,
                        ArrivalStatus::Late => summary.late_days += 1,
                        ArrivalStatus::None => {}
                    }
                    match record.worked_duration() {
                        Some(worked) => summary.worked_minutes += worked.num_minutes(),
                        None => summary.incomplete_days += 1,
                    }
                }
                _ if workdays.contains(day.weekday()) => {
                    summary.absent_days += 1;
                    summary.absent_dates.push(day);
                }
                _ => {}
            }
        }

        Some(summary)
    }

    pub fn worked(&self) -> Duration {
        Duration::minutes(self.worked_minutes)
    }
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}
