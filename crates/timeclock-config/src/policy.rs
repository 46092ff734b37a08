//! Validated configuration structures

use crate::schema::{RawConfig, RawPayroll, RawPolicy, RawServiceConfig};
use crate::validation::{parse_days, resolve_time};
use std::path::PathBuf;
use timeclock_util::{DaysOfWeek, TimeWindow, UserId, WallClock};

/// Validated configuration ready for use by the attendance core
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub service: ServiceConfig,
    pub attendance: AttendancePolicy,
    pub payroll: PayrollPolicy,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            attendance: AttendancePolicy::from_raw(&raw.policy),
            payroll: PayrollPolicy::from_raw(&raw.payroll),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub default_user: Option<UserId>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(timeclock_util::default_data_dir),
            default_user: raw.default_user.map(UserId::new),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: timeclock_util::default_data_dir(),
            default_user: None,
        }
    }
}

/// When check-in and check-out are accepted.
///
/// The default is the standard office schedule:
/// - on time: 08:00 through 08:30
/// - late: after 08:30 through 09:30
/// - check-out: 16:30 through 17:00
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub on_time: TimeWindow,
    /// Starts where `on_time` ends, exclusive
    pub late: TimeWindow,
    pub check_out: TimeWindow,
    /// Days an absence counts against the employee
    pub workdays: DaysOfWeek,
}

impl AttendancePolicy {
    /// Build from the five window boundaries
    pub fn from_boundaries(
        check_in_start: WallClock,
        on_time_until: WallClock,
        late_until: WallClock,
        check_out_start: WallClock,
        check_out_end: WallClock,
    ) -> Self {
        Self {
            on_time: TimeWindow::closed(check_in_start, on_time_until),
            late: TimeWindow::left_open(on_time_until, late_until),
            check_out: TimeWindow::closed(check_out_start, check_out_end),
            workdays: DaysOfWeek::WEEKDAYS,
        }
    }

    fn from_raw(raw: &RawPolicy) -> Self {
        let defaults = Self::default();
        // Validation already rejected unparsable values
        let time = |field: &'static str, value: Option<&String>, default: WallClock| {
            resolve_time(field, value, default).unwrap_or(default)
        };

        let mut policy = Self::from_boundaries(
            time("check_in_start", raw.check_in_start.as_ref(), defaults.on_time.start),
            time("on_time_until", raw.on_time_until.as_ref(), defaults.on_time.end),
            time("late_until", raw.late_until.as_ref(), defaults.late.end),
            time("check_out_start", raw.check_out_start.as_ref(), defaults.check_out.start),
            time("check_out_end", raw.check_out_end.as_ref(), defaults.check_out.end),
        );

        if let Some(days) = &raw.workdays {
            policy.workdays = parse_days(days)
                .map(DaysOfWeek::new)
                .unwrap_or(DaysOfWeek::WEEKDAYS);
        }

        policy
    }
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self::from_boundaries(
            WallClock { hour: 8, minute: 0 },
            WallClock { hour: 8, minute: 30 },
            WallClock { hour: 9, minute: 30 },
            WallClock { hour: 16, minute: 30 },
            WallClock { hour: 17, minute: 0 },
        )
    }
}

/// Salary calculation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollPolicy {
    pub standard_work_days: u32,
    pub late_penalty_ratio: f64,
    pub overtime_hourly_rate: i64,
}

impl PayrollPolicy {
    fn from_raw(raw: &RawPayroll) -> Self {
        let defaults = Self::default();
        Self {
            standard_work_days: raw.standard_work_days.unwrap_or(defaults.standard_work_days),
            late_penalty_ratio: raw.late_penalty_ratio.unwrap_or(defaults.late_penalty_ratio),
            overtime_hourly_rate: raw
                .overtime_hourly_rate
                .unwrap_or(defaults.overtime_hourly_rate),
        }
    }
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            standard_work_days: 22,
            late_penalty_ratio: 0.1,
            overtime_hourly_rate: 50_000,
        }
    }
}
