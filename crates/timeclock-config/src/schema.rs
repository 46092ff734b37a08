//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Where and as whom the CLI runs
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Check-in/check-out windows
    #[serde(default)]
    pub policy: RawPolicy,

    /// Salary calculation parameters
    #[serde(default)]
    pub payroll: RawPayroll,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the attendance database
    pub data_dir: Option<PathBuf>,

    /// User to act as when none is given on the command line
    pub default_user: Option<String>,
}

/// Attendance windows, all in HH:MM local time.
///
/// Omitted fields fall back to the standard office hours.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPolicy {
    /// First minute an on-time check-in is accepted
    pub check_in_start: Option<String>,

    /// Last minute that still counts as on time
    pub on_time_until: Option<String>,

    /// Last minute a (late) check-in is accepted
    pub late_until: Option<String>,

    /// First minute a check-out is accepted
    pub check_out_start: Option<String>,

    /// Last minute a check-out is accepted
    pub check_out_end: Option<String>,

    /// Days of week that count as workdays: "weekdays", "weekends", "all",
    /// or a list like ["mon", "tue", "wed"]
    pub workdays: Option<RawDays>,
}

/// Days specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDays {
    Preset(String),
    List(Vec<String>),
}

/// Payroll parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPayroll {
    /// Divisor turning a monthly base salary into a daily rate
    pub standard_work_days: Option<u32>,

    /// Fraction of a daily rate deducted per late day
    pub late_penalty_ratio: Option<f64>,

    /// Flat amount paid per overtime hour
    pub overtime_hourly_rate: Option<i64>,
}
