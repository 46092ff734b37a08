//! Configuration validation

use crate::policy::AttendancePolicy;
use crate::schema::{RawConfig, RawDays, RawPayroll, RawPolicy};
use thiserror::Error;
use timeclock_util::WallClock;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid time format for '{field}' ('{value}'): expected HH:MM")]
    InvalidTimeFormat { field: &'static str, value: String },

    #[error("Window order: '{earlier}' ({earlier_value}) must come before '{later}' ({later_value})")]
    WindowOrder {
        earlier: &'static str,
        earlier_value: WallClock,
        later: &'static str,
        later_value: WallClock,
    },

    #[error("Invalid day specification: {0}")]
    InvalidDaySpec(String),

    #[error("Payroll: {0}")]
    PayrollError(String),

    #[error("Service: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(user) = &config.service.default_user
        && user.trim().is_empty()
    {
        errors.push(ValidationError::ServiceError(
            "default_user cannot be empty".into(),
        ));
    }

    errors.extend(validate_policy(&config.policy));
    errors.extend(validate_payroll(&config.payroll));

    errors
}

/// Resolve one window boundary, falling back to the standard value
pub(crate) fn resolve_time(
    field: &'static str,
    value: Option<&String>,
    default: WallClock,
) -> Result<WallClock, ValidationError> {
    match value {
        None => Ok(default),
        Some(s) => s
            .parse::<WallClock>()
            .map_err(|_| ValidationError::InvalidTimeFormat {
                field,
                value: s.clone(),
            }),
    }
}

fn validate_policy(policy: &RawPolicy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let defaults = AttendancePolicy::default();

    let fields = [
        ("check_in_start", policy.check_in_start.as_ref(), defaults.on_time.start),
        ("on_time_until", policy.on_time_until.as_ref(), defaults.on_time.end),
        ("late_until", policy.late_until.as_ref(), defaults.late.end),
        ("check_out_start", policy.check_out_start.as_ref(), defaults.check_out.start),
        ("check_out_end", policy.check_out_end.as_ref(), defaults.check_out.end),
    ];

    let mut resolved = Vec::with_capacity(fields.len());
    for (field, value, default) in fields {
        match resolve_time(field, value, default) {
            Ok(time) => resolved.push((field, time)),
            Err(e) => errors.push(e),
        }
    }

    // Ordering only makes sense once every boundary parsed
    if errors.is_empty() {
        for pair in resolved.windows(2) {
            let (earlier, earlier_value) = pair[0];
            let (later, later_value) = pair[1];
            // The late window must close strictly before check-out opens;
            // the other pairs may touch.
            let out_of_order = if later == "check_out_start" {
                earlier_value >= later_value
            } else {
                earlier_value > later_value
            };
            if out_of_order {
                errors.push(ValidationError::WindowOrder {
                    earlier,
                    earlier_value,
                    later,
                    later_value,
                });
            }
        }
    }

    if let Some(days) = &policy.workdays {
        match parse_days(days) {
            Ok(0) => errors.push(ValidationError::InvalidDaySpec(
                "workdays cannot be empty".into(),
            )),
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidDaySpec(e)),
        }
    }

    errors
}

/// Upper bound for `overtime_hourly_rate`
pub const MAX_OVERTIME_HOURLY_RATE: i64 = 1_000_000_000;

fn validate_payroll(payroll: &RawPayroll) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if payroll.standard_work_days == Some(0) {
        errors.push(ValidationError::PayrollError(
            "standard_work_days must be at least 1".into(),
        ));
    }

    if let Some(ratio) = payroll.late_penalty_ratio
        && !(0.0..=1.0).contains(&ratio)
    {
        errors.push(ValidationError::PayrollError(format!(
            "late_penalty_ratio must be between 0 and 1, got {}",
            ratio
        )));
    }

    if let Some(rate) = payroll.overtime_hourly_rate
        && !(0..=MAX_OVERTIME_HOURLY_RATE).contains(&rate)
    {
        errors.push(ValidationError::PayrollError(format!(
            "overtime_hourly_rate must be between 0 and {}, got {}",
            MAX_OVERTIME_HOURLY_RATE, rate
        )));
    }

    errors
}

/// Parse days specification
pub fn parse_days(days: &RawDays) -> Result<u8, String> {
    match days {
        RawDays::Preset(preset) => match preset.to_lowercase().as_str() {
            "all" | "every" | "daily" => Ok(0x7F),
            "weekdays" => Ok(0x1F), // Mon-Fri
            "weekends" => Ok(0x60), // Sat-Sun
            other => Err(format!("Unknown day preset: {}", other)),
        },
        RawDays::List(list) => {
            let mut mask = 0u8;
            for day in list {
                let bit = match day.to_lowercase().as_str() {
                    "mon" | "monday" => 1 << 0,
                    "tue" | "tuesday" => 1 << 1,
                    "wed" | "wednesday" => 1 << 2,
                    "thu" | "thursday" => 1 << 3,
                    "fri" | "friday" => 1 << 4,
                    "sat" | "saturday" => 1 << 5,
                    "sun" | "sunday" => 1 << 6,
                    other => return Err(format!("Unknown day: {}", other)),
                };
                mask |= bit;
            }
            Ok(mask)
        }
    }
}
