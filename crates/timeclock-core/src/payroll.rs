//! Monthly salary calculation from attendance counts

use serde::{Deserialize, Serialize};
use timeclock_config::PayrollPolicy;

use crate::{MonthlySummary, PayrollError};

/// Inputs for one employee's month
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryInput {
    pub base_salary: i64,
    pub work_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub overtime_hours: u32,
    pub bonus: i64,
}

impl SalaryInput {
    pub fn from_summary(
        summary: &MonthlySummary,
        base_salary: i64,
        overtime_hours: u32,
        bonus: i64,
    ) -> Self {
        Self {
            base_salary,
            work_days: summary.work_days,
            late_days: summary.late_days,
            absent_days: summary.absent_days,
            overtime_hours,
            bonus,
        }
    }
}

/// Every component of the net salary, in whole currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub daily_rate: i64,
    pub working_salary: i64,
    pub late_deduction: i64,
    pub absent_deduction: i64,
    pub overtime_bonus: i64,
    pub bonus: i64,
    pub net_salary: i64,
}

/// Compute the breakdown.
///
/// Components are rounded individually (half away from zero) and the net is
/// the sum of the rounded components, so the printed lines always add up.
/// Fails instead of wrapping when any amount leaves the `i64` range.
pub fn calculate_salary(
    input: &SalaryInput,
    policy: &PayrollPolicy,
) -> Result<SalaryBreakdown, PayrollError> {
    let daily = input.base_salary as f64 / f64::from(policy.standard_work_days.max(1));

    let working_salary = rounded(daily * f64::from(input.work_days), "working salary")?;
    let late_deduction = rounded(
        daily * f64::from(input.late_days) * policy.late_penalty_ratio,
        "late deduction",
    )?;
    let absent_deduction = rounded(daily * f64::from(input.absent_days), "absent deduction")?;
    let overtime_bonus = i64::from(input.overtime_hours)
        .checked_mul(policy.overtime_hourly_rate)
        .ok_or(PayrollError::Overflow("overtime bonus"))?;

    let net_salary = working_salary
        .checked_sub(late_deduction)
        .and_then(|net| net.checked_sub(absent_deduction))
        .and_then(|net| net.checked_add(overtime_bonus))
        .and_then(|net| net.checked_add(input.bonus))
        .ok_or(PayrollError::Overflow("net salary"))?;

    Ok(SalaryBreakdown {
        daily_rate: rounded(daily, "daily rate")?,
        working_salary,
        late_deduction,
        absent_deduction,
        overtime_bonus,
        bonus: input.bonus,
        net_salary,
    })
}

fn rounded(amount: f64, component: &'static str) -> Result<i64, PayrollError> {
    let amount = amount.round();
    // Open interval: i64::MAX as f64 is 2^63, and i64::MIN must stay negatable
    if amount.is_finite() && amount > i64::MIN as f64 && amount < i64::MAX as f64 {
        Ok(amount as i64)
    } else {
        Err(PayrollError::Overflow(component))
    }
}

/// "12.500.000 VND"
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{} VND", sign, grouped)
}
