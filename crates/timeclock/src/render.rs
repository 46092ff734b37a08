//! Plain-text output for the CLI

use chrono::{DateTime, Local, NaiveDate};
use std::io::{self, Write};
use timeclock_core::{
    format_currency, format_worked_hours, MonthlySummary, SalaryBreakdown, SalaryInput,
    TodayStatus,
};
use timeclock_store::{ArrivalStatus, AttendanceRecord};
use timeclock_util::{format_clock_time, format_datetime_full, UserId};

const NO_TIME: &str = "--:--:--";

fn clock_or_placeholder(time: Option<&DateTime<Local>>) -> String {
    time.map(format_clock_time)
        .unwrap_or_else(|| NO_TIME.to_string())
}

pub fn arrival_label(status: ArrivalStatus) -> &'static str {
    match status {
        ArrivalStatus::OnTime => "on time",
        ArrivalStatus::Late => "late",
        ArrivalStatus::None => "-",
    }
}

/// The status screen shown by `status` and `watch`
pub fn render_status<W: Write>(
    out: &mut W,
    status: &TodayStatus,
    user: &UserId,
    now: &DateTime<Local>,
) -> io::Result<()> {
    let record = status.record.as_ref();

    writeln!(out, "{}  {}", user, format_datetime_full(now))?;
    writeln!(out, "State:      {}", status.state.label())?;
    writeln!(
        out,
        "Check-in:   {}",
        clock_or_placeholder(record.and_then(|r| r.check_in_time.as_ref()))
    )?;
    if let Some(r) = record.filter(|r| r.is_checked_in()) {
        match &r.late_reason {
            Some(reason) => writeln!(
                out,
                "Arrival:    {} ({})",
                arrival_label(r.arrival_status),
                reason
            )?,
            None => writeln!(out, "Arrival:    {}", arrival_label(r.arrival_status))?,
        }
    }
    writeln!(
        out,
        "Check-out:  {}",
        clock_or_placeholder(record.and_then(|r| r.check_out_time.as_ref()))
    )?;
    writeln!(out, "Worked:     {}", status.worked_hours_display())?;
    writeln!(out, "{}", status.decision.message())
}

/// One line per day, oldest first, followed by the month totals.
///
/// Workdays the summary counts as absent get their own row.
pub fn render_history<W: Write>(
    out: &mut W,
    records: &[AttendanceRecord],
    summary: Option<&MonthlySummary>,
) -> io::Result<()> {
    let absent = summary.map(|s| s.absent_dates.as_slice()).unwrap_or_default();

    let mut rows: Vec<(NaiveDate, Option<&AttendanceRecord>)> = records
        .iter()
        .map(|r| (r.date, Some(r)))
        .chain(absent.iter().map(|d| (*d, None)))
        .collect();
    rows.sort_by_key(|(date, _)| *date);

    if rows.is_empty() {
        writeln!(out, "No attendance records")?;
    } else {
        writeln!(
            out,
            "{:<10}  {:<8}  {:<8}  {:<7}  {:>6}  Reason",
            "Date", "In", "Out", "Arrival", "Worked"
        )?;
        for (date, record) in rows {
            match record {
                Some(record) => writeln!(
                    out,
                    "{:<10}  {:<8}  {:<8}  {:<7}  {:>6}  {}",
                    date.format("%Y-%m-%d"),
                    clock_or_placeholder(record.check_in_time.as_ref()),
                    clock_or_placeholder(record.check_out_time.as_ref()),
                    arrival_label(record.arrival_status),
                    format_worked_hours(record.worked_duration()),
                    record.late_reason.as_deref().unwrap_or(""),
                )?,
                None => writeln!(
                    out,
                    "{:<10}  {:<8}  {:<8}  {:<7}  {:>6}",
                    date.format("%Y-%m-%d"),
                    NO_TIME,
                    NO_TIME,
                    "absent",
                    format_worked_hours(None),
                )?,
            }
        }
    }

    if let Some(s) = summary {
        writeln!(out)?;
        writeln!(out, "{:04}-{:02}", s.year, s.month)?;
        writeln!(out, "  Work days:       {}", s.work_days)?;
        writeln!(out, "  On time:         {}", s.on_time_days)?;
        writeln!(out, "  Late:            {}", s.late_days)?;
        writeln!(out, "  Absent:          {}", s.absent_days)?;
        writeln!(out, "  No check-out:    {}", s.incomplete_days)?;
        writeln!(out, "  Hours worked:    {}", format_worked_hours(Some(s.worked())))?;
    }

    Ok(())
}

fn amount_line<W: Write>(out: &mut W, label: &str, amount: i64) -> io::Result<()> {
    writeln!(out, "{:<20} {:>20}", label, format_currency(amount))
}

pub fn render_payroll<W: Write>(
    out: &mut W,
    input: &SalaryInput,
    result: &SalaryBreakdown,
) -> io::Result<()> {
    amount_line(out, "Base salary", input.base_salary)?;
    amount_line(out, "Daily rate", result.daily_rate)?;
    amount_line(out, &format!("Worked ({} days)", input.work_days), result.working_salary)?;
    amount_line(out, &format!("Late ({} days)", input.late_days), -result.late_deduction)?;
    amount_line(out, &format!("Absent ({} days)", input.absent_days), -result.absent_deduction)?;
    amount_line(out, &format!("Overtime ({}h)", input.overtime_hours), result.overtime_bonus)?;
    amount_line(out, "Bonus", result.bonus)?;
    writeln!(out, "{}", "-".repeat(41))?;
    amount_line(out, "Net salary", result.net_salary)
}
