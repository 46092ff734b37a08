//! timeclock - employee attendance from the command line
//!
//! Wires together:
//! - Configuration loading
//! - Store initialization
//! - The attendance controller
//! - One subcommand per user action, plus a live status view

mod render;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use timeclock_config::{load_config_or_default, PayrollPolicy};
use timeclock_core::{
    calculate_salary, format_worked_hours, month_bounds, AttendanceController, AttendanceError,
    SalaryInput,
};
use timeclock_store::{
    ArrivalStatus, AuditEvent, AuditEventType, RecordStore, SqliteStore, StoreError,
};
use timeclock_util::{
    default_config_path, format_clock_time, is_mock_time_active, parse_year_month, Clock,
    SystemClock, TimeclockError, UserId, DATABASE_FILENAME, TIMECLOCK_CONFIG_ENV,
    TIMECLOCK_DATA_DIR_ENV,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::render::{arrival_label, render_history, render_payroll, render_status};

/// timeclock - Employee attendance check-in and check-out
#[derive(Parser, Debug)]
#[command(name = "timeclock")]
#[command(about = "Employee attendance check-in and check-out", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/timeclock/config.toml)
    #[arg(short, long, env = TIMECLOCK_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set TIMECLOCK_DATA_DIR env var)
    #[arg(short, long, env = TIMECLOCK_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Employee to act as (or set TIMECLOCK_USER env var)
    #[arg(short, long, env = "TIMECLOCK_USER")]
    user: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check in for today
    CheckIn {
        /// Why you are late (required after the on-time window)
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Check out for today
    CheckOut,

    /// Show today's attendance
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show today's attendance, refreshed every second until Ctrl-C
    Watch,

    /// List a month of attendance with totals
    History {
        /// Month as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Compute a month's salary from attendance
    Payroll {
        /// Monthly base salary
        #[arg(long)]
        base_salary: i64,

        /// Overtime hours worked this month
        #[arg(long, default_value_t = 0)]
        overtime_hours: u32,

        /// Extra bonus
        #[arg(long, default_value_t = 0)]
        bonus: i64,

        /// Month as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Exit status for refused or invalid requests
const EXIT_FAILURE: u8 = 1;

/// Exit status when storage failed and the same command may succeed later (EX_TEMPFAIL)
const EXIT_TEMPFAIL: u8 = 75;

/// Everything a subcommand needs
struct App {
    controller: AttendanceController,
    store: Arc<dyn RecordStore>,
    payroll: PayrollPolicy,
    clock: SystemClock,
    user: UserId,
    config_source: String,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(config_path = %args.config.display(), "Configuration loaded");

        let user = args
            .user
            .clone()
            .map(UserId::new)
            .or_else(|| config.service.default_user.clone())
            .filter(|u| !u.is_blank())
            .ok_or(TimeclockError::MissingUser)?;

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.service.data_dir.clone());

        let db_path = data_dir.join(DATABASE_FILENAME);
        let store: Arc<dyn RecordStore> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        if !store.is_healthy() {
            return Err(AttendanceError::StorageUnavailable(format!(
                "database {} is not responding",
                db_path.display()
            ))
            .into());
        }

        info!(db_path = %db_path.display(), "Store initialized");

        let config_source = if args.config.exists() {
            args.config.display().to_string()
        } else {
            "defaults".to_string()
        };

        if is_mock_time_active() {
            warn!("Mock time is active, attendance will be recorded at the mocked time");
        }

        Ok(Self {
            controller: AttendanceController::new(config.attendance, store.clone()),
            store,
            payroll: config.payroll,
            clock: SystemClock,
            user,
            config_source,
        })
    }

    /// Note which configuration governed the record write that follows
    fn audit_config_source(&self) {
        let loaded = AuditEvent::new(AuditEventType::ConfigLoaded {
            source: self.config_source.clone(),
        });
        if let Err(e) = self.store.append_audit(loaded) {
            warn!(error = %e, "Failed to append audit event");
        }
    }

    fn check_in(&self, reason: Option<&str>) -> Result<()> {
        self.audit_config_source();

        let result = self
            .controller
            .request_check_in(&self.user, self.clock.now(), reason);

        let record = match result {
            Err(AttendanceError::ReasonRequired) => match prompt_late_reason() {
                Some(reason) => {
                    self.controller
                        .request_check_in(&self.user, self.clock.now(), Some(&reason))?
                }
                None => return Err(AttendanceError::ReasonRequired.into()),
            },
            other => other?,
        };

        let at = record
            .check_in_time
            .as_ref()
            .map(format_clock_time)
            .unwrap_or_default();
        match (record.arrival_status, &record.late_reason) {
            (ArrivalStatus::Late, Some(reason)) => {
                println!("✓ Checked in at {} (late: {})", at, reason)
            }
            (status, _) => println!("✓ Checked in at {} ({})", at, arrival_label(status)),
        }
        Ok(())
    }

    fn check_out(&self) -> Result<()> {
        self.audit_config_source();

        let record = self.controller.request_check_out(&self.user, self.clock.now())?;

        let at = record
            .check_out_time
            .as_ref()
            .map(format_clock_time)
            .unwrap_or_default();
        println!(
            "✓ Checked out at {}, worked {}",
            at,
            format_worked_hours(record.worked_duration())
        );
        Ok(())
    }

    fn status(&self, json: bool) -> Result<()> {
        let now = self.clock.now();
        let status = self.controller.get_today_status(&self.user, now)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            render_status(&mut io::stdout().lock(), &status, &self.user, &now)?;
        }
        Ok(())
    }

    fn history(&self, month: Option<&str>) -> Result<()> {
        let now = self.clock.now();
        let (year, month) = resolve_month(month, &now)?;
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| TimeclockError::InvalidMonth(format!("{:04}-{:02}", year, month)))?;

        let records = self.controller.history(&self.user, first, last)?;
        let summary = self
            .controller
            .monthly_summary(&self.user, year, month, now)?;

        render_history(&mut io::stdout().lock(), &records, summary.as_ref())?;
        Ok(())
    }

    fn payroll(
        &self,
        base_salary: i64,
        overtime_hours: u32,
        bonus: i64,
        month: Option<&str>,
    ) -> Result<()> {
        anyhow::ensure!(base_salary >= 0, "Base salary cannot be negative");

        let now = self.clock.now();
        let (year, month) = resolve_month(month, &now)?;
        let summary = self
            .controller
            .monthly_summary(&self.user, year, month, now)?
            .unwrap_or_default();

        let input = SalaryInput::from_summary(&summary, base_salary, overtime_hours, bonus);
        let result = calculate_salary(&input, &self.payroll)?;
        debug!(?input, ?result, "Salary calculated");

        let mut out = io::stdout().lock();
        writeln!(out, "{} {:04}-{:02}", self.user, year, month)?;
        render_payroll(&mut out, &input, &result)?;
        Ok(())
    }
}

fn resolve_month(month: Option<&str>, now: &DateTime<Local>) -> Result<(i32, u32)> {
    match month {
        Some(spec) => Ok(parse_year_month(spec)?),
        None => Ok((now.year(), now.month())),
    }
}

/// Ask for a late reason when a human is at the keyboard
fn prompt_late_reason() -> Option<String> {
    if !io::stdin().is_terminal() {
        return None;
    }

    eprint!("You are late. Reason: ");
    let _ = io::stderr().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(_) => Some(line),
        Err(e) => {
            warn!(error = %e, "Failed to read late reason");
            None
        }
    }
}

/// Re-render today's status once per second until `shutdown` resolves.
///
/// Read-only. Returns the number of frames drawn.
async fn watch<F, W>(
    controller: &AttendanceController,
    user: &UserId,
    clock: &dyn Clock,
    shutdown: F,
    out: &mut W,
) -> Result<u64>
where
    F: Future<Output = ()>,
    W: Write,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut frames = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(frames, "Watch stopped");
                break;
            }
            _ = ticker.tick() => {
                let now = clock.now();
                // Clear screen, cursor home
                write!(out, "\x1b[2J\x1b[H")?;
                match controller.get_today_status(user, now) {
                    Ok(status) => render_status(&mut *out, &status, user, &now)?,
                    Err(e) => writeln!(out, "✗ {}", e)?,
                }
                out.flush()?;
                frames += 1;
            }
        }
    }

    Ok(frames)
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Map a failed command onto the process exit status
fn exit_code(err: &anyhow::Error) -> u8 {
    let retryable = match err.downcast_ref::<AttendanceError>() {
        Some(e) => !e.is_user_correctable(),
        None => err.downcast_ref::<StoreError>().is_some(),
    };

    if retryable {
        EXIT_TEMPFAIL
    } else {
        EXIT_FAILURE
    }
}

async fn run(args: &Args) -> Result<()> {
    let app = App::new(args)?;

    match &args.command {
        Command::CheckIn { reason } => app.check_in(reason.as_deref()),
        Command::CheckOut => app.check_out(),
        Command::Status { json } => app.status(*json),
        Command::Watch => {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
            };
            watch(&app.controller, &app.user, &app.clock, ctrl_c, &mut io::stdout())
                .await
                .map(|_| ())
        }
        Command::History { month } => app.history(month.as_deref()),
        Command::Payroll {
            base_salary,
            overtime_hours,
            bonus,
            month,
        } => app.payroll(*base_salary, *overtime_hours, *bonus, month.as_deref()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "timeclock starting");

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use timeclock_config::AttendancePolicy;
    use timeclock_store::MemoryStore;
    use timeclock_util::FixedClock;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "timeclock",
            "--user",
            "alice",
            "check-in",
            "--reason",
            "traffic",
        ])
        .unwrap();

        assert_eq!(args.user.as_deref(), Some("alice"));
        assert!(matches!(
            args.command,
            Command::CheckIn { reason: Some(ref r) } if r == "traffic"
        ));

        let args = Args::try_parse_from(["timeclock", "payroll", "--base-salary", "22000000"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Payroll { base_salary: 22_000_000, overtime_hours: 0, bonus: 0, month: None }
        ));
    }

    #[test]
    fn test_exit_codes() {
        let unavailable = anyhow::Error::from(AttendanceError::StorageUnavailable("locked".into()));
        assert_eq!(exit_code(&unavailable), EXIT_TEMPFAIL);

        let open_failed = anyhow::Error::from(StoreError::Unavailable("disk full".into()))
            .context("Failed to open database");
        assert_eq!(exit_code(&open_failed), EXIT_TEMPFAIL);

        for refused in [
            AttendanceError::ReasonRequired,
            AttendanceError::AlreadyCheckedIn,
            AttendanceError::OutsideWindow { tag: timeclock_core::DecisionTag::TooEarly },
        ] {
            assert_eq!(exit_code(&anyhow::Error::from(refused)), EXIT_FAILURE);
        }

        assert_eq!(exit_code(&anyhow::anyhow!("bad month")), EXIT_FAILURE);
    }

    fn app_in(dir: &std::path::Path, command: &str) -> App {
        let config = dir.join("missing.toml");
        let args = Args::try_parse_from([
            "timeclock",
            "--config",
            config.to_str().unwrap(),
            "--data-dir",
            dir.to_str().unwrap(),
            "--user",
            "alice",
            command,
        ])
        .unwrap();
        App::new(&args).unwrap()
    }

    #[test]
    fn test_reads_leave_audit_log_alone() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path(), "status");

        app.status(true).unwrap();
        app.history(None).unwrap();
        assert!(app.store.get_recent_audits(10).unwrap().is_empty());

        // Outcome depends on the wall clock; the config audit is written either way
        let _ = app.check_out();
        let audits = app.store.get_recent_audits(10).unwrap();
        assert!(audits.iter().any(|a| matches!(
            &a.event,
            AuditEventType::ConfigLoaded { source } if source == "defaults"
        )));
    }

    #[test]
    fn test_resolve_month() {
        let now = Local.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(resolve_month(None, &now).unwrap(), (2025, 3));
        assert_eq!(resolve_month(Some("2024-11"), &now).unwrap(), (2024, 11));
        assert!(resolve_month(Some("2024-00"), &now).is_err());
    }

    #[tokio::test]
    async fn test_watch_renders_until_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let controller = AttendanceController::new(AttendancePolicy::default(), store.clone());
        let clock = FixedClock::new(Local.with_ymd_and_hms(2025, 3, 4, 8, 5, 0).unwrap());
        let user = UserId::new("alice");

        let mut out = Vec::new();
        let shutdown = tokio::time::sleep(Duration::from_millis(1500));
        let frames = watch(&controller, &user, &clock, shutdown, &mut out)
            .await
            .unwrap();

        assert!(frames >= 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("On-time check-in available"));
        // Watching never writes a record
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_watch_reports_storage_errors() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let controller = AttendanceController::new(AttendancePolicy::default(), store);
        let clock = FixedClock::new(Local.with_ymd_and_hms(2025, 3, 4, 8, 5, 0).unwrap());

        let mut out = Vec::new();
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        watch(&controller, &UserId::new("alice"), &clock, shutdown, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("try again"));
    }
}
