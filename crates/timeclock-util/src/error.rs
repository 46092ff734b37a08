//! Error types for timeclock

use thiserror::Error;

/// Errors from parsing user-supplied values outside the attendance core
#[derive(Debug, Error)]
pub enum TimeclockError {
    #[error("Invalid clock time '{0}': expected HH:MM")]
    InvalidClockTime(String),

    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("No user given: pass --user, set TIMECLOCK_USER, or set service.default_user")]
    MissingUser,
}

pub type Result<T> = std::result::Result<T, TimeclockError>;
