//! Attendance and payroll errors

use thiserror::Error;
use timeclock_store::StoreError;

use crate::DecisionTag;

/// Why a check-in or check-out was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Already checked out today")]
    AlreadyCheckedOut,

    #[error("Not checked in today")]
    NotCheckedIn,

    #[error("{}", outside_window_message(.tag))]
    OutsideWindow { tag: DecisionTag },

    #[error("A reason is required for a late check-in")]
    ReasonRequired,

    #[error("Attendance storage is unavailable, please try again ({0})")]
    StorageUnavailable(String),
}

/// Salary arithmetic left the representable range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayrollError {
    #[error("Salary {0} is out of range")]
    Overflow(&'static str),
}

fn outside_window_message(tag: &DecisionTag) -> &'static str {
    match tag {
        DecisionTag::TooEarly => "Too early to check out",
        _ => "Outside attendance hours",
    }
}

impl AttendanceError {
    /// False only when retrying the same action later might succeed
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, AttendanceError::StorageUnavailable(_))
    }

    /// Stable name used in audit events and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::AlreadyCheckedIn => "already_checked_in",
            AttendanceError::AlreadyCheckedOut => "already_checked_out",
            AttendanceError::NotCheckedIn => "not_checked_in",
            AttendanceError::OutsideWindow { .. } => "outside_window",
            AttendanceError::ReasonRequired => "reason_required",
            AttendanceError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        AttendanceError::StorageUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_become_unavailable() {
        let err: AttendanceError = StoreError::Unavailable("disk full".into()).into();
        assert!(matches!(err, AttendanceError::StorageUnavailable(ref msg) if msg.contains("disk full")));
        assert!(!err.is_user_correctable());
        assert!(err.to_string().contains("try again"));
    }

    #[test]
    fn test_outside_window_messages() {
        let early = AttendanceError::OutsideWindow { tag: DecisionTag::TooEarly };
        let late = AttendanceError::OutsideWindow { tag: DecisionTag::OutsideWindow };

        assert_eq!(early.to_string(), "Too early to check out");
        assert_eq!(late.to_string(), "Outside attendance hours");
        assert!(early.is_user_correctable());
        assert_eq!(late.kind(), "outside_window");
    }
}
