//! Time-window policy evaluation
//!
//! Maps a wall-clock time and the user's state for the day onto the action
//! the user may take next. Pure and deterministic: no clock, no storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use timeclock_config::AttendancePolicy;
use timeclock_util::WallClock;

/// What the user may do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AllowCheckIn,
    AllowCheckOut,
    Deny,
    /// Nothing left to do today
    None,
}

/// Why the action was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTag {
    OnTime,
    Late,
    OutsideWindow,
    /// Checked in, check-out window not open yet
    TooEarly,
    CheckOut,
    Complete,
}

impl DecisionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTag::OnTime => "on_time",
            DecisionTag::Late => "late",
            DecisionTag::OutsideWindow => "outside_window",
            DecisionTag::TooEarly => "too_early",
            DecisionTag::CheckOut => "check_out",
            DecisionTag::Complete => "complete",
        }
    }
}

impl fmt::Display for DecisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating the policy at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub tag: DecisionTag,
    /// Set only for late check-ins
    pub requires_reason: bool,
}

impl Decision {
    fn new(action: Action, tag: DecisionTag) -> Self {
        Self {
            action,
            tag,
            requires_reason: false,
        }
    }

    fn late() -> Self {
        Self {
            action: Action::AllowCheckIn,
            tag: DecisionTag::Late,
            requires_reason: true,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.action, Action::AllowCheckIn | Action::AllowCheckOut)
    }

    /// Status line shown to the user
    pub fn message(&self) -> &'static str {
        match self.tag {
            DecisionTag::OnTime => "On-time check-in available",
            DecisionTag::Late => "Late - a reason is required",
            DecisionTag::CheckOut => "Check-out available",
            DecisionTag::TooEarly => "Too early to check out",
            DecisionTag::Complete => "Done for today",
            DecisionTag::OutsideWindow => "Outside attendance hours",
        }
    }
}

/// Decide what the user may do at `now`.
///
/// A set `has_checked_out_today` wins over everything else, so the
/// evaluator never offers an action on a finished day.
pub fn evaluate(
    policy: &AttendancePolicy,
    now: WallClock,
    has_checked_in_today: bool,
    has_checked_out_today: bool,
) -> Decision {
    if has_checked_out_today {
        return Decision::new(Action::None, DecisionTag::Complete);
    }

    if !has_checked_in_today {
        if policy.on_time.contains(now) {
            return Decision::new(Action::AllowCheckIn, DecisionTag::OnTime);
        }
        if policy.late.contains(now) {
            return Decision::late();
        }
        return Decision::new(Action::Deny, DecisionTag::OutsideWindow);
    }

    if policy.check_out.contains(now) {
        Decision::new(Action::AllowCheckOut, DecisionTag::CheckOut)
    } else if policy.check_out.starts_after(now) {
        Decision::new(Action::Deny, DecisionTag::TooEarly)
    } else {
        Decision::new(Action::Deny, DecisionTag::OutsideWindow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: u16) -> WallClock {
        WallClock::from_minutes(minutes).unwrap()
    }

    fn before_check_in(minutes: u16) -> Decision {
        evaluate(&AttendancePolicy::default(), at(minutes), false, false)
    }

    fn after_check_in(minutes: u16) -> Decision {
        evaluate(&AttendancePolicy::default(), at(minutes), true, false)
    }

    #[test]
    fn test_on_time_window_every_minute() {
        for minute in 480..=510 {
            let decision = before_check_in(minute);
            assert_eq!(decision.action, Action::AllowCheckIn, "minute {}", minute);
            assert_eq!(decision.tag, DecisionTag::OnTime, "minute {}", minute);
            assert!(!decision.requires_reason);
        }
    }

    #[test]
    fn test_late_window_every_minute() {
        for minute in 511..=570 {
            let decision = before_check_in(minute);
            assert_eq!(decision.action, Action::AllowCheckIn, "minute {}", minute);
            assert_eq!(decision.tag, DecisionTag::Late, "minute {}", minute);
            assert!(decision.requires_reason);
        }
    }

    #[test]
    fn test_check_in_outside_window() {
        for minute in [0, 479, 571, 600, 990, 1439] {
            let decision = before_check_in(minute);
            assert_eq!(decision.action, Action::Deny, "minute {}", minute);
            assert_eq!(decision.tag, DecisionTag::OutsideWindow);
            assert!(!decision.requires_reason);
        }
    }

    #[test]
    fn test_check_out_window_bounds() {
        for minute in [990, 1000, 1020] {
            let decision = after_check_in(minute);
            assert_eq!(decision.action, Action::AllowCheckOut, "minute {}", minute);
            assert_eq!(decision.tag, DecisionTag::CheckOut);
        }

        assert_eq!(after_check_in(989).tag, DecisionTag::TooEarly);
        assert_eq!(after_check_in(989).action, Action::Deny);
        assert_eq!(after_check_in(495).tag, DecisionTag::TooEarly);

        assert_eq!(after_check_in(1021).tag, DecisionTag::OutsideWindow);
        assert_eq!(after_check_in(1021).action, Action::Deny);
    }

    #[test]
    fn test_checked_out_is_complete() {
        let policy = AttendancePolicy::default();
        for minute in [0, 500, 1000, 1439] {
            let decision = evaluate(&policy, at(minute), true, true);
            assert_eq!(decision.action, Action::None);
            assert_eq!(decision.tag, DecisionTag::Complete);
        }

        // Flag wins even with an inconsistent check-in flag
        let decision = evaluate(&policy, at(1000), false, true);
        assert_eq!(decision.tag, DecisionTag::Complete);
    }

    #[test]
    fn test_custom_windows() {
        let policy = AttendancePolicy::from_boundaries(
            WallClock::new(7, 0).unwrap(),
            WallClock::new(7, 15).unwrap(),
            WallClock::new(7, 45).unwrap(),
            WallClock::new(15, 0).unwrap(),
            WallClock::new(15, 30).unwrap(),
        );

        assert_eq!(evaluate(&policy, at(420), false, false).tag, DecisionTag::OnTime);
        assert_eq!(evaluate(&policy, at(436), false, false).tag, DecisionTag::Late);
        assert_eq!(evaluate(&policy, at(480), false, false).tag, DecisionTag::OutsideWindow);
        assert_eq!(evaluate(&policy, at(900), true, false).tag, DecisionTag::CheckOut);
    }

    #[test]
    fn test_messages() {
        assert_eq!(before_check_in(480).message(), "On-time check-in available");
        assert_eq!(before_check_in(540).message(), "Late - a reason is required");
        assert_eq!(after_check_in(600).message(), "Too early to check out");
        assert!(after_check_in(1000).is_allowed());
        assert!(!before_check_in(700).is_allowed());
    }
}
