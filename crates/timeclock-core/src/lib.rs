//! Attendance policy and daily state machine for timeclock
//!
//! This crate is the heart of timeclock, containing:
//! - Window evaluation (may the user check in or out right now?)
//! - The per-day state machine (NotCheckedIn -> CheckedIn -> CheckedOut)
//! - Monthly summaries and the salary calculation built on them

mod controller;
mod error;
mod payroll;
mod policy;
mod status;
mod summary;

pub use controller::*;
pub use error::*;
pub use payroll::*;
pub use policy::*;
pub use status::*;
pub use summary::*;
