//! Shared utilities for timeclock
//!
//! This crate provides:
//! - ID types (UserId)
//! - Clock source (system clock with mock time, fixed clock for tests)
//! - Wall-clock time windows and weekday masks
//! - Error types for user-supplied values
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
