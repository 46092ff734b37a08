//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use timeclock_util::UserId;

use crate::ArrivalStatus;

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Check-in accepted and recorded
    CheckedIn {
        user_id: UserId,
        date: NaiveDate,
        arrival_status: ArrivalStatus,
    },

    /// Check-out accepted and recorded
    CheckedOut {
        user_id: UserId,
        date: NaiveDate,
        worked_minutes: i64,
    },

    /// Check-in refused
    CheckInRejected { user_id: UserId, reason: String },

    /// Check-out refused
    CheckOutRejected { user_id: UserId, reason: String },

    /// Configuration loaded at startup
    ConfigLoaded { source: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self::at(timeclock_util::now(), event)
    }

    pub fn at(timestamp: DateTime<Local>, event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp,
            event,
        }
    }
}
