//! Persistence layer for timeclock
//!
//! Provides:
//! - Daily attendance records, one per (user, calendar day)
//! - Atomic insert-if-absent and compare-and-swap writes
//! - Audit log (append-only)
//!
//! Two backends implement [`RecordStore`]: [`MemoryStore`] for tests and
//! [`SqliteStore`] for anything that must survive a restart.

mod audit;
mod memory;
mod record;
mod sqlite;
mod traits;

pub use audit::*;
pub use memory::*;
pub use record::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record {key}: {message}")]
    InvalidRecord { key: RecordKey, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
