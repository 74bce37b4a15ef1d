//! CRM domain model.
//!
//! # Responsibility
//! - Define the records shared by repositories, the query engine and the
//!   handler boundary.
//! - Own write-side validation and derived fields (normalized phone,
//!   fallback display name).
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4 stored as lowercase text.
//! - Timestamps are Unix epoch milliseconds.

pub mod activity;
pub mod contact;
pub mod directory;
pub mod proposal;
pub mod saved_view;
pub mod task;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Unicode case fold shared by text matching and name ordering.
///
/// Registered in SQLite as `fold_case` so stored values and query input fold
/// the same way.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
