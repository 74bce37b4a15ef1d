//! Repository layer over the SQLite store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories report missing targets as `RepoError::NotFound`.

pub mod activity_repo;
pub mod contact_repo;
pub mod directory_repo;
pub mod proposal_repo;
pub mod task_repo;
pub mod view_repo;

use contact_repo::{RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_enum<T>(
    value: &str,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value).ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Fails with `NotFound` unless `table` has a row with primary key `id`.
///
/// `table` must be a trusted identifier; it is spliced into the SQL.
pub(crate) fn ensure_row_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1;"),
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::NotFound { entity, id }),
    }
}
