//! Pagination modes and page-size normalization.
//!
//! # Invariants
//! - Cursor mode: page size defaults to 25 and never exceeds 100.
//! - Offset mode: `take` defaults to 50 and never exceeds 100; `skip >= 0`.
//! - Malformed, zero or negative sizes fall back to the default.

use serde::Serialize;

use super::cursor::ContactCursor;
use super::filter::ContactFilter;
use super::sort::SortSpec;
use crate::model::contact::Contact;

pub const CURSOR_DEFAULT_LIMIT: u32 = 25;
pub const OFFSET_DEFAULT_TAKE: u32 = 50;
pub const PAGE_SIZE_MAX: u32 = 100;

/// How the caller walks the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Legacy skip/take paging.
    Offset { skip: u32, take: u32 },
    /// Keyset paging continuing after `cursor` (first page when `None`).
    Cursor {
        limit: u32,
        cursor: Option<ContactCursor>,
    },
}

impl Pagination {
    pub fn page_size(&self) -> u32 {
        match self {
            Pagination::Offset { take, .. } => *take,
            Pagination::Cursor { limit, .. } => *limit,
        }
    }

    pub fn is_cursor_mode(&self) -> bool {
        matches!(self, Pagination::Cursor { .. })
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Offset {
            skip: 0,
            take: OFFSET_DEFAULT_TAKE,
        }
    }
}

/// Fully typed contact listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    pub filter: ContactFilter,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

/// One page of contacts, independent of the response shape sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPage {
    pub items: Vec<Contact>,
    /// Token for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Normalizes a raw page size against a default and the hard cap.
pub fn normalize_page_size(raw: Option<&str>, default: u32) -> u32 {
    match raw.map(str::trim).and_then(|value| value.parse::<i64>().ok()) {
        Some(value) if value <= 0 => default,
        Some(value) if value > i64::from(PAGE_SIZE_MAX) => PAGE_SIZE_MAX,
        Some(value) => u32::try_from(value).unwrap_or(default),
        None => default,
    }
}

/// Normalizes a raw offset; anything unusable becomes 0.
pub fn normalize_skip(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).and_then(|value| value.parse::<i64>().ok()) {
        Some(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_page_size, normalize_skip, CURSOR_DEFAULT_LIMIT, PAGE_SIZE_MAX};

    #[test]
    fn page_size_defaults_clamps_and_ignores_garbage() {
        assert_eq!(normalize_page_size(None, CURSOR_DEFAULT_LIMIT), 25);
        assert_eq!(normalize_page_size(Some(""), CURSOR_DEFAULT_LIMIT), 25);
        assert_eq!(normalize_page_size(Some("abc"), CURSOR_DEFAULT_LIMIT), 25);
        assert_eq!(normalize_page_size(Some("0"), CURSOR_DEFAULT_LIMIT), 25);
        assert_eq!(normalize_page_size(Some("-4"), CURSOR_DEFAULT_LIMIT), 25);
        assert_eq!(normalize_page_size(Some(" 7 "), CURSOR_DEFAULT_LIMIT), 7);
        assert_eq!(
            normalize_page_size(Some("5000"), CURSOR_DEFAULT_LIMIT),
            PAGE_SIZE_MAX
        );
    }

    #[test]
    fn skip_never_goes_negative() {
        assert_eq!(normalize_skip(None), 0);
        assert_eq!(normalize_skip(Some("-10")), 0);
        assert_eq!(normalize_skip(Some("x")), 0);
        assert_eq!(normalize_skip(Some("30")), 30);
        assert_eq!(normalize_skip(Some("99999999999")), u32::MAX);
    }
}
