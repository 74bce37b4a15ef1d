//! Contact query engine.
//!
//! # Responsibility
//! - Turn list requests (filters + sort + pagination mode) into a stable,
//!   deterministic page of contacts.
//! - Own the cursor codec and the keyset predicate that continues a page.
//!
//! # Invariants
//! - Ordering is total: `(sort field, id)` in the requested direction, nulls
//!   last in both directions.
//! - The engine never mutates contacts and keeps no state between calls;
//!   the cursor token is the only carried state.

pub mod cursor;
pub mod filter;
pub mod page;
pub mod params;
pub mod sort;
pub mod sql;

pub use cursor::{ContactCursor, CursorError, CursorValue};
pub use filter::{ContactFilter, TextQuery};
pub use page::{ContactPage, ContactQuery, Pagination};
pub use params::ListContactsParams;
pub use sort::{SortDirection, SortField, SortSpec};
