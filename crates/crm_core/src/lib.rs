//! Core domain logic for the CRM.
//! Contact storage, the contact query engine and the handler boundary.

pub mod api;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{Contact, ContactId, ContactPatch, ContactType, NewContact, Stage};
pub use query::{ContactCursor, ContactPage, ContactQuery, ListContactsParams, SortSpec};
pub use repo::contact_repo::{
    ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
pub use service::contact_service::ContactService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
