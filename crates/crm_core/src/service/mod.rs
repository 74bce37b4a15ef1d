//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the handler boundary decoupled from storage details.

pub mod activity_service;
pub mod contact_service;
pub mod proposal_service;
pub mod task_service;
pub mod view_service;

use crate::repo::contact_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case level error shared by the CRM services.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record does not exist (or is not visible to the caller).
    NotFound { entity: &'static str, id: Uuid },
    /// Caller input rejected by write-side validation.
    Invalid(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but the read-back did not match.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Invalid(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::InvalidContact(err) => Self::Invalid(err.to_string()),
            RepoError::InvalidTask(err) => Self::Invalid(err.to_string()),
            RepoError::InvalidView(err) => Self::Invalid(err.to_string()),
            RepoError::InvalidProposal(err) => Self::Invalid(err.to_string()),
            other => Self::Repo(other),
        }
    }
}
