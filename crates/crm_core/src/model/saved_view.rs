//! Saved contact-list views.
//!
//! # Invariants
//! - `name` is 1..=100 characters after trimming.
//! - At most one view per user has `is_default = true`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::directory::UserId;
use crate::query::{ContactQuery, ListContactsParams};

pub type SavedViewId = Uuid;

const VIEW_NAME_MAX_CHARS: usize = 100;

/// Named filter preset for the contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    pub id: SavedViewId,
    pub user_id: UserId,
    pub name: String,
    /// Stored list parameters, replayed through the query engine.
    pub filters: ListContactsParams,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedView {
    pub name: String,
    #[serde(default)]
    pub filters: ListContactsParams,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedViewPatch {
    pub name: Option<String>,
    pub filters: Option<ListContactsParams>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedViewValidationError {
    BlankName,
    NameTooLong(usize),
}

impl Display for SavedViewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "view name is required"),
            Self::NameTooLong(count) => write!(
                f,
                "view name has {count} characters; at most {VIEW_NAME_MAX_CHARS} allowed"
            ),
        }
    }
}

impl Error for SavedViewValidationError {}

impl SavedView {
    pub fn from_new(user_id: UserId, input: NewSavedView) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.trim().to_string(),
            filters: input.filters,
            is_default: input.is_default,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn apply_patch(&mut self, patch: SavedViewPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(filters) = patch.filters {
            self.filters = filters;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
    }

    pub fn validate(&self) -> Result<(), SavedViewValidationError> {
        let count = self.name.chars().count();
        if count == 0 {
            return Err(SavedViewValidationError::BlankName);
        }
        if count > VIEW_NAME_MAX_CHARS {
            return Err(SavedViewValidationError::NameTooLong(count));
        }
        Ok(())
    }

    /// Typed query for this view's stored filters.
    pub fn to_query(&self) -> ContactQuery {
        self.filters.to_query()
    }
}
