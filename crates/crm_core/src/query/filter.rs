//! Typed contact filters.
//!
//! All present criteria combine with AND. The free-text query matches with
//! OR across name, email and organization fields, plus the normalized phone
//! when the query contains digits.

use crate::model::contact::{normalize_phone, ContactType, Stage, VehicleFlag};
use crate::model::fold_case;
use crate::model::directory::UserId;

/// Free-text search needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    /// Trimmed, case-folded query used for substring matching.
    pub needle: String,
    /// Digits of the query, matched against `phone_normalized`.
    pub digits: Option<String>,
}

impl TextQuery {
    /// Returns `None` for blank input, which disables text filtering.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: fold_case(trimmed),
            digits: normalize_phone(trimmed),
        })
    }
}

/// Optional filter criteria for a contact listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub stage: Option<Stage>,
    pub owner: Option<UserId>,
    pub vehicle: Option<VehicleFlag>,
    pub contact_type: Option<ContactType>,
    pub text: Option<TextQuery>,
}

impl ContactFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
