//! Proposal model.
//!
//! # Invariants
//! - `doc_url`, when present, is an absolute URL with a scheme.
//! - Status changes are mirrored into the contact's activity history by the
//!   proposal service.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::contact::ContactId;
use super::directory::UserId;

pub type ProposalId = Uuid;

static DOC_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+\S*$").expect("valid doc url regex")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    #[default]
    Draft,
    Ready,
    Sent,
    Accepted,
    Declined,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Ready => "READY",
            ProposalStatus::Sent => "SENT",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Declined => "DECLINED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(ProposalStatus::Draft),
            "READY" => Some(ProposalStatus::Ready),
            "SENT" => Some(ProposalStatus::Sent),
            "ACCEPTED" => Some(ProposalStatus::Accepted),
            "DECLINED" => Some(ProposalStatus::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub contact_id: ContactId,
    pub status: ProposalStatus,
    pub doc_url: Option<String>,
    pub notes: Option<String>,
    pub owner_user_id: Option<UserId>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub contact_id: ContactId,
    #[serde(default)]
    pub status: Option<ProposalStatus>,
    #[serde(default)]
    pub doc_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub owner_user_id: Option<UserId>,
}

impl NewProposal {
    pub fn new(contact_id: ContactId) -> Self {
        Self {
            contact_id,
            status: None,
            doc_url: None,
            notes: None,
            owner_user_id: None,
        }
    }
}

/// Partial proposal update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalPatch {
    pub status: Option<ProposalStatus>,
    pub doc_url: Option<String>,
    pub notes: Option<String>,
    pub owner_user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalValidationError {
    InvalidDocUrl(String),
}

impl Display for ProposalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocUrl(url) => write!(f, "docUrl is not a valid url: {url}"),
        }
    }
}

impl Error for ProposalValidationError {}

impl Proposal {
    /// Builds a proposal from create input with a generated id.
    pub fn from_new(input: NewProposal) -> Self {
        Self {
            id: Uuid::new_v4(),
            contact_id: input.contact_id,
            status: input.status.unwrap_or_default(),
            doc_url: trimmed(input.doc_url),
            notes: input.notes,
            owner_user_id: input.owner_user_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn apply_patch(&mut self, patch: ProposalPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(doc_url) = patch.doc_url {
            self.doc_url = trimmed(Some(doc_url));
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(owner) = patch.owner_user_id {
            self.owner_user_id = Some(owner);
        }
    }

    pub fn validate(&self) -> Result<(), ProposalValidationError> {
        match self.doc_url.as_deref() {
            Some(url) if !DOC_URL_RE.is_match(url) => {
                Err(ProposalValidationError::InvalidDocUrl(url.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
