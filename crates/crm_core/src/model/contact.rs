//! Contact domain model.
//!
//! # Responsibility
//! - Define the queried `Contact` record and its pipeline enums.
//! - Validate and normalize contact input before persistence.
//!
//! # Invariants
//! - `phone_normalized` is always the digits-only projection of `phone`.
//! - `types` is sorted and free of duplicates.
//! - `id` is never reused for another contact.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::directory::{Organization, OrganizationId, UserId};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Stable contact identifier. Its text form is the final sort tie-breaker.
pub type ContactId = Uuid;

/// Position of a contact in the relationship pipeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    NewLead,
    FirstOutreachSent,
    ConnectedConversation,
    QuestionnaireSent,
    QuestionnaireReceived,
    QualifiedActive,
    ProposalToBeDeveloped,
    ProposalInProgress,
    ProposalReadyForFormatting,
    ProposalSent,
    ActiveNegotiation,
    SoftCommitted,
    ClosedConverted,
    Dormant,
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 15] = [
        Stage::NewLead,
        Stage::FirstOutreachSent,
        Stage::ConnectedConversation,
        Stage::QuestionnaireSent,
        Stage::QuestionnaireReceived,
        Stage::QualifiedActive,
        Stage::ProposalToBeDeveloped,
        Stage::ProposalInProgress,
        Stage::ProposalReadyForFormatting,
        Stage::ProposalSent,
        Stage::ActiveNegotiation,
        Stage::SoftCommitted,
        Stage::ClosedConverted,
        Stage::Dormant,
        Stage::Lost,
    ];

    /// Storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::NewLead => "NEW_LEAD",
            Stage::FirstOutreachSent => "FIRST_OUTREACH_SENT",
            Stage::ConnectedConversation => "CONNECTED_CONVERSATION",
            Stage::QuestionnaireSent => "QUESTIONNAIRE_SENT",
            Stage::QuestionnaireReceived => "QUESTIONNAIRE_RECEIVED",
            Stage::QualifiedActive => "QUALIFIED_ACTIVE",
            Stage::ProposalToBeDeveloped => "PROPOSAL_TO_BE_DEVELOPED",
            Stage::ProposalInProgress => "PROPOSAL_IN_PROGRESS",
            Stage::ProposalReadyForFormatting => "PROPOSAL_READY_FOR_FORMATTING",
            Stage::ProposalSent => "PROPOSAL_SENT",
            Stage::ActiveNegotiation => "ACTIVE_NEGOTIATION",
            Stage::SoftCommitted => "SOFT_COMMITTED",
            Stage::ClosedConverted => "CLOSED_CONVERTED",
            Stage::Dormant => "DORMANT",
            Stage::Lost => "LOST",
        }
    }

    /// Parses the exact wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == value)
    }
}

/// Relationship tag; a contact may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    InvestorCash,
    RollInOwner,
    Realtor,
    Professional,
    Partner,
    Internal,
}

impl ContactType {
    pub const ALL: [ContactType; 6] = [
        ContactType::InvestorCash,
        ContactType::RollInOwner,
        ContactType::Realtor,
        ContactType::Professional,
        ContactType::Partner,
        ContactType::Internal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactType::InvestorCash => "INVESTOR_CASH",
            ContactType::RollInOwner => "ROLL_IN_OWNER",
            ContactType::Realtor => "REALTOR",
            ContactType::Professional => "PROFESSIONAL",
            ContactType::Partner => "PARTNER",
            ContactType::Internal => "INTERNAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Investment vehicle a contact is associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleFlag {
    Core,
    Cast3,
}

impl VehicleFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleFlag::Core => "CORE",
            VehicleFlag::Cast3 => "CAST3",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CORE" => Some(VehicleFlag::Core),
            "CAST3" => Some(VehicleFlag::Cast3),
            _ => None,
        }
    }
}

/// Contact record as stored and returned by list/detail reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Digits-only projection of `phone`, used by free-text search.
    pub phone_normalized: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub types: Vec<ContactType>,
    pub vehicle: Option<VehicleFlag>,
    pub stage: Stage,
    pub owner_user_id: Option<UserId>,
    /// Joined organization; written through `organization_id`.
    pub organization: Option<Organization>,
    pub next_touch_at: Option<i64>,
    /// Last meaningful interaction. Nullable; nulls sort last.
    pub last_touch_at: Option<i64>,
    pub how_we_met: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create payload for a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub types: Vec<ContactType>,
    pub vehicle: Option<VehicleFlag>,
    pub stage: Option<Stage>,
    pub owner_user_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
    pub next_touch_at: Option<i64>,
    pub last_touch_at: Option<i64>,
    pub how_we_met: Option<String>,
    pub notes: Option<String>,
}

/// Partial update payload. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub types: Option<Vec<ContactType>>,
    pub vehicle: Option<VehicleFlag>,
    pub stage: Option<Stage>,
    pub owner_user_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
    pub next_touch_at: Option<i64>,
    pub last_touch_at: Option<i64>,
    pub how_we_met: Option<String>,
    pub notes: Option<String>,
}

/// Write-side validation failure for contact input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    InvalidEmail(String),
    NegativeTimestamp(&'static str),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::NegativeTimestamp(field) => write!(f, "`{field}` must not be negative"),
        }
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Builds a fresh contact from create input with a generated id.
    ///
    /// `created_at`/`updated_at` are placeholders until the row is read back.
    pub fn from_new(input: NewContact) -> Self {
        let organization = input.organization_id.map(|id| Organization {
            id,
            name: String::new(),
        });
        let mut contact = Self {
            id: Uuid::new_v4(),
            first_name: clean_text(input.first_name),
            last_name: clean_text(input.last_name),
            display_name: clean_text(input.display_name),
            email: clean_text(input.email),
            phone: clean_text(input.phone),
            phone_normalized: None,
            city: clean_text(input.city),
            region: clean_text(input.region),
            country: clean_text(input.country),
            types: normalize_types(&input.types),
            vehicle: input.vehicle,
            stage: input.stage.unwrap_or_default(),
            owner_user_id: input.owner_user_id,
            organization,
            next_touch_at: input.next_touch_at,
            last_touch_at: input.last_touch_at,
            how_we_met: clean_text(input.how_we_met),
            notes: clean_text(input.notes),
            created_at: 0,
            updated_at: 0,
        };
        contact.refresh_derived_fields();
        contact
    }

    /// Applies a partial update in place and recomputes derived fields.
    pub fn apply_patch(&mut self, patch: ContactPatch) {
        let explicit_display_name = patch.display_name.is_some();
        if let Some(value) = patch.first_name {
            self.first_name = clean_text(Some(value));
        }
        if let Some(value) = patch.last_name {
            self.last_name = clean_text(Some(value));
        }
        if explicit_display_name {
            self.display_name = clean_text(patch.display_name);
        }
        if let Some(value) = patch.email {
            self.email = clean_text(Some(value));
        }
        if let Some(value) = patch.phone {
            self.phone = clean_text(Some(value));
        }
        if let Some(value) = patch.city {
            self.city = clean_text(Some(value));
        }
        if let Some(value) = patch.region {
            self.region = clean_text(Some(value));
        }
        if let Some(value) = patch.country {
            self.country = clean_text(Some(value));
        }
        if let Some(types) = patch.types {
            self.types = normalize_types(&types);
        }
        if let Some(vehicle) = patch.vehicle {
            self.vehicle = Some(vehicle);
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(owner) = patch.owner_user_id {
            self.owner_user_id = Some(owner);
        }
        if let Some(organization_id) = patch.organization_id {
            self.organization = Some(Organization {
                id: organization_id,
                name: String::new(),
            });
        }
        if let Some(value) = patch.next_touch_at {
            self.next_touch_at = Some(value);
        }
        if let Some(value) = patch.last_touch_at {
            self.last_touch_at = Some(value);
        }
        if let Some(value) = patch.how_we_met {
            self.how_we_met = clean_text(Some(value));
        }
        if let Some(value) = patch.notes {
            self.notes = clean_text(Some(value));
        }
        self.refresh_derived_fields();
    }

    /// Checks write-side constraints.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if let Some(email) = self.email.as_deref() {
            if !EMAIL_RE.is_match(email) {
                return Err(ContactValidationError::InvalidEmail(email.to_string()));
            }
        }
        if self.next_touch_at.is_some_and(|value| value < 0) {
            return Err(ContactValidationError::NegativeTimestamp("nextTouchAt"));
        }
        if self.last_touch_at.is_some_and(|value| value < 0) {
            return Err(ContactValidationError::NegativeTimestamp("lastTouchAt"));
        }
        Ok(())
    }

    /// Organization id carried by this contact, if any.
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization.as_ref().map(|organization| organization.id)
    }

    fn refresh_derived_fields(&mut self) {
        self.phone_normalized = self.phone.as_deref().and_then(normalize_phone);
        if self.display_name.is_none() {
            self.display_name = derive_display_name(
                self.first_name.as_deref(),
                self.last_name.as_deref(),
            );
        }
    }
}

/// Strips every non-digit character. Returns `None` when no digit remains.
///
/// `"(555) 123-4567"` becomes `"5551234567"`.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn derive_display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(Some(joined))
}

fn normalize_types(types: &[ContactType]) -> Vec<ContactType> {
    types
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
