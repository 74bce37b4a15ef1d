//! Opaque pagination cursor codec.
//!
//! # Responsibility
//! - Encode the position of the last row of a page into a URL-safe token.
//! - Decode and validate tokens handed back by clients.
//!
//! # Invariants
//! - Wire form is base64url (no padding) of JSON
//!   `{"v":1,"sort":"<field>_<dir>","sortValue":<string|number|null>,"id":"<uuid>"}`.
//! - A decoded cursor's value kind always matches its sort field.
//! - Decoding accepts standard padded base64 as well.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::sort::{SortField, SortSpec};
use crate::model::contact::{Contact, ContactId};

/// Current payload version. Bump when the payload meaning changes.
pub const CURSOR_VERSION: u8 = 1;

/// Sort-key value of the row a cursor points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorValue {
    Text(String),
    Timestamp(i64),
    Null,
}

/// Decoded cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCursor {
    /// Sort order that produced the page this cursor continues.
    pub sort: SortSpec,
    pub sort_value: CursorValue,
    pub id: ContactId,
}

#[derive(Debug)]
pub enum CursorError {
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
    Json(serde_json::Error),
    UnsupportedVersion(u8),
    UnknownSort(String),
    ValueKindMismatch { sort: SortSpec },
    InvalidId(String),
}

impl Display for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64(err) => write!(f, "cursor is not base64: {err}"),
            Self::Utf8(err) => write!(f, "cursor is not UTF-8: {err}"),
            Self::Json(err) => write!(f, "cursor payload is not valid JSON: {err}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "cursor version {version} is not supported")
            }
            Self::UnknownSort(sort) => write!(f, "cursor sort `{sort}` is not recognized"),
            Self::ValueKindMismatch { sort } => {
                write!(f, "cursor value does not fit sort `{sort}`")
            }
            Self::InvalidId(id) => write!(f, "cursor id `{id}` is not a contact id"),
        }
    }
}

impl Error for CursorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Base64(err) => Some(err),
            Self::Utf8(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Timestamp(i64),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    v: u8,
    sort: String,
    #[serde(rename = "sortValue")]
    sort_value: Option<WireValue>,
    id: String,
}

impl ContactCursor {
    /// Cursor pointing at `contact` under `sort`.
    pub fn from_contact(contact: &Contact, sort: SortSpec) -> Self {
        let sort_value = match sort.field {
            SortField::LastTouchAt => contact
                .last_touch_at
                .map_or(CursorValue::Null, CursorValue::Timestamp),
            SortField::DisplayName => contact
                .display_name
                .clone()
                .map_or(CursorValue::Null, CursorValue::Text),
            SortField::CreatedAt => CursorValue::Timestamp(contact.created_at),
            SortField::UpdatedAt => CursorValue::Timestamp(contact.updated_at),
        };
        Self {
            sort,
            sort_value,
            id: contact.id,
        }
    }

    /// Serializes into the opaque client token.
    pub fn encode(&self) -> String {
        let payload = CursorPayload {
            v: CURSOR_VERSION,
            sort: self.sort.to_string(),
            sort_value: match &self.sort_value {
                CursorValue::Text(text) => Some(WireValue::Text(text.clone())),
                CursorValue::Timestamp(value) => Some(WireValue::Timestamp(*value)),
                CursorValue::Null => None,
            },
            id: self.id.to_string(),
        };
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Parses and validates a client token.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let token = token.trim();
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .or_else(|_| STANDARD.decode(token))
            .map_err(CursorError::Base64)?;
        let text = String::from_utf8(bytes).map_err(CursorError::Utf8)?;
        let payload: CursorPayload = serde_json::from_str(&text).map_err(CursorError::Json)?;

        if payload.v != CURSOR_VERSION {
            return Err(CursorError::UnsupportedVersion(payload.v));
        }

        let sort = SortSpec::parse_strict(&payload.sort)
            .ok_or_else(|| CursorError::UnknownSort(payload.sort.clone()))?;

        let sort_value = match (payload.sort_value, sort.field.is_timestamp()) {
            (None, _) if sort.field.is_nullable() => CursorValue::Null,
            (Some(WireValue::Timestamp(value)), true) => CursorValue::Timestamp(value),
            (Some(WireValue::Text(text)), false) => CursorValue::Text(text),
            _ => return Err(CursorError::ValueKindMismatch { sort }),
        };

        let id = Uuid::parse_str(&payload.id).map_err(|_| CursorError::InvalidId(payload.id))?;

        Ok(Self {
            sort,
            sort_value,
            id,
        })
    }

    /// Decodes a token for a request sorted by `sort`.
    ///
    /// Undecodable tokens and tokens minted under another sort order yield
    /// `None`, which restarts the listing from the first page.
    pub fn resolve(token: Option<&str>, sort: SortSpec) -> Option<Self> {
        let token = token.map(str::trim).filter(|value| !value.is_empty())?;
        match Self::decode(token) {
            Ok(cursor) if cursor.sort == sort => Some(cursor),
            Ok(cursor) => {
                warn!(
                    "event=cursor_resolve module=query status=ignored reason=sort_mismatch cursor_sort={} request_sort={}",
                    cursor.sort, sort
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=cursor_resolve module=query status=ignored reason=decode_failed error={}",
                    err
                );
                None
            }
        }
    }
}
