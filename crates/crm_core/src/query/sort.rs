//! Sort order for contact listing.
//!
//! Parsed from the `field_direction` request form (`lastTouchAt_desc`).
//! Unknown fields fall back to `lastTouchAt`, unknown directions to `desc`.

use std::fmt::{Display, Formatter};

/// Primary sort key. `id` is always appended as the tie-breaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    LastTouchAt,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::LastTouchAt => "lastTouchAt",
            SortField::DisplayName => "displayName",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lastTouchAt" => Some(SortField::LastTouchAt),
            "displayName" => Some(SortField::DisplayName),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    /// Qualified column in the contact select.
    pub fn column(self) -> &'static str {
        match self {
            SortField::LastTouchAt => "c.last_touch_at",
            SortField::DisplayName => "c.display_name",
            SortField::CreatedAt => "c.created_at",
            SortField::UpdatedAt => "c.updated_at",
        }
    }

    /// Expression ordered and compared on. Names order case-insensitively.
    pub fn sort_key(self) -> &'static str {
        match self {
            SortField::DisplayName => "fold_case(c.display_name)",
            other => other.column(),
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, SortField::LastTouchAt | SortField::DisplayName)
    }

    /// Whether the key holds epoch-millisecond values rather than text.
    pub fn is_timestamp(self) -> bool {
        !matches!(self, SortField::DisplayName)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Field plus direction. Defaults to `lastTouchAt_desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Lenient parse used for request input.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::default();
        };

        let (field, direction) = match raw.rsplit_once('_') {
            Some((field, direction)) => (field, Some(direction)),
            None => (raw, None),
        };

        Self {
            field: SortField::parse(field).unwrap_or_default(),
            direction: direction
                .and_then(|value| SortDirection::parse(&value.to_ascii_lowercase()))
                .unwrap_or_default(),
        }
    }

    /// Strict parse used for cursor payloads; only canonical forms pass.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        let (field, direction) = raw.rsplit_once('_')?;
        Some(Self {
            field: SortField::parse(field)?,
            direction: SortDirection::parse(direction)?,
        })
    }
}

impl Display for SortSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.field.as_str(), self.direction.as_str())
    }
}
