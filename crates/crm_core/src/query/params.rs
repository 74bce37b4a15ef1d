//! Raw contact-list request parameters.
//!
//! # Responsibility
//! - Capture query-string parameters exactly as received.
//! - Translate them into a typed [`ContactQuery`] without ever rejecting
//!   the request: unusable values degrade to "no filter" or defaults.
//!
//! # Invariants
//! - Cursor mode is selected only by the presence of `limit`.
//! - `q` wins over its legacy alias `search`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cursor::ContactCursor;
use super::filter::{ContactFilter, TextQuery};
use super::page::{
    normalize_page_size, normalize_skip, ContactQuery, Pagination, CURSOR_DEFAULT_LIMIT,
    OFFSET_DEFAULT_TAKE,
};
use super::sort::SortSpec;
use crate::model::contact::{ContactType, Stage, VehicleFlag};

/// Contact list parameters as strings, keyed like the HTTP query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListContactsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<String>,
}

impl ListContactsParams {
    /// Builds params from already percent-decoded key/value pairs.
    ///
    /// Unknown keys are ignored; for repeated keys the first value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "stage" => &mut params.stage,
                "ownerUserId" => &mut params.owner_user_id,
                "vehicle" => &mut params.vehicle,
                "contactType" => &mut params.contact_type,
                "q" => &mut params.q,
                "search" => &mut params.search,
                "sort" => &mut params.sort,
                "limit" => &mut params.limit,
                "cursor" => &mut params.cursor,
                "skip" => &mut params.skip,
                "take" => &mut params.take,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }

    /// Whether the caller opted into cursor mode (and the paged response).
    pub fn wants_cursor_mode(&self) -> bool {
        self.limit.is_some()
    }

    pub fn to_filter(&self) -> ContactFilter {
        ContactFilter {
            stage: trimmed(&self.stage).and_then(Stage::parse),
            owner: trimmed(&self.owner_user_id).and_then(|value| Uuid::parse_str(value).ok()),
            vehicle: trimmed(&self.vehicle).and_then(VehicleFlag::parse),
            contact_type: trimmed(&self.contact_type).and_then(ContactType::parse),
            text: trimmed(&self.q)
                .or_else(|| trimmed(&self.search))
                .and_then(TextQuery::parse),
        }
    }

    /// Translates the raw parameters into a typed query.
    pub fn to_query(&self) -> ContactQuery {
        let sort = SortSpec::parse_lenient(self.sort.as_deref());
        let pagination = if self.wants_cursor_mode() {
            Pagination::Cursor {
                limit: normalize_page_size(self.limit.as_deref(), CURSOR_DEFAULT_LIMIT),
                cursor: ContactCursor::resolve(self.cursor.as_deref(), sort),
            }
        } else {
            Pagination::Offset {
                skip: normalize_skip(self.skip.as_deref()),
                take: normalize_page_size(self.take.as_deref(), OFFSET_DEFAULT_TAKE),
            }
        };

        ContactQuery {
            filter: self.to_filter(),
            sort,
            pagination,
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::ListContactsParams;
    use crate::model::contact::{ContactType, Stage};
    use crate::query::page::Pagination;
    use crate::query::sort::{SortDirection, SortField};

    #[test]
    fn missing_limit_selects_offset_mode_with_defaults() {
        let query = ListContactsParams::default().to_query();
        assert_eq!(query.pagination, Pagination::Offset { skip: 0, take: 50 });
        assert_eq!(query.sort.field, SortField::LastTouchAt);
        assert_eq!(query.sort.direction, SortDirection::Desc);
        assert!(query.filter.is_empty());
    }

    #[test]
    fn present_limit_selects_cursor_mode_even_when_malformed() {
        let params = ListContactsParams::from_pairs([("limit", "lots")]);
        let query = params.to_query();
        assert_eq!(
            query.pagination,
            Pagination::Cursor {
                limit: 25,
                cursor: None
            }
        );
    }

    #[test]
    fn invalid_filter_values_are_dropped() {
        let params = ListContactsParams::from_pairs([
            ("stage", "NOT_A_STAGE"),
            ("ownerUserId", "nobody"),
            ("vehicle", "BOAT"),
            ("contactType", "REALTOR"),
        ]);
        let filter = params.to_filter();
        assert_eq!(filter.stage, None);
        assert_eq!(filter.owner, None);
        assert_eq!(filter.vehicle, None);
        assert_eq!(filter.contact_type, Some(ContactType::Realtor));
    }

    #[test]
    fn q_takes_precedence_over_search_alias() {
        let params = ListContactsParams::from_pairs([("search", "legacy"), ("q", "John")]);
        assert_eq!(params.to_filter().text.unwrap().needle, "john");

        let params = ListContactsParams::from_pairs([("search", "legacy"), ("q", "  ")]);
        assert_eq!(params.to_filter().text.unwrap().needle, "legacy");
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let params = ListContactsParams::from_pairs([("stage", "LOST"), ("stage", "DORMANT")]);
        assert_eq!(params.to_filter().stage, Some(Stage::Lost));
    }

    #[test]
    fn deserializes_from_camel_case_json() {
        let params: ListContactsParams =
            serde_json::from_str(r#"{"ownerUserId":"x","contactType":"PARTNER","limit":"10"}"#)
                .unwrap();
        assert_eq!(params.owner_user_id.as_deref(), Some("x"));
        assert!(params.wants_cursor_mode());
    }
}
