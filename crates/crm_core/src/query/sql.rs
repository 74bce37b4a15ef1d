//! SQL rendering of a [`ContactQuery`].
//!
//! Produces the WHERE / ORDER BY / LIMIT tail appended to the contact select,
//! with positional bind values in the same order as the `?` placeholders.
//!
//! Keyset predicate for cursor `(v, cid)` on field `f`:
//!
//! | dir  | v        | rows strictly after the cursor                    |
//! |------|----------|---------------------------------------------------|
//! | desc | not null | `f < v OR (f = v AND id < cid) OR f IS NULL`      |
//! | desc | null     | `f IS NULL AND id < cid`                          |
//! | asc  | not null | `f > v OR (f = v AND id > cid) OR f IS NULL`      |
//! | asc  | null     | `f IS NULL AND id > cid`                          |
//!
//! Null rows always trail non-null rows, so every null row follows a
//! non-null cursor and every non-null row precedes a null cursor.
//!
//! Text comparisons go through the `fold_case` scalar registered on every
//! connection, the same fold applied to query input.

use rusqlite::types::Value;

use crate::model::fold_case;

use super::cursor::{ContactCursor, CursorValue};
use super::filter::{ContactFilter, TextQuery};
use super::page::{ContactQuery, Pagination};
use super::sort::{SortDirection, SortSpec};

/// Rendered query tail plus bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPlan {
    pub clause: String,
    pub bind_values: Vec<Value>,
}

/// Renders filters, keyset predicate, ordering and the `page_size + 1` limit.
pub fn render_contact_query(query: &ContactQuery) -> SqlPlan {
    let mut clause = String::from(" WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    push_filter(&query.filter, &mut clause, &mut bind_values);

    if let Pagination::Cursor {
        cursor: Some(cursor),
        ..
    } = &query.pagination
    {
        push_keyset_predicate(cursor, &mut clause, &mut bind_values);
    }

    clause.push_str(&order_by(query.sort));

    let fetch = i64::from(query.pagination.page_size()) + 1;
    clause.push_str(" LIMIT ?");
    bind_values.push(Value::Integer(fetch));
    if let Pagination::Offset { skip, .. } = query.pagination {
        if skip > 0 {
            clause.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(skip)));
        }
    }

    SqlPlan {
        clause,
        bind_values,
    }
}

fn push_filter(filter: &ContactFilter, clause: &mut String, bind_values: &mut Vec<Value>) {
    if let Some(stage) = filter.stage {
        clause.push_str(" AND c.stage = ?");
        bind_values.push(Value::Text(stage.as_str().to_string()));
    }

    if let Some(owner) = filter.owner {
        clause.push_str(" AND c.owner_user_id = ?");
        bind_values.push(Value::Text(owner.to_string()));
    }

    if let Some(vehicle) = filter.vehicle {
        clause.push_str(" AND c.vehicle = ?");
        bind_values.push(Value::Text(vehicle.as_str().to_string()));
    }

    if let Some(contact_type) = filter.contact_type {
        clause.push_str(
            " AND EXISTS (
                SELECT 1
                FROM contact_types ct
                WHERE ct.contact_id = c.id
                  AND ct.type = ?
            )",
        );
        bind_values.push(Value::Text(contact_type.as_str().to_string()));
    }

    if let Some(text) = filter.text.as_ref() {
        push_text_match(text, clause, bind_values);
    }
}

fn push_text_match(text: &TextQuery, clause: &mut String, bind_values: &mut Vec<Value>) {
    const TEXT_COLUMNS: [&str; 5] = [
        "c.first_name",
        "c.last_name",
        "c.display_name",
        "c.email",
        "o.name",
    ];

    let mut arms = TEXT_COLUMNS
        .iter()
        .map(|column| format!("instr(fold_case({column}), ?) > 0"))
        .collect::<Vec<_>>();
    for _ in TEXT_COLUMNS {
        bind_values.push(Value::Text(text.needle.clone()));
    }

    if let Some(digits) = text.digits.as_ref() {
        arms.push("instr(c.phone_normalized, ?) > 0".to_string());
        bind_values.push(Value::Text(digits.clone()));
    }

    clause.push_str(" AND (");
    clause.push_str(&arms.join(" OR "));
    clause.push(')');
}

fn push_keyset_predicate(
    cursor: &ContactCursor,
    clause: &mut String,
    bind_values: &mut Vec<Value>,
) {
    let column = cursor.sort.field.sort_key();
    let (cmp, id_cmp) = match cursor.sort.direction {
        SortDirection::Desc => ("<", "<"),
        SortDirection::Asc => (">", ">"),
    };
    let id = Value::Text(cursor.id.to_string());

    let value = match &cursor.sort_value {
        CursorValue::Text(text) => Some(Value::Text(fold_case(text))),
        CursorValue::Timestamp(millis) => Some(Value::Integer(*millis)),
        CursorValue::Null => None,
    };

    match value {
        Some(value) => {
            clause.push_str(&format!(
                " AND ({column} {cmp} ? OR ({column} = ? AND c.id {id_cmp} ?) OR {column} IS NULL)"
            ));
            bind_values.push(value.clone());
            bind_values.push(value);
            bind_values.push(id);
        }
        None => {
            clause.push_str(&format!(" AND ({column} IS NULL AND c.id {id_cmp} ?)"));
            bind_values.push(id);
        }
    }
}

fn order_by(sort: SortSpec) -> String {
    let column = sort.field.sort_key();
    let direction = sort.direction.sql_keyword();
    format!(" ORDER BY ({column} IS NULL) ASC, {column} {direction}, c.id {direction}")
}
