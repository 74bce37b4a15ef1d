#![allow(dead_code)]

use crm_core::api::{self, ContactListResponse};
use crm_core::model::contact::{Contact, NewContact};
use crm_core::{ContactRepository, ListContactsParams, SqliteContactRepository};
use rusqlite::Connection;
use uuid::Uuid;

pub const JAN_01_2024: i64 = 1_704_067_200_000;
pub const JAN_03_2024: i64 = 1_704_240_000_000;

/// Inserts a contact with a fixed id derived from `n`.
pub fn seed(conn: &Connection, n: u128, input: NewContact) -> Contact {
    let repo = SqliteContactRepository::new(conn);
    let mut contact = Contact::from_new(input);
    contact.id = Uuid::from_u128(n);
    repo.create_contact(&contact).unwrap();
    repo.get_contact(contact.id).unwrap().unwrap()
}

pub fn seed_named(conn: &Connection, n: u128, name: &str, last_touch_at: Option<i64>) -> Contact {
    seed(
        conn,
        n,
        NewContact {
            display_name: Some(name.to_string()),
            last_touch_at,
            ..NewContact::default()
        },
    )
}

pub fn params(pairs: &[(&str, &str)]) -> ListContactsParams {
    ListContactsParams::from_pairs(pairs.iter().map(|(key, value)| (*key, *value)))
}

/// Returns `(items, next_cursor)` of a cursor-mode listing.
pub fn paged(conn: &Connection, params: &ListContactsParams) -> (Vec<Contact>, Option<String>) {
    match api::list_contacts(conn, params).unwrap() {
        ContactListResponse::Paged { items, next_cursor } => (items, next_cursor),
        ContactListResponse::Legacy(_) => panic!("expected paged response"),
    }
}

pub fn legacy(conn: &Connection, params: &ListContactsParams) -> Vec<Contact> {
    match api::list_contacts(conn, params).unwrap() {
        ContactListResponse::Legacy(items) => items,
        ContactListResponse::Paged { .. } => panic!("expected bare array response"),
    }
}

/// Follows `nextCursor` until exhausted and returns every id in page order.
pub fn walk_all(conn: &Connection, sort: &str, limit: u32) -> Vec<Uuid> {
    let limit = limit.to_string();
    let mut ids = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let mut request = params(&[("sort", sort), ("limit", limit.as_str())]);
        request.cursor = cursor.take();
        let (items, next) = paged(conn, &request);
        ids.extend(items.iter().map(|contact| contact.id));
        match next {
            Some(token) => cursor = Some(token),
            None => return ids,
        }
    }
}

pub fn ids(contacts: &[Contact]) -> Vec<Uuid> {
    contacts.iter().map(|contact| contact.id).collect()
}
