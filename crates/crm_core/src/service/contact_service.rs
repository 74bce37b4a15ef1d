//! Contact use-case service.
//!
//! # Responsibility
//! - Provide contact create/update/get/delete entry points.
//! - Turn a typed [`ContactQuery`] into a [`ContactPage`].
//!
//! # Invariants
//! - A page holds at most `page_size` contacts.
//! - `next_cursor` is present only in cursor mode and only when more rows
//!   exist after the last returned contact.

use crate::model::contact::{Contact, ContactId, ContactPatch, NewContact};
use crate::query::{ContactCursor, ContactPage, ContactQuery};
use crate::repo::contact_repo::ContactRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Contact service facade over a repository implementation.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a contact and returns the stored record.
    pub fn create_contact(&self, input: NewContact) -> ServiceResult<Contact> {
        let contact = Contact::from_new(input);
        let id = self.repo.create_contact(&contact)?;
        self.repo
            .get_contact(id)?
            .ok_or(ServiceError::InconsistentState(
                "created contact missing on read-back",
            ))
    }

    /// Applies a partial update. Absent fields keep their stored value.
    pub fn update_contact(&self, id: ContactId, patch: ContactPatch) -> ServiceResult<Contact> {
        let mut contact = self
            .repo
            .get_contact(id)?
            .ok_or_else(|| ServiceError::not_found("contact", id))?;
        contact.apply_patch(patch);
        self.repo.update_contact(&contact)?;
        self.repo
            .get_contact(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated contact missing on read-back",
            ))
    }

    pub fn get_contact(&self, id: ContactId) -> ServiceResult<Option<Contact>> {
        Ok(self.repo.get_contact(id)?)
    }

    pub fn delete_contact(&self, id: ContactId) -> ServiceResult<()> {
        self.repo.delete_contact(id)?;
        Ok(())
    }

    /// Executes one page of a contact listing.
    pub fn list_contacts(&self, query: &ContactQuery) -> ServiceResult<ContactPage> {
        let page_size = query.pagination.page_size() as usize;
        let mut items = self.repo.query_contacts(query)?;

        let has_more = items.len() > page_size;
        items.truncate(page_size);

        let next_cursor = match items.last() {
            Some(last) if has_more && query.pagination.is_cursor_mode() => {
                Some(ContactCursor::from_contact(last, query.sort).encode())
            }
            _ => None,
        };

        info!(
            "event=contacts_list module=service status=ok mode={} sort={} returned={} has_more={}",
            if query.pagination.is_cursor_mode() {
                "cursor"
            } else {
                "offset"
            },
            query.sort,
            items.len(),
            has_more
        );

        Ok(ContactPage { items, next_cursor })
    }
}
