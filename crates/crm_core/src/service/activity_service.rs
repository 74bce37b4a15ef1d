//! Activity logging service.
//!
//! # Invariants
//! - Touch-point activities move the contact's `last_touch_at` forward to
//!   the activity time, never backwards.
//! - Other activity types leave `last_touch_at` untouched.

use crate::model::activity::{Activity, NewActivity};
use crate::model::contact::ContactId;
use crate::model::now_epoch_ms;
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::contact_repo::ContactRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

pub const ACTIVITY_LIST_LIMIT: u32 = 50;

pub struct ActivityService<A: ActivityRepository, C: ContactRepository> {
    activities: A,
    contacts: C,
}

impl<A: ActivityRepository, C: ContactRepository> ActivityService<A, C> {
    pub fn new(activities: A, contacts: C) -> Self {
        Self {
            activities,
            contacts,
        }
    }

    /// Records an activity. Missing `occurred_at` means now.
    pub fn log_activity(&self, input: NewActivity) -> ServiceResult<Activity> {
        if self.contacts.get_contact(input.contact_id)?.is_none() {
            return Err(ServiceError::not_found("contact", input.contact_id));
        }

        let now = now_epoch_ms();
        let activity = Activity {
            id: Uuid::new_v4(),
            contact_id: input.contact_id,
            kind: input.kind,
            occurred_at: input.occurred_at.unwrap_or(now),
            subject: clean(input.subject),
            body: clean(input.body),
            actor_user_id: input.actor_user_id,
            created_at: now,
        };
        self.activities.create_activity(&activity)?;

        if activity.kind.is_touch_point() {
            self.contacts
                .advance_last_touch(activity.contact_id, activity.occurred_at)?;
        }

        info!(
            "event=activity_log module=service status=ok type={} touch={}",
            activity.kind.as_str(),
            activity.kind.is_touch_point()
        );
        Ok(activity)
    }

    /// Newest activities of a contact, capped at [`ACTIVITY_LIST_LIMIT`].
    pub fn list_activities(&self, contact_id: ContactId) -> ServiceResult<Vec<Activity>> {
        Ok(self
            .activities
            .list_for_contact(contact_id, ACTIVITY_LIST_LIMIT)?)
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
