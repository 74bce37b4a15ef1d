//! Activity history persistence.

use crate::model::activity::{Activity, ActivityType};
use crate::model::contact::ContactId;
use crate::repo::contact_repo::RepoResult;
use crate::repo::{ensure_row_exists, parse_enum, parse_optional_uuid, parse_uuid};
use rusqlite::{params, Connection, Row};

pub trait ActivityRepository {
    fn create_activity(&self, activity: &Activity) -> RepoResult<()>;
    /// Newest first: `occurred_at DESC, id DESC`.
    fn list_for_contact(&self, contact_id: ContactId, limit: u32) -> RepoResult<Vec<Activity>>;
}

pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, activity: &Activity) -> RepoResult<()> {
        ensure_row_exists(self.conn, "contacts", "contact", activity.contact_id)?;
        if let Some(actor) = activity.actor_user_id {
            ensure_row_exists(self.conn, "users", "user", actor)?;
        }

        self.conn.execute(
            "INSERT INTO activities (
                id,
                contact_id,
                type,
                occurred_at,
                subject,
                body,
                actor_user_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                activity.id.to_string(),
                activity.contact_id.to_string(),
                activity.kind.as_str(),
                activity.occurred_at,
                activity.subject.as_deref(),
                activity.body.as_deref(),
                activity.actor_user_id.map(|id| id.to_string()),
                activity.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_for_contact(&self, contact_id: ContactId, limit: u32) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, type, occurred_at, subject, body, actor_user_id, created_at
             FROM activities
             WHERE contact_id = ?1
             ORDER BY occurred_at DESC, id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![contact_id.to_string(), i64::from(limit)])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let id: String = row.get(0)?;
    let contact_id: String = row.get(1)?;
    let kind: String = row.get(2)?;
    Ok(Activity {
        id: parse_uuid(&id, "activities.id")?,
        contact_id: parse_uuid(&contact_id, "activities.contact_id")?,
        kind: parse_enum(&kind, "activities.type", ActivityType::parse)?,
        occurred_at: row.get(3)?,
        subject: row.get(4)?,
        body: row.get(5)?,
        actor_user_id: parse_optional_uuid(row.get(6)?, "activities.actor_user_id")?,
        created_at: row.get(7)?,
    })
}
