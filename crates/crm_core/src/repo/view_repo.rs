//! Saved view persistence.
//!
//! # Invariants
//! - Every read and write is scoped to the owning user; another user's view
//!   is indistinguishable from a missing one.
//! - Setting a view as default clears the flag on the user's other views in
//!   the same transaction.

use crate::model::directory::UserId;
use crate::model::now_epoch_ms;
use crate::model::saved_view::{SavedView, SavedViewId};
use crate::query::ListContactsParams;
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::repo::{bool_to_int, ensure_row_exists, int_to_bool, parse_uuid};
use rusqlite::{params, Connection, Row};

const VIEW_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    filters_json,
    is_default,
    created_at,
    updated_at
FROM saved_views";

pub trait SavedViewRepository {
    fn create_view(&self, view: &SavedView) -> RepoResult<SavedViewId>;
    fn update_view(&self, view: &SavedView) -> RepoResult<()>;
    fn get_view(&self, user_id: UserId, id: SavedViewId) -> RepoResult<Option<SavedView>>;
    /// Newest first: `created_at DESC, id DESC`.
    fn list_views(&self, user_id: UserId) -> RepoResult<Vec<SavedView>>;
    fn delete_view(&self, user_id: UserId, id: SavedViewId) -> RepoResult<()>;
}

pub struct SqliteSavedViewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSavedViewRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SavedViewRepository for SqliteSavedViewRepository<'_> {
    fn create_view(&self, view: &SavedView) -> RepoResult<SavedViewId> {
        view.validate()?;
        ensure_row_exists(self.conn, "users", "user", view.user_id)?;
        let filters_json = encode_filters(&view.filters)?;

        let now = now_epoch_ms();
        let tx = self.conn.unchecked_transaction()?;
        if view.is_default {
            clear_default(&tx, view.user_id, now)?;
        }
        tx.execute(
            "INSERT INTO saved_views (
                id,
                user_id,
                name,
                filters_json,
                is_default,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                view.id.to_string(),
                view.user_id.to_string(),
                view.name.as_str(),
                filters_json,
                bool_to_int(view.is_default),
                now,
            ],
        )?;
        tx.commit()?;
        Ok(view.id)
    }

    fn update_view(&self, view: &SavedView) -> RepoResult<()> {
        view.validate()?;
        let filters_json = encode_filters(&view.filters)?;

        let now = now_epoch_ms();
        let tx = self.conn.unchecked_transaction()?;
        if view.is_default {
            clear_default(&tx, view.user_id, now)?;
        }
        let changed = tx.execute(
            "UPDATE saved_views
             SET
                name = ?3,
                filters_json = ?4,
                is_default = ?5,
                updated_at = ?6
             WHERE id = ?1 AND user_id = ?2;",
            params![
                view.id.to_string(),
                view.user_id.to_string(),
                view.name.as_str(),
                filters_json,
                bool_to_int(view.is_default),
                now,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "saved view",
                id: view.id,
            });
        }
        tx.commit()?;
        Ok(())
    }

    fn get_view(&self, user_id: UserId, id: SavedViewId) -> RepoResult<Option<SavedView>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VIEW_SELECT_SQL} WHERE id = ?1 AND user_id = ?2;"))?;
        let mut rows = stmt.query(params![id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_view_row(row)?));
        }
        Ok(None)
    }

    fn list_views(&self, user_id: UserId) -> RepoResult<Vec<SavedView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VIEW_SELECT_SQL} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(parse_view_row(row)?);
        }
        Ok(views)
    }

    fn delete_view(&self, user_id: UserId, id: SavedViewId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM saved_views WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "saved view",
                id,
            });
        }
        Ok(())
    }
}

fn clear_default(conn: &Connection, user_id: UserId, now: i64) -> RepoResult<()> {
    conn.execute(
        "UPDATE saved_views
         SET is_default = 0, updated_at = ?2
         WHERE user_id = ?1 AND is_default = 1;",
        params![user_id.to_string(), now],
    )?;
    Ok(())
}

fn encode_filters(filters: &ListContactsParams) -> RepoResult<String> {
    serde_json::to_string(filters)
        .map_err(|err| RepoError::InvalidData(format!("unserializable view filters: {err}")))
}

fn parse_view_row(row: &Row<'_>) -> RepoResult<SavedView> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let filters_json: String = row.get(3)?;
    let filters = serde_json::from_str::<ListContactsParams>(&filters_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid saved_views.filters_json for {id}: {err}"))
    })?;
    Ok(SavedView {
        id: parse_uuid(&id, "saved_views.id")?,
        user_id: parse_uuid(&user_id, "saved_views.user_id")?,
        name: row.get(2)?,
        filters,
        is_default: int_to_bool(row.get(4)?, "saved_views.is_default")?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
