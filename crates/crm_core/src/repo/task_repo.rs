//! Follow-up task persistence.
//!
//! # Invariants
//! - Listing is ordered `created_at DESC, id DESC`.
//! - `take` defaults to 50 and is capped at 100.

use crate::model::contact::ContactId;
use crate::model::now_epoch_ms;
use crate::model::task::{Task, TaskId, TaskPriority, TaskStatus};
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::repo::{ensure_row_exists, parse_enum, parse_optional_uuid, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub const TASK_DEFAULT_TAKE: u32 = 50;
pub const TASK_MAX_TAKE: u32 = 100;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    contact_id,
    title,
    description,
    status,
    priority,
    due_at,
    completed_at,
    assigned_to_user_id,
    created_at,
    updated_at
FROM tasks";

/// Filter and window for task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub contact_id: Option<ContactId>,
    pub status: Option<TaskStatus>,
    pub skip: u32,
    /// `None` means the default window.
    pub take: Option<u32>,
}

impl TaskListQuery {
    pub fn effective_take(&self) -> u32 {
        match self.take {
            Some(0) | None => TASK_DEFAULT_TAKE,
            Some(take) => take.min(TASK_MAX_TAKE),
        }
    }
}

pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        ensure_row_exists(self.conn, "contacts", "contact", task.contact_id)?;
        if let Some(assignee) = task.assigned_to_user_id {
            ensure_row_exists(self.conn, "users", "user", assignee)?;
        }

        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                contact_id,
                title,
                description,
                status,
                priority,
                due_at,
                completed_at,
                assigned_to_user_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10);",
            params![
                task.id.to_string(),
                task.contact_id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.status.as_str(),
                task.priority.as_str(),
                task.due_at,
                task.completed_at,
                task.assigned_to_user_id.map(|id| id.to_string()),
                now,
            ],
        )?;
        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        if let Some(assignee) = task.assigned_to_user_id {
            ensure_row_exists(self.conn, "users", "user", assignee)?;
        }

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?2,
                description = ?3,
                status = ?4,
                priority = ?5,
                due_at = ?6,
                completed_at = ?7,
                assigned_to_user_id = ?8,
                updated_at = ?9
             WHERE id = ?1;",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.status.as_str(),
                task.priority.as_str(),
                task.due_at,
                task.completed_at,
                task.assigned_to_user_id.map(|id| id.to_string()),
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task.id,
            });
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(contact_id) = query.contact_id {
            sql.push_str(" AND contact_id = ?");
            bind_values.push(Value::Text(contact_id.to_string()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(query.effective_take())));
        bind_values.push(Value::Integer(i64::from(query.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: String = row.get(0)?;
    let contact_id: String = row.get(1)?;
    let status: String = row.get(4)?;
    let priority: String = row.get(5)?;
    Ok(Task {
        id: parse_uuid(&id, "tasks.id")?,
        contact_id: parse_uuid(&contact_id, "tasks.contact_id")?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: parse_enum(&status, "tasks.status", TaskStatus::parse)?,
        priority: parse_enum(&priority, "tasks.priority", TaskPriority::parse)?,
        due_at: row.get(6)?,
        completed_at: row.get(7)?,
        assigned_to_user_id: parse_optional_uuid(row.get(8)?, "tasks.assigned_to_user_id")?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{TaskListQuery, TASK_DEFAULT_TAKE, TASK_MAX_TAKE};

    #[test]
    fn take_defaults_and_caps() {
        let mut query = TaskListQuery::default();
        assert_eq!(query.effective_take(), TASK_DEFAULT_TAKE);
        query.take = Some(0);
        assert_eq!(query.effective_take(), TASK_DEFAULT_TAKE);
        query.take = Some(500);
        assert_eq!(query.effective_take(), TASK_MAX_TAKE);
        query.take = Some(7);
        assert_eq!(query.effective_take(), 7);
    }
}
