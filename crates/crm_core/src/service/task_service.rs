//! Follow-up task service.
//!
//! # Responsibility
//! - Create, update and list tasks.
//! - Mirror task lifecycle events into the contact's activity history.
//!
//! # Invariants
//! - Creating a task logs one `TASK_CREATED` activity.
//! - Moving a task into `DONE` logs one `TASK_COMPLETED` activity; saving an
//!   already-done task logs nothing.

use crate::model::activity::{Activity, ActivityType};
use crate::model::now_epoch_ms;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::service::{ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

pub struct TaskService<T: TaskRepository, A: ActivityRepository> {
    tasks: T,
    activities: A,
}

impl<T: TaskRepository, A: ActivityRepository> TaskService<T, A> {
    pub fn new(tasks: T, activities: A) -> Self {
        Self { tasks, activities }
    }

    pub fn create_task(&self, input: NewTask) -> ServiceResult<Task> {
        let mut task = Task::from_new(input);
        if task.status == TaskStatus::Done {
            task.completed_at = Some(now_epoch_ms());
        }
        let id = self.tasks.create_task(&task)?;
        self.record(&task, ActivityType::TaskCreated, "Task created")?;

        info!(
            "event=task_create module=service status=ok task_status={}",
            task.status.as_str()
        );
        self.tasks
            .get_task(id)?
            .ok_or(ServiceError::InconsistentState(
                "created task missing on read-back",
            ))
    }

    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> ServiceResult<Task> {
        let mut task = self
            .tasks
            .get_task(id)?
            .ok_or_else(|| ServiceError::not_found("task", id))?;
        let was_done = task.status == TaskStatus::Done;

        task.apply_patch(patch, now_epoch_ms());
        self.tasks.update_task(&task)?;

        if !was_done && task.status == TaskStatus::Done {
            self.record(&task, ActivityType::TaskCompleted, "Task completed")?;
            info!("event=task_complete module=service status=ok");
        }

        self.tasks
            .get_task(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated task missing on read-back",
            ))
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Option<Task>> {
        Ok(self.tasks.get_task(id)?)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.list_tasks(query)?)
    }

    fn record(&self, task: &Task, kind: ActivityType, label: &str) -> ServiceResult<()> {
        let now = now_epoch_ms();
        self.activities.create_activity(&Activity {
            id: Uuid::new_v4(),
            contact_id: task.contact_id,
            kind,
            occurred_at: now,
            subject: Some(format!("{label}: {}", task.title)),
            body: None,
            actor_user_id: None,
            created_at: now,
        })?;
        Ok(())
    }
}
