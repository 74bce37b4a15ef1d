//! Transport-neutral handler boundary.
//!
//! # Responsibility
//! - Expose one function per CRM endpoint over a borrowed connection.
//! - Choose the response shape and map failures to status plus public
//!   message.
//!
//! # Invariants
//! - Store failures are logged with their cause and surfaced with a generic
//!   message only.
//! - Contact listing answers a bare array unless the caller sent `limit`.

use crate::model::activity::{Activity, NewActivity};
use crate::model::contact::{Contact, ContactPatch, NewContact};
use crate::model::directory::{UserId, UserSummary};
use crate::model::proposal::{NewProposal, Proposal, ProposalPatch};
use crate::model::saved_view::{NewSavedView, SavedView, SavedViewPatch};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::query::ListContactsParams;
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::repo::contact_repo::SqliteContactRepository;
use crate::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crate::repo::proposal_repo::{ProposalListQuery, SqliteProposalRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TASK_DEFAULT_TAKE};
use crate::repo::view_repo::SqliteSavedViewRepository;
use crate::service::activity_service::ActivityService;
use crate::service::contact_service::ContactService;
use crate::service::proposal_service::{ProposalPage, ProposalService};
use crate::service::task_service::TaskService;
use crate::service::view_service::SavedViewService;
use crate::service::ServiceError;
use log::error;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure returned to clients. Serializes as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl Error for ApiError {}

/// Contact list payload; the variant is chosen once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContactListResponse {
    /// Offset mode: bare JSON array.
    Legacy(Vec<Contact>),
    /// Cursor mode: `{items, nextCursor}`.
    Paged {
        items: Vec<Contact>,
        #[serde(rename = "nextCursor")]
        next_cursor: Option<String>,
    },
}

impl ContactListResponse {
    pub fn items(&self) -> &[Contact] {
        match self {
            Self::Legacy(items) => items,
            Self::Paged { items, .. } => items,
        }
    }
}

/// Contact with its owner and recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetail {
    #[serde(flatten)]
    pub contact: Contact,
    pub owner: Option<UserSummary>,
    pub activities: Vec<Activity>,
    pub tasks: Vec<Task>,
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

const DELETED: DeleteResponse = DeleteResponse { success: true };

/// Parses a JSON request body; malformed input is a 400.
pub fn parse_body<T: DeserializeOwned>(raw: &str) -> ApiResult<T> {
    serde_json::from_str(raw)
        .map_err(|err| ApiError::bad_request(format!("Invalid request body: {err}")))
}

pub fn list_contacts(
    conn: &Connection,
    params: &ListContactsParams,
) -> ApiResult<ContactListResponse> {
    let query = params.to_query();
    let page = contact_service(conn)
        .list_contacts(&query)
        .map_err(|err| map_error("list_contacts", err, "Failed to fetch contacts"))?;

    if params.wants_cursor_mode() {
        Ok(ContactListResponse::Paged {
            items: page.items,
            next_cursor: page.next_cursor,
        })
    } else {
        Ok(ContactListResponse::Legacy(page.items))
    }
}

pub fn get_contact(conn: &Connection, id: &str) -> ApiResult<ContactDetail> {
    const FAILURE: &str = "Failed to fetch contact";
    let id = parse_path_id(id, "Contact")?;
    let contact = contact_service(conn)
        .get_contact(id)
        .map_err(|err| map_error("get_contact", err, FAILURE))?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    let activities = activity_service(conn)
        .list_activities(id)
        .map_err(|err| map_error("get_contact", err, FAILURE))?;
    let tasks = task_service(conn)
        .list_tasks(&TaskListQuery {
            contact_id: Some(id),
            take: Some(TASK_DEFAULT_TAKE),
            ..TaskListQuery::default()
        })
        .map_err(|err| map_error("get_contact", err, FAILURE))?;
    let proposals = proposal_service(conn)
        .list_for_contact(id)
        .map_err(|err| map_error("get_contact", err, FAILURE))?;
    let owner = match contact.owner_user_id {
        Some(owner_id) => SqliteDirectoryRepository::new(conn)
            .get_user(owner_id)
            .map_err(|err| map_error("get_contact", err.into(), FAILURE))?
            .map(UserSummary::from),
        None => None,
    };

    Ok(ContactDetail {
        contact,
        owner,
        activities,
        tasks,
        proposals,
    })
}

pub fn create_contact(conn: &Connection, input: NewContact) -> ApiResult<Contact> {
    contact_service(conn)
        .create_contact(input)
        .map_err(|err| map_error("create_contact", err, "Failed to create contact"))
}

pub fn update_contact(conn: &Connection, id: &str, patch: ContactPatch) -> ApiResult<Contact> {
    let id = parse_path_id(id, "Contact")?;
    contact_service(conn)
        .update_contact(id, patch)
        .map_err(|err| map_error("update_contact", err, "Failed to update contact"))
}

pub fn delete_contact(conn: &Connection, id: &str) -> ApiResult<DeleteResponse> {
    let id = parse_path_id(id, "Contact")?;
    contact_service(conn)
        .delete_contact(id)
        .map_err(|err| map_error("delete_contact", err, "Failed to delete contact"))?;
    Ok(DELETED)
}

pub fn list_activities(conn: &Connection, contact_id: Option<&str>) -> ApiResult<Vec<Activity>> {
    let contact_id = contact_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("contactId is required"))?;
    let contact_id = Uuid::parse_str(contact_id)
        .map_err(|_| ApiError::bad_request("contactId is not a valid id"))?;
    activity_service(conn)
        .list_activities(contact_id)
        .map_err(|err| map_error("list_activities", err, "Failed to fetch activities"))
}

pub fn create_activity(conn: &Connection, input: NewActivity) -> ApiResult<Activity> {
    activity_service(conn)
        .log_activity(input)
        .map_err(|err| map_error("create_activity", err, "Failed to create activity"))
}

pub fn list_tasks(conn: &Connection, query: &TaskListQuery) -> ApiResult<Vec<Task>> {
    task_service(conn)
        .list_tasks(query)
        .map_err(|err| map_error("list_tasks", err, "Failed to fetch tasks"))
}

pub fn create_task(conn: &Connection, input: NewTask) -> ApiResult<Task> {
    task_service(conn)
        .create_task(input)
        .map_err(|err| map_error("create_task", err, "Failed to create task"))
}

pub fn update_task(conn: &Connection, id: &str, patch: TaskPatch) -> ApiResult<Task> {
    let id = parse_path_id(id, "Task")?;
    task_service(conn)
        .update_task(id, patch)
        .map_err(|err| map_error("update_task", err, "Failed to update task"))
}

pub fn list_views(conn: &Connection, user_id: UserId) -> ApiResult<Vec<SavedView>> {
    view_service(conn)
        .list_views(user_id)
        .map_err(|err| map_error("list_views", err, "Failed to fetch views"))
}

pub fn create_view(
    conn: &Connection,
    user_id: UserId,
    input: NewSavedView,
) -> ApiResult<SavedView> {
    view_service(conn)
        .create_view(user_id, input)
        .map_err(|err| map_error("create_view", err, "Failed to create view"))
}

pub fn update_view(
    conn: &Connection,
    user_id: UserId,
    id: &str,
    patch: SavedViewPatch,
) -> ApiResult<SavedView> {
    let id = parse_path_id(id, "View")?;
    view_service(conn)
        .update_view(user_id, id, patch)
        .map_err(|err| map_error("update_view", err, "Failed to update view"))
}

pub fn delete_view(conn: &Connection, user_id: UserId, id: &str) -> ApiResult<DeleteResponse> {
    let id = parse_path_id(id, "View")?;
    view_service(conn)
        .delete_view(user_id, id)
        .map_err(|err| map_error("delete_view", err, "Failed to delete view"))?;
    Ok(DELETED)
}

pub fn list_proposals(conn: &Connection, query: &ProposalListQuery) -> ApiResult<ProposalPage> {
    proposal_service(conn)
        .list_proposals(query)
        .map_err(|err| map_error("list_proposals", err, "Internal server error"))
}

pub fn get_proposal(conn: &Connection, id: &str) -> ApiResult<Proposal> {
    let id = parse_path_id(id, "Proposal")?;
    proposal_service(conn)
        .get_proposal(id)
        .map_err(|err| map_error("get_proposal", err, "Internal server error"))?
        .ok_or_else(|| ApiError::not_found("Proposal not found"))
}

pub fn create_proposal(conn: &Connection, input: NewProposal) -> ApiResult<Proposal> {
    proposal_service(conn)
        .create_proposal(input)
        .map_err(|err| map_error("create_proposal", err, "Internal server error"))
}

pub fn update_proposal(conn: &Connection, id: &str, patch: ProposalPatch) -> ApiResult<Proposal> {
    let id = parse_path_id(id, "Proposal")?;
    proposal_service(conn)
        .update_proposal(id, patch)
        .map_err(|err| map_error("update_proposal", err, "Internal server error"))
}

pub fn delete_proposal(conn: &Connection, id: &str) -> ApiResult<DeleteResponse> {
    let id = parse_path_id(id, "Proposal")?;
    proposal_service(conn)
        .delete_proposal(id)
        .map_err(|err| map_error("delete_proposal", err, "Internal server error"))?;
    Ok(DELETED)
}

fn contact_service(conn: &Connection) -> ContactService<SqliteContactRepository<'_>> {
    ContactService::new(SqliteContactRepository::new(conn))
}

fn activity_service(
    conn: &Connection,
) -> ActivityService<SqliteActivityRepository<'_>, SqliteContactRepository<'_>> {
    ActivityService::new(
        SqliteActivityRepository::new(conn),
        SqliteContactRepository::new(conn),
    )
}

fn task_service(
    conn: &Connection,
) -> TaskService<SqliteTaskRepository<'_>, SqliteActivityRepository<'_>> {
    TaskService::new(
        SqliteTaskRepository::new(conn),
        SqliteActivityRepository::new(conn),
    )
}

fn proposal_service(
    conn: &Connection,
) -> ProposalService<SqliteProposalRepository<'_>, SqliteActivityRepository<'_>> {
    ProposalService::new(
        SqliteProposalRepository::new(conn),
        SqliteActivityRepository::new(conn),
    )
}

fn view_service(conn: &Connection) -> SavedViewService<SqliteSavedViewRepository<'_>> {
    SavedViewService::new(SqliteSavedViewRepository::new(conn))
}

/// An id that cannot exist resolves like a missing record.
fn parse_path_id(raw: &str, entity: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(format!("{entity} not found")))
}

fn map_error(operation: &str, err: ServiceError, failure_message: &str) -> ApiError {
    match err {
        ServiceError::NotFound { entity, .. } => {
            ApiError::not_found(format!("{} not found", capitalize(entity)))
        }
        ServiceError::Invalid(message) => ApiError::bad_request(message),
        other => {
            error!(
                "event=api_request module=api status=error operation={} error={}",
                operation, other
            );
            ApiError::internal(failure_message)
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, ApiError, ContactListResponse};
    use serde_json::json;

    #[test]
    fn error_body_carries_message_only() {
        let err = ApiError::internal("Failed to fetch contacts");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "error": "Failed to fetch contacts" })
        );
    }

    #[test]
    fn list_shapes_serialize_as_array_or_object() {
        assert_eq!(
            serde_json::to_value(ContactListResponse::Legacy(Vec::new())).unwrap(),
            json!([])
        );
        assert_eq!(
            serde_json::to_value(ContactListResponse::Paged {
                items: Vec::new(),
                next_cursor: None,
            })
            .unwrap(),
            json!({ "items": [], "nextCursor": null })
        );
    }

    #[test]
    fn entity_names_are_capitalized() {
        assert_eq!(capitalize("saved view"), "Saved view");
        assert_eq!(capitalize(""), "");
    }
}
