//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `contacts` and their `contact_types` tags.
//! - Execute rendered contact queries for the query engine.
//!
//! # Invariants
//! - Tag sets are replaced in the same transaction as the contact row.
//! - `phone_normalized` is persisted exactly as derived by the model.
//! - Query reads are side-effect free.

use crate::db::DbError;
use crate::model::contact::{
    Contact, ContactId, ContactType, ContactValidationError, Stage, VehicleFlag,
};
use crate::model::directory::Organization;
use crate::model::now_epoch_ms;
use crate::model::proposal::ProposalValidationError;
use crate::model::saved_view::SavedViewValidationError;
use crate::model::task::TaskValidationError;
use crate::query::sql::render_contact_query;
use crate::query::ContactQuery;
use crate::repo::{ensure_row_exists, parse_enum, parse_optional_uuid, parse_uuid};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.first_name AS first_name,
    c.last_name AS last_name,
    c.display_name AS display_name,
    c.email AS email,
    c.phone AS phone,
    c.phone_normalized AS phone_normalized,
    c.city AS city,
    c.region AS region,
    c.country AS country,
    c.vehicle AS vehicle,
    c.stage AS stage,
    c.owner_user_id AS owner_user_id,
    c.organization_id AS organization_id,
    o.name AS organization_name,
    c.next_touch_at AS next_touch_at,
    c.last_touch_at AS last_touch_at,
    c.how_we_met AS how_we_met,
    c.notes AS notes,
    c.created_at AS created_at,
    c.updated_at AS updated_at,
    (
        SELECT group_concat(ct.type, ',')
        FROM contact_types ct
        WHERE ct.contact_id = c.id
    ) AS types_csv
FROM contacts c
LEFT JOIN organizations o ON o.id = c.organization_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every CRM repository.
#[derive(Debug)]
pub enum RepoError {
    InvalidContact(ContactValidationError),
    InvalidTask(TaskValidationError),
    InvalidView(SavedViewValidationError),
    InvalidProposal(ProposalValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContact(err) => write!(f, "{err}"),
            Self::InvalidTask(err) => write!(f, "{err}"),
            Self::InvalidView(err) => write!(f, "{err}"),
            Self::InvalidProposal(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidContact(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            Self::InvalidView(err) => Some(err),
            Self::InvalidProposal(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::InvalidContact(value)
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

impl From<SavedViewValidationError> for RepoError {
    fn from(value: SavedViewValidationError) -> Self {
        Self::InvalidView(value)
    }
}

impl From<ProposalValidationError> for RepoError {
    fn from(value: ProposalValidationError) -> Self {
        Self::InvalidProposal(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for contact persistence and listing.
pub trait ContactRepository {
    fn create_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    /// Full replacement of the stored row and its tag set.
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Hard delete; activities, tasks and tags cascade.
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
    /// Runs a rendered query. Returns up to `page_size + 1` rows.
    fn query_contacts(&self, query: &ContactQuery) -> RepoResult<Vec<Contact>>;
    /// Moves `last_touch_at` forward to `touched_at`; never backwards.
    fn advance_last_touch(&self, id: ContactId, touched_at: i64) -> RepoResult<()>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_references(&self, contact: &Contact) -> RepoResult<()> {
        if let Some(owner) = contact.owner_user_id {
            ensure_row_exists(self.conn, "users", "user", owner)?;
        }
        if let Some(organization_id) = contact.organization_id() {
            ensure_row_exists(self.conn, "organizations", "organization", organization_id)?;
        }
        Ok(())
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        contact.validate()?;
        self.ensure_references(contact)?;

        let now = now_epoch_ms();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO contacts (
                id,
                first_name,
                last_name,
                display_name,
                email,
                phone,
                phone_normalized,
                city,
                region,
                country,
                vehicle,
                stage,
                owner_user_id,
                organization_id,
                next_touch_at,
                last_touch_at,
                how_we_met,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19);",
            params![
                contact.id.to_string(),
                contact.first_name.as_deref(),
                contact.last_name.as_deref(),
                contact.display_name.as_deref(),
                contact.email.as_deref(),
                contact.phone.as_deref(),
                contact.phone_normalized.as_deref(),
                contact.city.as_deref(),
                contact.region.as_deref(),
                contact.country.as_deref(),
                contact.vehicle.map(VehicleFlag::as_str),
                contact.stage.as_str(),
                contact.owner_user_id.map(|id| id.to_string()),
                contact.organization_id().map(|id| id.to_string()),
                contact.next_touch_at,
                contact.last_touch_at,
                contact.how_we_met.as_deref(),
                contact.notes.as_deref(),
                now,
            ],
        )?;
        replace_types(&tx, contact.id, &contact.types)?;
        tx.commit()?;

        Ok(contact.id)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;
        self.ensure_references(contact)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE contacts
             SET
                first_name = ?2,
                last_name = ?3,
                display_name = ?4,
                email = ?5,
                phone = ?6,
                phone_normalized = ?7,
                city = ?8,
                region = ?9,
                country = ?10,
                vehicle = ?11,
                stage = ?12,
                owner_user_id = ?13,
                organization_id = ?14,
                next_touch_at = ?15,
                last_touch_at = ?16,
                how_we_met = ?17,
                notes = ?18,
                updated_at = ?19
             WHERE id = ?1;",
            params![
                contact.id.to_string(),
                contact.first_name.as_deref(),
                contact.last_name.as_deref(),
                contact.display_name.as_deref(),
                contact.email.as_deref(),
                contact.phone.as_deref(),
                contact.phone_normalized.as_deref(),
                contact.city.as_deref(),
                contact.region.as_deref(),
                contact.country.as_deref(),
                contact.vehicle.map(VehicleFlag::as_str),
                contact.stage.as_str(),
                contact.owner_user_id.map(|id| id.to_string()),
                contact.organization_id().map(|id| id.to_string()),
                contact.next_touch_at,
                contact.last_touch_at,
                contact.how_we_met.as_deref(),
                contact.notes.as_deref(),
                now_epoch_ms(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "contact",
                id: contact.id,
            });
        }

        replace_types(&tx, contact.id, &contact.types)?;
        tx.commit()?;
        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }
        Ok(None)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "contact",
                id,
            });
        }
        Ok(())
    }

    fn query_contacts(&self, query: &ContactQuery) -> RepoResult<Vec<Contact>> {
        let plan = render_contact_query(query);
        let sql = format!("{CONTACT_SELECT_SQL}{}", plan.clause);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(plan.bind_values))?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn advance_last_touch(&self, id: ContactId, touched_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                last_touch_at = MAX(COALESCE(last_touch_at, ?2), ?2),
                updated_at = ?3
             WHERE id = ?1;",
            params![id.to_string(), touched_at, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "contact",
                id,
            });
        }
        Ok(())
    }
}

fn replace_types(conn: &Connection, id: ContactId, types: &[ContactType]) -> RepoResult<()> {
    let id_text = id.to_string();
    conn.execute(
        "DELETE FROM contact_types WHERE contact_id = ?1;",
        [id_text.as_str()],
    )?;
    for contact_type in types {
        conn.execute(
            "INSERT OR IGNORE INTO contact_types (contact_id, type) VALUES (?1, ?2);",
            params![id_text.as_str(), contact_type.as_str()],
        )?;
    }
    Ok(())
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "contacts.id")?;

    let stage_text: String = row.get("stage")?;
    let stage = parse_enum(&stage_text, "contacts.stage", Stage::parse)?;

    let vehicle = match row.get::<_, Option<String>>("vehicle")? {
        Some(value) => Some(parse_enum(&value, "contacts.vehicle", VehicleFlag::parse)?),
        None => None,
    };

    let organization = match (
        parse_optional_uuid(row.get("organization_id")?, "contacts.organization_id")?,
        row.get::<_, Option<String>>("organization_name")?,
    ) {
        (Some(id), Some(name)) => Some(Organization { id, name }),
        (None, _) => None,
        (Some(id), None) => {
            return Err(RepoError::InvalidData(format!(
                "contact {id_text} references missing organization {id}"
            )));
        }
    };

    let types = match row.get::<_, Option<String>>("types_csv")? {
        Some(csv) => {
            let mut types = csv
                .split(',')
                .map(|value| parse_enum(value, "contact_types.type", ContactType::parse))
                .collect::<RepoResult<Vec<_>>>()?;
            types.sort();
            types
        }
        None => Vec::new(),
    };

    Ok(Contact {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        display_name: row.get("display_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        phone_normalized: row.get("phone_normalized")?,
        city: row.get("city")?,
        region: row.get("region")?,
        country: row.get("country")?,
        types,
        vehicle,
        stage,
        owner_user_id: parse_optional_uuid(row.get("owner_user_id")?, "contacts.owner_user_id")?,
        organization,
        next_touch_at: row.get("next_touch_at")?,
        last_touch_at: row.get("last_touch_at")?,
        how_we_met: row.get("how_we_met")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
