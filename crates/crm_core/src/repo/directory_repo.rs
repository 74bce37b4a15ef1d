//! Users and organizations.
//!
//! # Responsibility
//! - Persist the lookup records contacts point at.
//!
//! # Invariants
//! - User emails are unique (enforced by the schema).

use crate::model::directory::{Organization, OrganizationId, User, UserId};
use crate::model::now_epoch_ms;
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::repo::{bool_to_int, int_to_bool, parse_uuid};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub trait DirectoryRepository {
    fn create_user(&self, email: &str, display_name: Option<&str>) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn create_organization(&self, name: &str) -> RepoResult<Organization>;
    fn list_organizations(&self) -> RepoResult<Vec<Organization>>;
}

pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_user(&self, email: &str, display_name: Option<&str>) -> RepoResult<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(RepoError::InvalidData("user email is required".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            display_name: display_name
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            is_active: true,
            created_at: now_epoch_ms(),
        };
        self.conn.execute(
            "INSERT INTO users (id, email, display_name, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.display_name.as_deref(),
                bool_to_int(user.is_active),
                user.created_at,
            ],
        )?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, email, display_name, is_active, created_at
                 FROM users
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, email, display_name, is_active, created_at)| {
            Ok(User {
                id: parse_uuid(&id, "users.id")?,
                email,
                display_name,
                is_active: int_to_bool(is_active, "users.is_active")?,
                created_at,
            })
        })
        .transpose()
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, display_name, is_active, created_at
             FROM users
             ORDER BY email ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            users.push(User {
                id: parse_uuid(&id, "users.id")?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                is_active: int_to_bool(row.get(3)?, "users.is_active")?,
                created_at: row.get(4)?,
            });
        }
        Ok(users)
    }

    fn create_organization(&self, name: &str) -> RepoResult<Organization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "organization name is required".to_string(),
            ));
        }

        let organization = Organization {
            id: OrganizationId::new_v4(),
            name: name.to_string(),
        };
        self.conn.execute(
            "INSERT INTO organizations (id, name, created_at) VALUES (?1, ?2, ?3);",
            params![
                organization.id.to_string(),
                organization.name.as_str(),
                now_epoch_ms()
            ],
        )?;
        Ok(organization)
    }

    fn list_organizations(&self) -> RepoResult<Vec<Organization>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM organizations ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            organizations.push(Organization {
                id: parse_uuid(&id, "organizations.id")?,
                name: row.get(1)?,
            });
        }
        Ok(organizations)
    }
}
