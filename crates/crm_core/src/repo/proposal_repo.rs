//! Proposal persistence.
//!
//! # Invariants
//! - Listing is ordered `created_at DESC, id DESC`.
//! - `take` defaults to 50 and is capped at 100; `count_proposals` applies
//!   the same filter as `list_proposals` without the window.
//! - `list_for_contact` is not windowed.

use crate::model::contact::ContactId;
use crate::model::now_epoch_ms;
use crate::model::proposal::{Proposal, ProposalId, ProposalStatus};
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::repo::{ensure_row_exists, parse_enum, parse_optional_uuid, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub const PROPOSAL_DEFAULT_TAKE: u32 = 50;
pub const PROPOSAL_MAX_TAKE: u32 = 100;

const PROPOSAL_SELECT_SQL: &str = "SELECT
    id,
    contact_id,
    status,
    doc_url,
    notes,
    owner_user_id,
    created_at,
    updated_at
FROM proposals";

/// Filter and window for proposal listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalListQuery {
    pub contact_id: Option<ContactId>,
    pub skip: u32,
    /// `None` means the default window.
    pub take: Option<u32>,
}

impl ProposalListQuery {
    pub fn effective_take(&self) -> u32 {
        match self.take {
            Some(0) | None => PROPOSAL_DEFAULT_TAKE,
            Some(take) => take.min(PROPOSAL_MAX_TAKE),
        }
    }

    fn push_filter(&self, sql: &mut String, bind_values: &mut Vec<Value>) {
        if let Some(contact_id) = self.contact_id {
            sql.push_str(" AND contact_id = ?");
            bind_values.push(Value::Text(contact_id.to_string()));
        }
    }
}

pub trait ProposalRepository {
    fn create_proposal(&self, proposal: &Proposal) -> RepoResult<ProposalId>;
    fn update_proposal(&self, proposal: &Proposal) -> RepoResult<()>;
    fn get_proposal(&self, id: ProposalId) -> RepoResult<Option<Proposal>>;
    fn list_proposals(&self, query: &ProposalListQuery) -> RepoResult<Vec<Proposal>>;
    fn count_proposals(&self, query: &ProposalListQuery) -> RepoResult<u64>;
    /// Unwindowed listing for one contact.
    fn list_for_contact(&self, contact_id: ContactId) -> RepoResult<Vec<Proposal>>;
    fn delete_proposal(&self, id: ProposalId) -> RepoResult<()>;
}

pub struct SqliteProposalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProposalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProposalRepository for SqliteProposalRepository<'_> {
    fn create_proposal(&self, proposal: &Proposal) -> RepoResult<ProposalId> {
        proposal.validate()?;
        ensure_row_exists(self.conn, "contacts", "contact", proposal.contact_id)?;
        if let Some(owner) = proposal.owner_user_id {
            ensure_row_exists(self.conn, "users", "user", owner)?;
        }

        self.conn.execute(
            "INSERT INTO proposals (
                id,
                contact_id,
                status,
                doc_url,
                notes,
                owner_user_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                proposal.id.to_string(),
                proposal.contact_id.to_string(),
                proposal.status.as_str(),
                proposal.doc_url.as_deref(),
                proposal.notes.as_deref(),
                proposal.owner_user_id.map(|id| id.to_string()),
                now_epoch_ms(),
            ],
        )?;
        Ok(proposal.id)
    }

    fn update_proposal(&self, proposal: &Proposal) -> RepoResult<()> {
        proposal.validate()?;
        if let Some(owner) = proposal.owner_user_id {
            ensure_row_exists(self.conn, "users", "user", owner)?;
        }

        let changed = self.conn.execute(
            "UPDATE proposals
             SET
                status = ?2,
                doc_url = ?3,
                notes = ?4,
                owner_user_id = ?5,
                updated_at = ?6
             WHERE id = ?1;",
            params![
                proposal.id.to_string(),
                proposal.status.as_str(),
                proposal.doc_url.as_deref(),
                proposal.notes.as_deref(),
                proposal.owner_user_id.map(|id| id.to_string()),
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "proposal",
                id: proposal.id,
            });
        }
        Ok(())
    }

    fn get_proposal(&self, id: ProposalId) -> RepoResult<Option<Proposal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROPOSAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_proposal_row(row)?));
        }
        Ok(None)
    }

    fn list_proposals(&self, query: &ProposalListQuery) -> RepoResult<Vec<Proposal>> {
        let mut sql = format!("{PROPOSAL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        query.push_filter(&mut sql, &mut bind_values);

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(query.effective_take())));
        bind_values.push(Value::Integer(i64::from(query.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut proposals = Vec::new();
        while let Some(row) = rows.next()? {
            proposals.push(parse_proposal_row(row)?);
        }
        Ok(proposals)
    }

    fn count_proposals(&self, query: &ProposalListQuery) -> RepoResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM proposals WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        query.push_filter(&mut sql, &mut bind_values);

        let total: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative proposal count {total}")))
    }

    fn list_for_contact(&self, contact_id: ContactId) -> RepoResult<Vec<Proposal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROPOSAL_SELECT_SQL} WHERE contact_id = ?1 ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([contact_id.to_string()])?;
        let mut proposals = Vec::new();
        while let Some(row) = rows.next()? {
            proposals.push(parse_proposal_row(row)?);
        }
        Ok(proposals)
    }

    fn delete_proposal(&self, id: ProposalId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM proposals WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "proposal",
                id,
            });
        }
        Ok(())
    }
}

fn parse_proposal_row(row: &Row<'_>) -> RepoResult<Proposal> {
    let id: String = row.get(0)?;
    let contact_id: String = row.get(1)?;
    let status: String = row.get(2)?;
    Ok(Proposal {
        id: parse_uuid(&id, "proposals.id")?,
        contact_id: parse_uuid(&contact_id, "proposals.contact_id")?,
        status: parse_enum(&status, "proposals.status", ProposalStatus::parse)?,
        doc_url: row.get(3)?,
        notes: row.get(4)?,
        owner_user_id: parse_optional_uuid(row.get(5)?, "proposals.owner_user_id")?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{ProposalListQuery, PROPOSAL_DEFAULT_TAKE, PROPOSAL_MAX_TAKE};

    #[test]
    fn take_defaults_and_caps() {
        let mut query = ProposalListQuery::default();
        assert_eq!(query.effective_take(), PROPOSAL_DEFAULT_TAKE);
        query.take = Some(250);
        assert_eq!(query.effective_take(), PROPOSAL_MAX_TAKE);
        query.take = Some(3);
        assert_eq!(query.effective_take(), 3);
    }
}
