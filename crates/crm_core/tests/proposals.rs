mod common;

use common::seed_named;
use crm_core::db::open_db_in_memory;
use crm_core::model::activity::ActivityType;
use crm_core::model::proposal::{NewProposal, ProposalPatch, ProposalStatus};
use crm_core::repo::activity_repo::SqliteActivityRepository;
use crm_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crm_core::repo::proposal_repo::{ProposalListQuery, SqliteProposalRepository};
use crm_core::service::activity_service::ActivityService;
use crm_core::service::proposal_service::ProposalService;
use crm_core::{ServiceError, SqliteContactRepository};
use rusqlite::Connection;
use uuid::Uuid;

fn proposal_service(
    conn: &Connection,
) -> ProposalService<SqliteProposalRepository<'_>, SqliteActivityRepository<'_>> {
    ProposalService::new(
        SqliteProposalRepository::new(conn),
        SqliteActivityRepository::new(conn),
    )
}

fn status_changes(conn: &Connection, contact_id: Uuid) -> Vec<(String, Option<String>)> {
    let activities = ActivityService::new(
        SqliteActivityRepository::new(conn),
        SqliteContactRepository::new(conn),
    )
    .list_activities(contact_id)
    .unwrap();
    let mut changes = activities
        .into_iter()
        .filter(|activity| activity.kind == ActivityType::StatusChange)
        .map(|activity| (activity.subject.unwrap(), activity.body))
        .collect::<Vec<_>>();
    changes.sort();
    changes
}

#[test]
fn status_history_is_mirrored_into_activities() {
    let conn = open_db_in_memory().unwrap();
    let contact = seed_named(&conn, 1, "Prospect", None);
    let owner = SqliteDirectoryRepository::new(&conn)
        .create_user("owner@example.com", Some("Owner"))
        .unwrap();
    let proposals = proposal_service(&conn);

    let proposal = proposals
        .create_proposal(NewProposal {
            notes: Some("First draft".to_string()),
            owner_user_id: Some(owner.id),
            ..NewProposal::new(contact.id)
        })
        .unwrap();
    assert_eq!(proposal.status, ProposalStatus::Draft);

    let sent = proposals
        .update_proposal(
            proposal.id,
            ProposalPatch {
                status: Some(ProposalStatus::Sent),
                notes: Some("Sent to client".to_string()),
                ..ProposalPatch::default()
            },
        )
        .unwrap();
    assert_eq!(sent.status, ProposalStatus::Sent);
    assert_eq!(sent.notes.as_deref(), Some("Sent to client"));

    // Same status again: no new history entry.
    proposals
        .update_proposal(
            proposal.id,
            ProposalPatch {
                status: Some(ProposalStatus::Sent),
                ..ProposalPatch::default()
            },
        )
        .unwrap();

    assert_eq!(
        status_changes(&conn, contact.id),
        vec![
            (
                "Proposal created with status: DRAFT".to_string(),
                Some("First draft".to_string())
            ),
            (
                "Proposal status changed from DRAFT to SENT".to_string(),
                Some("Sent to client".to_string())
            ),
        ]
    );
}

#[test]
fn listing_reports_window_and_total() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_named(&conn, 1, "First", None);
    let second = seed_named(&conn, 2, "Second", None);
    let proposals = proposal_service(&conn);

    for _ in 0..3 {
        proposals.create_proposal(NewProposal::new(first.id)).unwrap();
    }
    let other = proposals.create_proposal(NewProposal::new(second.id)).unwrap();
    conn.execute_batch("UPDATE proposals SET created_at = 1000 + rowid;")
        .unwrap();

    let page = proposals
        .list_proposals(&ProposalListQuery {
            take: Some(2),
            ..ProposalListQuery::default()
        })
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id, other.id);
    assert_eq!(page.pagination.total, 4);
    assert!(page.pagination.has_more);

    let rest = proposals
        .list_proposals(&ProposalListQuery {
            skip: 2,
            take: Some(2),
            ..ProposalListQuery::default()
        })
        .unwrap();
    assert_eq!(rest.data.len(), 2);
    assert!(!rest.pagination.has_more);

    let for_first = proposals.list_for_contact(first.id).unwrap();
    assert_eq!(for_first.len(), 3);
    assert!(for_first
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[test]
fn invalid_input_and_missing_targets() {
    let conn = open_db_in_memory().unwrap();
    let contact = seed_named(&conn, 1, "Target", None);
    let proposals = proposal_service(&conn);

    let err = proposals
        .create_proposal(NewProposal {
            doc_url: Some("not a url".to_string()),
            ..NewProposal::new(contact.id)
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));

    let err = proposals
        .create_proposal(NewProposal::new(Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "contact", .. }));

    let err = proposals
        .update_proposal(Uuid::new_v4(), ProposalPatch::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "proposal", .. }));

    let proposal = proposals.create_proposal(NewProposal::new(contact.id)).unwrap();
    proposals.delete_proposal(proposal.id).unwrap();
    assert!(matches!(
        proposals.delete_proposal(proposal.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn deleting_contact_removes_its_proposals() {
    let conn = open_db_in_memory().unwrap();
    let contact = seed_named(&conn, 1, "Gone", None);
    let proposals = proposal_service(&conn);
    let proposal = proposals.create_proposal(NewProposal::new(contact.id)).unwrap();

    conn.execute("DELETE FROM contacts WHERE id = ?1;", [contact.id.to_string()])
        .unwrap();
    assert_eq!(proposals.get_proposal(proposal.id).unwrap(), None);
}
