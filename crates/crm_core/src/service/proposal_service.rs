//! Proposal service.
//!
//! # Responsibility
//! - Create, update, list and delete proposals.
//! - Record proposal status history as `STATUS_CHANGE` activities.
//!
//! # Invariants
//! - Creating a proposal logs one activity carrying the initial status.
//! - An update logs one activity only when the status actually changes.

use crate::model::activity::{Activity, ActivityType};
use crate::model::contact::ContactId;
use crate::model::now_epoch_ms;
use crate::model::proposal::{NewProposal, Proposal, ProposalId, ProposalPatch};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::proposal_repo::{ProposalListQuery, ProposalRepository};
use crate::service::{ServiceError, ServiceResult};
use log::info;
use serde::Serialize;
use uuid::Uuid;

/// Window metadata returned with a proposal listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalWindow {
    pub total: u64,
    pub take: u32,
    pub skip: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalPage {
    pub data: Vec<Proposal>,
    pub pagination: ProposalWindow,
}

pub struct ProposalService<P: ProposalRepository, A: ActivityRepository> {
    proposals: P,
    activities: A,
}

impl<P: ProposalRepository, A: ActivityRepository> ProposalService<P, A> {
    pub fn new(proposals: P, activities: A) -> Self {
        Self {
            proposals,
            activities,
        }
    }

    pub fn create_proposal(&self, input: NewProposal) -> ServiceResult<Proposal> {
        let proposal = Proposal::from_new(input);
        let id = self.proposals.create_proposal(&proposal)?;
        self.record(
            &proposal,
            format!("Proposal created with status: {}", proposal.status.as_str()),
            proposal.notes.clone(),
        )?;

        info!(
            "event=proposal_create module=service status=ok proposal_status={}",
            proposal.status.as_str()
        );
        self.proposals
            .get_proposal(id)?
            .ok_or(ServiceError::InconsistentState(
                "created proposal missing on read-back",
            ))
    }

    pub fn update_proposal(
        &self,
        id: ProposalId,
        patch: ProposalPatch,
    ) -> ServiceResult<Proposal> {
        let mut proposal = self
            .proposals
            .get_proposal(id)?
            .ok_or_else(|| ServiceError::not_found("proposal", id))?;
        let previous = proposal.status;
        let notes = patch.notes.clone();

        proposal.apply_patch(patch);
        self.proposals.update_proposal(&proposal)?;

        if proposal.status != previous {
            self.record(
                &proposal,
                format!(
                    "Proposal status changed from {} to {}",
                    previous.as_str(),
                    proposal.status.as_str()
                ),
                notes,
            )?;
            info!(
                "event=proposal_status module=service status=ok from={} to={}",
                previous.as_str(),
                proposal.status.as_str()
            );
        }

        self.proposals
            .get_proposal(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated proposal missing on read-back",
            ))
    }

    pub fn get_proposal(&self, id: ProposalId) -> ServiceResult<Option<Proposal>> {
        Ok(self.proposals.get_proposal(id)?)
    }

    pub fn list_proposals(&self, query: &ProposalListQuery) -> ServiceResult<ProposalPage> {
        let data = self.proposals.list_proposals(query)?;
        let total = self.proposals.count_proposals(query)?;
        let take = query.effective_take();
        Ok(ProposalPage {
            data,
            pagination: ProposalWindow {
                total,
                take,
                skip: query.skip,
                has_more: u64::from(query.skip) + u64::from(take) < total,
            },
        })
    }

    /// Every proposal of one contact, newest first.
    pub fn list_for_contact(&self, contact_id: ContactId) -> ServiceResult<Vec<Proposal>> {
        Ok(self.proposals.list_for_contact(contact_id)?)
    }

    pub fn delete_proposal(&self, id: ProposalId) -> ServiceResult<()> {
        self.proposals.delete_proposal(id)?;
        info!("event=proposal_delete module=service status=ok");
        Ok(())
    }

    fn record(
        &self,
        proposal: &Proposal,
        subject: String,
        body: Option<String>,
    ) -> ServiceResult<()> {
        let now = now_epoch_ms();
        self.activities.create_activity(&Activity {
            id: Uuid::new_v4(),
            contact_id: proposal.contact_id,
            kind: ActivityType::StatusChange,
            occurred_at: now,
            subject: Some(subject),
            body,
            actor_user_id: proposal.owner_user_id,
            created_at: now,
        })?;
        Ok(())
    }
}
