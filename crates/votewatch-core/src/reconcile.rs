//! Reconciliation of the remote proposal list against the persisted state.
//!
//! Everything here is a pure function over borrowed data: no I/O, no clock,
//! and inputs are never mutated.
//!
//! # Ordering
//!
//! The remote list must be oldest-first. The resulting state keeps surviving
//! records in their stored order and appends new records in remote order, so
//! repeated runs over the same inputs produce byte-identical documents.

use std::collections::HashSet;

use thiserror::Error;

use crate::RecordPolicy;
use crate::proposal::{ProposalId, ProposalRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("empty proposal id in {0}")]
    EmptyId(&'static str),

    #[error("duplicate proposal id {id} in {source_name}")]
    DuplicateId {
        id: ProposalId,
        source_name: &'static str,
    },
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Remote ids not present in the stored state, in remote order.
    pub to_notify: Vec<ProposalId>,
    /// Surviving stored records followed by one new record per `to_notify` id.
    pub next_state: Vec<ProposalRecord>,
}

impl Reconciliation {
    /// Number of stored records dropped because their proposal left the remote set.
    pub fn dropped(&self, stored_len: usize) -> usize {
        let kept = self.next_state.len() - self.to_notify.len();
        stored_len.saturating_sub(kept)
    }
}

/// Diff `remote_ids` (oldest-first) against `stored`.
pub fn reconcile(
    remote_ids: &[ProposalId],
    stored: &[ProposalRecord],
    policy: RecordPolicy,
) -> Result<Reconciliation, InvalidInput> {
    let remote = unique_ids(remote_ids.iter(), "remote proposals")?;
    let known = unique_ids(stored.iter().map(|r| &r.proposal), "stored state")?;

    let to_notify: Vec<ProposalId> = remote_ids
        .iter()
        .filter(|id| !known.contains(id))
        .cloned()
        .collect();

    let mut next_state: Vec<ProposalRecord> = stored
        .iter()
        .filter(|r| remote.contains(&r.proposal))
        .cloned()
        .collect();
    next_state.extend(to_notify.iter().cloned().map(|id| policy.new_record(id)));

    Ok(Reconciliation {
        to_notify,
        next_state,
    })
}

/// True iff any record lacks a non-empty lifecycle marker.
pub fn has_unstarted_proposals(records: &[ProposalRecord]) -> bool {
    records.iter().any(ProposalRecord::is_unstarted)
}

/// Ids of the records that [`has_unstarted_proposals`] would count, in record order.
pub fn unstarted_ids(records: &[ProposalRecord]) -> Vec<ProposalId> {
    records
        .iter()
        .filter(|r| r.is_unstarted())
        .map(|r| r.proposal.clone())
        .collect()
}

/// Ids of records carrying no lifecycle marker at all, as written under the plain policy.
///
/// A lifecycle pass treats these as unstarted and notifies them again.
pub fn unmarked_ids(records: &[ProposalRecord]) -> Vec<ProposalId> {
    records
        .iter()
        .filter(|r| r.started_at.is_none())
        .map(|r| r.proposal.clone())
        .collect()
}

/// Return a copy of `records` with `started_at = at` on every record whose id is in `ids`.
pub fn mark_started(
    records: &[ProposalRecord],
    ids: &[ProposalId],
    at: &str,
) -> Vec<ProposalRecord> {
    let started: HashSet<&ProposalId> = ids.iter().collect();
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if started.contains(&r.proposal) {
                r.started_at = Some(at.to_string());
            }
            r
        })
        .collect()
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a ProposalId>,
    source_name: &'static str,
) -> Result<HashSet<&'a ProposalId>, InvalidInput> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.as_str().is_empty() {
            return Err(InvalidInput::EmptyId(source_name));
        }
        if !seen.insert(id) {
            return Err(InvalidInput::DuplicateId {
                id: id.clone(),
                source_name,
            });
        }
    }
    Ok(seen)
}
