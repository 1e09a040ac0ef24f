//! Run orchestrator: one invocation of the proposal notifier.
//!
//! fetch → read state → reconcile → notify → persist, strictly in sequence.
//! Every collaborator failure is logged here with the operation name and then
//! returned as a [`RunError`]; deciding the process exit status is left to the
//! caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use votewatch_core::{
    Config, InvalidInput, ProposalId, ProposalRecord, RecordPolicy, StateDocument, mark_started,
    reconcile, unmarked_ids, unstarted_ids,
};
use votewatch_notify::{Notifier, NotifyError};
use votewatch_store::{SecretError, StateStore, StoreError};
use votewatch_sync::{FetchError, ProposalFilter, ProposalSource, oldest_first};

pub const NO_PROPOSALS: &str = "No accepting votes proposals found";
pub const NO_NEW_PROPOSALS: &str = "Success: No new proposals found";
pub const PROPOSALS_RUN: &str = "Success: New proposal(s) were run";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetching proposals failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("reading state failed: {0}")]
    StoreRead(#[source] StoreError),

    #[error("writing state failed: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("loading mail credentials failed: {0}")]
    Secret(#[from] SecretError),

    #[error("sending notifications failed: {0}")]
    Notify(#[source] NotifyError),

    #[error("inconsistent proposal data: {0}")]
    InvalidInput(#[from] InvalidInput),
}

impl From<NotifyError> for RunError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::Secret(s) => Self::Secret(s),
            other => Self::Notify(other),
        }
    }
}

/// Structured result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl RunOutcome {
    fn ok(body: &str) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }
}

/// What a run would do, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Remote ids, oldest-first.
    pub remote: Vec<ProposalId>,
    pub to_notify: Vec<ProposalId>,
    /// Unstarted ids a lifecycle run would (re)send. Empty under the plain policy.
    pub pending: Vec<ProposalId>,
    pub dropped: Vec<ProposalId>,
    pub next_state: StateDocument,
}

pub struct Runner {
    source: Box<dyn ProposalSource>,
    store: Box<dyn StateStore>,
    notifier: Box<dyn Notifier>,
    filter: ProposalFilter,
    policy: RecordPolicy,
    clock: fn() -> DateTime<Utc>,
}

impl Runner {
    pub fn new(
        config: &Config,
        source: Box<dyn ProposalSource>,
        store: Box<dyn StateStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            filter: ProposalFilter::from(&config.source),
            policy: config.record_policy,
            clock: Utc::now,
        }
    }

    /// Replace the clock used for `started_at` stamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute one run.
    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let remote = self.fetch().await?;
        if remote.is_empty() {
            info!("no proposals accepting votes");
            return Ok(RunOutcome::ok(NO_PROPOSALS));
        }

        let stored = self.read_state().await?;
        let rec = reconcile(&remote, &stored, self.policy)
            .inspect_err(|e| error!(operation = "reconcile", error = %e, "rejected input"))?;
        info!(
            remote = remote.len(),
            stored = stored.len(),
            new = rec.to_notify.len(),
            dropped = rec.dropped(stored.len()),
            "reconciled proposals"
        );

        match self.policy {
            RecordPolicy::Plain => {
                if rec.to_notify.is_empty() {
                    return Ok(RunOutcome::ok(NO_NEW_PROPOSALS));
                }
                self.notifier.notify(&rec.to_notify).await.map_err(|e| {
                    error!(operation = "notify", proposals = ?rec.to_notify, error = %e, "notification failed");
                    RunError::from(e)
                })?;
                info!(proposals = ?rec.to_notify, "notifications sent");
                self.write_state(&rec.next_state).await?;
            }
            RecordPolicy::Lifecycle => {
                let pending = unstarted_ids(&rec.next_state);
                if pending.is_empty() {
                    return Ok(RunOutcome::ok(NO_NEW_PROPOSALS));
                }
                let unmarked = unmarked_ids(&rec.next_state);
                if !unmarked.is_empty() {
                    warn!(
                        proposals = ?unmarked,
                        "records without started_at (written by the plain policy) will be notified again"
                    );
                }
                if pending.len() > rec.to_notify.len() {
                    info!(
                        retrying = pending.len() - rec.to_notify.len(),
                        "found proposals whose notification never completed"
                    );
                }
                let (delivered, failure) = self.send_each(&pending).await;
                let started_at = (self.clock)().to_rfc3339();
                let next = mark_started(&rec.next_state, &delivered, &started_at);
                self.write_state(&next).await?;
                if let Some(e) = failure {
                    return Err(e.into());
                }
            }
        }

        Ok(RunOutcome::ok(PROPOSALS_RUN))
    }

    /// Fetch, read and reconcile without notifying or writing.
    pub async fn preview(&self) -> Result<Preview, RunError> {
        let remote = self.fetch().await?;
        let stored = if remote.is_empty() {
            Vec::new()
        } else {
            self.read_state().await?
        };
        let rec = reconcile(&remote, &stored, self.policy)?;
        let pending = match self.policy {
            RecordPolicy::Plain => Vec::new(),
            RecordPolicy::Lifecycle => unstarted_ids(&rec.next_state),
        };
        let dropped = stored
            .iter()
            .filter(|r| !remote.contains(&r.proposal))
            .map(|r| r.proposal.clone())
            .collect();
        Ok(Preview {
            remote,
            to_notify: rec.to_notify,
            pending,
            dropped,
            next_state: rec.next_state,
        })
    }

    async fn fetch(&self) -> Result<Vec<ProposalId>, RunError> {
        let ids = self.source.fetch(&self.filter).await.map_err(|e| {
            error!(operation = "fetch_proposals", error = %e, "proposal fetch failed");
            RunError::Fetch(e)
        })?;
        Ok(oldest_first(ids))
    }

    async fn read_state(&self) -> Result<Vec<ProposalRecord>, RunError> {
        self.store.get().await.map_err(|e| {
            error!(operation = "state_get", store = %self.store.describe(), error = %e, "state read failed");
            RunError::StoreRead(e)
        })
    }

    async fn write_state(&self, doc: &StateDocument) -> Result<(), RunError> {
        self.store.put(doc).await.map_err(|e| {
            error!(operation = "state_put", store = %self.store.describe(), error = %e, "state write failed");
            RunError::StoreWrite(e)
        })
    }

    /// Send one at a time. Returns the ids delivered before the first failure, and that failure.
    async fn send_each(&self, ids: &[ProposalId]) -> (Vec<ProposalId>, Option<NotifyError>) {
        let mut delivered = Vec::with_capacity(ids.len());
        for id in ids {
            if let Err(e) = self.notifier.send(id).await {
                error!(operation = "notify", proposal = %id, error = %e, "notification failed");
                if delivered.len() + 1 < ids.len() {
                    warn!(
                        unsent = ids.len() - delivered.len() - 1,
                        "remaining notifications deferred to the next run"
                    );
                }
                return (delivered, Some(e));
            }
            delivered.push(id.clone());
        }
        info!(proposals = ?delivered, "notifications sent");
        (delivered, None)
    }
}
