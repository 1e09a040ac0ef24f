pub mod config;
pub mod proposal;
pub mod reconcile;

pub use config::{Config, ConfigError, RecordPolicy};
pub use proposal::{ProposalId, ProposalRecord, StateDocument};
pub use reconcile::{
    InvalidInput, Reconciliation, has_unstarted_proposals, mark_started, reconcile, unmarked_ids,
    unstarted_ids,
};
