//! Remote proposal source: the governance API, behind a trait the run orchestrator consumes.

use async_trait::async_trait;
use thiserror::Error;
use votewatch_core::ProposalId;
use votewatch_core::config::SourceConfig;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::ProposalClient;

#[derive(Error, Debug)]
pub enum FetchError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed proposals response: {reason}: {body}")]
    Malformed { reason: String, body: String },
}

/// Query sent to the proposal source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalFilter {
    pub topics: Vec<String>,
    pub reward_status: String,
}

impl From<&SourceConfig> for ProposalFilter {
    fn from(config: &SourceConfig) -> Self {
        Self {
            topics: config.topics.clone(),
            reward_status: config.reward_status.clone(),
        }
    }
}

#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Ids of the proposals matching `filter`, newest-first as the API delivers them.
    async fn fetch(&self, filter: &ProposalFilter) -> Result<Vec<ProposalId>, FetchError>;
}

/// Reverse the API's newest-first order into the oldest-first order reconciliation expects.
pub fn oldest_first(mut ids: Vec<ProposalId>) -> Vec<ProposalId> {
    ids.reverse();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_first_reverses() {
        let ids = vec![ProposalId::from("3"), "2".into(), "1".into()];
        assert_eq!(
            oldest_first(ids),
            vec![ProposalId::from("1"), "2".into(), "3".into()]
        );
    }

    #[test]
    fn filter_from_source_config() {
        let filter = ProposalFilter::from(&SourceConfig::default());
        assert_eq!(filter.reward_status, "ACCEPT_VOTES");
        assert_eq!(filter.topics[0], "TOPIC_GOVERNANCE");
    }
}
