//! Shared proposal types for the governance API and the persisted state document.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque proposal identifier.
///
/// The governance API hands these out as integers, but nothing downstream relies
/// on numeric semantics, so they are carried as strings. Deserialisation accepts
/// either a JSON string or a JSON integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProposalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for ProposalId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

/// One entry of the persisted state document.
///
/// `started_at` is the lifecycle marker: absent for plain records, empty for a
/// proposal whose notification has not gone out yet, and an RFC 3339 timestamp
/// once it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub proposal: ProposalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl ProposalRecord {
    /// A record without a lifecycle marker.
    pub fn plain(proposal: ProposalId) -> Self {
        Self {
            proposal,
            started_at: None,
        }
    }

    /// A record carrying the "not yet started" marker.
    pub fn unstarted(proposal: ProposalId) -> Self {
        Self {
            proposal,
            started_at: Some(String::new()),
        }
    }

    /// True unless the record carries a non-empty `started_at`.
    pub fn is_unstarted(&self) -> bool {
        self.started_at.as_deref().is_none_or(str::is_empty)
    }
}

/// The whole persisted artifact: an ordered list of records.
pub type StateDocument = Vec<ProposalRecord>;
