//! Persistence collaborators: the shared state document and the SMTP credentials.

mod error;
pub use error::{SecretError, StoreError};

mod file;
pub use file::FileStateStore;

mod memory;
pub use memory::MemoryStateStore;

mod secrets;
pub use secrets::{Credentials, EnvSecretStore, SecretStore, StaticSecretStore};

#[cfg(feature = "aws")]
mod aws;
#[cfg(feature = "aws")]
pub use aws::{SecretsManagerStore, SsmStateStore};

use async_trait::async_trait;
use votewatch_core::StateDocument;

/// Single-document store for the proposals already notified.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the current document. An absent or unparseable value is an error.
    async fn get(&self) -> Result<StateDocument, StoreError>;

    /// Overwrite the document.
    async fn put(&self, doc: &StateDocument) -> Result<(), StoreError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Parse a stored document, mapping serde failures to [`StoreError::Parse`].
pub(crate) fn parse_document(raw: &str) -> Result<StateDocument, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Parse {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}
