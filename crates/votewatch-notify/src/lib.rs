//! Notifier: one message per proposal id to a fixed recipient list.

mod message;
pub use message::EmailContent;

#[cfg(feature = "smtp")]
mod smtp;
#[cfg(feature = "smtp")]
pub use smtp::SmtpNotifier;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use votewatch_core::ProposalId;
use votewatch_store::SecretError;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("cannot load mail credentials: {0}")]
    Secret(#[from] SecretError),

    #[error("invalid mail address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to notify proposal {id}: {reason}")]
    Send { id: ProposalId, reason: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the notification for a single proposal.
    async fn send(&self, id: &ProposalId) -> Result<(), NotifyError>;

    /// Deliver notifications one after another, stopping at the first failure.
    async fn notify(&self, ids: &[ProposalId]) -> Result<(), NotifyError> {
        for id in ids {
            self.send(id).await?;
        }
        Ok(())
    }
}

/// Logs the rendered message instead of sending it.
pub struct LogNotifier {
    config: votewatch_core::config::NotifyConfig,
}

impl LogNotifier {
    pub fn new(config: votewatch_core::config::NotifyConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, id: &ProposalId) -> Result<(), NotifyError> {
        let email = EmailContent::render(&self.config, id);
        info!(
            proposal = %id,
            recipients = ?self.config.recipients,
            subject = %email.subject,
            "notification (log only)"
        );
        Ok(())
    }
}
