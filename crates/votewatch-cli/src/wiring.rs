//! Builds the collaborators named by the configuration.

use tracing::info;
use votewatch_core::Config;
use votewatch_core::config::{NotifyBackend, SecretsBackend, StoreBackend};
use votewatch_notify::{LogNotifier, Notifier, SmtpNotifier};
use votewatch_store::{
    EnvSecretStore, FileStateStore, SecretStore, SecretsManagerStore, SsmStateStore, StateStore,
};
use votewatch_sync::{ProposalClient, ProposalSource};

pub fn proposal_source(config: &Config) -> Box<dyn ProposalSource> {
    Box::new(ProposalClient::new(config.source.api_url.clone()))
}

pub async fn state_store(config: &Config) -> Box<dyn StateStore> {
    let store: Box<dyn StateStore> = match config.store.backend {
        StoreBackend::File => Box::new(FileStateStore::new(config.store.path.clone())),
        StoreBackend::Ssm => Box::new(
            SsmStateStore::connect(&config.store.region, config.store.parameter_name.clone())
                .await,
        ),
    };
    info!(store = %store.describe(), "using state store");
    store
}

pub async fn secret_store(config: &Config) -> Box<dyn SecretStore> {
    match config.secrets.backend {
        SecretsBackend::Env => Box::new(EnvSecretStore::default()),
        SecretsBackend::SecretsManager => Box::new(
            SecretsManagerStore::connect(&config.secrets.region, config.secrets.secret_name.clone())
                .await,
        ),
    }
}

pub async fn notifier(config: &Config) -> Box<dyn Notifier> {
    match config.notify.backend {
        NotifyBackend::Smtp => Box::new(SmtpNotifier::new(
            config.notify.clone(),
            secret_store(config).await,
        )),
        NotifyBackend::Log => Box::new(LogNotifier::new(config.notify.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_backend_reads_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"[{"proposal":"5"}]"#).unwrap();

        let mut config = Config::default();
        config.store.path = path.clone();
        let store = state_store(&config).await;
        assert_eq!(store.describe(), format!("file {}", path.display()));
        assert_eq!(store.get().await.unwrap()[0].proposal.as_str(), "5");
    }

    #[tokio::test]
    async fn log_backend_needs_no_credentials() {
        let mut config = Config::default();
        config.notify.backend = NotifyBackend::Log;
        let notifier = notifier(&config).await;
        notifier.send(&"1".into()).await.unwrap();
    }
}
