//! SMTP delivery over implicit TLS (port 465) or STARTTLS (any other port).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tokio::sync::OnceCell;
use tracing::{error, info};
use votewatch_core::ProposalId;
use votewatch_core::config::NotifyConfig;
use votewatch_store::{Credentials, SecretStore};

use crate::{EmailContent, Notifier, NotifyError};

/// Sends each notification as a plain-text mail to every configured recipient.
///
/// Credentials are fetched from the secret store on the first send and reused
/// for the rest of the run.
pub struct SmtpNotifier<S> {
    config: NotifyConfig,
    secrets: S,
    session: OnceCell<Session>,
}

struct Session {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl<S: SecretStore> SmtpNotifier<S> {
    pub fn new(config: NotifyConfig, secrets: S) -> Self {
        Self {
            config,
            secrets,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> Result<&Session, NotifyError> {
        self.session
            .get_or_try_init(|| async {
                let creds = self.secrets.credentials().await.inspect_err(|e| {
                    error!(operation = "credentials", error = %e, "cannot load mail credentials");
                })?;
                self.open_session(creds)
            })
            .await
    }

    fn open_session(&self, creds: Credentials) -> Result<Session, NotifyError> {
        let from = parse_mailbox(&creds.username)?;
        let to = self
            .config
            .recipients
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;

        let tls = TlsMode::for_port(self.config.smtp_port);
        let builder = match tls {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host),
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            }
        };
        let transport = builder
            .map_err(|e| NotifyError::Address {
                address: self.config.smtp_host.clone(),
                reason: e.to_string(),
            })?
            .port(self.config.smtp_port)
            .credentials(SmtpCredentials::new(creds.username, creds.password))
            .build();

        info!(
            host = %self.config.smtp_host,
            port = self.config.smtp_port,
            tls = ?tls,
            "opened SMTP session"
        );
        Ok(Session {
            transport,
            from,
            to,
        })
    }
}

/// Port 465 speaks TLS from the first byte; every other port is upgraded with STARTTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsMode {
    Implicit,
    StartTls,
}

impl TlsMode {
    fn for_port(port: u16) -> Self {
        if port == 465 {
            Self::Implicit
        } else {
            Self::StartTls
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn build_message(session: &Session, email: EmailContent) -> Result<Message, lettre::error::Error> {
    let mut builder = Message::builder()
        .from(session.from.clone())
        .subject(email.subject)
        .header(ContentType::TEXT_PLAIN);
    for to in &session.to {
        builder = builder.to(to.clone());
    }
    builder.body(email.body)
}

#[async_trait]
impl<S: SecretStore> Notifier for SmtpNotifier<S> {
    async fn send(&self, id: &ProposalId) -> Result<(), NotifyError> {
        let session = self.session().await?;
        let email = EmailContent::render(&self.config, id);
        let message = build_message(session, email).map_err(|e| NotifyError::Send {
            id: id.clone(),
            reason: e.to_string(),
        })?;

        let response = session.transport.send(message).await.map_err(|e| {
            error!(operation = "send_mail", proposal = %id, error = %e, "mail delivery failed");
            NotifyError::Send {
                id: id.clone(),
                reason: e.to_string(),
            }
        })?;
        info!(proposal = %id, code = %response.code(), "notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votewatch_store::{SecretError, StaticSecretStore};

    struct NoSecrets;

    #[async_trait]
    impl SecretStore for NoSecrets {
        async fn credentials(&self) -> Result<Credentials, SecretError> {
            Err(SecretError::Missing("VOTEWATCH_SMTP_USERNAME".into()))
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_the_send() {
        let notifier = SmtpNotifier::new(NotifyConfig::default(), NoSecrets);
        let err = notifier.send(&"1".into()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Secret(SecretError::Missing(_))));
    }

    #[tokio::test]
    async fn bad_recipient_is_an_address_error() {
        let config = NotifyConfig {
            recipients: vec!["not an address".into()],
            ..NotifyConfig::default()
        };
        let notifier = SmtpNotifier::new(
            config,
            StaticSecretStore(Credentials::new("bot@example.org", "pw")),
        );
        let err = notifier.send(&"1".into()).await.unwrap_err();
        match err {
            NotifyError::Address { address, .. } => assert_eq!(address, "not an address"),
            other => panic!("expected Address, got {other:?}"),
        }
    }

    #[test]
    fn tls_mode_follows_port() {
        assert_eq!(TlsMode::for_port(465), TlsMode::Implicit);
        assert_eq!(TlsMode::for_port(587), TlsMode::StartTls);
        assert_eq!(TlsMode::for_port(25), TlsMode::StartTls);
    }

    #[tokio::test]
    async fn starttls_session_opens_on_submission_port() {
        let config = NotifyConfig {
            smtp_host: "localhost".into(),
            smtp_port: 587,
            ..NotifyConfig::default()
        };
        let notifier = SmtpNotifier::new(
            config,
            StaticSecretStore(Credentials::new("bot@example.org", "pw")),
        );
        let session = notifier.session().await.unwrap();
        assert_eq!(session.to.len(), 1);
    }

    #[test]
    fn message_goes_to_every_recipient() {
        let session = Session {
            transport: AsyncSmtpTransport::<Tokio1Executor>::unencrypted_localhost(),
            from: parse_mailbox("bot@example.org").unwrap(),
            to: vec![
                parse_mailbox("a@example.org").unwrap(),
                parse_mailbox("b@example.org").unwrap(),
            ],
        };
        let email = EmailContent::render(&NotifyConfig::default(), &"42".into());
        let message = build_message(&session, email).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("a@example.org"));
        assert!(raw.contains("b@example.org"));
        assert!(raw.contains("Proposal requires your vote - 42"));
    }
}
