//! SMTP credential sources.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::SecretError;

pub const USERNAME_VAR: &str = "VOTEWATCH_SMTP_USERNAME";
pub const PASSWORD_VAR: &str = "VOTEWATCH_SMTP_PASSWORD";

/// Mail account credentials.
///
/// Deserialises from the secret payload `{"gmailUsername": ..., "gmailAppPassword": ...}`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "gmailUsername")]
    pub username: String,
    #[serde(rename = "gmailAppPassword")]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, SecretError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, SecretError>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Box<T> {
    async fn credentials(&self) -> Result<Credentials, SecretError> {
        (**self).credentials().await
    }
}

/// Reads credentials from two environment variables.
pub struct EnvSecretStore {
    username_var: String,
    password_var: String,
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::with_vars(USERNAME_VAR, PASSWORD_VAR)
    }
}

impl EnvSecretStore {
    pub fn with_vars(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    fn var(name: &str) -> Result<String, SecretError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ => Err(SecretError::Missing(name.to_string())),
        }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn credentials(&self) -> Result<Credentials, SecretError> {
        let username = Self::var(&self.username_var)?;
        let password = Self::var(&self.password_var)?;
        debug!(username = %username, "loaded SMTP credentials from environment");
        Ok(Credentials { username, password })
    }
}

/// Fixed credentials supplied by the caller.
pub struct StaticSecretStore(pub Credentials);

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn credentials(&self) -> Result<Credentials, SecretError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secret_payload() {
        let creds =
            Credentials::from_json(r#"{"gmailUsername":"bot@example.org","gmailAppPassword":"pw"}"#)
                .unwrap();
        assert_eq!(creds, Credentials::new("bot@example.org", "pw"));
    }

    #[test]
    fn payload_missing_password_rejected() {
        let err = Credentials::from_json(r#"{"gmailUsername":"bot@example.org"}"#).unwrap_err();
        assert!(matches!(err, SecretError::Parse(_)));
    }

    #[test]
    fn debug_hides_password() {
        let shown = format!("{:?}", Credentials::new("bot", "hunter2"));
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    async fn unset_env_var_is_missing() {
        let store = EnvSecretStore::with_vars(
            "VOTEWATCH_TEST_UNSET_USERNAME",
            "VOTEWATCH_TEST_UNSET_PASSWORD",
        );
        match store.credentials().await.unwrap_err() {
            SecretError::Missing(name) => assert_eq!(name, "VOTEWATCH_TEST_UNSET_USERNAME"),
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn static_store_returns_its_credentials() {
        let store = StaticSecretStore(Credentials::new("a", "b"));
        assert_eq!(store.credentials().await.unwrap().username, "a");
    }
}
