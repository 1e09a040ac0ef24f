//! Job configuration.
//!
//! Loaded once by the binary from a TOML file and handed to every collaborator.
//! All fields have defaults, so an empty file (or no file) yields the
//! production settings of the proposal notifier.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::proposal::{ProposalId, ProposalRecord};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How freshly discovered proposals are recorded in the state document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// `{ "proposal": id }` only. Presence means "notified".
    #[default]
    Plain,
    /// Adds `started_at`, empty until the notification for that id went out.
    Lifecycle,
}

impl RecordPolicy {
    pub fn new_record(self, id: ProposalId) -> ProposalRecord {
        match self {
            Self::Plain => ProposalRecord::plain(id),
            Self::Lifecycle => ProposalRecord::unstarted(id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub record_policy: RecordPolicy,
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub secrets: SecretsConfig,
    pub notify: NotifyConfig,
}

/// Governance API query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub api_url: String,
    pub reward_status: String,
    pub topics: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ic-api.internetcomputer.org/api/v3/proposals".into(),
            reward_status: "ACCEPT_VOTES".into(),
            topics: vec![
                "TOPIC_GOVERNANCE".into(),
                "TOPIC_NETWORK_ECONOMICS".into(),
                "TOPIC_SNS_AND_COMMUNITY_FUND".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    File,
    Ssm,
}

/// Where the state document lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON file for the `file` backend.
    pub path: PathBuf,
    /// Parameter name for the `ssm` backend.
    pub parameter_name: String,
    pub region: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::from("votewatch-state.json"),
            parameter_name: "pt_hub-shared_data".into(),
            region: "eu-west-1".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretsBackend {
    #[default]
    Env,
    SecretsManager,
}

/// Where SMTP credentials come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub backend: SecretsBackend,
    pub secret_name: String,
    pub region: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretsBackend::Env,
            secret_name: "pt-hub/proposal-notifier-secrets".into(),
            region: "eu-west-1".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyBackend {
    #[default]
    Smtp,
    /// Log each notification instead of sending mail.
    Log,
}

/// Mail delivery and message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub backend: NotifyBackend,
    pub smtp_host: String,
    /// 465 uses implicit TLS; any other port negotiates STARTTLS.
    pub smtp_port: u16,
    pub recipients: Vec<String>,
    pub subject_prefix: String,
    /// Per-proposal link is `{dashboard_url}/{id}`.
    pub dashboard_url: String,
    pub signature: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            backend: NotifyBackend::Smtp,
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 465,
            recipients: vec!["icp-hub-proposals@googlegroups.com".into()],
            subject_prefix: "[ICP HUB]".into(),
            dashboard_url: "https://dashboard.internetcomputer.org/proposal".into(),
            signature: "ICP HUB Bot".into(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or return validated defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.topics.is_empty() {
            return Err(ConfigError::Invalid("source.topics must not be empty".into()));
        }
        if self.source.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("source.topics contains a blank topic".into()));
        }
        if self.notify.backend == NotifyBackend::Smtp {
            if self.notify.recipients.iter().all(|r| r.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "notify.recipients must list at least one address".into(),
                ));
            }
            if self.notify.smtp_port == 0 {
                return Err(ConfigError::Invalid("notify.smtp_port must be non-zero".into()));
            }
        }
        Ok(())
    }
}
