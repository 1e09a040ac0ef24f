//! AWS Systems Manager parameter store and Secrets Manager backends.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueOutput;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::operation::put_parameter::PutParameterOutput;
use tracing::{error, info};
use votewatch_core::StateDocument;

use crate::{Credentials, SecretError, SecretStore, StateStore, StoreError, parse_document};

async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// State document held in a single SSM `String` parameter.
pub struct SsmStateStore {
    client: aws_sdk_ssm::Client,
    parameter_name: String,
}

impl SsmStateStore {
    pub async fn connect(region: &str, parameter_name: impl Into<String>) -> Self {
        let config = sdk_config(region).await;
        Self {
            client: aws_sdk_ssm::Client::new(&config),
            parameter_name: parameter_name.into(),
        }
    }
}

#[async_trait]
impl StateStore for SsmStateStore {
    async fn get(&self) -> Result<StateDocument, StoreError> {
        let out = match self
            .client
            .get_parameter()
            .name(&self.parameter_name)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) if e
                .as_service_error()
                .is_some_and(|se| se.is_parameter_not_found()) =>
            {
                return Err(StoreError::Missing(self.describe()));
            }
            Err(e) => {
                let detail = DisplayErrorContext(&e).to_string();
                error!(operation = "GetParameter", error = %detail, "parameter read failed");
                return Err(StoreError::Backend(detail));
            }
        };

        let raw = out
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| StoreError::Missing(self.describe()))?;
        let doc = parse_document(raw)?;
        info!(parameter = %self.parameter_name, records = doc.len(), "read state document");
        Ok(doc)
    }

    async fn put(&self, doc: &StateDocument) -> Result<(), StoreError> {
        let value = serde_json::to_string(doc)?;
        let out = self
            .client
            .put_parameter()
            .name(&self.parameter_name)
            .value(value)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                error!(operation = "PutParameter", error = %detail, "parameter write failed");
                StoreError::Backend(detail)
            })?;

        let version = check_put(&out)?;
        info!(
            parameter = %self.parameter_name,
            version,
            records = doc.len(),
            "wrote state document"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("ssm parameter {}", self.parameter_name)
    }
}

/// Credentials stored as a JSON secret string.
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
    secret_name: String,
}

impl SecretsManagerStore {
    pub async fn connect(region: &str, secret_name: impl Into<String>) -> Self {
        let config = sdk_config(region).await;
        Self {
            client: aws_sdk_secretsmanager::Client::new(&config),
            secret_name: secret_name.into(),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn credentials(&self) -> Result<Credentials, SecretError> {
        let out = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_name)
            .send()
            .await
            .map_err(|e| {
                let detail = aws_sdk_secretsmanager::error::DisplayErrorContext(&e).to_string();
                error!(operation = "GetSecretValue", error = %detail, "secret read failed");
                SecretError::Backend(detail)
            })?;

        Credentials::from_json(secret_payload(&out, &self.secret_name)?)
    }
}

/// A put without a new parameter version did not take effect.
fn check_put(out: &PutParameterOutput) -> Result<i64, StoreError> {
    if out.version() <= 0 {
        error!(response = ?out, "parameter write returned no version");
        return Err(StoreError::WriteRejected(format!("{out:?}")));
    }
    Ok(out.version())
}

fn secret_payload<'a>(out: &'a GetSecretValueOutput, name: &str) -> Result<&'a str, SecretError> {
    out.secret_string()
        .ok_or_else(|| SecretError::Missing(name.to_string()))
}
