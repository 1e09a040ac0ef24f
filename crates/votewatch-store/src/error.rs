use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state document not found at {0}")]
    Missing(String),

    #[error("state document is not valid JSON ({reason}): {raw}")]
    Parse { reason: String, raw: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend rejected the write: {0}")]
    WriteRejected(String),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {0} is not set")]
    Missing(String),

    #[error("secret payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}
