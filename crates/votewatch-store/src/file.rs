//! JSON file backend for the state document.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use votewatch_core::StateDocument;

use crate::{StateStore, StoreError, parse_document};

/// State document kept in a local JSON file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers never observe a half-written document.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self) -> Result<StateDocument, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(self.describe()));
            }
            Err(e) => return Err(e.into()),
        };
        let doc = parse_document(&raw)?;
        info!(path = %self.path.display(), records = doc.len(), "read state document");
        Ok(doc)
    }

    async fn put(&self, doc: &StateDocument) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(doc)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &contents))
            .await
            .map_err(|e| StoreError::Backend(format!("write task failed: {e}")))??;
        info!(path = %self.path.display(), records = doc.len(), "wrote state document");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votewatch_core::ProposalRecord;

    #[tokio::test]
    async fn missing_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert!(matches!(store.get().await, Err(StoreError::Missing(_))));
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        let doc = vec![
            ProposalRecord::plain("10".into()),
            ProposalRecord::unstarted("11".into()),
        ];
        store.put(&doc).await.unwrap();
        assert_eq!(store.get().await.unwrap(), doc);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            raw,
            r#"[{"proposal":"10"},{"proposal":"11","started_at":""}]"#
        );
    }

    #[tokio::test]
    async fn put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        store.put(&vec![ProposalRecord::plain("1".into())]).await.unwrap();
        store.put(&vec![]).await.unwrap();
        assert!(store.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileStateStore::new(&path).get().await.unwrap_err();
        match err {
            StoreError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn legacy_numeric_ids_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"[{"proposal":123}]"#).unwrap();
        let doc = FileStateStore::new(&path).get().await.unwrap();
        assert_eq!(doc[0].proposal.as_str(), "123");
    }
}
