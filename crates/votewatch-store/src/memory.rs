use async_trait::async_trait;
use tokio::sync::Mutex;
use votewatch_core::StateDocument;

use crate::{StateStore, StoreError};

/// In-process state store. `None` models a store that was never initialised.
#[derive(Default)]
pub struct MemoryStateStore {
    doc: Mutex<Option<StateDocument>>,
    writes: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new(doc: Option<StateDocument>) -> Self {
        Self {
            doc: Mutex::new(doc),
            writes: Mutex::new(0),
        }
    }

    /// Current contents, without going through [`StateStore::get`].
    pub async fn snapshot(&self) -> Option<StateDocument> {
        self.doc.lock().await.clone()
    }

    /// Number of successful `put` calls so far.
    pub async fn writes(&self) -> usize {
        *self.writes.lock().await
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self) -> Result<StateDocument, StoreError> {
        self.doc
            .lock()
            .await
            .clone()
            .ok_or_else(|| StoreError::Missing(self.describe()))
    }

    async fn put(&self, doc: &StateDocument) -> Result<(), StoreError> {
        *self.doc.lock().await = Some(doc.clone());
        *self.writes.lock().await += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
