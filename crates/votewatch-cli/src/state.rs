use votewatch_store::{StateStore, StoreError};

/// Write an empty document. Returns `false` without writing when one already
/// exists and `force` is not set. An unparseable document counts as existing.
pub async fn init(store: &dyn StateStore, force: bool) -> Result<bool, StoreError> {
    let exists = match store.get().await {
        Ok(_) | Err(StoreError::Parse { .. }) => true,
        Err(StoreError::Missing(_)) => false,
        Err(e) => return Err(e),
    };
    if exists && !force {
        return Ok(false);
    }
    store.put(&Vec::new()).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use votewatch_core::ProposalRecord;
    use votewatch_store::MemoryStateStore;

    #[tokio::test]
    async fn init_creates_missing_document() {
        let store = MemoryStateStore::default();
        assert!(init(&store, false).await.unwrap());
        assert_eq!(store.snapshot().await, Some(vec![]));
    }

    #[tokio::test]
    async fn init_keeps_existing_document() {
        let store = MemoryStateStore::new(Some(vec![ProposalRecord::plain("1".into())]));
        assert!(!init(&store, false).await.unwrap());
        assert_eq!(store.writes().await, 0);
    }

    #[tokio::test]
    async fn force_overwrites() {
        let store = MemoryStateStore::new(Some(vec![ProposalRecord::plain("1".into())]));
        assert!(init(&store, true).await.unwrap());
        assert_eq!(store.snapshot().await, Some(vec![]));
    }
}
