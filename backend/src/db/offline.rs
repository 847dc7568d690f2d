use async_trait::async_trait;

use super::{Collection, Document, DocumentStore, Filter, FindOptions, StoreError, Update, UpdateOutcome};

/// Stand-in used when the database client could not be set up at startup.
/// The server keeps listening and every data route answers 500.
#[derive(Debug, Clone)]
pub struct OfflineStore {
    reason: String,
}

impl OfflineStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn unavailable<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Backend(format!("database unavailable: {}", self.reason)))
    }
}

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.unavailable()
    }

    async fn insert_one(&self, _collection: Collection, _doc: Document) -> Result<String, StoreError> {
        self.unavailable()
    }

    async fn find(
        &self,
        _collection: Collection,
        _filter: Filter,
        _options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.unavailable()
    }

    async fn find_one(&self, _collection: Collection, _filter: Filter) -> Result<Option<Document>, StoreError> {
        self.unavailable()
    }

    async fn update_one(
        &self,
        _collection: Collection,
        _filter: Filter,
        _set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.unavailable()
    }

    async fn update_many(
        &self,
        _collection: Collection,
        _filter: Filter,
        _set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.unavailable()
    }

    async fn delete_one(&self, _collection: Collection, _filter: Filter) -> Result<u64, StoreError> {
        self.unavailable()
    }

    async fn apply_batch(
        &self,
        _collection: Collection,
        _updates: Vec<Update>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        self.unavailable()
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_call_reports_backend_failure() {
        let store = OfflineStore::new("dns lookup failed");
        assert!(matches!(store.ping().await, Err(StoreError::Backend(_))));
        let err = store
            .find(Collection::Property, Filter::All, FindOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dns lookup failed"));
    }
}
