use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    compare_values, Collection, Document, DocumentStore, Filter, FindOptions, SortOrder, StoreError,
    Update, UpdateOutcome, ID_FIELD,
};

/// Process-local store. Collections keep documents in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_update(docs: &mut [Document], update: &Update) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();
    for doc in docs.iter_mut().filter(|doc| update.filter.matches(doc)) {
        outcome.matched_count += 1;
        let mut changed = false;
        for (field, value) in &update.set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(field) != Some(value) {
                doc.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        if changed {
            outcome.modified_count += 1;
        }
        if !update.many {
            break;
        }
    }
    outcome
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<String, StoreError> {
        let id = ObjectId::new().to_hex();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(doc);
        Ok(id)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();

        if let Some((field, order)) = &options.sort {
            // Insertion order already is `_id` order.
            match (field.as_str(), order) {
                (ID_FIELD, SortOrder::Ascending) => {}
                (ID_FIELD, SortOrder::Descending) => found.reverse(),
                (_, SortOrder::Ascending) => {
                    found.sort_by(|a, b| compare_values(a.get(field), b.get(field)))
                }
                (_, SortOrder::Descending) => {
                    found.sort_by(|a, b| compare_values(b.get(field), a.get(field)))
                }
            }
        }
        if let Some(limit) = options.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        Ok(apply_update(docs, &Update::one(filter, set)))
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        Ok(apply_update(docs, &Update::many(filter, set)))
    }

    async fn delete_one(&self, collection: Collection, filter: Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn apply_batch(
        &self,
        collection: Collection,
        updates: Vec<Update>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        // A single write guard makes the batch indivisible for readers.
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        Ok(updates.iter().map(|update| apply_update(docs, update)).collect())
    }

    async fn close(&self) {}
}
