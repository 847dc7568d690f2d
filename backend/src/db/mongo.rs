use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database};
use serde_json::Value;

use super::{
    Collection, Document, DocumentStore, Filter, FindOptions, SortOrder, StoreError, Update,
    UpdateOutcome, ID_FIELD,
};

/// MongoDB-backed store. One client is shared by every request.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Builds the client. No connection is made until the first operation.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        let client = Client::with_options(options)?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<bson::Document> {
        self.db.collection::<bson::Document>(collection.name())
    }
}

fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn to_bson_document(doc: &Document) -> Result<bson::Document, StoreError> {
    let mut out = bson::Document::new();
    for (field, value) in doc {
        if field == ID_FIELD {
            continue;
        }
        out.insert(field.clone(), to_bson(value)?);
    }
    Ok(out)
}

fn from_bson_document(doc: bson::Document) -> Document {
    doc.into_iter()
        .map(|(field, value)| {
            let value = match value {
                Bson::ObjectId(id) => Value::String(id.to_hex()),
                other => other.into_relaxed_extjson(),
            };
            (field, value)
        })
        .collect()
}

fn filter_document(filter: &Filter) -> Result<bson::Document, StoreError> {
    Ok(match filter {
        Filter::All => doc! {},
        Filter::Id(id) => doc! { "_id": *id },
        Filter::NotId(id) => doc! { "_id": { "$ne": *id } },
        Filter::Eq(field, value) => {
            let mut out = bson::Document::new();
            out.insert(field.clone(), to_bson(value)?);
            out
        }
        Filter::And(parts) => {
            let parts = parts
                .iter()
                .map(|part| filter_document(part).map(Bson::Document))
                .collect::<Result<Vec<_>, _>>()?;
            doc! { "$and": parts }
        }
    })
}

fn set_document(set: &Document) -> Result<bson::Document, StoreError> {
    Ok(doc! { "$set": to_bson_document(set)? })
}

/// Sort document and limit for a `find`.
fn cursor_options(options: &FindOptions) -> (Option<bson::Document>, Option<i64>) {
    let sort = options.sort.as_ref().map(|(field, order)| {
        let direction = match order {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        };
        let mut sort = bson::Document::new();
        sort.insert(field.clone(), direction);
        sort
    });
    let limit = options.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
    (sort, limit)
}

/// Query and `$set` documents for one step of a batch.
fn update_documents(update: &Update) -> Result<(bson::Document, bson::Document), StoreError> {
    Ok((filter_document(&update.filter)?, set_document(&update.set)?))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(to_bson_document(&doc)?)
            .await?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id.to_hex()),
            other => Ok(other.to_string()),
        }
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let coll = self.collection(collection);
        let mut action = coll.find(filter_document(&filter)?);
        let (sort, limit) = cursor_options(&options);
        if let Some(sort) = sort {
            action = action.sort(sort);
        }
        if let Some(limit) = limit {
            action = action.limit(limit);
        }
        let docs: Vec<bson::Document> = action.await?.try_collect().await?;
        Ok(docs.into_iter().map(from_bson_document).collect())
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(filter_document(&filter)?)
            .await?;
        Ok(found.map(from_bson_document))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(filter_document(&filter)?, set_document(&set)?)
            .await?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_many(filter_document(&filter)?, set_document(&set)?)
            .await?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: Collection, filter: Filter) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(filter_document(&filter)?)
            .await?;
        Ok(result.deleted_count)
    }

    async fn apply_batch(
        &self,
        collection: Collection,
        updates: Vec<Update>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        let coll = self.collection(collection);
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let mut outcomes = Vec::with_capacity(updates.len());
        for update in &updates {
            let (filter, set) = match update_documents(update) {
                Ok(parts) => parts,
                Err(err) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        log::warn!("Failed to abort transaction: {}", abort_err);
                    }
                    return Err(err);
                }
            };
            let result = if update.many {
                coll.update_many(filter, set).session(&mut session).await
            } else {
                coll.update_one(filter, set).session(&mut session).await
            };
            match result {
                Ok(result) => outcomes.push(UpdateOutcome {
                    matched_count: result.matched_count,
                    modified_count: result.modified_count,
                }),
                Err(err) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        log::warn!("Failed to abort transaction: {}", abort_err);
                    }
                    return Err(err.into());
                }
            }
        }

        session.commit_transaction().await?;
        Ok(outcomes)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
