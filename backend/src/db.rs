//! Document store access.
//!
//! Handlers never talk to a driver directly: they receive an
//! `Arc<dyn DocumentStore>` through the application state. Production uses
//! [`MongoStore`]; tests and local runs without a cluster use [`MemoryStore`].
//!
//! Documents cross this boundary as JSON objects. The `_id` field is always a
//! 24-digit hex string on the JSON side, whatever the backend keeps natively.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

mod memory;
mod mongo;
mod offline;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use offline::OfflineStore;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// The collections the marketplace keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Property,
    Users,
    Wishlist,
    Reviews,
    Offers,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Property => "property",
            Collection::Users => "users",
            Collection::Wishlist => "wishlist",
            Collection::Reviews => "reviews",
            Collection::Offers => "offers",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid id format: {0}")]
    InvalidId(String),
    #[error("database error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Builds the Mongo store. When the client cannot be set up (bad URI,
/// unresolvable SRV record) the failure is logged and an [`OfflineStore`]
/// takes its place, so the process keeps serving.
pub async fn open_store(uri: &str, db_name: &str) -> Arc<dyn DocumentStore> {
    match MongoStore::connect(uri, db_name).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("Failed to set up the database client: {}", e);
            Arc::new(OfflineStore::new(e.to_string()))
        }
    }
}

/// Parses a path identifier into a document id.
pub fn parse_id(raw: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Query predicate understood by every backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(ObjectId),
    NotId(ObjectId),
    Eq(String, Value),
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(raw: &str) -> Result<Self, StoreError> {
        parse_id(raw).map(Filter::Id)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Evaluates the predicate against a JSON document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => doc_id(doc) == Some(id.to_hex().as_str()),
            Filter::NotId(id) => doc_id(doc) != Some(id.to_hex().as_str()),
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::And(parts) => parts.iter().all(|part| part.matches(doc)),
        }
    }
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Most recently inserted first. Document ids grow with insertion time.
    pub fn newest_first(limit: u64) -> Self {
        Self {
            sort: Some((ID_FIELD.to_string(), SortOrder::Descending)),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// One `$set` style write, applied to the first match or to every match.
#[derive(Debug, Clone)]
pub struct Update {
    pub filter: Filter,
    pub set: Document,
    pub many: bool,
}

impl Update {
    pub fn one(filter: Filter, set: Document) -> Self {
        Self { filter, set, many: false }
    }

    pub fn many(filter: Filter, set: Document) -> Self {
        Self { filter, set, many: true }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round trip to the backend to confirm it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Stores a new document and returns its generated id. Any `_id` in the
    /// input is replaced.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<String, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, StoreError>;

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, collection: Collection, filter: Filter) -> Result<u64, StoreError>;

    /// Applies every update or none of them.
    async fn apply_batch(
        &self,
        collection: Collection,
        updates: Vec<Update>,
    ) -> Result<Vec<UpdateOutcome>, StoreError>;

    async fn close(&self);
}

/// Ordering used when sorting on an arbitrary field. Numbers compare
/// numerically, strings lexically, anything else is treated as equal.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
