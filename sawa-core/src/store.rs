use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A stored document: a JSON object carrying its own string `id`.
pub type Document = Value;

/// Named collections of the marketplace document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Bookings,
    Offers,
    Conversations,
    Users,
    Adventures,
    CancellationRequests,
    Cities,
    Notifications,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Bookings => "bookings",
            Collection::Offers => "offers",
            Collection::Conversations => "conversations",
            Collection::Users => "users",
            Collection::Adventures => "adventures",
            Collection::CancellationRequests => "cancellation_requests",
            Collection::Cities => "cities",
            Collection::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter operator. Only equality-style predicates are supported; there are
/// no range queries or joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    In,
    ArrayContains,
}

/// A `(field, op, value)` predicate on a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self { field: field.to_string(), op: Op::Eq, value: value.into() }
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self { field: field.to_string(), op: Op::Ne, value: value.into() }
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self { field: field.to_string(), op: Op::In, value: Value::Array(values) }
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self { field: field.to_string(), op: Op::ArrayContains, value: value.into() }
    }

    /// A missing field never equals anything, so it always passes `Ne`.
    pub fn matches(&self, doc: &Document) -> bool {
        let current = doc.get(&self.field);
        match self.op {
            Op::Eq => current == Some(&self.value),
            Op::Ne => current != Some(&self.value),
            Op::In => match (current, &self.value) {
                (Some(current), Value::Array(options)) => options.contains(current),
                _ => false,
            },
            Op::ArrayContains => {
                matches!(current, Some(Value::Array(items)) if items.contains(&self.value))
            }
        }
    }
}

pub fn matches_all(filters: &[Filter], doc: &Document) -> bool {
    filters.iter().all(|f| f.matches(doc))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: &str) -> Self {
        StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
    }

    pub fn already_exists(collection: Collection, id: &str) -> Self {
        StoreError::AlreadyExists { collection: collection.to_string(), id: id.to_string() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Uniform access to the document store. Implementations pass straight
/// through to their backend: no caching, batching or retries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Documents matching every filter, newest `created_date` first.
    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>>;

    async fn get_all_documents(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        self.query_documents(collection, &[]).await
    }

    /// Inserts a document, assigning `id` and `created_date` when absent.
    /// An `id` that is already taken fails with `AlreadyExists`.
    async fn add_document(&self, collection: Collection, data: Document) -> StoreResult<Document>;

    /// Shallow-merges `patch` into an existing document.
    async fn update_document(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<Document>;

    /// Applies `patch` only if the stored document still matches `filters`,
    /// atomically with respect to other writers. `None` means the
    /// precondition failed (or the document is gone).
    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    /// Upserts the whole document under `id`.
    async fn set_document(&self, collection: Collection, id: &str, data: Document) -> StoreResult<Document>;

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool>;
}

pub fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fills in `id` and `created_date` for a new document and returns its id.
pub fn prepare_new(data: &mut Document) -> StoreResult<String> {
    let obj = data
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;

    let id = match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            obj.insert("id".into(), Value::String(id.clone()));
            id
        }
    };

    if !obj.contains_key("created_date") {
        obj.insert("created_date".into(), Value::String(now_stamp()));
    }

    Ok(id)
}

/// Stamps `updated_date` on a patch unless the caller set it.
pub fn stamp_patch(patch: &mut Document) -> StoreResult<()> {
    let obj = patch
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("patch must be a JSON object".into()))?;
    obj.entry("updated_date").or_insert_with(|| Value::String(now_stamp()));
    obj.remove("id");
    Ok(())
}

/// Top-level merge: fields in `patch` replace fields in `target`.
pub fn merge_patch(target: &mut Document, patch: &Document) -> StoreResult<()> {
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return Err(StoreError::InvalidDocument("merge requires JSON objects".into()));
    };
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn created_at(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("created_date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Newest first; undated documents last; ties broken by id.
pub fn sort_documents(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        let by_date = match (created_at(a), created_at(b)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| {
            let a = a.get("id").and_then(Value::as_str).unwrap_or_default();
            let b = b.get("id").and_then(Value::as_str).unwrap_or_default();
            a.cmp(b)
        })
    });
}

pub async fn get_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get_document(collection, id).await? {
        Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
        None => Ok(None),
    }
}

pub async fn query_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    filters: &[Filter],
) -> StoreResult<Vec<T>> {
    let docs = store.query_documents(collection, filters).await?;
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}

pub async fn get_all_as<T: DeserializeOwned>(store: &dyn DocumentStore, collection: Collection) -> StoreResult<Vec<T>> {
    query_as(store, collection, &[]).await
}

pub async fn add_as<T: Serialize + DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    value: &T,
) -> StoreResult<T> {
    let doc = store.add_document(collection, serde_json::to_value(value)?).await?;
    Ok(serde_json::from_value(doc)?)
}

pub async fn set_as<T: Serialize + DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
    value: &T,
) -> StoreResult<T> {
    let doc = store.set_document(collection, id, serde_json::to_value(value)?).await?;
    Ok(serde_json::from_value(doc)?)
}
